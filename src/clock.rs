use std::sync::Arc;

use chrono::{DateTime, Utc};

/// The clock shared by every handler.
pub type SharedClock = Arc<dyn Clock>;

/// A source of the current time.
///
/// Handlers read "now" once per request from the clock in the application
/// state and pass it explicitly to everything that depends on it.
pub trait Clock: Send + Sync {
	fn now(&self) -> DateTime<Utc>;
}

/// The wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
	fn now(&self) -> DateTime<Utc> {
		Utc::now()
	}
}

/// A clock stopped at a single instant.
#[cfg(test)]
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

#[cfg(test)]
impl Clock for FixedClock {
	fn now(&self) -> DateTime<Utc> {
		self.0
	}
}
