use std::{net::IpAddr, str::FromStr};

use tracing::Level;

use crate::route::post::model::Limits;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("{name} has an invalid value {value:?}")]
	Invalid { name: &'static str, value: String },
}

/// Runtime configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct Config {
	pub host: IpAddr,
	pub port: u16,
	/// When unset, posts are kept in memory for the lifetime of the process.
	pub database_url: Option<String>,
	pub limits: Limits,
	pub log_level: Level,
	/// Whether traces and metrics are exported over OTLP.
	pub otlp: bool,
}

impl Config {
	pub fn from_env() -> Result<Self, Error> {
		Self::from_lookup(|name| std::env::var(name).ok())
	}

	/// Builds the configuration from an arbitrary variable lookup.
	pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
		let defaults = Limits::default();

		Ok(Self {
			host: parse(&lookup, "HOST")?.unwrap_or(IpAddr::from([127, 0, 0, 1])),
			port: parse(&lookup, "PORT")?.unwrap_or(3000),
			database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
			limits: Limits {
				title: parse(&lookup, "POST_TITLE_MAX_LENGTH")?.unwrap_or(defaults.title),
				body_content: parse(&lookup, "POST_BODY_MAX_LENGTH")?
					.unwrap_or(defaults.body_content),
			},
			log_level: parse(&lookup, "LOG_LEVEL")?.unwrap_or(Level::INFO),
			otlp: lookup("OTEL_EXPORTER_OTLP_ENDPOINT").is_some_and(|url| !url.is_empty()),
		})
	}
}

fn parse<T: FromStr>(
	lookup: &impl Fn(&str) -> Option<String>,
	name: &'static str,
) -> Result<Option<T>, Error> {
	lookup(name)
		.map(|value| {
			value
				.trim()
				.parse()
				.map_err(|_| Error::Invalid { name, value })
		})
		.transpose()
}
