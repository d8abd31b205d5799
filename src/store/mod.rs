//! Persistence for posts.
//!
//! Handlers only talk to a [`PostRepository`], which is implemented on top of
//! PostgreSQL ([`PgPostRepository`]) and a process-local map
//! ([`MemoryPostRepository`]).

mod memory;
mod postgres;

use std::sync::Arc;

use chrono::{DateTime, Utc};

pub use memory::MemoryPostRepository;
pub use postgres::PgPostRepository;

use crate::route::post::model::{Post, PostInput};

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The repository shared by every handler.
pub type PostStore = Arc<dyn PostRepository>;

#[axum::async_trait]
pub trait PostRepository: Send + Sync {
	/// Stores a new post, assigning it a fresh identifier.
	async fn create(&self, input: PostInput) -> Result<Post>;

	/// Finds a post by its identifier, regardless of its publish date.
	async fn get_by_id(&self, id: i64) -> Result<Option<Post>>;

	/// Overwrites every field of an existing post, returning `None`
	/// if no post has the identifier.
	async fn update(&self, id: i64, input: PostInput) -> Result<Option<Post>>;

	/// Deletes a post, returning whether it existed.
	async fn delete(&self, id: i64) -> Result<bool>;

	/// Returns up to `limit` posts published at or before `now`, newest first.
	/// Posts with the same publish date are ordered by descending identifier.
	async fn list_visible(&self, now: DateTime<Utc>, limit: usize) -> Result<Vec<Post>>;
}
