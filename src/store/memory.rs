use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{PostRepository, Result};
use crate::route::post::model::{Post, PostInput};

/// Keeps posts in memory for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemoryPostRepository {
	inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
	/// The last identifier handed out. Identifiers are never reused.
	last_id: i64,
	posts: BTreeMap<i64, Post>,
}

#[axum::async_trait]
impl PostRepository for MemoryPostRepository {
	async fn create(&self, input: PostInput) -> Result<Post> {
		let mut inner = self.inner.write().await;

		inner.last_id += 1;

		let post = Post {
			id: inner.last_id,
			title: input.title,
			body_content: input.body_content,
			publish_date: input.publish_date,
		};

		inner.posts.insert(post.id, post.clone());

		Ok(post)
	}

	async fn get_by_id(&self, id: i64) -> Result<Option<Post>> {
		Ok(self.inner.read().await.posts.get(&id).cloned())
	}

	async fn update(&self, id: i64, input: PostInput) -> Result<Option<Post>> {
		let mut inner = self.inner.write().await;

		Ok(inner.posts.get_mut(&id).map(|post| {
			post.title = input.title;
			post.body_content = input.body_content;
			post.publish_date = input.publish_date;
			post.clone()
		}))
	}

	async fn delete(&self, id: i64) -> Result<bool> {
		Ok(self.inner.write().await.posts.remove(&id).is_some())
	}

	async fn list_visible(&self, now: DateTime<Utc>, limit: usize) -> Result<Vec<Post>> {
		let inner = self.inner.read().await;
		let mut posts = inner
			.posts
			.values()
			.filter(|post| post.is_visible(now))
			.cloned()
			.collect::<Vec<_>>();

		posts.sort_by_key(Post::newest_first);
		posts.truncate(limit);

		Ok(posts)
	}
}
