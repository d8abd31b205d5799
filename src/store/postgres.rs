use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, FromRow, Row};

use super::{PostRepository, Result};
use crate::{
	route::post::model::{Post, PostInput},
	Database,
};

impl<'r> FromRow<'r, PgRow> for Post {
	fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
		Ok(Self {
			id: row.try_get("id")?,
			title: row.try_get("title")?,
			body_content: row.try_get("body_content")?,
			publish_date: row.try_get("publish_date")?,
		})
	}
}

/// Stores posts in the `post` table.
#[derive(Debug, Clone)]
pub struct PgPostRepository {
	database: Database,
}

impl PgPostRepository {
	pub fn new(database: Database) -> Self {
		Self { database }
	}
}

#[axum::async_trait]
impl PostRepository for PgPostRepository {
	async fn create(&self, input: PostInput) -> Result<Post> {
		let post = sqlx::query_as::<_, Post>(
			r#"
				INSERT INTO post (title, body_content, publish_date)
				VALUES ($1, $2, $3)
				RETURNING *
			"#,
		)
		.bind(input.title)
		.bind(input.body_content)
		.bind(input.publish_date)
		.fetch_one(&self.database)
		.await?;

		Ok(post)
	}

	async fn get_by_id(&self, id: i64) -> Result<Option<Post>> {
		let post = sqlx::query_as::<_, Post>(
			r#"
				SELECT * FROM post
				WHERE id = $1
			"#,
		)
		.bind(id)
		.fetch_optional(&self.database)
		.await?;

		Ok(post)
	}

	async fn update(&self, id: i64, input: PostInput) -> Result<Option<Post>> {
		let post = sqlx::query_as::<_, Post>(
			r#"
				UPDATE post
				SET title = $1, body_content = $2, publish_date = $3
				WHERE id = $4
				RETURNING *
			"#,
		)
		.bind(input.title)
		.bind(input.body_content)
		.bind(input.publish_date)
		.bind(id)
		.fetch_optional(&self.database)
		.await?;

		Ok(post)
	}

	async fn delete(&self, id: i64) -> Result<bool> {
		let status = sqlx::query(
			r#"
				DELETE FROM post
				WHERE id = $1
			"#,
		)
		.bind(id)
		.execute(&self.database)
		.await?;

		Ok(status.rows_affected() > 0)
	}

	async fn list_visible(&self, now: DateTime<Utc>, limit: usize) -> Result<Vec<Post>> {
		let posts = sqlx::query_as::<_, Post>(
			r#"
				SELECT * FROM post
				WHERE publish_date <= $1
				ORDER BY publish_date DESC, id DESC
				LIMIT $2
			"#,
		)
		.bind(now)
		.bind(i64::try_from(limit).unwrap_or(i64::MAX))
		.fetch_all(&self.database)
		.await?;

		Ok(posts)
	}
}

#[cfg(test)]
mod test {
	use chrono::{Duration, DurationRound};

	use super::*;

	fn input(title: &str, publish_date: DateTime<Utc>) -> PostInput {
		PostInput {
			title: title.into(),
			body_content: "Some content!".into(),
			publish_date,
		}
	}

	/// Postgres stores microseconds, so compare against a truncated instant.
	fn now() -> DateTime<Utc> {
		Utc::now().duration_trunc(Duration::seconds(1)).unwrap()
	}

	#[sqlx::test]
	#[ignore = "requires DATABASE_URL to point at a postgres server"]
	async fn test_crud(pool: Database) {
		let store = PgPostRepository::new(pool);
		let now = now();

		let post = store.create(input("New post.", now)).await.unwrap();
		assert_eq!(store.get_by_id(post.id).await.unwrap(), Some(post.clone()));

		let updated = store
			.update(post.id, input("Valid post.", now))
			.await
			.unwrap()
			.unwrap();
		assert_eq!(updated.id, post.id);
		assert_eq!(updated.title, "Valid post.");

		assert!(store.delete(post.id).await.unwrap());
		assert!(!store.delete(post.id).await.unwrap());
		assert!(store.get_by_id(post.id).await.unwrap().is_none());
		assert!(store.update(post.id, input("Gone", now)).await.unwrap().is_none());
	}

	#[sqlx::test]
	#[ignore = "requires DATABASE_URL to point at a postgres server"]
	async fn test_list_visible(pool: Database) {
		let store = PgPostRepository::new(pool);
		let now = now();

		let a = store.create(input("A", now - Duration::days(30))).await.unwrap();
		let b = store.create(input("B", now - Duration::days(5))).await.unwrap();
		store.create(input("C", now + Duration::days(30))).await.unwrap();

		let posts = store.list_visible(now, 5).await.unwrap();

		assert_eq!(posts, [b, a]);
	}
}
