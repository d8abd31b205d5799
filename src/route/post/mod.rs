use aide::axum::{
	routing::{delete_with, get_with, post_with},
	ApiRouter,
};
use axum::http::StatusCode;

use crate::{error, AppState};

pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
	#[error("unknown_post")]
	UnknownPost(i64),
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/", get_with(index, index_docs))
		.api_route("/create/", post_with(create_post, create_post_docs))
		.api_route("/:id/", get_with(get_post, get_post_docs))
		.api_route("/:id/update/", post_with(update_post, update_post_docs))
		.api_route(
			"/:id/delete/",
			delete_with(delete_post, delete_post_docs).post_with(delete_post, delete_post_docs),
		)
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownPost(..) => StatusCode::NOT_FOUND,
		}
	}

	fn into_errors(self) -> Vec<error::Message<'static>> {
		let Self::UnknownPost(post) = self;

		error::Message::new(self.to_string())
			.detail("post", post)
			.into_vec()
	}
}

#[cfg(test)]
mod test {
	use crate::test::*;

	#[tokio::test]
	async fn test_index_without_posts() {
		let server = server();

		let response = server.get("/").await;

		assert_eq!(response.status_code(), 200);
		assert!(response.json::<Vec<Value>>().is_empty());
	}

	#[tokio::test]
	async fn test_index_past_post() {
		let server = server();
		create_post(&server, "Past post.", "old news!", -30).await;

		let posts = server.get("/").await.json::<Vec<Value>>();

		assert_eq!(titles(&posts), ["Past post."]);
	}

	#[tokio::test]
	async fn test_index_future_post() {
		let server = server();
		create_post(&server, "Future post.", "This is breaking news!", 30).await;

		let posts = server.get("/").await.json::<Vec<Value>>();

		assert!(posts.is_empty());
	}

	#[tokio::test]
	async fn test_index_future_and_past_posts() {
		let server = server();
		create_post(&server, "A", "older news!", -30).await;
		create_post(&server, "B", "old news!", -5).await;
		create_post(&server, "C", "breaking news!", 30).await;

		let posts = server.get("/").await.json::<Vec<Value>>();

		assert_eq!(titles(&posts), ["B", "A"]);
	}

	#[tokio::test]
	async fn test_index_shows_five_newest() {
		let server = server();

		for days in 1..=7 {
			create_post(&server, &format!("Post {days}."), "news!", -days).await;
		}

		let posts = server.get("/").await.json::<Vec<Value>>();

		assert_eq!(
			titles(&posts),
			["Post 1.", "Post 2.", "Post 3.", "Post 4.", "Post 5."]
		);
	}

	#[tokio::test]
	async fn test_index_orders_equal_dates_by_id() {
		let server = server();
		let first = create_post(&server, "First.", "news!", -1).await;
		let second = create_post(&server, "Second.", "news!", -1).await;

		let posts = server.get("/").await.json::<Vec<Value>>();

		assert_eq!(
			posts.iter().map(id).collect::<Vec<_>>(),
			[id(&second), id(&first)]
		);
	}

	#[tokio::test]
	async fn test_detail_future_post() {
		let server = server();
		let post = create_post(&server, "Future post.", "breaking news!", 5).await;

		let response = server.get(&format!("/{}/", id(&post))).await;

		assert_eq!(response.status_code(), 404);

		let body = response.json::<Value>();

		assert_eq!(body["success"], false);
		assert_eq!(body["errors"][0]["content"], "unknown_post");
		assert_eq!(body["errors"][0]["details"]["post"], id(&post));
	}

	#[tokio::test]
	async fn test_detail_past_post() {
		let server = server();
		let post = create_post(&server, "Past post.", "older news!", -5).await;

		let response = server.get(&format!("/{}/", id(&post))).await;

		assert_eq!(response.status_code(), 200);

		let body = response.json::<Value>();

		assert_eq!(body["title"], "Past post.");
		assert_eq!(body["body_content"], "older news!");
		assert_eq!(body["was_published_recently"], false);
		assert_eq!(body["url"], format!("/{}/", id(&post)));
	}

	#[tokio::test]
	async fn test_detail_recent_post() {
		let server = server();
		let post = create_post(&server, "Fresh post.", "news!", 0).await;

		let body = server.get(&format!("/{}/", id(&post))).await.json::<Value>();

		assert_eq!(body["was_published_recently"], true);
	}

	#[tokio::test]
	async fn test_detail_unknown_post() {
		let server = server();

		assert_eq!(server.get("/1/").await.status_code(), 404);
		assert_eq!(server.get("/abc/").await.status_code(), 404);
	}

	#[tokio::test]
	async fn test_create_then_detail() {
		let server = server();
		let post = create_post(&server, "New post.", "Some content!", -1).await;

		assert_eq!(post["title"], "New post.");

		let body = server.get(&format!("/{}/", id(&post))).await.json::<Value>();

		assert_eq!(body["id"], post["id"]);
		assert_eq!(body["title"], "New post.");
		assert_eq!(body["body_content"], "Some content!");
	}

	#[tokio::test]
	async fn test_create_title_too_long() {
		let server = server();

		let response = server
			.post("/create/")
			.form(&form("This title is too long.", "Some content!", -1))
			.await;

		assert_eq!(response.status_code(), 400);

		let body = response.json::<Value>();

		assert_eq!(body["errors"][0]["field"], "title");
		assert_eq!(body["errors"][0]["details"]["max"], 15);

		assert!(server.get("/").await.json::<Vec<Value>>().is_empty());
		assert_eq!(server.get("/1/").await.status_code(), 404);
	}

	#[tokio::test]
	async fn test_create_body_too_long() {
		let server = server();

		let response = server
			.post("/create/")
			.form(&form("Long post.", &"a".repeat(501), -1))
			.await;

		assert_eq!(response.status_code(), 400);
		assert!(server.get("/").await.json::<Vec<Value>>().is_empty());
	}

	#[tokio::test]
	async fn test_create_empty_title() {
		let server = server();

		let response = server
			.post("/create/")
			.form(&form("", "Some content!", -1))
			.await;

		assert_eq!(response.status_code(), 400);
		assert_eq!(response.json::<Value>()["errors"][0]["field"], "title");
	}

	#[tokio::test]
	async fn test_create_blank_title() {
		let server = server();

		let response = server
			.post("/create/")
			.form(&form("   ", "Some content!", -1))
			.await;

		assert_eq!(response.status_code(), 400);

		let body = response.json::<Value>();

		assert_eq!(body["errors"][0]["field"], "title");
		assert_eq!(body["errors"][0]["content"], "blank");
		assert!(server.get("/").await.json::<Vec<Value>>().is_empty());
	}

	#[tokio::test]
	async fn test_create_requires_form_content_type() {
		let server = server();

		let response = server
			.post("/create/")
			.json(&form("New post.", "Some content!", -1))
			.await;

		assert_eq!(response.status_code(), 415);
		assert!(server.get("/").await.json::<Vec<Value>>().is_empty());
	}

	#[tokio::test]
	async fn test_create_missing_field() {
		let server = server();

		let response = server
			.post("/create/")
			.form(&[("title", "New post."), ("body_content", "Some content!")])
			.await;

		assert_eq!(response.status_code(), 400);
		assert!(server.get("/").await.json::<Vec<Value>>().is_empty());
	}

	#[tokio::test]
	async fn test_create_malformed_date() {
		let server = server();

		let response = server
			.post("/create/")
			.form(&[
				("title", "New post."),
				("body_content", "Some content!"),
				("publish_date", "yesterday"),
			])
			.await;

		assert_eq!(response.status_code(), 400);
	}

	#[tokio::test]
	async fn test_update_valid_post() {
		let server = server();
		let post = create_post(&server, "New post.", "News!", -30).await;
		let url = format!("/{}/", id(&post));

		let response = server
			.post(&format!("{url}update/"))
			.form(&form("Valid post.", "Some valid content.", -30))
			.await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(response.json::<Value>()["id"], post["id"]);

		let body = server.get(&url).await.json::<Value>();

		assert_eq!(body["id"], post["id"]);
		assert_eq!(body["title"], "Valid post.");
		assert_eq!(body["body_content"], "Some valid content.");
	}

	#[tokio::test]
	async fn test_update_future_post() {
		let server = server();
		let post = create_post(&server, "Future post.", "News!", 30).await;
		let url = format!("/{}/", id(&post));

		let response = server
			.post(&format!("{url}update/"))
			.form(&form("Published.", "News!", -1))
			.await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(server.get(&url).await.json::<Value>()["title"], "Published.");
	}

	#[tokio::test]
	async fn test_update_invalid_post() {
		let server = server();
		let post = create_post(&server, "New post.", "News!", -30).await;
		let url = format!("/{}/", id(&post));

		let response = server
			.post(&format!("{url}update/"))
			.form(&form("This title is too long.", "News!", -30))
			.await;

		assert_eq!(response.status_code(), 400);
		assert_eq!(server.get(&url).await.json::<Value>()["title"], "New post.");
	}

	#[tokio::test]
	async fn test_update_unknown_post() {
		let server = server();

		let response = server
			.post("/1/update/")
			.form(&form("Valid post.", "News!", -1))
			.await;

		assert_eq!(response.status_code(), 404);
	}

	#[tokio::test]
	async fn test_delete_post() {
		let server = server();
		let post = create_post(&server, "New post.", "News!", -30).await;
		let url = format!("/{}/", id(&post));

		let response = server.delete(&format!("{url}delete/")).await;

		assert_eq!(response.status_code(), 200);
		assert!(response.text().is_empty());

		assert_eq!(server.get(&url).await.status_code(), 404);
		assert_eq!(
			server
				.post(&format!("{url}update/"))
				.form(&form("Valid post.", "News!", -1))
				.await
				.status_code(),
			404
		);
		assert_eq!(
			server.delete(&format!("{url}delete/")).await.status_code(),
			404
		);
		assert!(server.get("/").await.json::<Vec<Value>>().is_empty());
	}

	#[tokio::test]
	async fn test_delete_with_form_submission() {
		let server = server();
		let post = create_post(&server, "New post.", "News!", -30).await;

		let response = server.post(&format!("/{}/delete/", id(&post))).await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(
			server.get(&format!("/{}/", id(&post))).await.status_code(),
			404
		);
	}

	#[tokio::test]
	async fn test_delete_unknown_post() {
		let server = server();

		assert_eq!(server.delete("/1/delete/").await.status_code(), 404);
	}

	#[tokio::test]
	async fn test_identifiers_are_not_reused() {
		let server = server();
		let first = create_post(&server, "First.", "News!", -1).await;

		server.delete(&format!("/{}/delete/", id(&first))).await;

		let second = create_post(&server, "Second.", "News!", -1).await;

		assert_ne!(id(&first), id(&second));
		assert_eq!(
			server.get(&format!("/{}/", id(&first))).await.status_code(),
			404
		);
	}

	#[tokio::test]
	async fn test_api_document() {
		let server = server();

		let response = server.get("/docs/api.json").await;

		assert_eq!(response.status_code(), 200);

		let document = response.json::<Value>();

		let paths = &document["paths"];

		assert!(paths["/{id}/"]["get"].is_object());
		assert!(paths["/create/"]["post"]["requestBody"].is_object());
		assert!(paths["/{id}/update/"]["post"]["requestBody"].is_object());

		assert!(paths["/create/"]["post"]["responses"]["400"].is_object());
		assert!(paths["/{id}/"]["get"]["responses"]["404"].is_object());
		assert!(paths["/{id}/update/"]["post"]["responses"]["404"].is_object());
		assert!(paths["/{id}/delete/"]["delete"]["responses"]["404"].is_object());
	}
}
