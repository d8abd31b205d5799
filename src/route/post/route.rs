use axum::extract::State;
use posts_macros::route;

use crate::{
	clock::SharedClock,
	error::{self, AppError},
	extract::{Form, Json, Path},
	openapi::tag,
	store::PostStore,
	trace,
};

use super::{model, Error, RouteError};

/// Checks the configured length limits, which the input's own validation does not know about.
fn check_limits(limits: &model::Limits, input: &model::PostInput) -> Result<(), RouteError> {
	limits.check(input).map_err(AppError::Validation)?;

	Ok(())
}

/// Get latest posts
/// Returns the five most recently published posts, newest first. Posts scheduled for the future are not included.
#[route(tag = tag::POST)]
pub async fn index(
	State(posts): State<PostStore>,
	State(clock): State<SharedClock>,
) -> Result<Json<Vec<model::PostView>>, RouteError> {
	let now = clock.now();
	let posts = posts.list_visible(now, model::INDEX_SIZE).await?;

	Ok(Json(
		posts
			.into_iter()
			.map(|post| model::PostView::new(post, now))
			.collect(),
	))
}

/// Get single post
/// Returns a single published post by its unique id. Posts scheduled for the future are not found.
#[route(tag = tag::POST, response(status = 404, shape = "Json<error::ErrorResponse>", description = "The post does not exist or is not published yet."))]
pub async fn get_post(
	State(posts): State<PostStore>,
	State(clock): State<SharedClock>,
	Path(path): Path<model::IdInput>,
) -> Result<Json<model::PostView>, RouteError> {
	let now = clock.now();
	let post = posts
		.get_by_id(path.id)
		.await?
		.filter(|post| post.is_visible(now))
		.ok_or(Error::UnknownPost(path.id))?;

	Ok(Json(model::PostView::new(post, now)))
}

/// Create post
/// Creates a new post from a form with a title, body and publish date.
#[route(tag = tag::POST, response(status = 400, shape = "Json<error::ErrorResponse>", description = "The form is invalid."))]
pub async fn create_post(
	State(posts): State<PostStore>,
	State(clock): State<SharedClock>,
	State(limits): State<model::Limits>,
	Form(input): Form<model::PostInput>,
) -> Result<Json<model::PostView>, RouteError> {
	check_limits(&limits, &input)?;

	let post = posts.create(input).await?;

	tracing::info!(post.id = post.id, post.publish_date = %post.publish_date, "created post");
	trace::count_post_change("created");

	Ok(Json(model::PostView::new(post, clock.now())))
}

/// Update post
/// Replaces the title, body and publish date of an existing post by its unique id, whether or not it is published yet.
#[route(tag = tag::POST, response(status = 400, shape = "Json<error::ErrorResponse>", description = "The form is invalid."), response(status = 404, shape = "Json<error::ErrorResponse>", description = "The post does not exist."))]
pub async fn update_post(
	State(posts): State<PostStore>,
	State(clock): State<SharedClock>,
	State(limits): State<model::Limits>,
	Path(path): Path<model::IdInput>,
	Form(input): Form<model::PostInput>,
) -> Result<Json<model::PostView>, RouteError> {
	check_limits(&limits, &input)?;

	let post = posts
		.update(path.id, input)
		.await?
		.ok_or(Error::UnknownPost(path.id))?;

	tracing::info!(post.id = post.id, "updated post");
	trace::count_post_change("updated");

	Ok(Json(model::PostView::new(post, clock.now())))
}

/// Delete post
/// Deletes an existing post by its unique id. The id can not be used again afterwards.
#[route(tag = tag::POST, response(status = 404, shape = "Json<error::ErrorResponse>", description = "The post does not exist."))]
pub async fn delete_post(
	State(posts): State<PostStore>,
	Path(path): Path<model::IdInput>,
) -> Result<(), RouteError> {
	if !posts.delete(path.id).await? {
		return Err(Error::UnknownPost(path.id).into());
	}

	tracing::info!(post.id = path.id, "deleted post");
	trace::count_post_change("deleted");

	Ok(())
}
