use std::{cmp::Reverse, fmt};

use chrono::{DateTime, Duration, Utc};
use posts_macros::model;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

/// The number of posts shown on the index.
pub const INDEX_SIZE: usize = 5;

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
	if value.trim().is_empty() {
		return Err(ValidationError::new("blank"));
	}

	Ok(())
}

/// A single blog post.
#[model]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema, Validate)]
pub struct Post {
	/// The unique identifier of the post, assigned when it is created.
	#[serde(skip_deserializing)]
	pub id: i64,
	/// The title of the post.
	#[validate(custom(function = "validate_not_blank"))]
	pub title: String,
	/// The content of the post.
	#[validate(custom(function = "validate_not_blank"))]
	pub body_content: String,
	/// The time from which the post is publicly visible.
	pub publish_date: DateTime<Utc>,
}

impl Post {
	/// Whether the post was published within the day leading up to `now`.
	///
	/// Both ends of the window are inclusive, and posts scheduled after `now`
	/// were never published recently.
	pub fn was_published_recently(&self, now: DateTime<Utc>) -> bool {
		now - Duration::days(1) <= self.publish_date && self.publish_date <= now
	}

	/// Whether the post is visible to readers at `now`.
	pub fn is_visible(&self, now: DateTime<Utc>) -> bool {
		self.publish_date <= now
	}

	/// The path of the post's detail page.
	pub fn url(&self) -> String {
		format!("/{}/", self.id)
	}

	/// Sort key that orders posts newest first, falling back to the
	/// most recently created post when publish dates are equal.
	pub fn newest_first(&self) -> Reverse<(DateTime<Utc>, i64)> {
		Reverse((self.publish_date, self.id))
	}
}

impl fmt::Display for Post {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.title)
	}
}

/// A post as it is presented to clients.
#[derive(Debug, Serialize, JsonSchema)]
pub struct PostView {
	#[serde(flatten)]
	pub post: Post,
	/// Whether the post was published within the last day.
	pub was_published_recently: bool,
	/// The path of the post's detail page.
	pub url: String,
}

impl PostView {
	pub fn new(post: Post, now: DateTime<Utc>) -> Self {
		Self {
			was_published_recently: post.was_published_recently(now),
			url: post.url(),
			post,
		}
	}
}

/// Maximum field lengths for submitted posts, in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
	pub title: usize,
	pub body_content: usize,
}

impl Default for Limits {
	fn default() -> Self {
		Self {
			title: 15,
			body_content: 500,
		}
	}
}

impl Limits {
	/// Checks the submitted fields against the configured maximum lengths.
	pub fn check(&self, input: &PostInput) -> Result<(), ValidationErrors> {
		let mut errors = ValidationErrors::new();

		check_length(&mut errors, "title", &input.title, self.title);
		check_length(
			&mut errors,
			"body_content",
			&input.body_content,
			self.body_content,
		);

		if errors.errors().is_empty() {
			Ok(())
		} else {
			Err(errors)
		}
	}
}

fn check_length(errors: &mut ValidationErrors, field: &'static str, value: &str, max: usize) {
	let length = value.chars().count();

	if length > max {
		let mut error = ValidationError::new("length");

		error.message = Some(format!("must be at most {max} characters long").into());
		error.add_param("max".into(), &max);
		error.add_param("length".into(), &length);
		errors.add(field, error);
	}
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct IdInput {
	/// The unique identifier of the post.
	pub id: i64,
}
