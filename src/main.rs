#![warn(clippy::pedantic)]

mod clock;
mod config;
mod error;
mod extract;
mod openapi;
mod route;
mod store;
mod trace;

use std::sync::Arc;

use aide::{axum::ApiRouter, openapi::OpenApi};
use axum::{Extension, Router};
use tower::ServiceBuilder;
use tower_http::{
	compression::CompressionLayer,
	request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
	trace::TraceLayer,
};

use crate::{
	clock::{SharedClock, SystemClock},
	config::Config,
	route::post::model::Limits,
	store::{MemoryPostRepository, PgPostRepository, PostStore},
};

pub type Database = sqlx::Pool<sqlx::Postgres>;
pub type AppState = State;

/// The shared application state.
///
/// This contains every dependency that handlers need to access. Each field
/// can be extracted on its own with [`axum::extract::State`].
#[derive(Clone, axum::extract::FromRef)]
pub struct State {
	pub posts: PostStore,
	pub clock: SharedClock,
	pub limits: Limits,
}

/// Builds the application router, along with its `OpenAPI` document.
pub fn app(state: AppState) -> Router {
	aide::gen::extract_schemas(true);

	let mut api = OpenApi::default();

	ApiRouter::new()
		.merge(route::post::routes())
		.nest_api_service("/docs", route::docs::routes())
		.finish_api_with(&mut api, openapi::docs)
		.layer(Extension(Arc::new(api)))
		.layer(
			ServiceBuilder::new()
				.layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
				.layer(TraceLayer::new_for_http().on_response(trace::RecordLatency))
				.layer(PropagateRequestIdLayer::x_request_id())
				.layer(CompressionLayer::new()),
		)
		.with_state(state)
}

/// Connects to the database and applies pending migrations, or falls back to
/// an in-memory store when no database is configured.
async fn connect(config: &Config) -> Result<PostStore, store::Error> {
	let Some(url) = &config.database_url else {
		tracing::warn!("DATABASE_URL is not set, posts will only be kept in memory");

		return Ok(Arc::new(MemoryPostRepository::default()));
	};

	let database = Database::connect(url).await?;

	sqlx::migrate!()
		.run(&database)
		.await
		.map_err(sqlx::Error::from)?;

	Ok(Arc::new(PgPostRepository::new(database)))
}

#[tokio::main]
async fn main() {
	dotenvy::dotenv().ok();

	let config = Config::from_env().expect("invalid configuration");
	let _guard = trace::init_tracing_subscriber(config.log_level, config.otlp)
		.expect("failed to initialize tracing");

	let state = State {
		posts: connect(&config)
			.await
			.expect("failed to connect to database"),
		clock: Arc::new(SystemClock),
		limits: config.limits,
	};

	let listener = tokio::net::TcpListener::bind((config.host, config.port))
		.await
		.expect("failed to bind to port");

	tracing::info!("listening on {}:{}", config.host, config.port);

	axum::serve(listener, app(state))
		.await
		.expect("server error");
}
