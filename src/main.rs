#![warn(clippy::pedantic)]

mod config;
mod credential;
mod error;
mod extract;
mod model;
mod openapi;
mod ratelimit;
mod repository;
mod response;
mod route;
mod storage;
mod trace;

use std::{net::SocketAddr, sync::Arc};

use aide::{axum::ApiRouter, openapi::OpenApi};
use argon2::Argon2;
use axum::{middleware, Extension, Router};
use tower::ServiceBuilder;
use tower_http::{
	compression::CompressionLayer,
	cors::CorsLayer,
	request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
	services::ServeDir,
	trace::TraceLayer,
};

use crate::{
	config::Config,
	credential::Credentials,
	repository::{PgStore, Repositories},
	storage::{BlobStore, LocalBlobStore},
};

pub type Database = sqlx::Pool<sqlx::Postgres>;
pub type AppState = State;

/// The shared application state.
///
/// Services pick the repositories they need out of this through
/// [`axum::extract::FromRef`], so handlers never see the whole thing.
#[derive(Clone, axum::extract::FromRef)]
pub struct State {
	pub repositories: Repositories,
	pub credentials: Credentials,
	pub storage: Arc<dyn BlobStore>,
	pub config: Arc<Config>,
}

/// Builds the application router, without rate limiting.
pub fn app(state: AppState) -> Router {
	let mut api = OpenApi::default();
	let uploads = state.config.upload_dir.clone();

	ApiRouter::new()
		.nest("/api/v1", route::routes())
		.nest_api_service("/docs", route::docs::routes())
		.finish_api_with(&mut api, openapi::docs)
		.nest_service("/img", ServeDir::new(&uploads))
		.nest_service("/api/v1/img", ServeDir::new(&uploads))
		.fallback(error::unknown_route)
		.layer(Extension(Arc::new(api)))
		.layer(
			ServiceBuilder::new()
				.layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
				.layer(TraceLayer::new_for_http())
				.layer(PropagateRequestIdLayer::x_request_id())
				.layer(CorsLayer::permissive())
				.layer(CompressionLayer::new())
				.layer(middleware::from_fn(error::attach_path)),
		)
		.with_state(state)
}

#[derive(Debug, thiserror::Error)]
enum StartupError {
	#[error(transparent)]
	Config(#[from] config::Error),
	#[error(transparent)]
	Trace(#[from] trace::Error),
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),
	#[error("migration error: {0}")]
	Migrate(#[from] sqlx::migrate::MigrateError),
	#[error("io error: {0}")]
	Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> Result<(), StartupError> {
	let config = Config::from_env()?;
	let _guard = trace::init_tracing_subscriber(config.otlp_endpoint.as_deref())?;

	let database = Database::connect(&config.database_url).await?;
	sqlx::migrate!().run(&database).await?;

	tokio::fs::create_dir_all(&config.upload_dir).await?;

	let state = State {
		repositories: Repositories::new(Arc::new(PgStore::new(database))),
		credentials: Credentials::new(
			Argon2::default(),
			config.jwt_secret.as_bytes(),
			chrono::Duration::hours(config.jwt_ttl_hours),
		),
		storage: Arc::new(LocalBlobStore::new(&config.upload_dir, &config.public_url)),
		config: Arc::new(config),
	};

	let address = SocketAddr::from((state.config.host, state.config.port));
	let governor = ratelimit::default();

	ratelimit::cleanup_old_limits(&[&governor]);

	let app = ratelimit::limit(app(state), governor);
	let listener = tokio::net::TcpListener::bind(address).await?;

	tracing::info!("listening on {}", address);

	axum::serve(
		listener,
		app.into_make_service_with_connect_info::<SocketAddr>(),
	)
	.with_graceful_shutdown(shutdown_signal())
	.await?;

	Ok(())
}

async fn shutdown_signal() {
	if let Err(e) = tokio::signal::ctrl_c().await {
		tracing::error!("failed to listen for shutdown signal: {}", e);
	}

	tracing::info!("shutting down");
}
