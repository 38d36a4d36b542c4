use aide::axum::{
	routing::{get_with, post_with},
	ApiRouter,
};
use axum::http::StatusCode;

use crate::{error, AppState};

pub mod model;
pub mod route;
pub mod service;

pub use service::ImportService;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("insufficient permissions")]
	Forbidden,
	#[error("cannot read {0}: {1}")]
	Unreadable(String, std::io::Error),
	#[error("{0} is outside of the import directory")]
	OutsideImportDir(String),
	#[error("malformed import file: {0}")]
	Malformed(serde_json::Error),
	#[error("record has no title")]
	MissingTitle,
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/admin/import/posts", post_with(import_posts, import_posts_docs))
		.api_route("/admin/import/status", get_with(import_status, import_status_docs))
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::Forbidden => StatusCode::FORBIDDEN,
			Self::Unreadable(..)
			| Self::OutsideImportDir(..)
			| Self::Malformed(..)
			| Self::MissingTitle => StatusCode::BAD_REQUEST,
		}
	}
}
