use aide::axum::{
	routing::{get_with, post_with},
	ApiRouter,
};
use axum::http::StatusCode;

use crate::{error, AppState};

pub mod model;
pub mod route;
pub mod service;

pub use service::PostService;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unknown post {0}")]
	UnknownPost(i64),
	#[error("unknown author {0}")]
	UnknownAuthor(i64),
	#[error("insufficient permissions")]
	Forbidden,
	#[error("invalid slug {0:?}")]
	InvalidSlug(String),
	#[error("slug already taken: {0}")]
	SlugTaken(String),
	#[error("cover image must be one of: jpg, jpeg, png, gif, webp")]
	UnsupportedImage,
	#[error("missing file")]
	MissingFile,
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route(
			"/posts",
			get_with(list_posts, list_posts_docs).post_with(create_post, create_post_docs),
		)
		.api_route("/posts/search", get_with(search_posts, search_posts_docs))
		.api_route(
			"/posts/:id",
			get_with(get_post, get_post_docs)
				.patch_with(update_post, update_post_docs)
				.delete_with(delete_post, delete_post_docs),
		)
		.api_route(
			"/posts/:id/coverImage",
			post_with(upload_cover_image, upload_cover_image_docs),
		)
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownPost(..) | Self::UnknownAuthor(..) => StatusCode::NOT_FOUND,
			Self::Forbidden => StatusCode::FORBIDDEN,
			Self::SlugTaken(..) => StatusCode::CONFLICT,
			Self::InvalidSlug(..) | Self::UnsupportedImage | Self::MissingFile => {
				StatusCode::BAD_REQUEST
			}
		}
	}
}
