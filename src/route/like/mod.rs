use aide::axum::{routing::get_with, ApiRouter};
use axum::http::StatusCode;

use crate::{error, AppState};

pub mod model;
pub mod route;
pub mod service;

pub use service::LikeService;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unknown post {0}")]
	UnknownPost(i64),
	#[error("unknown user {0}")]
	UnknownUser(i64),
	#[error("insufficient permissions")]
	Forbidden,
	#[error("post {0} is already liked")]
	AlreadyLiked(i64),
	#[error("post {0} is not liked")]
	NotLiked(i64),
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new().api_route(
		"/posts/:id/likes",
		get_with(list_likers, list_likers_docs)
			.post_with(like_post, like_post_docs)
			.delete_with(unlike_post, unlike_post_docs),
	)
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownPost(..) | Self::UnknownUser(..) | Self::NotLiked(..) => {
				StatusCode::NOT_FOUND
			}
			Self::Forbidden => StatusCode::FORBIDDEN,
			Self::AlreadyLiked(..) => StatusCode::CONFLICT,
		}
	}
}
