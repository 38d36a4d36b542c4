use aide::axum::{routing::get_with, ApiRouter};
use axum::http::StatusCode;

use crate::{error, AppState};

pub mod model;
pub mod route;
pub mod service;

pub use service::CommentService;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unknown comment {0}")]
	UnknownComment(i64),
	#[error("unknown post {0}")]
	UnknownPost(i64),
	#[error("unknown user {0}")]
	UnknownUser(i64),
	#[error("insufficient permissions")]
	Forbidden,
	#[error("parent comment {0} belongs to another post")]
	ParentOnOtherPost(i64),
	#[error("comment {0} is part of a thread and cannot be moved")]
	Unmovable(i64),
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route(
			"/comments",
			get_with(list_comments, list_comments_docs)
				.post_with(create_comment, create_comment_docs),
		)
		.api_route(
			"/comments/:id",
			get_with(get_comment, get_comment_docs)
				.patch_with(update_comment, update_comment_docs)
				.delete_with(delete_comment, delete_comment_docs),
		)
		.api_route(
			"/posts/:id/comments",
			get_with(list_post_comments, list_post_comments_docs)
				.post_with(comment_on_post, comment_on_post_docs),
		)
		.api_route(
			"/posts/:id/root-comments",
			get_with(list_root_comments, list_root_comments_docs),
		)
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownComment(..) | Self::UnknownPost(..) | Self::UnknownUser(..) => {
				StatusCode::NOT_FOUND
			}
			Self::Forbidden => StatusCode::FORBIDDEN,
			Self::ParentOnOtherPost(..) | Self::Unmovable(..) => StatusCode::BAD_REQUEST,
		}
	}
}
