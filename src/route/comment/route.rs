use aide::axum::IntoApiResponse;
use axum::{extract::State, http::StatusCode, response::IntoResponse};
use macros::route;

use crate::{
	extract::{Json, Path, Principal},
	openapi::tag,
	response::CommentResponse,
	route::model::IdInput,
};

use super::{model, CommentService, RouteError};

/// List comments
/// Returns every comment, each with its direct replies.
#[route(tag = tag::COMMENT)]
pub async fn list_comments(
	State(service): State<CommentService>,
) -> Result<Json<Vec<CommentResponse>>, RouteError> {
	Ok(Json(service.list().await?))
}

/// Create comment
/// Comments on a post, optionally replying to another comment on it.
#[route(tag = tag::COMMENT, response(status = 201, description = "Comment created.", shape = "Json<CommentResponse>"))]
pub async fn create_comment(
	State(service): State<CommentService>,
	principal: Principal,
	Json(input): Json<model::CreateCommentInput>,
) -> Result<impl IntoApiResponse, RouteError> {
	let comment = service.create(&principal, input).await?;

	Ok((StatusCode::CREATED, Json(comment)))
}

/// Get comment
#[route(tag = tag::COMMENT)]
pub async fn get_comment(
	State(service): State<CommentService>,
	Path(path): Path<IdInput>,
) -> Result<Json<CommentResponse>, RouteError> {
	Ok(Json(service.get(path.id).await?))
}

/// Update comment
/// Applies a partial update. Only the author or an administrator may do this.
#[route(tag = tag::COMMENT)]
pub async fn update_comment(
	State(service): State<CommentService>,
	principal: Principal,
	Path(path): Path<IdInput>,
	Json(patch): Json<model::CommentPatch>,
) -> Result<Json<CommentResponse>, RouteError> {
	Ok(Json(service.update(&principal, path.id, patch).await?))
}

/// Delete comment
/// Soft deletes a comment and every reply below it.
#[route(tag = tag::COMMENT, response(status = 204, description = "Comment deleted."))]
pub async fn delete_comment(
	State(service): State<CommentService>,
	principal: Principal,
	Path(path): Path<IdInput>,
) -> Result<impl IntoApiResponse, RouteError> {
	service.delete(&principal, path.id).await?;

	Ok(StatusCode::NO_CONTENT.into_response())
}

/// List post comments
/// Returns every comment on a post, each with its direct replies.
#[route(tag = tag::COMMENT)]
pub async fn list_post_comments(
	State(service): State<CommentService>,
	Path(path): Path<IdInput>,
) -> Result<Json<Vec<CommentResponse>>, RouteError> {
	Ok(Json(service.list_by_post(path.id).await?))
}

/// List root comments
/// Returns the top-level comments on a post, each with its direct replies.
#[route(tag = tag::COMMENT)]
pub async fn list_root_comments(
	State(service): State<CommentService>,
	Path(path): Path<IdInput>,
) -> Result<Json<Vec<CommentResponse>>, RouteError> {
	Ok(Json(service.list_roots_by_post(path.id).await?))
}

/// Comment on post
/// Comments on the post in the path.
#[route(tag = tag::COMMENT, response(status = 201, description = "Comment created.", shape = "Json<CommentResponse>"))]
pub async fn comment_on_post(
	State(service): State<CommentService>,
	principal: Principal,
	Path(path): Path<IdInput>,
	Json(body): Json<model::CommentBody>,
) -> Result<impl IntoApiResponse, RouteError> {
	let comment = service.create(&principal, body.on(path.id)).await?;

	Ok((StatusCode::CREATED, Json(comment)))
}
