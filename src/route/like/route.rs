use aide::axum::IntoApiResponse;
use axum::{extract::State, http::StatusCode, response::IntoResponse};
use macros::route;

use crate::{
	extract::{Json, Path, Principal, Query},
	openapi::tag,
	response::UserResponse,
	route::model::IdInput,
};

use super::{model, LikeService, RouteError};

/// Like post
/// Records a like and notifies the author, unless they are the one liking.
#[route(tag = tag::LIKE, response(status = 201, description = "Post liked.", shape = "Json<model::LikeResponse>"))]
pub async fn like_post(
	State(service): State<LikeService>,
	principal: Principal,
	Path(path): Path<IdInput>,
	Query(query): Query<model::LikeQuery>,
) -> Result<impl IntoApiResponse, RouteError> {
	let like = service.like(&principal, path.id, query.user_id).await?;

	Ok((StatusCode::CREATED, Json(like)))
}

/// Unlike post
#[route(tag = tag::LIKE, response(status = 204, description = "Like removed."))]
pub async fn unlike_post(
	State(service): State<LikeService>,
	principal: Principal,
	Path(path): Path<IdInput>,
	Query(query): Query<model::LikeQuery>,
) -> Result<impl IntoApiResponse, RouteError> {
	service.unlike(&principal, path.id, query.user_id).await?;

	Ok(StatusCode::NO_CONTENT.into_response())
}

/// List likers
/// Returns the users currently liking a post, in the order they liked it.
#[route(tag = tag::LIKE)]
pub async fn list_likers(
	State(service): State<LikeService>,
	Path(path): Path<IdInput>,
) -> Result<Json<Vec<UserResponse>>, RouteError> {
	Ok(Json(service.likers(path.id).await?))
}
