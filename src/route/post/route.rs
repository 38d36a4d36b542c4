use aide::axum::IntoApiResponse;
use axum::{extract::State, http::StatusCode, response::IntoResponse};
use macros::route;

use crate::{
	extract::{Json, Multipart, Path, Principal, Query},
	openapi::tag,
	response::{Page, PostResponse},
	route::model::{Form, IdInput, Paginate},
};

use super::{model, Error, PostService, RouteError};

/// List posts
/// Returns a page of posts with their author and tags, ordered by id.
#[route(tag = tag::POST)]
pub async fn list_posts(
	State(service): State<PostService>,
	Query(paginate): Query<Paginate>,
) -> Result<Json<Vec<PostResponse>>, RouteError> {
	Ok(Json(service.list(paginate).await?))
}

/// Search posts
/// Case-insensitive search on the post title.
#[route(tag = tag::POST)]
pub async fn search_posts(
	State(service): State<PostService>,
	Query(input): Query<model::SearchInput>,
) -> Result<Json<Page<PostResponse>>, RouteError> {
	Ok(Json(service.search(input).await?))
}

/// Create post
/// Creates a post authored by the caller. The slug is derived from the title
/// and missing tags are created on the fly.
#[route(tag = tag::POST, response(status = 201, description = "Post created.", shape = "Json<PostResponse>"))]
pub async fn create_post(
	State(service): State<PostService>,
	principal: Principal,
	Json(input): Json<model::CreatePostInput>,
) -> Result<impl IntoApiResponse, RouteError> {
	let post = service.create(&principal, input).await?;

	Ok((StatusCode::CREATED, Json(post)))
}

/// Get post
/// Returns a post with its tags and comment thread.
#[route(tag = tag::POST)]
pub async fn get_post(
	State(service): State<PostService>,
	Path(path): Path<IdInput>,
) -> Result<Json<PostResponse>, RouteError> {
	Ok(Json(service.get(path.id).await?))
}

/// Update post
/// Applies a partial update. Only the author or an administrator may do this.
#[route(tag = tag::POST)]
pub async fn update_post(
	State(service): State<PostService>,
	principal: Principal,
	Path(path): Path<IdInput>,
	Json(patch): Json<model::PostPatch>,
) -> Result<Json<PostResponse>, RouteError> {
	Ok(Json(service.update(&principal, path.id, patch).await?))
}

/// Delete post
/// Soft deletes a post and its comments.
#[route(tag = tag::POST, response(status = 204, description = "Post deleted."))]
pub async fn delete_post(
	State(service): State<PostService>,
	principal: Principal,
	Path(path): Path<IdInput>,
) -> Result<impl IntoApiResponse, RouteError> {
	service.delete(&principal, path.id).await?;

	Ok(StatusCode::NO_CONTENT.into_response())
}

/// Upload cover image
/// Multipart form with a single `file` image. Replaces the current cover.
#[route(tag = tag::POST)]
pub async fn upload_cover_image(
	State(service): State<PostService>,
	principal: Principal,
	Path(path): Path<IdInput>,
	multipart: Multipart,
) -> Result<Json<PostResponse>, RouteError> {
	let upload = Form::read(multipart)
		.await?
		.files
		.remove("file")
		.ok_or(Error::MissingFile)?;

	Ok(Json(
		service
			.upload_cover_image(&principal, path.id, upload)
			.await?,
	))
}
