use aide::axum::IntoApiResponse;
use axum::{
	extract::State,
	http::StatusCode,
	response::IntoResponse,
};
use macros::route;
use validator::Validate;

use crate::{
	extract::{Json, Multipart, Path, Principal, Query},
	openapi::tag,
	response::UserResponse,
	route::model::{Form, IdInput, Paginate},
};

use super::{model, RouteError, UserService};

/// List users
/// Returns a page of users, ordered by id.
#[route(tag = tag::USER)]
pub async fn list_users(
	State(service): State<UserService>,
	Query(paginate): Query<Paginate>,
) -> Result<Json<Vec<UserResponse>>, RouteError> {
	Ok(Json(service.list(paginate.into()).await?))
}

/// Create user
/// Creates an account with the given roles. Requires the ADMIN role.
#[route(tag = tag::USER, response(status = 201, description = "User created.", shape = "Json<UserResponse>"))]
pub async fn create_user(
	State(service): State<UserService>,
	principal: Principal,
	Json(input): Json<model::CreateUserInput>,
) -> Result<impl IntoApiResponse, RouteError> {
	let user = service.create(&principal, input).await?;

	Ok((StatusCode::CREATED, Json(user)))
}

/// Get user
/// Returns a single user by id.
#[route(tag = tag::USER)]
pub async fn get_user(
	State(service): State<UserService>,
	Path(path): Path<IdInput>,
) -> Result<Json<UserResponse>, RouteError> {
	Ok(Json(service.get(path.id).await?))
}

/// Update user
/// Applies a partial update to a user. Only the user themselves or an
/// administrator may do this.
#[route(tag = tag::USER)]
pub async fn update_user(
	State(service): State<UserService>,
	principal: Principal,
	Path(path): Path<IdInput>,
	Json(patch): Json<model::UserPatch>,
) -> Result<Json<UserResponse>, RouteError> {
	Ok(Json(service.update(&principal, path.id, patch).await?))
}

/// Delete user
/// Soft deletes a user. Only the user themselves or an administrator may do this.
#[route(tag = tag::USER, response(status = 204, description = "User deleted."))]
pub async fn delete_user(
	State(service): State<UserService>,
	principal: Principal,
	Path(path): Path<IdInput>,
) -> Result<impl IntoApiResponse, RouteError> {
	service.delete(&principal, path.id).await?;

	Ok(StatusCode::NO_CONTENT.into_response())
}

/// Update own profile
/// Multipart form with optional `name`, `email` and `photo` (an image file).
/// A new photo replaces the previous one.
#[route(tag = tag::USER)]
pub async fn update_me(
	State(service): State<UserService>,
	principal: Principal,
	multipart: Multipart,
) -> Result<Json<UserResponse>, RouteError> {
	let mut form = Form::read(multipart).await?;

	let patch = model::UserPatch {
		name: form.text("name"),
		email: form.text("email"),
		photo: None,
		active: None,
	};

	patch.validate()?;

	let form = model::UpdateMeForm {
		name: patch.name,
		email: patch.email,
		photo: form.files.remove("photo"),
	};

	Ok(Json(service.update_me(&principal, form).await?))
}
