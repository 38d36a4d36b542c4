use aide::axum::IntoApiResponse;
use axum::{extract::State, http::StatusCode};
use macros::route;

use crate::{
	extract::{Json, Principal},
	openapi::tag,
	response::UserResponse,
};

use super::{model, AuthService, RouteError};

/// Sign up
/// Registers a new account with the USER role and returns its public profile.
#[route(tag = tag::AUTH, response(status = 201, description = "Account created.", shape = "Json<UserResponse>"))]
pub async fn sign_up(
	State(service): State<AuthService>,
	Json(input): Json<model::SignUpInput>,
) -> Result<impl IntoApiResponse, RouteError> {
	let user = service.sign_up(input).await?;

	Ok((StatusCode::CREATED, Json(user)))
}

/// Sign in
/// Exchanges an email and password for a bearer token.
#[route(tag = tag::AUTH)]
pub async fn sign_in(
	State(service): State<AuthService>,
	Json(input): Json<model::SignInInput>,
) -> Result<Json<model::AuthResponse>, RouteError> {
	Ok(Json(service.sign_in(input).await?))
}

/// Get current user
/// Returns the profile of the authenticated account.
#[route(tag = tag::AUTH)]
pub async fn get_me(
	State(service): State<AuthService>,
	principal: Principal,
) -> Result<Json<UserResponse>, RouteError> {
	Ok(Json(service.current_user(&principal).await?))
}
