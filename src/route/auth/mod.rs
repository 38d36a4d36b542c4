use aide::axum::{
	routing::{get_with, post_with},
	ApiRouter,
};
use axum::http::StatusCode;

use crate::{error, AppState};

pub mod model;
pub mod route;
pub mod service;

pub use service::AuthService;

/// An error that can occur during authentication.
///
/// Note that the messages are presented to the client, so they should not contain
/// sensitive information.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("invalid email or password")]
	InvalidEmailOrPassword,
	#[error("passwords do not match")]
	PasswordMismatch,
	#[error("email already taken")]
	EmailTaken,
	#[error("missing bearer token")]
	MissingToken,
	#[error("invalid bearer token")]
	InvalidToken,
	#[error("bearer token expired")]
	ExpiredToken,
	#[error("account is disabled")]
	AccountDisabled,
	#[error("account no longer exists")]
	UnknownAccount,
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/auth/signup", post_with(sign_up, sign_up_docs))
		.api_route("/auth/signin", post_with(sign_in, sign_in_docs))
		.api_route("/auth/me", get_with(get_me, get_me_docs))
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::InvalidEmailOrPassword
			| Self::MissingToken
			| Self::InvalidToken
			| Self::ExpiredToken
			| Self::AccountDisabled
			| Self::UnknownAccount => StatusCode::UNAUTHORIZED,
			Self::PasswordMismatch => StatusCode::BAD_REQUEST,
			Self::EmailTaken => StatusCode::CONFLICT,
		}
	}
}
