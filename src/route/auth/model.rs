use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::response::UserResponse;

/// Lowercases and trims an email so lookups are case-insensitive.
pub fn normalize_email(email: &str) -> String {
	email.trim().to_lowercase()
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignUpInput {
	/// The name that is displayed to the public.
	#[validate(
		length(min = 1, max = 100),
		custom(function = "crate::route::model::not_blank")
	)]
	pub name: String,
	/// Used for signing in, unique among accounts.
	#[validate(email)]
	pub email: String,
	#[validate(length(min = 8, max = 128))]
	pub password: String,
	/// Must equal `password`.
	pub password_confirm: String,
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct SignInInput {
	#[validate(email)]
	pub email: String,
	#[validate(length(min = 1, max = 128))]
	pub password: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
	/// Send as `Authorization: Bearer <token>`.
	pub token: String,
	pub token_type: String,
	/// Seconds until the token expires.
	pub expires_in: i64,
	pub user: UserResponse,
}
