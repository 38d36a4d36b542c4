use macros::patch;
use schemars::JsonSchema;
use serde::Deserialize;
use validator::Validate;

use crate::{model::Role, route::model::Upload};

/// A new account, created by an administrator.
#[patch]
#[derive(Debug, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserInput {
	/// The name that is displayed to the public.
	#[validate(
		length(min = 1, max = 100),
		custom(function = "crate::route::model::not_blank")
	)]
	pub name: String,
	#[validate(email)]
	pub email: String,
	#[validate(url)]
	pub photo: Option<String>,
	#[patch(skip)]
	#[validate(length(min = 8, max = 128))]
	pub password: String,
	#[patch(skip)]
	pub password_confirm: String,
	/// Defaults to `USER`.
	#[patch(skip)]
	#[serde(default)]
	pub roles: Vec<Role>,
	/// Deactivated accounts cannot sign in. Only administrators may change this.
	#[patch(only)]
	pub active: Option<bool>,
}

/// The multipart form accepted by `PATCH /users/updateMe`.
#[derive(Debug, Default)]
pub struct UpdateMeForm {
	pub name: Option<String>,
	pub email: Option<String>,
	pub photo: Option<Upload>,
}
