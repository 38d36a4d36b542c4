use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::response::{PostSummary, UserResponse};

#[derive(Debug, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LikeQuery {
	/// Likes on behalf of another user. Only administrators may set this,
	/// it defaults to the caller.
	#[validate(range(min = 1))]
	pub user_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LikeResponse {
	pub user: UserResponse,
	pub post: PostSummary,
}
