use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MarkAllReadResponse {
	/// The number of notifications that were unread before the call.
	pub updated: u64,
}
