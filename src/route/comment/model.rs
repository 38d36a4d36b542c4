use macros::patch;
use schemars::JsonSchema;
use serde::Deserialize;
use validator::Validate;

/// A new comment, written by the caller.
#[patch]
#[derive(Debug, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentInput {
	#[validate(length(min = 1, max = 5000))]
	pub content: String,
	/// The post being commented on. Only administrators may move a comment.
	#[validate(range(min = 1))]
	pub post_id: i64,
	/// The comment being replied to, which must belong to the same post.
	#[patch(skip)]
	#[validate(range(min = 1))]
	pub parent_id: Option<i64>,
	/// Reassigns the comment. Only administrators may do this.
	#[patch(only)]
	#[validate(range(min = 1))]
	pub user_id: Option<i64>,
}

/// A new comment on the post named in the path.
#[derive(Debug, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentBody {
	#[validate(length(min = 1, max = 5000))]
	pub content: String,
	#[validate(range(min = 1))]
	pub parent_id: Option<i64>,
}

impl CommentBody {
	pub fn on(self, post_id: i64) -> CreateCommentInput {
		CreateCommentInput {
			content: self.content,
			post_id,
			parent_id: self.parent_id,
		}
	}
}
