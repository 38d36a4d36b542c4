//! Public response shapes and the mapping from persisted entities.
//!
//! Relations are resolved by the services into lookup maps and passed in,
//! so every function here is a pure transform. Nesting is bounded: posts
//! embed comments, comments embed one level of replies, and nothing embeds
//! its own parent.

use std::collections::HashMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::model::{Comment, Notification, Post, Role, Tag, Timestamp, User};

/// Users by id, for resolving authors, senders and recipients.
pub type Users = HashMap<i64, UserResponse>;

/// The public profile of a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
	pub id: i64,
	pub name: String,
	pub email: String,
	pub photo: Option<String>,
	pub roles: Vec<Role>,
	pub created_at: Timestamp,
}

impl From<&User> for UserResponse {
	fn from(user: &User) -> Self {
		Self {
			id: user.id,
			name: user.name.clone(),
			email: user.email.clone(),
			photo: user.photo.clone(),
			roles: user.roles.clone(),
			created_at: user.created_at,
		}
	}
}

impl From<User> for UserResponse {
	fn from(user: User) -> Self {
		Self::from(&user)
	}
}

pub fn users(users: &[User]) -> Users {
	users
		.iter()
		.map(|user| (user.id, UserResponse::from(user)))
		.collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TagResponse {
	pub id: i64,
	pub name: String,
}

impl From<Tag> for TagResponse {
	fn from(tag: Tag) -> Self {
		Self {
			id: tag.id,
			name: tag.name,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
	pub id: i64,
	pub content: String,
	/// The author, absent when their account was deleted.
	pub user: Option<UserResponse>,
	pub post_id: i64,
	pub parent_id: Option<i64>,
	/// Depth in the thread, 0 for a root comment.
	pub level: i32,
	pub created_at: Timestamp,
	/// Direct replies. Replies never carry replies of their own.
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub replies: Vec<CommentResponse>,
}

/// Maps a comment without its replies.
pub fn comment(comment: &Comment, users: &Users) -> CommentResponse {
	CommentResponse {
		id: comment.id,
		content: comment.content.clone(),
		user: users.get(&comment.user_id).cloned(),
		post_id: comment.post_id,
		parent_id: comment.parent_id,
		level: comment.level,
		created_at: comment.created_at,
		replies: Vec::new(),
	}
}

/// Maps each of `selected` with its direct replies taken from `all`.
pub fn comments_with_replies(
	selected: &[Comment],
	all: &[Comment],
	users: &Users,
) -> Vec<CommentResponse> {
	selected
		.iter()
		.map(|parent| CommentResponse {
			replies: all
				.iter()
				.filter(|reply| reply.parent_id == Some(parent.id))
				.map(|reply| comment(reply, users))
				.collect(),
			..comment(parent, users)
		})
		.collect()
}

/// Maps the comments of one post as root comments with their direct replies.
pub fn thread(all: &[Comment], users: &Users) -> Vec<CommentResponse> {
	let roots = all
		.iter()
		.filter(|c| c.is_root())
		.cloned()
		.collect::<Vec<_>>();

	comments_with_replies(&roots, all, users)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
	pub id: i64,
	pub slug: String,
	pub title: String,
	pub content: String,
	pub excerpt: String,
	pub cover_image: Option<String>,
	/// The author, absent when their account was deleted.
	pub author: Option<UserResponse>,
	pub created_at: Timestamp,
	pub updated_at: Timestamp,
	#[serde(default)]
	pub tags: Vec<TagResponse>,
	#[serde(default)]
	pub comments: Vec<CommentResponse>,
}

pub fn post(
	post: Post,
	users: &Users,
	tags: Option<Vec<Tag>>,
	comments: Option<Vec<CommentResponse>>,
) -> PostResponse {
	PostResponse {
		author: users.get(&post.author_id).cloned(),
		id: post.id,
		slug: post.slug,
		title: post.title,
		content: post.content,
		excerpt: post.excerpt,
		cover_image: post.cover_image,
		created_at: post.created_at,
		updated_at: post.updated_at,
		tags: tags
			.unwrap_or_default()
			.into_iter()
			.map(TagResponse::from)
			.collect(),
		comments: comments.unwrap_or_default(),
	}
}

/// A post reference small enough to embed anywhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PostSummary {
	pub id: i64,
	pub slug: String,
	pub title: String,
}

impl From<&Post> for PostSummary {
	fn from(post: &Post) -> Self {
		Self {
			id: post.id,
			slug: post.slug.clone(),
			title: post.title.clone(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
	pub id: i64,
	pub recipient: Option<UserResponse>,
	pub sender: Option<UserResponse>,
	pub post: Option<PostSummary>,
	#[serde(rename = "type")]
	pub kind: String,
	pub message: String,
	pub read: bool,
	pub created_at: Timestamp,
}

pub fn notification(
	notification: Notification,
	users: &Users,
	posts: &HashMap<i64, PostSummary>,
) -> NotificationResponse {
	NotificationResponse {
		id: notification.id,
		recipient: users.get(&notification.recipient_id).cloned(),
		sender: users.get(&notification.sender_id).cloned(),
		post: notification
			.post_id
			.and_then(|id| posts.get(&id))
			.cloned(),
		kind: notification.kind,
		message: notification.message,
		read: notification.read,
		created_at: notification.created_at,
	}
}

/// One page of a larger result set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
	pub content: Vec<T>,
	/// The 1-indexed page number.
	pub page: i64,
	pub size: i64,
	pub total_elements: i64,
	pub total_pages: i64,
}

impl<T> Page<T> {
	pub fn new(content: Vec<T>, page: i64, size: i64, total_elements: i64) -> Self {
		let total_pages = if size > 0 {
			(total_elements + size - 1) / size
		} else {
			0
		};

		Self {
			content,
			page,
			size,
			total_elements,
			total_pages,
		}
	}
}
