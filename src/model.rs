//! Persisted entities.
//!
//! These are what repositories read and write. They are never serialized to
//! the client directly, see [`crate::response`] for the public shapes.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub type Timestamp = DateTime<Utc>;

/// A capability tag attached to a user and to every principal resolved for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
	User,
	Admin,
}

impl Role {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::User => "USER",
			Self::Admin => "ADMIN",
		}
	}
}

impl fmt::Display for Role {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, thiserror::Error)]
#[error("unknown role {0}")]
pub struct UnknownRole(String);

impl FromStr for Role {
	type Err = UnknownRole;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"USER" => Ok(Self::User),
			"ADMIN" => Ok(Self::Admin),
			other => Err(UnknownRole(other.to_owned())),
		}
	}
}

/// Rows carrying a soft-delete marker.
#[cfg(test)]
pub trait SoftDelete {
	fn deleted_at(&self) -> Option<Timestamp>;

	fn is_live(&self) -> bool {
		self.deleted_at().is_none()
	}
}

macro_rules! soft_delete {
	($($ty:ty),+) => {
		$(
			#[cfg(test)]
			impl SoftDelete for $ty {
				fn deleted_at(&self) -> Option<Timestamp> {
					self.deleted_at
				}
			}
		)+
	};
}

soft_delete!(User, Post, Comment, PostLike, Notification);

/// A registered account.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
	pub id: i64,
	pub name: String,
	pub email: String,
	pub photo: Option<String>,
	/// Argon2 PHC string.
	pub password: String,
	pub active: bool,
	#[sqlx(skip)]
	pub roles: Vec<Role>,
	pub created_at: Timestamp,
	pub updated_at: Timestamp,
	pub deleted_at: Option<Timestamp>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
	pub name: String,
	pub email: String,
	pub photo: Option<String>,
	pub password: String,
	pub roles: Vec<Role>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Post {
	pub id: i64,
	pub title: String,
	pub slug: String,
	pub content: String,
	pub excerpt: String,
	pub cover_image: Option<String>,
	pub author_id: i64,
	pub created_at: Timestamp,
	pub updated_at: Timestamp,
	pub deleted_at: Option<Timestamp>,
}

#[derive(Debug, Clone)]
pub struct NewPost {
	pub title: String,
	pub slug: String,
	pub content: String,
	pub excerpt: String,
	pub cover_image: Option<String>,
	pub author_id: i64,
	pub tag_ids: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Tag {
	pub id: i64,
	pub name: String,
}

/// A comment on a post. Replies point at their parent and carry their depth.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Comment {
	pub id: i64,
	pub content: String,
	pub post_id: i64,
	pub user_id: i64,
	pub parent_id: Option<i64>,
	pub level: i32,
	pub created_at: Timestamp,
	pub updated_at: Timestamp,
	pub deleted_at: Option<Timestamp>,
}

impl Comment {
	pub fn is_root(&self) -> bool {
		self.parent_id.is_none()
	}
}

#[derive(Debug, Clone)]
pub struct NewComment {
	pub content: String,
	pub post_id: i64,
	pub user_id: i64,
	pub parent_id: Option<i64>,
	pub level: i32,
}

/// A like as stored, read directly only by tests.
#[cfg(test)]
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostLike {
	pub user_id: i64,
	pub post_id: i64,
	pub created_at: Timestamp,
	pub updated_at: Timestamp,
	pub deleted_at: Option<Timestamp>,
}

pub mod notification_kind {
	pub const LIKE: &str = "LIKE";
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Notification {
	pub id: i64,
	pub recipient_id: i64,
	pub sender_id: i64,
	pub post_id: Option<i64>,
	#[sqlx(rename = "type")]
	pub kind: String,
	pub message: String,
	#[sqlx(rename = "is_read")]
	pub read: bool,
	pub created_at: Timestamp,
	pub updated_at: Timestamp,
	pub deleted_at: Option<Timestamp>,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
	pub recipient_id: i64,
	pub sender_id: i64,
	pub post_id: Option<i64>,
	pub kind: &'static str,
	pub message: String,
}
