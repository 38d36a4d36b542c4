//! Typed persistence ports, one per entity.
//!
//! Soft-deleted rows are invisible through every method here: lookups, lists
//! and existence checks only ever see live rows.

#[cfg(test)]
pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;

use crate::model::{
	Comment, NewComment, NewNotification, NewPost, NewUser, Notification, Post, Tag, User,
};

pub use postgres::PgStore;

/// An error raised by a repository.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// A uniqueness constraint was violated, holding the constraint name.
	#[error("unique constraint {0} violated")]
	Conflict(String),
	#[error("database error: {0}")]
	Database(sqlx::Error),
}

impl From<sqlx::Error> for Error {
	fn from(error: sqlx::Error) -> Self {
		match error {
			sqlx::Error::Database(ref e) if e.is_unique_violation() => {
				Self::Conflict(e.constraint().unwrap_or_default().to_owned())
			}
			e => Self::Database(e),
		}
	}
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Names of the uniqueness constraints surfaced through [`Error::Conflict`].
pub mod constraint {
	pub const USER_EMAIL: &str = "users_email_key";
	pub const POST_SLUG: &str = "posts_slug_key";
	pub const TAG_NAME: &str = "tags_name_key";
}

/// A window into an ordered collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
	pub offset: i64,
	pub limit: i64,
}

/// One page of results along with the number of matching rows.
#[derive(Debug, Clone)]
pub struct Page<T> {
	pub items: Vec<T>,
	pub total: i64,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
	/// Lists users ordered by id.
	async fn find_all(&self, page: PageRequest) -> Result<Vec<User>>;

	async fn find_by_id(&self, id: i64) -> Result<Option<User>>;

	async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<User>>;

	async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

	async fn exists_by_id(&self, id: i64) -> Result<bool>;

	async fn exists_by_email(&self, email: &str) -> Result<bool>;

	/// Inserts a user along with its role assignments.
	async fn create(&self, user: NewUser) -> Result<User>;

	/// Writes back the mutable profile fields (name, email, photo, active).
	async fn update(&self, user: &User) -> Result<Option<User>>;

	async fn soft_delete(&self, id: i64) -> Result<bool>;
}

#[async_trait]
pub trait PostRepository: Send + Sync {
	/// Lists posts ordered by id.
	async fn find_all(&self, page: PageRequest) -> Result<Vec<Post>>;

	async fn find_by_id(&self, id: i64) -> Result<Option<Post>>;

	async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>>;

	async fn exists_by_id(&self, id: i64) -> Result<bool>;

	/// Case-insensitive substring match on the title, ordered by id.
	async fn search_by_title(&self, title: &str, page: PageRequest) -> Result<Page<Post>>;

	/// Inserts a post and links its tags.
	async fn create(&self, post: NewPost) -> Result<Post>;

	/// Writes back title, slug, content, excerpt, cover image and author.
	async fn update(&self, post: &Post) -> Result<Option<Post>>;

	/// Soft deletes the post together with all of its comments.
	async fn soft_delete(&self, id: i64) -> Result<bool>;
}

#[async_trait]
pub trait TagRepository: Send + Sync {
	async fn find_all(&self) -> Result<Vec<Tag>>;

	async fn find_by_post(&self, post_id: i64) -> Result<Vec<Tag>>;

	/// Returns the tag with this exact name, creating it when missing.
	async fn find_or_create(&self, name: &str) -> Result<Tag>;
}

#[async_trait]
pub trait CommentRepository: Send + Sync {
	async fn find_all(&self) -> Result<Vec<Comment>>;

	async fn find_by_id(&self, id: i64) -> Result<Option<Comment>>;

	async fn find_by_post(&self, post_id: i64) -> Result<Vec<Comment>>;

	/// Comments of the post without a parent.
	async fn find_roots_by_post(&self, post_id: i64) -> Result<Vec<Comment>>;

	async fn create(&self, comment: NewComment) -> Result<Comment>;

	/// Writes back content, post and user.
	async fn update(&self, comment: &Comment) -> Result<Option<Comment>>;

	/// Soft deletes the comment and every reply below it.
	async fn soft_delete(&self, id: i64) -> Result<bool>;
}

#[async_trait]
pub trait PostLikeRepository: Send + Sync {
	/// Records a like and, in the same transaction, the optional notification.
	///
	/// Returns `false` without writing anything when the like already exists.
	async fn create(
		&self,
		user_id: i64,
		post_id: i64,
		notification: Option<NewNotification>,
	) -> Result<bool>;

	async fn delete(&self, user_id: i64, post_id: i64) -> Result<bool>;

	/// Users currently liking the post, in the order they liked it.
	async fn find_likers(&self, post_id: i64) -> Result<Vec<User>>;
}

#[async_trait]
pub trait NotificationRepository: Send + Sync {
	async fn find_by_recipient(&self, recipient_id: i64) -> Result<Vec<Notification>>;

	async fn find_by_id(&self, id: i64) -> Result<Option<Notification>>;

	async fn mark_read(&self, id: i64) -> Result<bool>;

	/// Returns the number of notifications changed.
	async fn mark_all_read(&self, recipient_id: i64) -> Result<u64>;
}

/// Every repository the application uses, usually backed by the same store.
#[derive(Clone)]
pub struct Repositories {
	pub users: Arc<dyn UserRepository>,
	pub posts: Arc<dyn PostRepository>,
	pub tags: Arc<dyn TagRepository>,
	pub comments: Arc<dyn CommentRepository>,
	pub likes: Arc<dyn PostLikeRepository>,
	pub notifications: Arc<dyn NotificationRepository>,
}

impl Repositories {
	pub fn new<S>(store: Arc<S>) -> Self
	where
		S: UserRepository
			+ PostRepository
			+ TagRepository
			+ CommentRepository
			+ PostLikeRepository
			+ NotificationRepository
			+ 'static,
	{
		Self {
			users: store.clone(),
			posts: store.clone(),
			tags: store.clone(),
			comments: store.clone(),
			likes: store.clone(),
			notifications: store,
		}
	}
}
