//! In-memory store backing the service and router tests.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use super::{
	constraint, CommentRepository, Error, NotificationRepository, Page, PageRequest,
	PostLikeRepository, PostRepository, Result, TagRepository, UserRepository,
};
use crate::model::{
	Comment, NewComment, NewNotification, NewPost, NewUser, Notification, Post, PostLike,
	SoftDelete, Tag, User,
};

#[derive(Default)]
struct Tables {
	users: Vec<User>,
	posts: Vec<Post>,
	posts_tags: Vec<(i64, i64)>,
	tags: Vec<Tag>,
	comments: Vec<Comment>,
	likes: Vec<PostLike>,
	notifications: Vec<Notification>,
	sequence: i64,
}

impl Tables {
	fn next_id(&mut self) -> i64 {
		self.sequence += 1;
		self.sequence
	}
}

#[derive(Default)]
pub struct MemoryStore {
	tables: Mutex<Tables>,
}

fn window<T: Clone>(items: impl Iterator<Item = T>, page: PageRequest) -> Vec<T> {
	items
		.skip(page.offset.max(0) as usize)
		.take(page.limit.max(0) as usize)
		.collect()
}

impl MemoryStore {
	fn lock(&self) -> MutexGuard<'_, Tables> {
		self.tables.lock().unwrap_or_else(|e| e.into_inner())
	}

	/// Returns the user row regardless of its soft-delete state.
	pub fn raw_user(&self, id: i64) -> Option<User> {
		self.lock().users.iter().find(|u| u.id == id).cloned()
	}

	pub fn raw_post(&self, id: i64) -> Option<Post> {
		self.lock().posts.iter().find(|p| p.id == id).cloned()
	}

	pub fn raw_comment(&self, id: i64) -> Option<Comment> {
		self.lock().comments.iter().find(|c| c.id == id).cloned()
	}

	pub fn raw_like(&self, user_id: i64, post_id: i64) -> Option<PostLike> {
		self.lock()
			.likes
			.iter()
			.find(|l| l.user_id == user_id && l.post_id == post_id)
			.cloned()
	}

	pub fn notification_count(&self) -> usize {
		self.lock().notifications.len()
	}
}

#[async_trait]
impl UserRepository for MemoryStore {
	async fn find_all(&self, page: PageRequest) -> Result<Vec<User>> {
		let tables = self.lock();

		Ok(window(
			tables.users.iter().filter(|u| u.is_live()).cloned(),
			page,
		))
	}

	async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
		let tables = self.lock();

		Ok(tables
			.users
			.iter()
			.find(|u| u.id == id && u.is_live())
			.cloned())
	}

	async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<User>> {
		let tables = self.lock();

		Ok(tables
			.users
			.iter()
			.filter(|u| ids.contains(&u.id) && u.is_live())
			.cloned()
			.collect())
	}

	async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
		let tables = self.lock();

		Ok(tables
			.users
			.iter()
			.find(|u| u.email == email && u.is_live())
			.cloned())
	}

	async fn exists_by_id(&self, id: i64) -> Result<bool> {
		Ok(UserRepository::find_by_id(self, id).await?.is_some())
	}

	async fn exists_by_email(&self, email: &str) -> Result<bool> {
		Ok(self.find_by_email(email).await?.is_some())
	}

	async fn create(&self, user: NewUser) -> Result<User> {
		let mut tables = self.lock();

		if tables.users.iter().any(|u| u.email == user.email && u.is_live()) {
			return Err(Error::Conflict(constraint::USER_EMAIL.into()));
		}

		let now = Utc::now();
		let mut roles = user.roles;
		roles.sort();
		roles.dedup();

		let created = User {
			id: tables.next_id(),
			name: user.name,
			email: user.email,
			photo: user.photo,
			password: user.password,
			active: true,
			roles,
			created_at: now,
			updated_at: now,
			deleted_at: None,
		};

		tables.users.push(created.clone());

		Ok(created)
	}

	async fn update(&self, user: &User) -> Result<Option<User>> {
		let mut tables = self.lock();

		if tables
			.users
			.iter()
			.any(|u| u.id != user.id && u.email == user.email && u.is_live())
		{
			return Err(Error::Conflict(constraint::USER_EMAIL.into()));
		}

		let Some(row) = tables
			.users
			.iter_mut()
			.find(|u| u.id == user.id && u.is_live())
		else {
			return Ok(None);
		};

		row.name.clone_from(&user.name);
		row.email.clone_from(&user.email);
		row.photo.clone_from(&user.photo);
		row.active = user.active;
		row.updated_at = Utc::now();

		Ok(Some(row.clone()))
	}

	async fn soft_delete(&self, id: i64) -> Result<bool> {
		let mut tables = self.lock();

		Ok(match tables.users.iter_mut().find(|u| u.id == id && u.is_live()) {
			Some(row) => {
				row.deleted_at = Some(Utc::now());
				true
			}
			None => false,
		})
	}
}

#[async_trait]
impl PostRepository for MemoryStore {
	async fn find_all(&self, page: PageRequest) -> Result<Vec<Post>> {
		let tables = self.lock();

		Ok(window(
			tables.posts.iter().filter(|p| p.is_live()).cloned(),
			page,
		))
	}

	async fn find_by_id(&self, id: i64) -> Result<Option<Post>> {
		let tables = self.lock();

		Ok(tables
			.posts
			.iter()
			.find(|p| p.id == id && p.is_live())
			.cloned())
	}

	async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>> {
		let tables = self.lock();

		Ok(tables
			.posts
			.iter()
			.find(|p| p.slug == slug && p.is_live())
			.cloned())
	}

	async fn exists_by_id(&self, id: i64) -> Result<bool> {
		Ok(PostRepository::find_by_id(self, id).await?.is_some())
	}

	async fn search_by_title(&self, title: &str, page: PageRequest) -> Result<Page<Post>> {
		let tables = self.lock();
		let needle = title.to_lowercase();
		let matching = tables
			.posts
			.iter()
			.filter(|p| p.is_live() && p.title.to_lowercase().contains(&needle))
			.cloned()
			.collect::<Vec<_>>();

		Ok(Page {
			total: matching.len() as i64,
			items: window(matching.into_iter(), page),
		})
	}

	async fn create(&self, post: NewPost) -> Result<Post> {
		let mut tables = self.lock();

		if tables.posts.iter().any(|p| p.slug == post.slug && p.is_live()) {
			return Err(Error::Conflict(constraint::POST_SLUG.into()));
		}

		let now = Utc::now();
		let created = Post {
			id: tables.next_id(),
			title: post.title,
			slug: post.slug,
			content: post.content,
			excerpt: post.excerpt,
			cover_image: post.cover_image,
			author_id: post.author_id,
			created_at: now,
			updated_at: now,
			deleted_at: None,
		};

		for tag_id in post.tag_ids {
			if !tables.posts_tags.contains(&(created.id, tag_id)) {
				tables.posts_tags.push((created.id, tag_id));
			}
		}

		tables.posts.push(created.clone());

		Ok(created)
	}

	async fn update(&self, post: &Post) -> Result<Option<Post>> {
		let mut tables = self.lock();

		if tables
			.posts
			.iter()
			.any(|p| p.id != post.id && p.slug == post.slug && p.is_live())
		{
			return Err(Error::Conflict(constraint::POST_SLUG.into()));
		}

		let Some(row) = tables
			.posts
			.iter_mut()
			.find(|p| p.id == post.id && p.is_live())
		else {
			return Ok(None);
		};

		row.title.clone_from(&post.title);
		row.slug.clone_from(&post.slug);
		row.content.clone_from(&post.content);
		row.excerpt.clone_from(&post.excerpt);
		row.cover_image.clone_from(&post.cover_image);
		row.author_id = post.author_id;
		row.updated_at = Utc::now();

		Ok(Some(row.clone()))
	}

	async fn soft_delete(&self, id: i64) -> Result<bool> {
		let mut guard = self.lock();
		let tables = &mut *guard;
		let now = Utc::now();

		let Some(row) = tables.posts.iter_mut().find(|p| p.id == id && p.is_live()) else {
			return Ok(false);
		};

		row.deleted_at = Some(now);

		for comment in tables
			.comments
			.iter_mut()
			.filter(|c| c.post_id == id && c.is_live())
		{
			comment.deleted_at = Some(now);
		}

		Ok(true)
	}
}

#[async_trait]
impl TagRepository for MemoryStore {
	async fn find_all(&self) -> Result<Vec<Tag>> {
		let mut tags = self.lock().tags.clone();
		tags.sort_by(|a, b| a.name.cmp(&b.name));

		Ok(tags)
	}

	async fn find_by_post(&self, post_id: i64) -> Result<Vec<Tag>> {
		let tables = self.lock();
		let mut tags = tables
			.tags
			.iter()
			.filter(|t| tables.posts_tags.contains(&(post_id, t.id)))
			.cloned()
			.collect::<Vec<_>>();

		tags.sort_by(|a, b| a.name.cmp(&b.name));

		Ok(tags)
	}

	async fn find_or_create(&self, name: &str) -> Result<Tag> {
		let mut tables = self.lock();

		if let Some(tag) = tables.tags.iter().find(|t| t.name == name) {
			return Ok(tag.clone());
		}

		let tag = Tag {
			id: tables.next_id(),
			name: name.to_owned(),
		};

		tables.tags.push(tag.clone());

		Ok(tag)
	}
}

#[async_trait]
impl CommentRepository for MemoryStore {
	async fn find_all(&self) -> Result<Vec<Comment>> {
		let tables = self.lock();

		Ok(tables.comments.iter().filter(|c| c.is_live()).cloned().collect())
	}

	async fn find_by_id(&self, id: i64) -> Result<Option<Comment>> {
		let tables = self.lock();

		Ok(tables
			.comments
			.iter()
			.find(|c| c.id == id && c.is_live())
			.cloned())
	}

	async fn find_by_post(&self, post_id: i64) -> Result<Vec<Comment>> {
		let tables = self.lock();

		Ok(tables
			.comments
			.iter()
			.filter(|c| c.post_id == post_id && c.is_live())
			.cloned()
			.collect())
	}

	async fn find_roots_by_post(&self, post_id: i64) -> Result<Vec<Comment>> {
		let tables = self.lock();

		Ok(tables
			.comments
			.iter()
			.filter(|c| c.post_id == post_id && c.is_root() && c.is_live())
			.cloned()
			.collect())
	}

	async fn create(&self, comment: NewComment) -> Result<Comment> {
		let mut tables = self.lock();
		let now = Utc::now();

		let created = Comment {
			id: tables.next_id(),
			content: comment.content,
			post_id: comment.post_id,
			user_id: comment.user_id,
			parent_id: comment.parent_id,
			level: comment.level,
			created_at: now,
			updated_at: now,
			deleted_at: None,
		};

		tables.comments.push(created.clone());

		Ok(created)
	}

	async fn update(&self, comment: &Comment) -> Result<Option<Comment>> {
		let mut tables = self.lock();

		let Some(row) = tables
			.comments
			.iter_mut()
			.find(|c| c.id == comment.id && c.is_live())
		else {
			return Ok(None);
		};

		row.content.clone_from(&comment.content);
		row.post_id = comment.post_id;
		row.user_id = comment.user_id;
		row.updated_at = Utc::now();

		Ok(Some(row.clone()))
	}

	async fn soft_delete(&self, id: i64) -> Result<bool> {
		let mut tables = self.lock();

		if !tables.comments.iter().any(|c| c.id == id && c.is_live()) {
			return Ok(false);
		}

		let now = Utc::now();
		let mut frontier = vec![id];

		while let Some(current) = frontier.pop() {
			for comment in tables.comments.iter_mut().filter(|c| c.is_live()) {
				if comment.id == current || comment.parent_id == Some(current) {
					comment.deleted_at = Some(now);

					if comment.id != current {
						frontier.push(comment.id);
					}
				}
			}
		}

		Ok(true)
	}
}

#[async_trait]
impl PostLikeRepository for MemoryStore {
	async fn create(
		&self,
		user_id: i64,
		post_id: i64,
		notification: Option<NewNotification>,
	) -> Result<bool> {
		let mut tables = self.lock();
		let now = Utc::now();

		let existing = tables
			.likes
			.iter()
			.position(|l| l.user_id == user_id && l.post_id == post_id);

		match existing {
			Some(index) if tables.likes[index].is_live() => return Ok(false),
			Some(index) => {
				let like = &mut tables.likes[index];
				like.deleted_at = None;
				like.created_at = now;
				like.updated_at = now;
			}
			None => tables.likes.push(PostLike {
				user_id,
				post_id,
				created_at: now,
				updated_at: now,
				deleted_at: None,
			}),
		}

		if let Some(notification) = notification {
			let id = tables.next_id();

			tables.notifications.push(Notification {
				id,
				recipient_id: notification.recipient_id,
				sender_id: notification.sender_id,
				post_id: notification.post_id,
				kind: notification.kind.to_owned(),
				message: notification.message,
				read: false,
				created_at: now,
				updated_at: now,
				deleted_at: None,
			});
		}

		Ok(true)
	}

	async fn delete(&self, user_id: i64, post_id: i64) -> Result<bool> {
		let mut tables = self.lock();

		Ok(
			match tables
				.likes
				.iter_mut()
				.find(|l| l.user_id == user_id && l.post_id == post_id && l.is_live())
			{
				Some(like) => {
					like.deleted_at = Some(Utc::now());
					true
				}
				None => false,
			},
		)
	}

	async fn find_likers(&self, post_id: i64) -> Result<Vec<User>> {
		let tables = self.lock();
		let mut likes = tables
			.likes
			.iter()
			.filter(|l| l.post_id == post_id && l.is_live())
			.collect::<Vec<_>>();

		likes.sort_by_key(|l| l.created_at);

		Ok(likes
			.into_iter()
			.filter_map(|l| {
				tables
					.users
					.iter()
					.find(|u| u.id == l.user_id && u.is_live())
					.cloned()
			})
			.collect())
	}
}

#[async_trait]
impl NotificationRepository for MemoryStore {
	async fn find_by_recipient(&self, recipient_id: i64) -> Result<Vec<Notification>> {
		let tables = self.lock();

		Ok(tables
			.notifications
			.iter()
			.filter(|n| n.recipient_id == recipient_id && n.is_live())
			.cloned()
			.collect())
	}

	async fn find_by_id(&self, id: i64) -> Result<Option<Notification>> {
		let tables = self.lock();

		Ok(tables
			.notifications
			.iter()
			.find(|n| n.id == id && n.is_live())
			.cloned())
	}

	async fn mark_read(&self, id: i64) -> Result<bool> {
		let mut tables = self.lock();

		Ok(
			match tables
				.notifications
				.iter_mut()
				.find(|n| n.id == id && n.is_live())
			{
				Some(notification) => {
					notification.read = true;
					true
				}
				None => false,
			},
		)
	}

	async fn mark_all_read(&self, recipient_id: i64) -> Result<u64> {
		let mut tables = self.lock();
		let mut changed = 0;

		for notification in tables
			.notifications
			.iter_mut()
			.filter(|n| n.recipient_id == recipient_id && !n.read && n.is_live())
		{
			notification.read = true;
			changed += 1;
		}

		Ok(changed)
	}
}
