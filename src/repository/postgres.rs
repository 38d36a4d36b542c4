//! PostgreSQL implementation of every repository.
//!
//! Reads go through the `live_*` views so soft-deleted rows never leak out,
//! writes go to the underlying tables.

use std::collections::HashMap;

use async_trait::async_trait;

use super::{
	CommentRepository, NotificationRepository, Page, PageRequest, PostLikeRepository,
	PostRepository, Result, TagRepository, UserRepository,
};
use crate::{
	model::{
		Comment, NewComment, NewNotification, NewPost, NewUser, Notification, Post, Role, Tag,
		User,
	},
	Database,
};

#[derive(Clone)]
pub struct PgStore {
	pool: Database,
}

impl PgStore {
	pub fn new(pool: Database) -> Self {
		Self { pool }
	}

	/// Fills in the roles of each user with a single query.
	async fn with_roles(&self, mut users: Vec<User>) -> Result<Vec<User>> {
		if users.is_empty() {
			return Ok(users);
		}

		let ids = users.iter().map(|user| user.id).collect::<Vec<_>>();
		let rows = sqlx::query_as::<_, (i64, String)>(
			r#"
				SELECT ur.user_id, r.name FROM users_roles ur
				JOIN roles r ON r.id = ur.role_id
				WHERE ur.user_id = ANY($1)
			"#,
		)
		.bind(&ids)
		.fetch_all(&self.pool)
		.await?;

		let mut roles = HashMap::<i64, Vec<Role>>::new();

		for (user_id, name) in rows {
			match name.parse() {
				Ok(role) => roles.entry(user_id).or_default().push(role),
				Err(e) => tracing::warn!("skipping role of user {}: {}", user_id, e),
			}
		}

		for user in &mut users {
			let mut assigned = roles.remove(&user.id).unwrap_or_default();
			assigned.sort();
			user.roles = assigned;
		}

		Ok(users)
	}

	async fn with_roles_one(&self, user: Option<User>) -> Result<Option<User>> {
		let Some(user) = user else {
			return Ok(None);
		};

		Ok(self.with_roles(vec![user]).await?.pop())
	}
}

/// Escapes `LIKE` wildcards so user input only ever matches literally.
fn escape_like(input: &str) -> String {
	let mut escaped = String::with_capacity(input.len());

	for c in input.chars() {
		if matches!(c, '\\' | '%' | '_') {
			escaped.push('\\');
		}

		escaped.push(c);
	}

	escaped
}

#[async_trait]
impl UserRepository for PgStore {
	async fn find_all(&self, page: PageRequest) -> Result<Vec<User>> {
		let users = sqlx::query_as::<_, User>(
			r#"
				SELECT * FROM live_users
				ORDER BY id ASC
				LIMIT $1 OFFSET $2
			"#,
		)
		.bind(page.limit)
		.bind(page.offset)
		.fetch_all(&self.pool)
		.await?;

		self.with_roles(users).await
	}

	async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
		let user = sqlx::query_as::<_, User>("SELECT * FROM live_users WHERE id = $1")
			.bind(id)
			.fetch_optional(&self.pool)
			.await?;

		self.with_roles_one(user).await
	}

	async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<User>> {
		let users = sqlx::query_as::<_, User>(
			"SELECT * FROM live_users WHERE id = ANY($1) ORDER BY id ASC",
		)
		.bind(ids)
		.fetch_all(&self.pool)
		.await?;

		self.with_roles(users).await
	}

	async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
		let user = sqlx::query_as::<_, User>("SELECT * FROM live_users WHERE email = $1")
			.bind(email)
			.fetch_optional(&self.pool)
			.await?;

		self.with_roles_one(user).await
	}

	async fn exists_by_id(&self, id: i64) -> Result<bool> {
		let exists =
			sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM live_users WHERE id = $1)")
				.bind(id)
				.fetch_one(&self.pool)
				.await?;

		Ok(exists)
	}

	async fn exists_by_email(&self, email: &str) -> Result<bool> {
		let exists = sqlx::query_scalar::<_, bool>(
			"SELECT EXISTS (SELECT 1 FROM live_users WHERE email = $1)",
		)
		.bind(email)
		.fetch_one(&self.pool)
		.await?;

		Ok(exists)
	}

	async fn create(&self, user: NewUser) -> Result<User> {
		let mut tx = self.pool.begin().await?;

		let mut created = sqlx::query_as::<_, User>(
			r#"
				INSERT INTO users (name, email, photo, password)
				VALUES ($1, $2, $3, $4)
				RETURNING *
			"#,
		)
		.bind(&user.name)
		.bind(&user.email)
		.bind(&user.photo)
		.bind(&user.password)
		.fetch_one(&mut *tx)
		.await?;

		let roles = user
			.roles
			.iter()
			.map(|role| role.as_str().to_owned())
			.collect::<Vec<_>>();

		sqlx::query(
			r#"
				INSERT INTO users_roles (user_id, role_id)
				SELECT $1, id FROM roles WHERE name = ANY($2)
			"#,
		)
		.bind(created.id)
		.bind(&roles)
		.execute(&mut *tx)
		.await?;

		tx.commit().await?;

		let mut assigned = user.roles;
		assigned.sort();
		assigned.dedup();
		created.roles = assigned;

		Ok(created)
	}

	async fn update(&self, user: &User) -> Result<Option<User>> {
		let updated = sqlx::query_as::<_, User>(
			r#"
				UPDATE users
				SET name = $1, email = $2, photo = $3, active = $4, updated_at = now()
				WHERE id = $5 AND deleted_at IS NULL
				RETURNING *
			"#,
		)
		.bind(&user.name)
		.bind(&user.email)
		.bind(&user.photo)
		.bind(user.active)
		.bind(user.id)
		.fetch_optional(&self.pool)
		.await?;

		self.with_roles_one(updated).await
	}

	async fn soft_delete(&self, id: i64) -> Result<bool> {
		let status = sqlx::query(
			"UPDATE users SET deleted_at = now() WHERE id = $1 AND deleted_at IS NULL",
		)
		.bind(id)
		.execute(&self.pool)
		.await?;

		Ok(status.rows_affected() > 0)
	}
}

#[async_trait]
impl PostRepository for PgStore {
	async fn find_all(&self, page: PageRequest) -> Result<Vec<Post>> {
		let posts = sqlx::query_as::<_, Post>(
			r#"
				SELECT * FROM live_posts
				ORDER BY id ASC
				LIMIT $1 OFFSET $2
			"#,
		)
		.bind(page.limit)
		.bind(page.offset)
		.fetch_all(&self.pool)
		.await?;

		Ok(posts)
	}

	async fn find_by_id(&self, id: i64) -> Result<Option<Post>> {
		let post = sqlx::query_as::<_, Post>("SELECT * FROM live_posts WHERE id = $1")
			.bind(id)
			.fetch_optional(&self.pool)
			.await?;

		Ok(post)
	}

	async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>> {
		let post = sqlx::query_as::<_, Post>("SELECT * FROM live_posts WHERE slug = $1")
			.bind(slug)
			.fetch_optional(&self.pool)
			.await?;

		Ok(post)
	}

	async fn exists_by_id(&self, id: i64) -> Result<bool> {
		let exists =
			sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM live_posts WHERE id = $1)")
				.bind(id)
				.fetch_one(&self.pool)
				.await?;

		Ok(exists)
	}

	async fn search_by_title(&self, title: &str, page: PageRequest) -> Result<Page<Post>> {
		let pattern = format!("%{}%", escape_like(title));

		let items = sqlx::query_as::<_, Post>(
			r#"
				SELECT * FROM live_posts
				WHERE title ILIKE $1
				ORDER BY id ASC
				LIMIT $2 OFFSET $3
			"#,
		)
		.bind(&pattern)
		.bind(page.limit)
		.bind(page.offset)
		.fetch_all(&self.pool)
		.await?;

		let total =
			sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM live_posts WHERE title ILIKE $1")
				.bind(&pattern)
				.fetch_one(&self.pool)
				.await?;

		Ok(Page { items, total })
	}

	async fn create(&self, post: NewPost) -> Result<Post> {
		let mut tx = self.pool.begin().await?;

		let created = sqlx::query_as::<_, Post>(
			r#"
				INSERT INTO posts (title, slug, content, excerpt, cover_image, author_id)
				VALUES ($1, $2, $3, $4, $5, $6)
				RETURNING *
			"#,
		)
		.bind(&post.title)
		.bind(&post.slug)
		.bind(&post.content)
		.bind(&post.excerpt)
		.bind(&post.cover_image)
		.bind(post.author_id)
		.fetch_one(&mut *tx)
		.await?;

		if !post.tag_ids.is_empty() {
			sqlx::query(
				r#"
					INSERT INTO posts_tags (post_id, tag_id)
					SELECT $1, UNNEST($2::BIGINT[])
					ON CONFLICT DO NOTHING
				"#,
			)
			.bind(created.id)
			.bind(&post.tag_ids)
			.execute(&mut *tx)
			.await?;
		}

		tx.commit().await?;

		Ok(created)
	}

	async fn update(&self, post: &Post) -> Result<Option<Post>> {
		let updated = sqlx::query_as::<_, Post>(
			r#"
				UPDATE posts
				SET title = $1, slug = $2, content = $3, excerpt = $4,
					cover_image = $5, author_id = $6, updated_at = now()
				WHERE id = $7 AND deleted_at IS NULL
				RETURNING *
			"#,
		)
		.bind(&post.title)
		.bind(&post.slug)
		.bind(&post.content)
		.bind(&post.excerpt)
		.bind(&post.cover_image)
		.bind(post.author_id)
		.bind(post.id)
		.fetch_optional(&self.pool)
		.await?;

		Ok(updated)
	}

	async fn soft_delete(&self, id: i64) -> Result<bool> {
		let mut tx = self.pool.begin().await?;

		let status = sqlx::query(
			"UPDATE posts SET deleted_at = now() WHERE id = $1 AND deleted_at IS NULL",
		)
		.bind(id)
		.execute(&mut *tx)
		.await?;

		if status.rows_affected() == 0 {
			return Ok(false);
		}

		sqlx::query(
			"UPDATE comments SET deleted_at = now() WHERE post_id = $1 AND deleted_at IS NULL",
		)
		.bind(id)
		.execute(&mut *tx)
		.await?;

		tx.commit().await?;

		Ok(true)
	}
}

#[async_trait]
impl TagRepository for PgStore {
	async fn find_all(&self) -> Result<Vec<Tag>> {
		let tags = sqlx::query_as::<_, Tag>("SELECT * FROM tags ORDER BY name ASC")
			.fetch_all(&self.pool)
			.await?;

		Ok(tags)
	}

	async fn find_by_post(&self, post_id: i64) -> Result<Vec<Tag>> {
		let tags = sqlx::query_as::<_, Tag>(
			r#"
				SELECT t.* FROM tags t
				JOIN posts_tags pt ON pt.tag_id = t.id
				WHERE pt.post_id = $1
				ORDER BY t.name ASC
			"#,
		)
		.bind(post_id)
		.fetch_all(&self.pool)
		.await?;

		Ok(tags)
	}

	async fn find_or_create(&self, name: &str) -> Result<Tag> {
		// The no-op update makes RETURNING yield the existing row on conflict.
		let tag = sqlx::query_as::<_, Tag>(
			r#"
				INSERT INTO tags (name) VALUES ($1)
				ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
				RETURNING *
			"#,
		)
		.bind(name)
		.fetch_one(&self.pool)
		.await?;

		Ok(tag)
	}
}

#[async_trait]
impl CommentRepository for PgStore {
	async fn find_all(&self) -> Result<Vec<Comment>> {
		let comments = sqlx::query_as::<_, Comment>("SELECT * FROM live_comments ORDER BY id ASC")
			.fetch_all(&self.pool)
			.await?;

		Ok(comments)
	}

	async fn find_by_id(&self, id: i64) -> Result<Option<Comment>> {
		let comment = sqlx::query_as::<_, Comment>("SELECT * FROM live_comments WHERE id = $1")
			.bind(id)
			.fetch_optional(&self.pool)
			.await?;

		Ok(comment)
	}

	async fn find_by_post(&self, post_id: i64) -> Result<Vec<Comment>> {
		let comments = sqlx::query_as::<_, Comment>(
			"SELECT * FROM live_comments WHERE post_id = $1 ORDER BY id ASC",
		)
		.bind(post_id)
		.fetch_all(&self.pool)
		.await?;

		Ok(comments)
	}

	async fn find_roots_by_post(&self, post_id: i64) -> Result<Vec<Comment>> {
		let comments = sqlx::query_as::<_, Comment>(
			r#"
				SELECT * FROM live_comments
				WHERE post_id = $1 AND parent_id IS NULL
				ORDER BY id ASC
			"#,
		)
		.bind(post_id)
		.fetch_all(&self.pool)
		.await?;

		Ok(comments)
	}

	async fn create(&self, comment: NewComment) -> Result<Comment> {
		let created = sqlx::query_as::<_, Comment>(
			r#"
				INSERT INTO comments (content, post_id, user_id, parent_id, level)
				VALUES ($1, $2, $3, $4, $5)
				RETURNING *
			"#,
		)
		.bind(&comment.content)
		.bind(comment.post_id)
		.bind(comment.user_id)
		.bind(comment.parent_id)
		.bind(comment.level)
		.fetch_one(&self.pool)
		.await?;

		Ok(created)
	}

	async fn update(&self, comment: &Comment) -> Result<Option<Comment>> {
		let updated = sqlx::query_as::<_, Comment>(
			r#"
				UPDATE comments
				SET content = $1, post_id = $2, user_id = $3, updated_at = now()
				WHERE id = $4 AND deleted_at IS NULL
				RETURNING *
			"#,
		)
		.bind(&comment.content)
		.bind(comment.post_id)
		.bind(comment.user_id)
		.bind(comment.id)
		.fetch_optional(&self.pool)
		.await?;

		Ok(updated)
	}

	async fn soft_delete(&self, id: i64) -> Result<bool> {
		let status = sqlx::query(
			r#"
				WITH RECURSIVE subtree AS (
					SELECT id FROM live_comments WHERE id = $1
					UNION ALL
					SELECT c.id FROM live_comments c
					JOIN subtree s ON c.parent_id = s.id
				)
				UPDATE comments SET deleted_at = now()
				WHERE id IN (SELECT id FROM subtree)
			"#,
		)
		.bind(id)
		.execute(&self.pool)
		.await?;

		Ok(status.rows_affected() > 0)
	}
}

#[async_trait]
impl PostLikeRepository for PgStore {
	async fn create(
		&self,
		user_id: i64,
		post_id: i64,
		notification: Option<NewNotification>,
	) -> Result<bool> {
		let mut tx = self.pool.begin().await?;

		// A previously removed like is revived, a live one is left untouched.
		let status = sqlx::query(
			r#"
				INSERT INTO posts_likes (user_id, post_id) VALUES ($1, $2)
				ON CONFLICT (user_id, post_id) DO UPDATE
				SET deleted_at = NULL, created_at = now(), updated_at = now()
				WHERE posts_likes.deleted_at IS NOT NULL
			"#,
		)
		.bind(user_id)
		.bind(post_id)
		.execute(&mut *tx)
		.await?;

		if status.rows_affected() == 0 {
			return Ok(false);
		}

		if let Some(notification) = notification {
			sqlx::query(
				r#"
					INSERT INTO notifications (recipient_id, sender_id, post_id, type, message)
					VALUES ($1, $2, $3, $4, $5)
				"#,
			)
			.bind(notification.recipient_id)
			.bind(notification.sender_id)
			.bind(notification.post_id)
			.bind(notification.kind)
			.bind(&notification.message)
			.execute(&mut *tx)
			.await?;
		}

		tx.commit().await?;

		Ok(true)
	}

	async fn delete(&self, user_id: i64, post_id: i64) -> Result<bool> {
		let status = sqlx::query(
			r#"
				UPDATE posts_likes SET deleted_at = now(), updated_at = now()
				WHERE user_id = $1 AND post_id = $2 AND deleted_at IS NULL
			"#,
		)
		.bind(user_id)
		.bind(post_id)
		.execute(&self.pool)
		.await?;

		Ok(status.rows_affected() > 0)
	}

	async fn find_likers(&self, post_id: i64) -> Result<Vec<User>> {
		let users = sqlx::query_as::<_, User>(
			r#"
				SELECT u.* FROM live_users u
				JOIN live_posts_likes l ON l.user_id = u.id
				WHERE l.post_id = $1
				ORDER BY l.created_at ASC, u.id ASC
			"#,
		)
		.bind(post_id)
		.fetch_all(&self.pool)
		.await?;

		self.with_roles(users).await
	}
}

#[async_trait]
impl NotificationRepository for PgStore {
	async fn find_by_recipient(&self, recipient_id: i64) -> Result<Vec<Notification>> {
		let notifications = sqlx::query_as::<_, Notification>(
			"SELECT * FROM live_notifications WHERE recipient_id = $1 ORDER BY id ASC",
		)
		.bind(recipient_id)
		.fetch_all(&self.pool)
		.await?;

		Ok(notifications)
	}

	async fn find_by_id(&self, id: i64) -> Result<Option<Notification>> {
		let notification =
			sqlx::query_as::<_, Notification>("SELECT * FROM live_notifications WHERE id = $1")
				.bind(id)
				.fetch_optional(&self.pool)
				.await?;

		Ok(notification)
	}

	async fn mark_read(&self, id: i64) -> Result<bool> {
		let status = sqlx::query(
			r#"
				UPDATE notifications SET is_read = TRUE, updated_at = now()
				WHERE id = $1 AND deleted_at IS NULL
			"#,
		)
		.bind(id)
		.execute(&self.pool)
		.await?;

		Ok(status.rows_affected() > 0)
	}

	async fn mark_all_read(&self, recipient_id: i64) -> Result<u64> {
		let status = sqlx::query(
			r#"
				UPDATE notifications SET is_read = TRUE, updated_at = now()
				WHERE recipient_id = $1 AND is_read = FALSE AND deleted_at IS NULL
			"#,
		)
		.bind(recipient_id)
		.execute(&self.pool)
		.await?;

		Ok(status.rows_affected())
	}
}
