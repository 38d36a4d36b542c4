use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
	credential::Principal,
	model::{NewPost, Post},
	repository::{CommentRepository, PostRepository, TagRepository, UserRepository},
	response::{self, Page, PostResponse, Users},
	route::model::{blob_name, Paginate, Upload},
	storage::{self, BlobStore},
	AppState,
};

use super::{
	model::{clean_tag, excerpt_or_derive, is_slug, slugify, CreatePostInput, PostPatch, SearchInput},
	Error, RouteError,
};

const COVER_FOLDER: &str = "posts";

#[derive(Clone)]
pub struct PostService {
	posts: Arc<dyn PostRepository>,
	users: Arc<dyn UserRepository>,
	tags: Arc<dyn TagRepository>,
	comments: Arc<dyn CommentRepository>,
	storage: Arc<dyn BlobStore>,
}

impl FromRef<AppState> for PostService {
	fn from_ref(state: &AppState) -> Self {
		Self {
			posts: state.repositories.posts.clone(),
			users: state.repositories.users.clone(),
			tags: state.repositories.tags.clone(),
			comments: state.repositories.comments.clone(),
			storage: state.storage.clone(),
		}
	}
}

impl PostService {
	async fn authors(&self, posts: &[Post]) -> Result<Users, RouteError> {
		let mut ids = posts.iter().map(|post| post.author_id).collect::<Vec<_>>();
		ids.sort_unstable();
		ids.dedup();

		Ok(response::users(&self.users.find_by_ids(&ids).await?))
	}

	/// Maps posts with their authors and tags, leaving comments out.
	async fn summarize(&self, posts: Vec<Post>) -> Result<Vec<PostResponse>, RouteError> {
		let authors = self.authors(&posts).await?;
		let mut mapped = Vec::with_capacity(posts.len());

		for post in posts {
			let tags = self.tags.find_by_post(post.id).await?;

			mapped.push(response::post(post, &authors, Some(tags), None));
		}

		Ok(mapped)
	}

	/// Maps a post with its author, tags and comment thread.
	async fn detail(&self, post: Post) -> Result<PostResponse, RouteError> {
		let tags = self.tags.find_by_post(post.id).await?;
		let comments = self.comments.find_by_post(post.id).await?;

		let mut ids = comments.iter().map(|c| c.user_id).collect::<Vec<_>>();
		ids.push(post.author_id);
		ids.sort_unstable();
		ids.dedup();

		let users = response::users(&self.users.find_by_ids(&ids).await?);
		let thread = response::thread(&comments, &users);

		Ok(response::post(post, &users, Some(tags), Some(thread)))
	}

	async fn find(&self, id: i64) -> Result<Post, RouteError> {
		Ok(self
			.posts
			.find_by_id(id)
			.await?
			.ok_or(Error::UnknownPost(id))?)
	}

	/// Finds a post the caller is allowed to change.
	async fn find_owned(&self, principal: &Principal, id: i64) -> Result<Post, RouteError> {
		let post = self.find(id).await?;

		if !principal.can_act_for(post.author_id) {
			return Err(Error::Forbidden.into());
		}

		Ok(post)
	}

	async fn ensure_slug_free(&self, slug: &str, own_id: Option<i64>) -> Result<(), RouteError> {
		match self.posts.find_by_slug(slug).await? {
			Some(other) if Some(other.id) != own_id => Err(Error::SlugTaken(slug.to_owned()).into()),
			_ => Ok(()),
		}
	}

	pub async fn list(&self, paginate: Paginate) -> Result<Vec<PostResponse>, RouteError> {
		let posts = self.posts.find_all(paginate.into()).await?;

		self.summarize(posts).await
	}

	pub async fn get(&self, id: i64) -> Result<PostResponse, RouteError> {
		let post = self.find(id).await?;

		self.detail(post).await
	}

	pub async fn create(
		&self,
		principal: &Principal,
		input: CreatePostInput,
	) -> Result<PostResponse, RouteError> {
		if !self.users.exists_by_id(principal.id).await? {
			return Err(Error::UnknownAuthor(principal.id).into());
		}

		let slug = slugify(&input.title);
		self.ensure_slug_free(&slug, None).await?;

		let mut tag_ids = Vec::new();

		for name in input.tags.iter().filter_map(|name| clean_tag(name)) {
			let tag = self.tags.find_or_create(&name).await?;

			if !tag_ids.contains(&tag.id) {
				tag_ids.push(tag.id);
			}
		}

		let post = self
			.posts
			.create(NewPost {
				excerpt: excerpt_or_derive(input.excerpt, &input.content),
				title: input.title,
				slug,
				content: input.content,
				cover_image: input.cover_image,
				author_id: principal.id,
				tag_ids,
			})
			.await?;

		tracing::info!("user {} created post {} ({})", principal.id, post.id, post.slug);

		self.detail(post).await
	}

	/// Applies the fields present in `patch`. A new title recomputes the slug
	/// unless the patch also carries one.
	pub async fn update(
		&self,
		principal: &Principal,
		id: i64,
		patch: PostPatch,
	) -> Result<PostResponse, RouteError> {
		let mut post = self.find_owned(principal, id).await?;

		if let Some(author_id) = patch.author_id.filter(|author| *author != post.author_id) {
			if !principal.is_admin() {
				return Err(Error::Forbidden.into());
			}

			if !self.users.exists_by_id(author_id).await? {
				return Err(Error::UnknownAuthor(author_id).into());
			}

			post.author_id = author_id;
		}

		if let Some(title) = patch.title {
			if patch.slug.is_none() {
				post.slug = slugify(&title);
			}

			post.title = title;
		}

		if let Some(slug) = patch.slug {
			if !is_slug(&slug) {
				return Err(Error::InvalidSlug(slug).into());
			}

			post.slug = slug;
		}

		if let Some(content) = patch.content {
			post.content = content;
		}

		if let Some(excerpt) = patch.excerpt {
			post.excerpt = excerpt_or_derive(Some(excerpt), &post.content);
		}

		let replaced = match patch.cover_image {
			Some(cover) if post.cover_image.as_deref() != Some(cover.as_str()) => {
				post.cover_image.replace(cover)
			}
			_ => None,
		};

		self.ensure_slug_free(&post.slug, Some(post.id)).await?;

		let post = self
			.posts
			.update(&post)
			.await?
			.ok_or(Error::UnknownPost(id))?;

		if let Some(previous) = replaced {
			storage::discard(self.storage.as_ref(), &previous).await;
		}

		tracing::info!("updated post {}", post.id);

		self.detail(post).await
	}

	/// Soft deletes the post along with its comments.
	pub async fn delete(&self, principal: &Principal, id: i64) -> Result<(), RouteError> {
		self.find_owned(principal, id).await?;

		if !self.posts.soft_delete(id).await? {
			return Err(Error::UnknownPost(id).into());
		}

		tracing::info!("deleted post {}", id);

		Ok(())
	}

	pub async fn upload_cover_image(
		&self,
		principal: &Principal,
		id: i64,
		upload: Upload,
	) -> Result<PostResponse, RouteError> {
		let mut post = self.find_owned(principal, id).await?;

		let name = blob_name("post", post.id, &upload).ok_or(Error::UnsupportedImage)?;
		let url = self.storage.store(COVER_FOLDER, &name, &upload.bytes).await?;
		let previous = post.cover_image.replace(url.clone());

		let updated = self
			.posts
			.update(&post)
			.await
			.map_err(RouteError::from)
			.and_then(|post| post.ok_or_else(|| Error::UnknownPost(id).into()));

		let post = match updated {
			Ok(post) => post,
			Err(e) => {
				storage::discard(self.storage.as_ref(), &url).await;
				return Err(e);
			}
		};

		if let Some(previous) = previous {
			storage::discard(self.storage.as_ref(), &previous).await;
		}

		self.detail(post).await
	}

	pub async fn search(&self, input: SearchInput) -> Result<Page<PostResponse>, RouteError> {
		let paginate = input.paginate();
		let page = self
			.posts
			.search_by_title(input.title.trim(), paginate.into())
			.await?;

		let content = self.summarize(page.items).await?;

		Ok(Page::new(content, paginate.page, paginate.size, page.total))
	}
}
