use std::{
	path::{Path, PathBuf},
	sync::Arc,
};

use axum::extract::FromRef;

use crate::{
	credential::{Credentials, Principal},
	model::{NewPost, NewUser, Role, User},
	repository::{PostRepository, TagRepository, UserRepository},
	route::post::model::{clean_tag, slugify},
	AppState,
};

use super::{
	model::{
		author_email, author_name, clean_content, import_excerpt, ImportResult, ImportStatus,
		ScrapedPost, DEFAULT_IMPORT_FILE,
	},
	Error, RouteError,
};

/// What happened to a single scraped record.
#[derive(Debug, PartialEq, Eq)]
enum Outcome {
	Imported,
	Skipped,
}

#[derive(Clone)]
pub struct ImportService {
	users: Arc<dyn UserRepository>,
	posts: Arc<dyn PostRepository>,
	tags: Arc<dyn TagRepository>,
	credentials: Credentials,
	import_dir: PathBuf,
}

impl FromRef<AppState> for ImportService {
	fn from_ref(state: &AppState) -> Self {
		Self {
			users: state.repositories.users.clone(),
			posts: state.repositories.posts.clone(),
			tags: state.repositories.tags.clone(),
			credentials: state.credentials.clone(),
			import_dir: state.config.import_dir.clone(),
		}
	}
}

impl ImportService {
	fn authorize(principal: &Principal) -> Result<(), RouteError> {
		if principal.is_admin() {
			Ok(())
		} else {
			Err(Error::Forbidden.into())
		}
	}

	/// Resolves `file_path` against the import directory, refusing anything
	/// that ends up outside of it.
	async fn resolve(&self, file_path: &str) -> Result<PathBuf, RouteError> {
		let root = tokio::fs::canonicalize(&self.import_dir)
			.await
			.map_err(|e| Error::Unreadable(self.import_dir.display().to_string(), e))?;

		let path = tokio::fs::canonicalize(root.join(Path::new(file_path)))
			.await
			.map_err(|e| Error::Unreadable(file_path.to_owned(), e))?;

		if !path.starts_with(&root) {
			return Err(Error::OutsideImportDir(file_path.to_owned()).into());
		}

		Ok(path)
	}

	pub fn status(&self, principal: &Principal) -> Result<ImportStatus, RouteError> {
		Self::authorize(principal)?;

		Ok(ImportStatus {
			message: "Import endpoint is ready".into(),
			import_dir: self.import_dir.display().to_string(),
			default_file: DEFAULT_IMPORT_FILE.into(),
		})
	}

	/// Imports every post in a JSON file of scraped posts. A failing record is
	/// counted and logged, and never stops the rest of the batch.
	pub async fn import_posts(
		&self,
		principal: &Principal,
		file_path: &str,
	) -> Result<ImportResult, RouteError> {
		Self::authorize(principal)?;

		let path = self.resolve(file_path).await?;
		let bytes = tokio::fs::read(&path)
			.await
			.map_err(|e| Error::Unreadable(file_path.to_owned(), e))?;
		let records =
			serde_json::from_slice::<Vec<ScrapedPost>>(&bytes).map_err(Error::Malformed)?;

		tracing::info!("importing {} scraped posts from {}", records.len(), path.display());

		let mut result = ImportResult::default();

		for record in &records {
			match self.import_one(record).await {
				Ok(Outcome::Imported) => result.success += 1,
				Ok(Outcome::Skipped) => result.skipped += 1,
				Err(e) => {
					tracing::warn!(
						"failed to import post {:?}: {}",
						record.title.as_deref().unwrap_or_default(),
						e
					);
					result.errors += 1;
				}
			}
		}

		tracing::info!(
			"import finished: {} imported, {} skipped, {} failed",
			result.success,
			result.skipped,
			result.errors
		);

		Ok(result)
	}

	async fn import_one(&self, record: &ScrapedPost) -> Result<Outcome, RouteError> {
		let title = record
			.title
			.as_deref()
			.map(str::trim)
			.filter(|title| !title.is_empty())
			.ok_or(Error::MissingTitle)?;

		let base = slugify(title);
		let slug = match self.posts.find_by_slug(&base).await? {
			Some(existing) if existing.title == title => return Ok(Outcome::Skipped),
			Some(..) => self.free_slug(&base).await?,
			None => base,
		};

		let author = self.author(record).await?;

		let mut tag_ids = Vec::new();

		for name in record.tags.iter().filter_map(|name| clean_tag(name)) {
			let tag = self.tags.find_or_create(&name).await?;

			if !tag_ids.contains(&tag.id) {
				tag_ids.push(tag.id);
			}
		}

		let raw = record.content.as_deref().unwrap_or_default();
		let post = self
			.posts
			.create(NewPost {
				title: title.to_owned(),
				slug,
				content: clean_content(raw),
				excerpt: import_excerpt(record.excerpt.as_deref(), raw),
				cover_image: record.cover_image.clone(),
				author_id: author.id,
				tag_ids,
			})
			.await?;

		tracing::debug!("imported post {} ({}) by {}", post.id, post.slug, author.email);

		Ok(Outcome::Imported)
	}

	/// The first of `base-1`, `base-2`, ... that no live post uses.
	async fn free_slug(&self, base: &str) -> Result<String, RouteError> {
		let mut counter = 1;

		loop {
			let candidate = format!("{base}-{counter}");

			if self.posts.find_by_slug(&candidate).await?.is_none() {
				return Ok(candidate);
			}

			counter += 1;
		}
	}

	/// Finds the account for the record's author, creating it with an
	/// unguessable password when missing.
	async fn author(&self, record: &ScrapedPost) -> Result<User, RouteError> {
		let email = author_email(record);

		if let Some(user) = self.users.find_by_email(&email).await? {
			return Ok(user);
		}

		let password = self
			.credentials
			.hash_password(&uuid::Uuid::new_v4().to_string())?;

		let user = self
			.users
			.create(NewUser {
				name: author_name(record),
				email,
				photo: record.author_avatar.clone(),
				password,
				roles: vec![Role::User],
			})
			.await?;

		tracing::info!("created imported author {} ({})", user.id, user.email);

		Ok(user)
	}
}
