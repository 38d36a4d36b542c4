//! Blob storage for uploaded images.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("io error: {0}")]
	Io(#[from] std::io::Error),
	#[error("invalid blob name {0:?}")]
	InvalidName(String),
	#[error("{0} was not issued by this store")]
	Unmanaged(String),
}

#[async_trait]
pub trait BlobStore: Send + Sync {
	/// Stores `bytes` as `folder/file_name`, returning the public url.
	async fn store(&self, folder: &str, file_name: &str, bytes: &[u8]) -> Result<String, Error>;

	/// Removes a blob by the url [`BlobStore::store`] returned.
	/// Removing a blob that is already gone succeeds.
	async fn delete(&self, url: &str) -> Result<(), Error>;

	/// Whether the url points into this store.
	fn is_managed(&self, url: &str) -> bool;
}

/// Best-effort removal of a replaced blob. Urls hosted elsewhere are left alone.
pub async fn discard(store: &dyn BlobStore, url: &str) {
	if !store.is_managed(url) {
		return;
	}

	if let Err(e) = store.delete(url).await {
		tracing::warn!("failed to delete replaced blob {}: {}", url, e);
	}
}

/// Stores blobs on the local filesystem, served under `<public_url>/img`.
pub struct LocalBlobStore {
	root: PathBuf,
	prefix: String,
}

impl LocalBlobStore {
	pub fn new(root: impl Into<PathBuf>, public_url: &str) -> Self {
		Self {
			root: root.into(),
			prefix: format!("{}/img/", public_url.trim_end_matches('/')),
		}
	}

	/// Maps a url issued by this store back to a file under the root.
	fn path_of(&self, url: &str) -> Result<PathBuf, Error> {
		let relative = url
			.strip_prefix(&self.prefix)
			.ok_or_else(|| Error::Unmanaged(url.to_owned()))?;

		let relative = Path::new(relative);

		if relative
			.components()
			.any(|c| !matches!(c, Component::Normal(..)))
		{
			return Err(Error::InvalidName(url.to_owned()));
		}

		Ok(self.root.join(relative))
	}
}

/// A single path segment, with no separators or relative components.
fn check_segment(segment: &str) -> Result<(), Error> {
	if segment.is_empty()
		|| segment == "."
		|| segment == ".."
		|| segment.contains(['/', '\\'])
	{
		return Err(Error::InvalidName(segment.to_owned()));
	}

	Ok(())
}

#[async_trait]
impl BlobStore for LocalBlobStore {
	async fn store(&self, folder: &str, file_name: &str, bytes: &[u8]) -> Result<String, Error> {
		check_segment(folder)?;
		check_segment(file_name)?;

		let directory = self.root.join(folder);
		tokio::fs::create_dir_all(&directory).await?;
		tokio::fs::write(directory.join(file_name), bytes).await?;

		tracing::debug!("stored {} bytes as {}/{}", bytes.len(), folder, file_name);

		Ok(format!("{}{}/{}", self.prefix, folder, file_name))
	}

	async fn delete(&self, url: &str) -> Result<(), Error> {
		let path = self.path_of(url)?;

		match tokio::fs::remove_file(&path).await {
			Ok(()) => Ok(()),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
			Err(e) => Err(e.into()),
		}
	}

	fn is_managed(&self, url: &str) -> bool {
		self.path_of(url).is_ok()
	}
}
