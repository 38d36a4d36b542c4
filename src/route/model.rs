use std::collections::HashMap;

use axum::body::Bytes;
use schemars::JsonSchema;
use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::{error::AppError, extract::Multipart, repository::PageRequest};

/// These can be removed when [`serde`] supports
/// literal defaults: <https://github.com/serde-rs/serde/issues/368>
#[inline]
pub(crate) fn one() -> i64 {
	1
}

#[inline]
pub(crate) fn ten() -> i64 {
	10
}

/// Rejects text that is empty once surrounding whitespace is trimmed.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
	if value.trim().is_empty() {
		let mut error = ValidationError::new("blank");
		error.message = Some("must not be blank".into());

		return Err(error);
	}

	Ok(())
}

#[derive(Debug, Clone, Copy, Deserialize, Validate, JsonSchema)]
pub struct Paginate {
	/// The page number to return (1-indexed).
	#[validate(range(min = 1, max = 100))]
	#[serde(default = "one")]
	pub page: i64,
	/// The number of items to return per page.
	#[validate(range(min = 1, max = 100))]
	#[serde(default = "ten")]
	pub size: i64,
}

impl Default for Paginate {
	fn default() -> Self {
		Self { page: 1, size: 10 }
	}
}

impl Paginate {
	pub fn offset(&self) -> i64 {
		(self.page - 1) * self.size
	}

	pub fn limit(&self) -> i64 {
		self.size
	}
}

impl From<Paginate> for PageRequest {
	fn from(paginate: Paginate) -> Self {
		Self {
			offset: paginate.offset(),
			limit: paginate.limit(),
		}
	}
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct IdInput {
	#[validate(range(min = 1))]
	pub id: i64,
}

/// An uploaded file.
#[derive(Debug)]
pub struct Upload {
	pub file_name: Option<String>,
	pub bytes: Bytes,
}

/// A fully buffered multipart form.
#[derive(Debug, Default)]
pub struct Form {
	pub fields: HashMap<String, String>,
	pub files: HashMap<String, Upload>,
}

impl Form {
	/// Reads every part. Parts with a file name are files, the rest are text.
	pub async fn read(Multipart(mut multipart): Multipart) -> Result<Self, AppError> {
		let mut form = Self::default();

		while let Some(field) = multipart.next_field().await? {
			let Some(name) = field.name().map(str::to_owned) else {
				continue;
			};

			if let Some(file_name) = field.file_name().map(str::to_owned) {
				let bytes = field.bytes().await?;

				form.files.insert(
					name,
					Upload {
						file_name: Some(file_name),
						bytes,
					},
				);
			} else {
				form.fields.insert(name, field.text().await?);
			}
		}

		Ok(form)
	}

	/// A text field, treating blank values as absent.
	pub fn text(&mut self, name: &str) -> Option<String> {
		self.fields
			.remove(name)
			.filter(|value| !value.trim().is_empty())
	}
}

/// Extensions accepted for uploaded images.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Returns the lowercase extension of an uploaded image, if it is one we accept.
pub fn image_extension(file_name: &str) -> Option<String> {
	let (_, extension) = file_name.rsplit_once('.')?;
	let extension = extension.to_ascii_lowercase();

	IMAGE_EXTENSIONS
		.contains(&extension.as_str())
		.then_some(extension)
}

/// Builds a collision-free blob name such as `post_4_<uuid>.png`.
pub fn blob_name(prefix: &str, id: i64, upload: &Upload) -> Option<String> {
	let extension = image_extension(upload.file_name.as_deref()?)?;

	Some(format!("{prefix}_{id}_{}.{extension}", uuid::Uuid::new_v4().simple()))
}

#[cfg(test)]
mod test {
	use axum::body::Bytes;

	use super::{blob_name, image_extension, not_blank, Upload};
	use crate::repository::PageRequest;

	#[test]
	fn test_image_extension() {
		assert_eq!(image_extension("me.PNG").as_deref(), Some("png"));
		assert_eq!(image_extension("archive.tar.jpeg").as_deref(), Some("jpeg"));
		assert_eq!(image_extension("script.sh"), None);
		assert_eq!(image_extension("noextension"), None);
	}

	#[test]
	fn test_blob_name() {
		let upload = Upload {
			file_name: Some("Cover.JPG".into()),
			bytes: Bytes::from_static(b"jpg"),
		};

		let name = blob_name("post", 4, &upload).unwrap();

		assert!(name.starts_with("post_4_"));
		assert!(name.ends_with(".jpg"));
		assert!(blob_name(
			"post",
			4,
			&Upload {
				file_name: None,
				bytes: Bytes::new()
			}
		)
		.is_none());
	}

	#[test]
	fn test_paginate_offset() {
		let mut paginate = super::Paginate { page: 1, size: 10 };

		assert_eq!(paginate.offset(), 0);

		paginate.page = 2;

		assert_eq!(paginate.offset(), 10);

		paginate.size = 5;

		assert_eq!(paginate.offset(), 5);

		paginate.page = 3;

		assert_eq!(paginate.offset(), 10);
	}

	#[test]
	fn test_paginate_limit() {
		let paginate = super::Paginate { page: 1, size: 10 };

		assert_eq!(paginate.limit(), 10);
	}

	#[test]
	fn test_paginate_into_page_request() {
		let request = PageRequest::from(super::Paginate { page: 4, size: 25 });

		assert_eq!(
			request,
			PageRequest {
				offset: 75,
				limit: 25
			}
		);
	}

	#[test]
	fn test_not_blank() {
		assert!(not_blank("Ada").is_ok());
		assert!(not_blank(" Ada ").is_ok());
		assert_eq!(not_blank(" \n\t").unwrap_err().code, "blank");
		assert!(not_blank("").is_err());
	}
}
