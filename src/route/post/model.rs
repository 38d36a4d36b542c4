use macros::patch;
use schemars::JsonSchema;
use serde::Deserialize;
use validator::Validate;

use crate::route::model::{one, ten, Paginate};

/// Excerpts derived from content are cut to this many characters.
pub const EXCERPT_LENGTH: usize = 200;

/// Tag names are cut to this many characters.
pub const TAG_LENGTH: usize = 50;

/// A new post, authored by the caller.
#[patch]
#[derive(Debug, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostInput {
	#[validate(length(min = 1, max = 255))]
	pub title: String,
	/// The body of the post.
	#[validate(length(min = 1))]
	pub content: String,
	/// Derived from the content when absent or blank.
	#[validate(length(max = 500))]
	pub excerpt: Option<String>,
	#[validate(url)]
	pub cover_image: Option<String>,
	/// Tag names, created when they do not exist yet.
	#[patch(skip)]
	#[serde(default)]
	pub tags: Vec<String>,
	/// Overrides the slug derived from the title.
	#[patch(only)]
	#[validate(length(min = 1, max = 255))]
	pub slug: Option<String>,
	/// Reassigns the post. Only administrators may do this.
	#[patch(only)]
	pub author_id: Option<i64>,
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct SearchInput {
	/// Matched case-insensitively anywhere in the title.
	#[validate(length(max = 255))]
	#[serde(default)]
	pub title: String,
	/// The page number to return (1-indexed).
	#[validate(range(min = 1, max = 100))]
	#[serde(default = "one")]
	pub page: i64,
	/// The number of items to return per page.
	#[validate(range(min = 1, max = 100))]
	#[serde(default = "ten")]
	pub size: i64,
}

impl SearchInput {
	pub fn paginate(&self) -> Paginate {
		Paginate {
			page: self.page,
			size: self.size,
		}
	}
}

/// Derives a URL-safe slug from a title.
///
/// ASCII letters and digits are kept (lowercased), runs of whitespace,
/// `-` and `_` collapse into a single `-`, everything else is dropped.
pub fn slugify(title: &str) -> String {
	let mut slug = String::with_capacity(title.len());
	let mut pending_dash = false;

	for c in title.chars() {
		if c.is_ascii_alphanumeric() {
			if pending_dash && !slug.is_empty() {
				slug.push('-');
			}

			pending_dash = false;
			slug.push(c.to_ascii_lowercase());
		} else if c.is_whitespace() || c == '-' || c == '_' {
			pending_dash = true;
		}
	}

	if slug.is_empty() {
		slug.push_str("untitled");
	}

	slug
}

/// Whether `slug` is already in the form [`slugify`] produces.
pub fn is_slug(slug: &str) -> bool {
	!slug.is_empty() && slugify(slug) == slug
}

/// The first [`EXCERPT_LENGTH`] characters of `content`, with `...` appended
/// when anything was cut.
pub fn excerpt(content: &str) -> String {
	match content.char_indices().nth(EXCERPT_LENGTH) {
		Some((end, _)) => format!("{}...", &content[..end]),
		None => content.to_owned(),
	}
}

/// The explicit excerpt when it has any text, otherwise one derived from `content`.
pub fn excerpt_or_derive(explicit: Option<String>, content: &str) -> String {
	explicit
		.filter(|excerpt| !excerpt.trim().is_empty())
		.unwrap_or_else(|| excerpt(content))
}

/// Trims, lowercases and truncates a tag name. Blank names become `None`.
pub fn clean_tag(name: &str) -> Option<String> {
	let name = name.trim().to_lowercase();

	if name.is_empty() {
		return None;
	}

	Some(name.chars().take(TAG_LENGTH).collect())
}
