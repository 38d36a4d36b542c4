use std::sync::OnceLock;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::route::post::model::EXCERPT_LENGTH;

/// Used when no file path is given.
pub const DEFAULT_IMPORT_FILE: &str = "devto_posts.json";

/// Domain of the accounts created for imported authors.
pub const IMPORTED_EMAIL_DOMAIN: &str = "devto.imported.local";

/// Imported author names are cut to this many characters.
const AUTHOR_NAME_LENGTH: usize = 100;

fn default_file_path() -> String {
	DEFAULT_IMPORT_FILE.to_owned()
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportQuery {
	/// A JSON file inside the import directory, relative to it.
	#[validate(length(min = 1, max = 1024))]
	#[serde(default = "default_file_path")]
	pub file_path: String,
}

/// One scraped post as written by the crawler. Every field is optional,
/// unknown fields are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ScrapedPost {
	pub title: Option<String>,
	pub content: Option<String>,
	pub excerpt: Option<String>,
	pub author_name: Option<String>,
	pub author_username: Option<String>,
	pub author_avatar: Option<String>,
	pub tags: Vec<String>,
	pub cover_image: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ImportResult {
	/// Records turned into posts.
	pub success: u32,
	/// Records whose post already exists.
	pub skipped: u32,
	/// Records that failed and were left out.
	pub errors: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportStatus {
	pub message: String,
	pub import_dir: String,
	pub default_file: String,
}

fn regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
	cell.get_or_init(|| {
		Regex::new(pattern).unwrap_or_else(|error| panic!("regex {pattern:?} failed to compile: {error}"))
	})
}

fn svg_regex() -> &'static Regex {
	static SVG: OnceLock<Regex> = OnceLock::new();

	regex(&SVG, r"(?s)<svg[^>]*>.*?</svg>")
}

fn presentation_regex() -> &'static Regex {
	static PRESENTATION: OnceLock<Regex> = OnceLock::new();

	regex(&PRESENTATION, r#"\s*(?:class|style)="[^"]*""#)
}

fn tag_regex() -> &'static Regex {
	static TAG: OnceLock<Regex> = OnceLock::new();

	regex(&TAG, r"<[^>]*>")
}

fn truncate(text: &str, length: usize) -> &str {
	match text.char_indices().nth(length) {
		Some((end, _)) => &text[..end],
		None => text,
	}
}

/// Strips inline SVG blocks along with `class` and `style` attributes.
pub fn clean_content(content: &str) -> String {
	let content = svg_regex().replace_all(content, "");
	let content = presentation_regex().replace_all(&content, "");

	content.trim().to_owned()
}

/// Text content of an HTML fragment with whitespace collapsed.
pub fn plain_text(html: &str) -> String {
	tag_regex()
		.replace_all(html, " ")
		.split_whitespace()
		.collect::<Vec<_>>()
		.join(" ")
}

/// The scraped excerpt when it has text, otherwise the start of the plain text
/// content. Both are cut without an ellipsis.
pub fn import_excerpt(explicit: Option<&str>, content: &str) -> String {
	match explicit.map(str::trim).filter(|excerpt| !excerpt.is_empty()) {
		Some(excerpt) => truncate(excerpt, EXCERPT_LENGTH).to_owned(),
		None => truncate(&plain_text(content), EXCERPT_LENGTH).to_owned(),
	}
}

/// The email of the account an imported post is attributed to.
pub fn author_email(post: &ScrapedPost) -> String {
	let clean = |value: &Option<String>| {
		value
			.as_deref()
			.map(|value| {
				value
					.chars()
					.filter(char::is_ascii_alphanumeric)
					.map(|c| c.to_ascii_lowercase())
					.collect::<String>()
			})
			.filter(|value| !value.is_empty())
	};

	let local = clean(&post.author_username)
		.or_else(|| clean(&post.author_name))
		.unwrap_or_else(|| "unknownauthor".to_owned());

	format!("{local}@{IMPORTED_EMAIL_DOMAIN}")
}

/// The display name of an imported author.
pub fn author_name(post: &ScrapedPost) -> String {
	[&post.author_name, &post.author_username]
		.into_iter()
		.flatten()
		.map(|name| name.trim())
		.find(|name| !name.is_empty())
		.map_or_else(
			|| "Imported Author".to_owned(),
			|name| truncate(name, AUTHOR_NAME_LENGTH).to_owned(),
		)
}
