use aide::{
	openapi::{SecurityScheme, Tag},
	transform::TransformOpenApi,
};
use axum::http::StatusCode;

use crate::{error::ErrorBody, extract::Json};

pub const SECURITY_SCHEME_BEARER: &str = "Bearer";

pub mod tag {
	pub const AUTH: &str = "Auth";
	pub const USER: &str = "User";
	pub const POST: &str = "Post";
	pub const TAG: &str = "Tag";
	pub const COMMENT: &str = "Comment";
	pub const LIKE: &str = "Like";
	pub const NOTIFICATION: &str = "Notification";
	pub const ADMIN: &str = "Admin";
}

pub fn docs(api: TransformOpenApi) -> TransformOpenApi {
	let tags = [
		(tag::AUTH, "Sign up, sign in and the current account"),
		(tag::USER, "User profiles"),
		(tag::POST, "Posts, cover images and search"),
		(tag::TAG, "Post tags"),
		(tag::COMMENT, "Threaded comments"),
		(tag::LIKE, "Post likes"),
		(tag::NOTIFICATION, "Notifications addressed to a user"),
		(tag::ADMIN, "Administrative imports"),
	];

	tags.into_iter()
		.fold(api, |api, (name, description)| {
			api.tag(Tag {
				name: name.into(),
				description: Some(description.into()),
				..Default::default()
			})
		})
		.title("Welog Open API")
		.summary("A blogging platform backend")
		.description(include_str!("../README.md"))
		.security_scheme(
			SECURITY_SCHEME_BEARER,
			SecurityScheme::Http {
				scheme: "bearer".into(),
				bearer_format: Some("JWT".into()),
				description: Some("A token returned by signing in".into()),
				extensions: Default::default(),
			},
		)
		.default_response_with::<Json<ErrorBody>, _>(|res| {
			res.example(ErrorBody::new(
				StatusCode::NOT_FOUND,
				"unknown post 1".into(),
			))
		})
}
