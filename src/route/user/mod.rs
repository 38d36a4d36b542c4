use aide::axum::{
	routing::{get_with, patch_with},
	ApiRouter,
};
use axum::http::StatusCode;

use crate::{error, AppState};

use super::auth;

pub mod model;
pub mod route;
pub mod service;

pub use service::UserService;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unknown user {0}")]
	UnknownUser(i64),
	#[error("insufficient permissions")]
	Forbidden,
	#[error("photo must be one of: jpg, jpeg, png, gif, webp")]
	UnsupportedImage,
	#[error(transparent)]
	Auth(auth::Error),
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route(
			"/users",
			get_with(list_users, list_users_docs).post_with(create_user, create_user_docs),
		)
		.api_route("/users/updateMe", patch_with(update_me, update_me_docs))
		.api_route(
			"/users/:id",
			get_with(get_user, get_user_docs)
				.patch_with(update_user, update_user_docs)
				.delete_with(delete_user, delete_user_docs),
		)
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownUser(..) => StatusCode::NOT_FOUND,
			Self::Forbidden => StatusCode::FORBIDDEN,
			Self::UnsupportedImage => StatusCode::BAD_REQUEST,
			Self::Auth(e) => error::ErrorShape::status(e),
		}
	}
}

#[cfg(test)]
mod test {
	use crate::test::*;

	#[tokio::test]
	async fn test_list_and_get_users() {
		let harness = Harness::new();
		let (ada, _) = harness.user("Ada", &[Role::User]).await;
		harness.user("Grace", &[Role::User]).await;
		let server = harness.server();

		let response = server.get("/api/v1/users").add_query_param("size", 1).await;

		assert_eq!(response.status_code(), StatusCode::OK);
		assert_eq!(response.json::<Vec<Value>>().len(), 1);

		let response = server.get(&format!("/api/v1/users/{}", ada.id)).await;

		assert_eq!(response.status_code(), StatusCode::OK);
		assert_eq!(response.json::<Value>()["name"], "Ada");

		let response = server.get("/api/v1/users/999").await;

		assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
		assert_eq!(response.json::<Value>()["path"], "/api/v1/users/999");
	}

	#[tokio::test]
	async fn test_pagination_is_validated() {
		let harness = Harness::new();
		let response = harness
			.server()
			.get("/api/v1/users")
			.add_query_param("size", 1000)
			.await;

		assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
	}

	#[tokio::test]
	async fn test_create_user_requires_admin() {
		let harness = Harness::new();
		let (_, user_token) = harness.user("Ada", &[Role::User]).await;
		let (_, admin_token) = harness.user("Root", &[Role::Admin]).await;
		let server = harness.server();
		let body = json!({
			"name": "Grace",
			"email": "grace@example.com",
			"password": PASSWORD,
			"passwordConfirm": PASSWORD,
			"roles": ["ADMIN"],
		});

		let response = server
			.post("/api/v1/users")
			.add_header(header::AUTHORIZATION, bearer(&user_token))
			.json(&body)
			.await;

		assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

		let response = server
			.post("/api/v1/users")
			.add_header(header::AUTHORIZATION, bearer(&admin_token))
			.json(&body)
			.await;

		assert_eq!(response.status_code(), StatusCode::CREATED);
		assert_eq!(response.json::<Value>()["roles"], json!(["ADMIN"]));
	}

	#[tokio::test]
	async fn test_patch_and_delete_user() {
		let harness = Harness::new();
		let (ada, token) = harness.user("Ada", &[Role::User]).await;
		let server = harness.server();

		let response = server
			.patch(&format!("/api/v1/users/{}", ada.id))
			.add_header(header::AUTHORIZATION, bearer(&token))
			.json(&json!({ "name": "Ada Lovelace" }))
			.await;

		assert_eq!(response.status_code(), StatusCode::OK);
		assert_eq!(response.json::<Value>()["name"], "Ada Lovelace");

		let response = server
			.delete(&format!("/api/v1/users/{}", ada.id))
			.add_header(header::AUTHORIZATION, bearer(&token))
			.await;

		assert_eq!(response.status_code(), StatusCode::NO_CONTENT);
		assert!(response.as_bytes().is_empty());

		let response = server.get(&format!("/api/v1/users/{}", ada.id)).await;

		assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
	}

	#[tokio::test]
	async fn test_blank_name_is_rejected() {
		let harness = Harness::new();
		let (ada, token) = harness.user("Ada", &[Role::User]).await;
		let server = harness.server();

		let response = server
			.patch(&format!("/api/v1/users/{}", ada.id))
			.add_header(header::AUTHORIZATION, bearer(&token))
			.json(&json!({ "name": "   " }))
			.await;

		assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
		assert_eq!(
			response.json::<Value>()["validationErrors"]["name"],
			"must not be blank"
		);
		assert_eq!(harness.store.raw_user(ada.id).unwrap().name, "Ada");

		let response = server
			.patch("/api/v1/users/updateMe")
			.add_header(header::AUTHORIZATION, bearer(&token))
			.multipart(MultipartForm::new().add_text("name", " \t "))
			.await;

		// Blank form fields are treated as absent.
		assert_eq!(response.status_code(), StatusCode::OK);
		assert_eq!(harness.store.raw_user(ada.id).unwrap().name, "Ada");
	}

	#[tokio::test]
	async fn test_update_me_replaces_photo() {
		let harness = Harness::new();
		let (ada, token) = harness.user("Ada", &[Role::User]).await;
		let server = harness.server();

		let upload = |name: &'static str| {
			MultipartForm::new()
				.add_text("name", "Ada L.")
				.add_part("photo", Part::bytes(b"png".to_vec()).file_name(name))
		};

		let response = server
			.patch("/api/v1/users/updateMe")
			.add_header(header::AUTHORIZATION, bearer(&token))
			.multipart(upload("me.png"))
			.await;

		assert_eq!(response.status_code(), StatusCode::OK);

		let first = response.json::<Value>();
		let first_url = first["photo"].as_str().unwrap().to_owned();

		assert_eq!(first["name"], "Ada L.");
		assert!(first_url.starts_with(&format!("{PUBLIC_URL}/img/users/user_{}_", ada.id)));
		assert_eq!(harness.uploaded_files("users").len(), 1);

		let response = server
			.patch("/api/v1/users/updateMe")
			.add_header(header::AUTHORIZATION, bearer(&token))
			.multipart(upload("me.webp"))
			.await;

		assert_eq!(response.status_code(), StatusCode::OK);

		let files = harness.uploaded_files("users");

		assert_eq!(files.len(), 1);
		assert!(files[0].ends_with(".webp"));
	}

	#[tokio::test]
	async fn test_update_me_rejects_non_images() {
		let harness = Harness::new();
		let (_, token) = harness.user("Ada", &[Role::User]).await;

		let response = harness
			.server()
			.patch("/api/v1/users/updateMe")
			.add_header(header::AUTHORIZATION, bearer(&token))
			.multipart(
				MultipartForm::new().add_part("photo", Part::bytes(b"#!".to_vec()).file_name("x.sh")),
			)
			.await;

		assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
		assert!(harness.uploaded_files("users").is_empty());
	}
}
