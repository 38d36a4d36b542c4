use aide::axum::{
	routing::{get_with, patch_with},
	ApiRouter,
};
use axum::http::StatusCode;

use crate::{error, AppState};

pub mod model;
pub mod route;
pub mod service;

pub use service::NotificationService;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unknown notification {0}")]
	UnknownNotification(i64),
	#[error("unknown user {0}")]
	UnknownUser(i64),
	#[error("insufficient permissions")]
	Forbidden,
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route(
			"/users/:id/notifications",
			get_with(list_notifications, list_notifications_docs),
		)
		.api_route(
			"/users/:id/notifications/read-all",
			patch_with(mark_all_read, mark_all_read_docs),
		)
		.api_route("/notifications/:id/read", patch_with(mark_read, mark_read_docs))
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownNotification(..) | Self::UnknownUser(..) => StatusCode::NOT_FOUND,
			Self::Forbidden => StatusCode::FORBIDDEN,
		}
	}
}

#[cfg(test)]
mod test {
	use crate::test::*;

	use crate::route::like::LikeService;

	#[tokio::test]
	async fn test_read_all_over_http() {
		let harness = Harness::new();
		let (a, token) = harness.user("A", &[Role::User]).await;
		let (b, _) = harness.user("B", &[Role::User]).await;
		let post = harness.post(&a, "P").await;

		harness
			.service::<LikeService>()
			.like(&harness.principal(&b), post.id, None)
			.await
			.unwrap();

		let server = harness.server();
		let response = server
			.patch(&format!("/api/v1/users/{}/notifications/read-all", a.id))
			.add_header(header::AUTHORIZATION, bearer(&token))
			.await;

		assert_eq!(response.status_code(), StatusCode::OK);
		assert_eq!(response.json::<Value>()["updated"], 1);

		let response = server
			.get(&format!("/api/v1/users/{}/notifications", a.id))
			.add_header(header::AUTHORIZATION, bearer(&token))
			.await;

		assert_eq!(response.json::<Vec<Value>>()[0]["read"], true);
	}

	#[tokio::test]
	async fn test_mark_read_unknown_notification() {
		let harness = Harness::new();
		let (_, token) = harness.user("A", &[Role::User]).await;

		let response = harness
			.server()
			.patch("/api/v1/notifications/999/read")
			.add_header(header::AUTHORIZATION, bearer(&token))
			.await;

		assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
	}

	#[tokio::test]
	async fn test_notifications_require_token() {
		let harness = Harness::new();
		let (a, _) = harness.user("A", &[Role::User]).await;

		let response = harness
			.server()
			.get(&format!("/api/v1/users/{}/notifications", a.id))
			.await;

		assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
	}
}
