use aide::axum::ApiRouter;

use crate::AppState;

pub mod admin;
pub mod auth;
pub mod comment;
pub mod docs;
pub mod like;
pub mod model;
pub mod notification;
pub mod post;
pub mod tag;
pub mod user;

/// Every API route, relative to `/api/v1`.
pub fn routes() -> ApiRouter<AppState> {
	ApiRouter::new()
		.merge(auth::routes())
		.merge(user::routes())
		.merge(post::routes())
		.merge(comment::routes())
		.merge(like::routes())
		.merge(notification::routes())
		.merge(tag::routes())
		.merge(admin::routes())
}
