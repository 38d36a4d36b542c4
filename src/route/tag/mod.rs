use aide::axum::{routing::get_with, ApiRouter};

use crate::AppState;

pub mod route;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new().api_route("/tags", get_with(list_tags, list_tags_docs))
}
