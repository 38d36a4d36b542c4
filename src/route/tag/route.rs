use axum::extract::State;
use macros::route;

use crate::{error::AppError, extract::Json, openapi::tag, response::TagResponse, AppState};

/// List tags
/// Returns every tag, ordered by name.
#[route(tag = tag::TAG)]
pub async fn list_tags(State(state): State<AppState>) -> Result<Json<Vec<TagResponse>>, AppError> {
	let tags = state.repositories.tags.find_all().await?;

	Ok(Json(tags.into_iter().map(TagResponse::from).collect()))
}
