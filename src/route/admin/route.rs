use axum::extract::State;
use macros::route;

use crate::{
	extract::{Json, Principal, Query},
	openapi::tag,
};

use super::{model, ImportService, RouteError};

/// Import posts
/// Imports scraped posts from a JSON file in the import directory. Records
/// whose post already exists are skipped, failing records are counted.
/// Requires the ADMIN role.
#[route(tag = tag::ADMIN)]
pub async fn import_posts(
	State(service): State<ImportService>,
	principal: Principal,
	Query(query): Query<model::ImportQuery>,
) -> Result<Json<model::ImportResult>, RouteError> {
	tracing::info!("user {} started an import from {}", principal.id, query.file_path);

	Ok(Json(service.import_posts(&principal, &query.file_path).await?))
}

/// Import status
/// Requires the ADMIN role.
#[route(tag = tag::ADMIN)]
pub async fn import_status(
	State(service): State<ImportService>,
	principal: Principal,
) -> Result<Json<model::ImportStatus>, RouteError> {
	Ok(Json(service.status(&principal)?))
}
