use axum::extract::State;
use macros::route;

use crate::{
	extract::{Json, Path, Principal},
	openapi::tag,
	response::NotificationResponse,
	route::model::IdInput,
};

use super::{model, NotificationService, RouteError};

/// List notifications
/// Returns the notifications addressed to a user. Only the recipient or an
/// administrator may do this.
#[route(tag = tag::NOTIFICATION)]
pub async fn list_notifications(
	State(service): State<NotificationService>,
	principal: Principal,
	Path(path): Path<IdInput>,
) -> Result<Json<Vec<NotificationResponse>>, RouteError> {
	Ok(Json(service.list_for_user(&principal, path.id).await?))
}

/// Mark notification read
#[route(tag = tag::NOTIFICATION)]
pub async fn mark_read(
	State(service): State<NotificationService>,
	principal: Principal,
	Path(path): Path<IdInput>,
) -> Result<Json<NotificationResponse>, RouteError> {
	Ok(Json(service.mark_read(&principal, path.id).await?))
}

/// Mark all notifications read
/// Marks every notification addressed to a user as read.
#[route(tag = tag::NOTIFICATION)]
pub async fn mark_all_read(
	State(service): State<NotificationService>,
	principal: Principal,
	Path(path): Path<IdInput>,
) -> Result<Json<model::MarkAllReadResponse>, RouteError> {
	Ok(Json(service.mark_all_read(&principal, path.id).await?))
}
