use std::{collections::HashMap, sync::Arc};

use axum::extract::FromRef;

use crate::{
	credential::Principal,
	model::Notification,
	repository::{NotificationRepository, PostRepository, UserRepository},
	response::{self, NotificationResponse, PostSummary},
	AppState,
};

use super::{model::MarkAllReadResponse, Error, RouteError};

#[derive(Clone)]
pub struct NotificationService {
	notifications: Arc<dyn NotificationRepository>,
	users: Arc<dyn UserRepository>,
	posts: Arc<dyn PostRepository>,
}

impl FromRef<AppState> for NotificationService {
	fn from_ref(state: &AppState) -> Self {
		Self {
			notifications: state.repositories.notifications.clone(),
			users: state.repositories.users.clone(),
			posts: state.repositories.posts.clone(),
		}
	}
}

impl NotificationService {
	async fn ensure_recipient(&self, principal: &Principal, user_id: i64) -> Result<(), RouteError> {
		if !principal.can_act_for(user_id) {
			return Err(Error::Forbidden.into());
		}

		if !self.users.exists_by_id(user_id).await? {
			return Err(Error::UnknownUser(user_id).into());
		}

		Ok(())
	}

	/// Maps notifications with their recipient, sender and post resolved.
	/// Posts that were deleted since are left out.
	async fn respond(
		&self,
		notifications: Vec<Notification>,
	) -> Result<Vec<NotificationResponse>, RouteError> {
		let mut user_ids = Vec::with_capacity(notifications.len() * 2);
		let mut posts = HashMap::new();

		for notification in &notifications {
			user_ids.push(notification.recipient_id);
			user_ids.push(notification.sender_id);

			if let Some(post_id) = notification.post_id {
				if !posts.contains_key(&post_id) {
					if let Some(post) = self.posts.find_by_id(post_id).await? {
						posts.insert(post_id, PostSummary::from(&post));
					}
				}
			}
		}

		user_ids.sort_unstable();
		user_ids.dedup();

		let users = response::users(&self.users.find_by_ids(&user_ids).await?);

		Ok(notifications
			.into_iter()
			.map(|n| response::notification(n, &users, &posts))
			.collect())
	}

	pub async fn list_for_user(
		&self,
		principal: &Principal,
		user_id: i64,
	) -> Result<Vec<NotificationResponse>, RouteError> {
		self.ensure_recipient(principal, user_id).await?;

		let notifications = self.notifications.find_by_recipient(user_id).await?;

		self.respond(notifications).await
	}

	pub async fn mark_read(
		&self,
		principal: &Principal,
		id: i64,
	) -> Result<NotificationResponse, RouteError> {
		let notification = self
			.notifications
			.find_by_id(id)
			.await?
			.ok_or(Error::UnknownNotification(id))?;

		if !principal.can_act_for(notification.recipient_id) {
			return Err(Error::Forbidden.into());
		}

		if !self.notifications.mark_read(id).await? {
			return Err(Error::UnknownNotification(id).into());
		}

		self.respond(vec![Notification {
			read: true,
			..notification
		}])
		.await?
		.pop()
		.ok_or_else(|| Error::UnknownNotification(id).into())
	}

	pub async fn mark_all_read(
		&self,
		principal: &Principal,
		user_id: i64,
	) -> Result<MarkAllReadResponse, RouteError> {
		self.ensure_recipient(principal, user_id).await?;

		let updated = self.notifications.mark_all_read(user_id).await?;

		tracing::debug!("marked {} notifications of user {} as read", updated, user_id);

		Ok(MarkAllReadResponse { updated })
	}
}
