use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
	credential::Principal,
	model::{notification_kind, NewNotification, Post},
	repository::{PostLikeRepository, PostRepository, UserRepository},
	response::{PostSummary, UserResponse},
	AppState,
};

use super::{model::LikeResponse, Error, RouteError};

#[derive(Clone)]
pub struct LikeService {
	likes: Arc<dyn PostLikeRepository>,
	posts: Arc<dyn PostRepository>,
	users: Arc<dyn UserRepository>,
}

impl FromRef<AppState> for LikeService {
	fn from_ref(state: &AppState) -> Self {
		Self {
			likes: state.repositories.likes.clone(),
			posts: state.repositories.posts.clone(),
			users: state.repositories.users.clone(),
		}
	}
}

impl LikeService {
	/// The user a like is recorded for, which is the caller unless an
	/// administrator names someone else.
	fn liker(principal: &Principal, user_id: Option<i64>) -> Result<i64, RouteError> {
		match user_id {
			Some(id) if !principal.can_act_for(id) => Err(Error::Forbidden.into()),
			Some(id) => Ok(id),
			None => Ok(principal.id),
		}
	}

	async fn find_post(&self, post_id: i64) -> Result<Post, RouteError> {
		Ok(self
			.posts
			.find_by_id(post_id)
			.await?
			.ok_or(Error::UnknownPost(post_id))?)
	}

	/// Likes a post. The author is notified unless they liked their own post.
	pub async fn like(
		&self,
		principal: &Principal,
		post_id: i64,
		user_id: Option<i64>,
	) -> Result<LikeResponse, RouteError> {
		let user_id = Self::liker(principal, user_id)?;
		let post = self.find_post(post_id).await?;
		let user = self
			.users
			.find_by_id(user_id)
			.await?
			.ok_or(Error::UnknownUser(user_id))?;

		let notification = (post.author_id != user.id).then(|| NewNotification {
			recipient_id: post.author_id,
			sender_id: user.id,
			post_id: Some(post.id),
			kind: notification_kind::LIKE,
			message: format!("{} liked your post: {}", user.name, post.title),
		});

		if !self.likes.create(user.id, post.id, notification).await? {
			return Err(Error::AlreadyLiked(post.id).into());
		}

		tracing::info!("user {} liked post {}", user.id, post.id);

		Ok(LikeResponse {
			post: PostSummary::from(&post),
			user: user.into(),
		})
	}

	pub async fn unlike(
		&self,
		principal: &Principal,
		post_id: i64,
		user_id: Option<i64>,
	) -> Result<(), RouteError> {
		let user_id = Self::liker(principal, user_id)?;

		if !self.likes.delete(user_id, post_id).await? {
			return Err(Error::NotLiked(post_id).into());
		}

		tracing::info!("user {} unliked post {}", user_id, post_id);

		Ok(())
	}

	pub async fn likers(&self, post_id: i64) -> Result<Vec<UserResponse>, RouteError> {
		self.find_post(post_id).await?;

		let users = self.likes.find_likers(post_id).await?;

		Ok(users.into_iter().map(UserResponse::from).collect())
	}
}

#[cfg(test)]
mod test {
	use crate::test::*;

	use super::LikeService;
	use crate::route::{like::Error, notification::NotificationService};

	#[tokio::test]
	async fn test_like_notify_unlike() {
		let harness = Harness::new();
		let (a, _) = harness.user("A", &[Role::User]).await;
		let (b, _) = harness.user("B", &[Role::User]).await;
		let post = harness.post(&a, "P").await;
		let likes = harness.service::<LikeService>();
		let notifications = harness.service::<NotificationService>();

		likes.like(&harness.principal(&b), post.id, None).await.unwrap();

		let likers = likes.likers(post.id).await.unwrap();

		assert_eq!(likers.len(), 1);
		assert_eq!(likers[0].id, b.id);

		let received = notifications
			.list_for_user(&harness.principal(&a), a.id)
			.await
			.unwrap();

		assert_eq!(received.len(), 1);
		assert_eq!(received[0].kind, "LIKE");
		assert_eq!(received[0].message, "B liked your post: P");
		assert_eq!(received[0].sender.as_ref().unwrap().id, b.id);
		assert!(!received[0].read);

		likes.unlike(&harness.principal(&b), post.id, None).await.unwrap();

		assert!(likes.likers(post.id).await.unwrap().is_empty());
		assert!(harness.store.raw_like(b.id, post.id).is_some());
	}

	#[tokio::test]
	async fn test_second_like_conflicts() {
		let harness = Harness::new();
		let (a, _) = harness.user("A", &[Role::User]).await;
		let (b, _) = harness.user("B", &[Role::User]).await;
		let post = harness.post(&a, "P").await;
		let likes = harness.service::<LikeService>();
		let principal = harness.principal(&b);

		likes.like(&principal, post.id, None).await.unwrap();

		assert!(matches!(
			likes.like(&principal, post.id, None).await,
			Err(RouteError::Route(Error::AlreadyLiked(..)))
		));
		assert_eq!(harness.store.notification_count(), 1);

		likes.unlike(&principal, post.id, None).await.unwrap();
		likes.like(&principal, post.id, None).await.unwrap();

		assert_eq!(likes.likers(post.id).await.unwrap().len(), 1);
	}

	#[tokio::test]
	async fn test_liking_own_post_does_not_notify() {
		let harness = Harness::new();
		let (a, _) = harness.user("A", &[Role::User]).await;
		let post = harness.post(&a, "P").await;

		harness
			.service::<LikeService>()
			.like(&harness.principal(&a), post.id, None)
			.await
			.unwrap();

		assert_eq!(harness.store.notification_count(), 0);
	}

	#[tokio::test]
	async fn test_unlike_without_like_is_not_found() {
		let harness = Harness::new();
		let (a, _) = harness.user("A", &[Role::User]).await;
		let post = harness.post(&a, "P").await;

		assert!(matches!(
			harness
				.service::<LikeService>()
				.unlike(&harness.principal(&a), post.id, None)
				.await,
			Err(RouteError::Route(Error::NotLiked(..)))
		));
	}

	#[tokio::test]
	async fn test_liking_for_others_requires_admin() {
		let harness = Harness::new();
		let (a, _) = harness.user("A", &[Role::User]).await;
		let (b, _) = harness.user("B", &[Role::User]).await;
		let (admin, _) = harness.user("Root", &[Role::Admin]).await;
		let post = harness.post(&a, "P").await;
		let likes = harness.service::<LikeService>();

		assert!(matches!(
			likes.like(&harness.principal(&a), post.id, Some(b.id)).await,
			Err(RouteError::Route(Error::Forbidden))
		));

		let like = likes
			.like(&harness.principal(&admin), post.id, Some(b.id))
			.await
			.unwrap();

		assert_eq!(like.user.id, b.id);
		assert!(matches!(
			likes.like(&harness.principal(&admin), post.id, Some(999)).await,
			Err(RouteError::Route(Error::UnknownUser(999)))
		));
	}
}
