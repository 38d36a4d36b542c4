use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
	credential::Principal,
	model::{Comment, NewComment},
	repository::{CommentRepository, PostRepository, UserRepository},
	response::{self, CommentResponse, Users},
	AppState,
};

use super::{
	model::{CommentPatch, CreateCommentInput},
	Error, RouteError,
};

#[derive(Clone)]
pub struct CommentService {
	comments: Arc<dyn CommentRepository>,
	posts: Arc<dyn PostRepository>,
	users: Arc<dyn UserRepository>,
}

impl FromRef<AppState> for CommentService {
	fn from_ref(state: &AppState) -> Self {
		Self {
			comments: state.repositories.comments.clone(),
			posts: state.repositories.posts.clone(),
			users: state.repositories.users.clone(),
		}
	}
}

impl CommentService {
	async fn authors(&self, comments: &[Comment]) -> Result<Users, RouteError> {
		let mut ids = comments.iter().map(|c| c.user_id).collect::<Vec<_>>();
		ids.sort_unstable();
		ids.dedup();

		Ok(response::users(&self.users.find_by_ids(&ids).await?))
	}

	async fn ensure_post(&self, post_id: i64) -> Result<(), RouteError> {
		if self.posts.exists_by_id(post_id).await? {
			Ok(())
		} else {
			Err(Error::UnknownPost(post_id).into())
		}
	}

	async fn find(&self, id: i64) -> Result<Comment, RouteError> {
		Ok(self
			.comments
			.find_by_id(id)
			.await?
			.ok_or(Error::UnknownComment(id))?)
	}

	/// Maps `selected` with their direct replies, which are looked up among
	/// the comments of the same posts.
	async fn respond(&self, selected: Vec<Comment>) -> Result<Vec<CommentResponse>, RouteError> {
		let mut post_ids = selected.iter().map(|c| c.post_id).collect::<Vec<_>>();
		post_ids.sort_unstable();
		post_ids.dedup();

		let mut related = Vec::new();

		for post_id in post_ids {
			related.extend(self.comments.find_by_post(post_id).await?);
		}

		let users = self.authors(&related).await?;

		Ok(response::comments_with_replies(&selected, &related, &users))
	}

	pub async fn list(&self) -> Result<Vec<CommentResponse>, RouteError> {
		let all = self.comments.find_all().await?;
		let users = self.authors(&all).await?;

		Ok(response::comments_with_replies(&all, &all, &users))
	}

	pub async fn get(&self, id: i64) -> Result<CommentResponse, RouteError> {
		let comment = self.find(id).await?;

		self.respond(vec![comment])
			.await?
			.pop()
			.ok_or_else(|| Error::UnknownComment(id).into())
	}

	pub async fn list_by_post(&self, post_id: i64) -> Result<Vec<CommentResponse>, RouteError> {
		self.ensure_post(post_id).await?;

		let all = self.comments.find_by_post(post_id).await?;
		let users = self.authors(&all).await?;

		Ok(response::comments_with_replies(&all, &all, &users))
	}

	/// Top-level comments of a post, each with its direct replies.
	pub async fn list_roots_by_post(
		&self,
		post_id: i64,
	) -> Result<Vec<CommentResponse>, RouteError> {
		self.ensure_post(post_id).await?;

		let all = self.comments.find_by_post(post_id).await?;
		let roots = self.comments.find_roots_by_post(post_id).await?;
		let users = self.authors(&all).await?;

		Ok(response::comments_with_replies(&roots, &all, &users))
	}

	pub async fn create(
		&self,
		principal: &Principal,
		input: CreateCommentInput,
	) -> Result<CommentResponse, RouteError> {
		if !self.users.exists_by_id(principal.id).await? {
			return Err(Error::UnknownUser(principal.id).into());
		}

		self.ensure_post(input.post_id).await?;

		let level = match input.parent_id {
			Some(parent_id) => {
				let parent = self
					.comments
					.find_by_id(parent_id)
					.await?
					.ok_or(Error::UnknownComment(parent_id))?;

				if parent.post_id != input.post_id {
					return Err(Error::ParentOnOtherPost(parent_id).into());
				}

				parent.level + 1
			}
			None => 0,
		};

		let comment = self
			.comments
			.create(NewComment {
				content: input.content,
				post_id: input.post_id,
				user_id: principal.id,
				parent_id: input.parent_id,
				level,
			})
			.await?;

		tracing::info!(
			"user {} commented {} on post {} at level {}",
			principal.id,
			comment.id,
			comment.post_id,
			comment.level
		);

		let users = self.authors(std::slice::from_ref(&comment)).await?;

		Ok(response::comment(&comment, &users))
	}

	pub async fn update(
		&self,
		principal: &Principal,
		id: i64,
		patch: CommentPatch,
	) -> Result<CommentResponse, RouteError> {
		let mut comment = self.find(id).await?;

		if !principal.can_act_for(comment.user_id) {
			return Err(Error::Forbidden.into());
		}

		if let Some(post_id) = patch.post_id.filter(|post| *post != comment.post_id) {
			if !principal.is_admin() {
				return Err(Error::Forbidden.into());
			}

			self.ensure_post(post_id).await?;

			let has_replies = self
				.comments
				.find_by_post(comment.post_id)
				.await?
				.iter()
				.any(|c| c.parent_id == Some(comment.id));

			if !comment.is_root() || has_replies {
				return Err(Error::Unmovable(id).into());
			}

			comment.post_id = post_id;
		}

		if let Some(user_id) = patch.user_id.filter(|user| *user != comment.user_id) {
			if !principal.is_admin() {
				return Err(Error::Forbidden.into());
			}

			if !self.users.exists_by_id(user_id).await? {
				return Err(Error::UnknownUser(user_id).into());
			}

			comment.user_id = user_id;
		}

		if let Some(content) = patch.content {
			comment.content = content;
		}

		let comment = self
			.comments
			.update(&comment)
			.await?
			.ok_or(Error::UnknownComment(id))?;

		self.respond(vec![comment])
			.await?
			.pop()
			.ok_or_else(|| Error::UnknownComment(id).into())
	}

	/// Soft deletes the comment together with all of its replies.
	pub async fn delete(&self, principal: &Principal, id: i64) -> Result<(), RouteError> {
		let comment = self.find(id).await?;

		if !principal.can_act_for(comment.user_id) {
			return Err(Error::Forbidden.into());
		}

		if !self.comments.soft_delete(id).await? {
			return Err(Error::UnknownComment(id).into());
		}

		tracing::info!("deleted comment {} and its replies", id);

		Ok(())
	}
}

#[cfg(test)]
mod test {
	use crate::test::*;

	use super::CommentService;
	use crate::route::comment::{
		model::{CommentPatch, CreateCommentInput},
		Error,
	};

	fn input(post_id: i64, parent_id: Option<i64>) -> CreateCommentInput {
		CreateCommentInput {
			content: "Nice".into(),
			post_id,
			parent_id,
		}
	}

	fn patch() -> CommentPatch {
		CommentPatch {
			content: None,
			post_id: None,
			user_id: None,
		}
	}

	#[tokio::test]
	async fn test_deleted_user_cannot_comment() {
		let harness = Harness::new();
		let (ada, _) = harness.user("Ada", &[Role::User]).await;
		let (ghost, _) = harness.user("Ghost", &[Role::User]).await;
		let post = harness.post(&ada, "Haunted").await;
		let service = harness.service::<CommentService>();

		harness.repositories().users.soft_delete(ghost.id).await.unwrap();

		assert!(matches!(
			service.create(&harness.principal(&ghost), input(post.id, None)).await,
			Err(RouteError::Route(Error::UnknownUser(id))) if id == ghost.id
		));
		assert!(harness.repositories().comments.find_by_post(post.id).await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn test_reply_levels_and_roots() {
		let harness = Harness::new();
		let (ada, _) = harness.user("Ada", &[Role::User]).await;
		let post = harness.post(&ada, "Threads").await;
		let service = harness.service::<CommentService>();
		let principal = harness.principal(&ada);

		let root = service.create(&principal, input(post.id, None)).await.unwrap();
		let reply = service
			.create(&principal, input(post.id, Some(root.id)))
			.await
			.unwrap();
		let nested = service
			.create(&principal, input(post.id, Some(reply.id)))
			.await
			.unwrap();

		assert_eq!(root.level, 0);
		assert_eq!(reply.level, 1);
		assert_eq!(nested.level, 2);

		let roots = service.list_roots_by_post(post.id).await.unwrap();

		assert_eq!(roots.len(), 1);
		assert_eq!(roots[0].id, root.id);
		assert_eq!(roots[0].replies.len(), 1);
		assert_eq!(roots[0].replies[0].id, reply.id);
		assert!(roots[0].replies[0].replies.is_empty());

		assert_eq!(service.list_by_post(post.id).await.unwrap().len(), 3);
	}

	#[tokio::test]
	async fn test_parent_must_exist_on_same_post() {
		let harness = Harness::new();
		let (ada, _) = harness.user("Ada", &[Role::User]).await;
		let first = harness.post(&ada, "First").await;
		let second = harness.post(&ada, "Second").await;
		let service = harness.service::<CommentService>();
		let principal = harness.principal(&ada);
		let parent = harness.comment(&ada, first.id, None).await;

		assert!(matches!(
			service.create(&principal, input(second.id, Some(parent.id))).await,
			Err(RouteError::Route(Error::ParentOnOtherPost(..)))
		));
		assert!(matches!(
			service.create(&principal, input(first.id, Some(999))).await,
			Err(RouteError::Route(Error::UnknownComment(999)))
		));
		assert!(matches!(
			service.create(&principal, input(999, None)).await,
			Err(RouteError::Route(Error::UnknownPost(999)))
		));
	}

	#[tokio::test]
	async fn test_delete_removes_subtree() {
		let harness = Harness::new();
		let (ada, _) = harness.user("Ada", &[Role::User]).await;
		let post = harness.post(&ada, "Threads").await;
		let service = harness.service::<CommentService>();
		let root = harness.comment(&ada, post.id, None).await;
		let reply = harness.comment(&ada, post.id, Some(&root)).await;
		let sibling = harness.comment(&ada, post.id, None).await;

		service.delete(&harness.principal(&ada), root.id).await.unwrap();

		assert!(harness.store.raw_comment(reply.id).unwrap().deleted_at.is_some());
		assert!(matches!(
			service.get(reply.id).await,
			Err(RouteError::Route(Error::UnknownComment(..)))
		));

		let remaining = service.list_by_post(post.id).await.unwrap();

		assert_eq!(remaining.len(), 1);
		assert_eq!(remaining[0].id, sibling.id);
	}

	#[tokio::test]
	async fn test_only_admin_may_reassign() {
		let harness = Harness::new();
		let (ada, _) = harness.user("Ada", &[Role::User]).await;
		let (grace, _) = harness.user("Grace", &[Role::User]).await;
		let (admin, _) = harness.user("Root", &[Role::Admin]).await;
		let first = harness.post(&ada, "First").await;
		let second = harness.post(&ada, "Second").await;
		let service = harness.service::<CommentService>();
		let root = harness.comment(&ada, first.id, None).await;

		assert!(matches!(
			service
				.update(
					&harness.principal(&grace),
					root.id,
					CommentPatch {
						content: Some("Mine now".into()),
						..patch()
					}
				)
				.await,
			Err(RouteError::Route(Error::Forbidden))
		));
		assert!(matches!(
			service
				.update(
					&harness.principal(&ada),
					root.id,
					CommentPatch {
						post_id: Some(second.id),
						..patch()
					}
				)
				.await,
			Err(RouteError::Route(Error::Forbidden))
		));

		let moved = service
			.update(
				&harness.principal(&admin),
				root.id,
				CommentPatch {
					post_id: Some(second.id),
					user_id: Some(grace.id),
					..patch()
				},
			)
			.await
			.unwrap();

		assert_eq!(moved.post_id, second.id);
		assert_eq!(moved.user.unwrap().id, grace.id);
		assert_eq!(moved.content, root.content);
	}

	#[tokio::test]
	async fn test_replies_cannot_be_moved() {
		let harness = Harness::new();
		let (admin, _) = harness.user("Root", &[Role::Admin]).await;
		let first = harness.post(&admin, "First").await;
		let second = harness.post(&admin, "Second").await;
		let service = harness.service::<CommentService>();
		let root = harness.comment(&admin, first.id, None).await;
		let reply = harness.comment(&admin, first.id, Some(&root)).await;
		let principal = harness.principal(&admin);

		for id in [root.id, reply.id] {
			assert!(matches!(
				service
					.update(
						&principal,
						id,
						CommentPatch {
							post_id: Some(second.id),
							..patch()
						}
					)
					.await,
				Err(RouteError::Route(Error::Unmovable(..)))
			));
		}
	}
}
