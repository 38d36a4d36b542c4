use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
	credential::Principal,
	repository::{PageRequest, UserRepository},
	response::UserResponse,
	route::{
		auth::{self, model::normalize_email, service::Registration, AuthService},
		model::blob_name,
	},
	storage::{self, BlobStore},
	AppState,
};

use super::{
	model::{CreateUserInput, UpdateMeForm, UserPatch},
	Error, RouteError,
};

const PHOTO_FOLDER: &str = "users";

#[derive(Clone)]
pub struct UserService {
	users: Arc<dyn UserRepository>,
	auth: AuthService,
	storage: Arc<dyn BlobStore>,
}

impl FromRef<AppState> for UserService {
	fn from_ref(state: &AppState) -> Self {
		Self {
			users: state.repositories.users.clone(),
			auth: AuthService::from_ref(state),
			storage: state.storage.clone(),
		}
	}
}

impl UserService {
	pub async fn list(&self, page: PageRequest) -> Result<Vec<UserResponse>, RouteError> {
		let users = self.users.find_all(page).await?;

		Ok(users.into_iter().map(UserResponse::from).collect())
	}

	pub async fn get(&self, id: i64) -> Result<UserResponse, RouteError> {
		let user = self
			.users
			.find_by_id(id)
			.await?
			.ok_or(Error::UnknownUser(id))?;

		Ok(user.into())
	}

	pub async fn create(
		&self,
		principal: &Principal,
		input: CreateUserInput,
	) -> Result<UserResponse, RouteError> {
		if !principal.is_admin() {
			return Err(Error::Forbidden.into());
		}

		let user = self
			.auth
			.register(Registration {
				name: input.name,
				email: input.email,
				password: input.password,
				password_confirm: input.password_confirm,
				photo: input.photo,
				roles: input.roles,
			})
			.await
			.map_err(|e| e.map(Error::Auth))?;

		Ok(user.into())
	}

	/// Applies the fields present in `patch`. The email stays unique among
	/// live accounts.
	pub async fn update(
		&self,
		principal: &Principal,
		id: i64,
		patch: UserPatch,
	) -> Result<UserResponse, RouteError> {
		if !principal.can_act_for(id) || (patch.active.is_some() && !principal.is_admin()) {
			return Err(Error::Forbidden.into());
		}

		let mut user = self
			.users
			.find_by_id(id)
			.await?
			.ok_or(Error::UnknownUser(id))?;

		if let Some(name) = patch.name {
			user.name = name.trim().to_owned();
		}

		if let Some(email) = patch.email {
			self.change_email(&mut user, &email).await?;
		}

		if let Some(photo) = patch.photo {
			user.photo = Some(photo);
		}

		if let Some(active) = patch.active {
			user.active = active;
		}

		let user = self
			.users
			.update(&user)
			.await?
			.ok_or(Error::UnknownUser(id))?;

		tracing::info!("updated user {}", user.id);

		Ok(user.into())
	}

	pub async fn delete(&self, principal: &Principal, id: i64) -> Result<(), RouteError> {
		if !principal.can_act_for(id) {
			return Err(Error::Forbidden.into());
		}

		if !self.users.soft_delete(id).await? {
			return Err(Error::UnknownUser(id).into());
		}

		tracing::info!("deleted user {}", id);

		Ok(())
	}

	/// Updates the caller's own profile, replacing the photo when one is uploaded.
	pub async fn update_me(
		&self,
		principal: &Principal,
		form: UpdateMeForm,
	) -> Result<UserResponse, RouteError> {
		let mut user = self
			.users
			.find_by_id(principal.id)
			.await?
			.ok_or(Error::UnknownUser(principal.id))?;

		if let Some(name) = form.name {
			user.name = name.trim().to_owned();
		}

		if let Some(email) = form.email {
			self.change_email(&mut user, &email).await?;
		}

		let mut stored = None;
		let mut replaced = None;

		if let Some(upload) = form.photo {
			let name = blob_name("user", user.id, &upload).ok_or(Error::UnsupportedImage)?;
			let url = self.storage.store(PHOTO_FOLDER, &name, &upload.bytes).await?;

			replaced = user.photo.replace(url.clone());
			stored = Some(url);
		}

		let updated = self
			.users
			.update(&user)
			.await
			.map_err(RouteError::from)
			.and_then(|user| user.ok_or_else(|| Error::UnknownUser(principal.id).into()));

		// The row keeps its old photo unless the write went through.
		let user = match updated {
			Ok(user) => user,
			Err(e) => {
				if let Some(url) = stored {
					storage::discard(self.storage.as_ref(), &url).await;
				}

				return Err(e);
			}
		};

		if let Some(previous) = replaced {
			storage::discard(self.storage.as_ref(), &previous).await;
		}

		Ok(user.into())
	}

	async fn change_email(
		&self,
		user: &mut crate::model::User,
		email: &str,
	) -> Result<(), RouteError> {
		let email = normalize_email(email);

		if email != user.email && self.users.exists_by_email(&email).await? {
			return Err(Error::Auth(auth::Error::EmailTaken).into());
		}

		user.email = email;
		Ok(())
	}
}
