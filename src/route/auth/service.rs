use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
	credential::{Credentials, Principal},
	model::{NewUser, Role, User},
	repository::UserRepository,
	response::UserResponse,
	AppState,
};

use super::{
	model::{normalize_email, AuthResponse, SignInInput, SignUpInput},
	Error, RouteError,
};

/// Everything needed to open an account.
pub struct Registration {
	pub name: String,
	pub email: String,
	pub password: String,
	pub password_confirm: String,
	pub photo: Option<String>,
	pub roles: Vec<Role>,
}

#[derive(Clone)]
pub struct AuthService {
	users: Arc<dyn UserRepository>,
	credentials: Credentials,
}

impl FromRef<AppState> for AuthService {
	fn from_ref(state: &AppState) -> Self {
		Self {
			users: state.repositories.users.clone(),
			credentials: state.credentials.clone(),
		}
	}
}

impl AuthService {
	/// Creates an account after checking the password confirmation and
	/// that the email is free.
	pub async fn register(&self, registration: Registration) -> Result<User, RouteError> {
		if registration.password != registration.password_confirm {
			return Err(Error::PasswordMismatch.into());
		}

		let email = normalize_email(&registration.email);

		if self.users.exists_by_email(&email).await? {
			return Err(Error::EmailTaken.into());
		}

		let password = self.credentials.hash_password(&registration.password)?;
		let roles = if registration.roles.is_empty() {
			vec![Role::User]
		} else {
			registration.roles
		};

		let user = self
			.users
			.create(NewUser {
				name: registration.name.trim().to_owned(),
				email,
				photo: registration.photo,
				password,
				roles,
			})
			.await?;

		tracing::info!("registered user {} ({})", user.id, user.email);

		Ok(user)
	}

	pub async fn sign_up(&self, input: SignUpInput) -> Result<UserResponse, RouteError> {
		let user = self
			.register(Registration {
				name: input.name,
				email: input.email,
				password: input.password,
				password_confirm: input.password_confirm,
				photo: None,
				roles: vec![Role::User],
			})
			.await?;

		Ok(user.into())
	}

	pub async fn sign_in(&self, input: SignInInput) -> Result<AuthResponse, RouteError> {
		let user = self
			.users
			.find_by_email(&normalize_email(&input.email))
			.await?
			.filter(|user| self.credentials.verify_password(&input.password, &user.password))
			.ok_or(Error::InvalidEmailOrPassword)?;

		if !user.active {
			return Err(Error::AccountDisabled.into());
		}

		let token = self.credentials.issue(&user)?;

		tracing::debug!("issued token for user {}", user.id);

		Ok(AuthResponse {
			token,
			token_type: "Bearer".into(),
			expires_in: self.credentials.ttl_seconds(),
			user: user.into(),
		})
	}

	/// The profile of the caller. Fails when the account was deleted after
	/// the token was issued.
	pub async fn current_user(&self, principal: &Principal) -> Result<UserResponse, RouteError> {
		let user = self
			.users
			.find_by_id(principal.id)
			.await?
			.ok_or(Error::UnknownAccount)?;

		Ok(user.into())
	}
}

#[cfg(test)]
mod test {
	use crate::test::*;

	use super::{AuthService, Registration};
	use crate::route::auth::{model::SignUpInput, Error};

	fn sign_up_input(email: &str) -> SignUpInput {
		SignUpInput {
			name: "Ada".into(),
			email: email.into(),
			password: PASSWORD.into(),
			password_confirm: PASSWORD.into(),
		}
	}

	#[tokio::test]
	async fn test_sign_up_assigns_only_user_role() {
		let harness = Harness::new();
		let service = harness.service::<AuthService>();

		let profile = service.sign_up(sign_up_input("Ada@Example.com")).await.unwrap();

		assert_eq!(profile.roles, vec![Role::User]);
		assert_eq!(profile.email, "ada@example.com");
	}

	#[tokio::test]
	async fn test_duplicate_email_is_rejected_case_insensitively() {
		let harness = Harness::new();
		let service = harness.service::<AuthService>();

		service.sign_up(sign_up_input("ada@example.com")).await.unwrap();

		assert!(matches!(
			service.sign_up(sign_up_input(" ADA@example.com")).await,
			Err(RouteError::Route(Error::EmailTaken))
		));
	}

	#[tokio::test]
	async fn test_register_defaults_to_user_role() {
		let harness = Harness::new();
		let user = harness
			.service::<AuthService>()
			.register(Registration {
				name: "Ada".into(),
				email: "ada@example.com".into(),
				password: PASSWORD.into(),
				password_confirm: PASSWORD.into(),
				photo: None,
				roles: Vec::new(),
			})
			.await
			.unwrap();

		assert_eq!(user.roles, vec![Role::User]);
		assert_ne!(user.password, PASSWORD);
	}

	#[tokio::test]
	async fn test_disabled_account_cannot_sign_in() {
		let harness = Harness::new();
		let (mut user, _) = harness.user("Ada", &[Role::User]).await;

		user.active = false;
		harness.repositories().users.update(&user).await.unwrap();

		let result = harness
			.service::<AuthService>()
			.sign_in(crate::route::auth::model::SignInInput {
				email: user.email,
				password: PASSWORD.into(),
			})
			.await;

		assert!(matches!(result, Err(RouteError::Route(Error::AccountDisabled))));
	}
}
