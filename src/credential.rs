//! Password hashing and bearer tokens.
//!
//! Passwords are stored as Argon2 PHC strings. Tokens are HS256 JWTs carrying
//! everything needed to build a [`Principal`], so authenticated requests never
//! touch the database to find out who is calling.

use argon2::{
	password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
	Argon2,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::model::{Role, User};

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("password hashing failed: {0}")]
	Hash(#[from] argon2::password_hash::Error),
	#[error("token signing failed: {0}")]
	Sign(#[from] jsonwebtoken::errors::Error),
}

/// Why a presented token was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
	Expired,
	Invalid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
	pub sub: i64,
	pub email: String,
	pub roles: Vec<Role>,
	pub active: bool,
	pub iat: i64,
	pub exp: i64,
}

/// The authenticated caller, resolved from a bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
	pub id: i64,
	pub email: String,
	pub roles: Vec<Role>,
	pub active: bool,
}

impl Principal {
	pub fn has_role(&self, role: Role) -> bool {
		self.roles.contains(&role)
	}

	pub fn is_admin(&self) -> bool {
		self.has_role(Role::Admin)
	}

	/// Whether the caller may act on resources owned by `owner_id`.
	pub fn can_act_for(&self, owner_id: i64) -> bool {
		self.id == owner_id || self.is_admin()
	}
}

impl From<Claims> for Principal {
	fn from(claims: Claims) -> Self {
		Self {
			id: claims.sub,
			email: claims.email,
			roles: claims.roles,
			active: claims.active,
		}
	}
}

#[derive(Clone)]
pub struct Credentials {
	hasher: Argon2<'static>,
	encoding: EncodingKey,
	decoding: DecodingKey,
	ttl: Duration,
}

impl Credentials {
	pub fn new(hasher: Argon2<'static>, secret: &[u8], ttl: Duration) -> Self {
		Self {
			hasher,
			encoding: EncodingKey::from_secret(secret),
			decoding: DecodingKey::from_secret(secret),
			ttl,
		}
	}

	/// Hashes a password with a fresh random salt.
	pub fn hash_password(&self, password: &str) -> Result<String, Error> {
		let salt = SaltString::encode_b64(uuid::Uuid::new_v4().as_bytes())?;

		Ok(self
			.hasher
			.hash_password(password.as_bytes(), &salt)?
			.to_string())
	}

	/// Returns `false` for a wrong password as well as for a malformed hash.
	pub fn verify_password(&self, password: &str, hash: &str) -> bool {
		PasswordHash::new(hash).is_ok_and(|parsed| {
			self.hasher
				.verify_password(password.as_bytes(), &parsed)
				.is_ok()
		})
	}

	pub fn issue(&self, user: &User) -> Result<String, Error> {
		let now = Utc::now();
		let claims = Claims {
			sub: user.id,
			email: user.email.clone(),
			roles: user.roles.clone(),
			active: user.active,
			iat: now.timestamp(),
			exp: (now + self.ttl).timestamp(),
		};

		Ok(jsonwebtoken::encode(
			&Header::new(Algorithm::HS256),
			&claims,
			&self.encoding,
		)?)
	}

	pub fn resolve(&self, token: &str) -> Result<Principal, TokenError> {
		let data =
			jsonwebtoken::decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
				.map_err(|e| match e.kind() {
					ErrorKind::ExpiredSignature => TokenError::Expired,
					_ => TokenError::Invalid,
				})?;

		Ok(data.claims.into())
	}

	/// Token lifetime in seconds, as reported to clients.
	pub fn ttl_seconds(&self) -> i64 {
		self.ttl.num_seconds()
	}
}

#[cfg(test)]
pub mod test {
	use argon2::{Algorithm, Argon2, Params, Version};
	use chrono::{Duration, Utc};

	use super::{Credentials, TokenError};
	use crate::model::{Role, User};

	/// Credentials with deliberately weak hashing parameters, fast enough for tests.
	pub fn credentials() -> Credentials {
		credentials_with_ttl(Duration::hours(1))
	}

	pub fn credentials_with_ttl(ttl: Duration) -> Credentials {
		let params = Params::new(8, 1, 1, None).unwrap();

		Credentials::new(
			Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
			b"test-secret",
			ttl,
		)
	}

	fn user(roles: Vec<Role>) -> User {
		let now = Utc::now();

		User {
			id: 7,
			name: "Ada".into(),
			email: "ada@example.com".into(),
			photo: None,
			password: String::new(),
			active: true,
			roles,
			created_at: now,
			updated_at: now,
			deleted_at: None,
		}
	}

	#[test]
	fn test_password_round_trip() {
		let credentials = credentials();
		let hash = credentials.hash_password("hunter2hunter").unwrap();

		assert!(hash.starts_with("$argon2id$"));
		assert!(credentials.verify_password("hunter2hunter", &hash));
		assert!(!credentials.verify_password("hunter3hunter", &hash));
		assert!(!credentials.verify_password("hunter2hunter", "not a hash"));
	}

	#[test]
	fn test_hash_is_salted() {
		let credentials = credentials();

		assert_ne!(
			credentials.hash_password("same").unwrap(),
			credentials.hash_password("same").unwrap()
		);
	}

	#[test]
	fn test_token_resolves_to_principal() {
		let credentials = credentials();
		let token = credentials.issue(&user(vec![Role::Admin, Role::User])).unwrap();
		let principal = credentials.resolve(&token).unwrap();

		assert_eq!(principal.id, 7);
		assert_eq!(principal.email, "ada@example.com");
		assert!(principal.is_admin());
		assert!(principal.can_act_for(8));
	}

	#[test]
	fn test_plain_user_acts_only_for_self() {
		let credentials = credentials();
		let token = credentials.issue(&user(vec![Role::User])).unwrap();
		let principal = credentials.resolve(&token).unwrap();

		assert!(principal.can_act_for(7));
		assert!(!principal.can_act_for(8));
	}

	#[test]
	fn test_expired_token_is_refused() {
		let token = credentials_with_ttl(Duration::hours(-2))
			.issue(&user(vec![Role::User]))
			.unwrap();

		assert_eq!(credentials().resolve(&token), Err(TokenError::Expired));
	}

	#[test]
	fn test_foreign_token_is_refused() {
		let token = credentials().issue(&user(vec![Role::User])).unwrap();
		let other = Credentials::new(Argon2::default(), b"other-secret", Duration::hours(1));

		assert_eq!(other.resolve(&token), Err(TokenError::Invalid));
		assert_eq!(other.resolve("garbage"), Err(TokenError::Invalid));
	}
}
