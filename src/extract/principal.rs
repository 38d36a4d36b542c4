use aide::OperationInput;
use axum::{
	extract::{FromRef, FromRequestParts},
	http::{header, request},
};

use crate::{
	credential::{Credentials, Principal, TokenError},
	error::RouteError,
	openapi::SECURITY_SCHEME_BEARER,
	route::auth,
};

pub const AUTHORIZATION_PREFIX: &str = "Bearer ";

/// Resolves the caller from an `Authorization: Bearer <token>` header.
///
/// Missing, malformed and expired tokens are rejected with 401, as are
/// tokens issued to a deactivated account.
///
/// ```rust
/// async fn route(principal: Principal) {
///   println!("{}", principal.id);
/// }
/// ```
#[axum::async_trait]
impl<S> FromRequestParts<S> for Principal
where
	Credentials: FromRef<S>,
	S: Sync + Send,
{
	type Rejection = RouteError<auth::Error>;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let header = parts
			.headers
			.get(header::AUTHORIZATION)
			.ok_or(auth::Error::MissingToken)?;

		let token = header
			.to_str()
			.ok()
			.and_then(|value| value.strip_prefix(AUTHORIZATION_PREFIX))
			.map(str::trim)
			.filter(|token| !token.is_empty())
			.ok_or(auth::Error::InvalidToken)?;

		let principal = Credentials::from_ref(state)
			.resolve(token)
			.map_err(|e| match e {
				TokenError::Expired => auth::Error::ExpiredToken,
				TokenError::Invalid => auth::Error::InvalidToken,
			})?;

		if !principal.active {
			return Err(auth::Error::AccountDisabled.into());
		}

		Ok(principal)
	}
}

impl OperationInput for Principal {
	/// Adds the bearer token requirement to the `OpenAPI` operation.
	fn operation_input(_ctx: &mut aide::gen::GenContext, operation: &mut aide::openapi::Operation) {
		operation.security.push(
			[(SECURITY_SCHEME_BEARER.to_string(), Vec::new())]
				.into_iter()
				.collect(),
		);
	}
}
