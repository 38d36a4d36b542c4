//! Error plumbing shared by every route.
//!
//! Each resource module owns an error enum implementing [`ErrorShape`].
//! Handlers return [`RouteError<E>`], which also carries the cross-cutting
//! [`AppError`] so `?` works on repository, credential and storage results.

use std::collections::BTreeMap;

use aide::OperationOutput;
use axum::{
	body::Body,
	extract::{
		multipart::{MultipartError, MultipartRejection},
		rejection::{JsonRejection, PathRejection, QueryRejection},
		Request,
	},
	http::{header, HeaderMap, StatusCode},
	middleware::Next,
	response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::Serialize;
use tower_governor::GovernorError;

use crate::{
	credential,
	repository::{self, constraint},
	storage,
};

/// A route-specific error with a status code and a client-facing message.
///
/// The message defaults to the Display output, so it must not leak internals.
pub trait ErrorShape: std::error::Error {
	fn status(&self) -> StatusCode;

	fn message(&self) -> String {
		self.to_string()
	}
}

/// The body of every error response.
#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
	pub status: u16,
	pub message: String,
	pub timestamp: DateTime<Utc>,
	/// The request path that produced the error.
	pub path: String,
	/// Field name to message, only present for validation errors.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub validation_errors: Option<BTreeMap<String, String>>,
}

impl ErrorBody {
	pub fn new(status: StatusCode, message: String) -> Self {
		Self {
			status: status.as_u16(),
			message,
			timestamp: Utc::now(),
			path: String::new(),
			validation_errors: None,
		}
	}

	/// Renders the body. A copy is kept in the response extensions so
	/// [`attach_path`] can fill in the request path later.
	fn into_response_with(self, headers: Option<HeaderMap>) -> Response {
		let status =
			StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
		let mut response = (status, axum::Json(&self)).into_response();

		if let Some(headers) = headers {
			response.headers_mut().extend(headers);
		}

		response.extensions_mut().insert(self);
		response
	}

	fn to_json(&self) -> Vec<u8> {
		serde_json::to_vec(self).unwrap_or_default()
	}
}

/// Errors that can occur in any route.
///
/// The Display output is only logged, [`AppError::message`] is what the
/// client sees.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
	#[error("validation error: {0}")]
	Validation(#[from] validator::ValidationErrors),
	#[error("json error: {0}")]
	Json(#[from] JsonRejection),
	#[error("query error: {0}")]
	Query(#[from] QueryRejection),
	#[error("path error: {0}")]
	Path(#[from] PathRejection),
	#[error("multipart error: {0}")]
	MultipartRejection(#[from] MultipartRejection),
	#[error("multipart error: {0}")]
	Multipart(#[from] MultipartError),
	#[error("repository error: {0}")]
	Repository(#[from] repository::Error),
	#[error("credential error: {0}")]
	Credential(#[from] credential::Error),
	#[error("storage error: {0}")]
	Storage(#[from] storage::Error),
	#[error("rate limited: {0:?}")]
	RateLimit(GovernorError),
	#[error("unknown route")]
	UnknownRoute,
}

impl From<GovernorError> for AppError {
	fn from(error: GovernorError) -> Self {
		Self::RateLimit(error)
	}
}

impl AppError {
	pub fn status(&self) -> StatusCode {
		match self {
			Self::Validation(..) | Self::Query(..) | Self::Path(..) => StatusCode::BAD_REQUEST,
			Self::Json(e) => e.status(),
			Self::MultipartRejection(e) => e.status(),
			Self::Multipart(e) => e.status(),
			Self::Repository(repository::Error::Conflict(..)) => StatusCode::CONFLICT,
			Self::Repository(..) | Self::Credential(..) | Self::Storage(..) => {
				StatusCode::INTERNAL_SERVER_ERROR
			}
			Self::RateLimit(GovernorError::TooManyRequests { .. }) => StatusCode::TOO_MANY_REQUESTS,
			Self::RateLimit(GovernorError::Other { code, .. }) => *code,
			Self::RateLimit(GovernorError::UnableToExtractKey) => StatusCode::INTERNAL_SERVER_ERROR,
			Self::UnknownRoute => StatusCode::NOT_FOUND,
		}
	}

	pub fn message(&self) -> String {
		match self {
			Self::Validation(..) => "validation failed".into(),
			Self::Json(e) => e.body_text(),
			Self::Query(e) => e.body_text(),
			Self::Path(e) => e.body_text(),
			Self::MultipartRejection(e) => e.body_text(),
			Self::Multipart(e) => e.body_text(),
			Self::Repository(repository::Error::Conflict(name)) => match name.as_str() {
				constraint::USER_EMAIL => "email already taken".into(),
				constraint::POST_SLUG => "slug already taken".into(),
				constraint::TAG_NAME => "tag already exists".into(),
				_ => "resource already exists".into(),
			},
			Self::RateLimit(GovernorError::TooManyRequests { wait_time, .. }) => {
				format!("too many requests, retry in {wait_time}s")
			}
			Self::RateLimit(GovernorError::Other { msg: Some(msg), .. }) => msg.clone(),
			Self::UnknownRoute => "unknown route".into(),
			_ => "internal server error".into(),
		}
	}

	fn validation_errors(&self) -> Option<BTreeMap<String, String>> {
		let Self::Validation(errors) = self else {
			return None;
		};

		Some(
			errors
				.field_errors()
				.into_iter()
				.map(|(field, errors)| {
					let message = errors
						.iter()
						.map(|e| {
							e.message
								.as_ref()
								.map_or_else(|| e.code.to_string(), ToString::to_string)
						})
						.collect::<Vec<_>>()
						.join("; ");

					(field.to_string(), message)
				})
				.collect(),
		)
	}
}

impl IntoResponse for AppError {
	fn into_response(self) -> Response {
		let status = self.status();

		if status.is_server_error() {
			tracing::error!("{}", self);
		}

		let mut body = ErrorBody::new(status, self.message());
		body.validation_errors = self.validation_errors();

		let headers = match self {
			Self::RateLimit(
				GovernorError::TooManyRequests { headers, .. } | GovernorError::Other { headers, .. },
			) => headers,
			_ => None,
		};

		body.into_response_with(headers)
	}
}

impl OperationOutput for AppError {
	type Inner = ErrorBody;
}

/// The error type returned by handlers of a resource with errors `E`.
#[derive(Debug)]
pub enum RouteError<E> {
	Route(E),
	App(AppError),
}

impl<E: std::fmt::Display> std::fmt::Display for RouteError<E> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Route(error) => error.fmt(f),
			Self::App(error) => error.fmt(f),
		}
	}
}

impl<E> RouteError<E> {
	/// Converts the route-specific error, for services delegating to another resource.
	pub fn map<F>(self, f: impl FnOnce(E) -> F) -> RouteError<F> {
		match self {
			Self::Route(error) => RouteError::Route(f(error)),
			Self::App(error) => RouteError::App(error),
		}
	}
}

impl<E: ErrorShape> From<E> for RouteError<E> {
	fn from(error: E) -> Self {
		Self::Route(error)
	}
}

impl<E> From<AppError> for RouteError<E> {
	fn from(error: AppError) -> Self {
		Self::App(error)
	}
}

macro_rules! from_app_error {
	($($ty:ty),+ $(,)?) => {
		$(
			impl<E> From<$ty> for RouteError<E> {
				fn from(error: $ty) -> Self {
					Self::App(error.into())
				}
			}
		)+
	};
}

from_app_error!(
	validator::ValidationErrors,
	repository::Error,
	credential::Error,
	storage::Error,
	MultipartError,
);

impl<E: ErrorShape> IntoResponse for RouteError<E> {
	fn into_response(self) -> Response {
		match self {
			Self::Route(error) => {
				let status = error.status();

				if status.is_server_error() {
					tracing::error!("{}", error);
				}

				ErrorBody::new(status, error.message()).into_response_with(None)
			}
			Self::App(error) => error.into_response(),
		}
	}
}

impl<E> OperationOutput for RouteError<E> {
	type Inner = ErrorBody;
}

/// Middleware filling in the request path of error bodies.
pub async fn attach_path(request: Request, next: Next) -> Response {
	let path = request.uri().path().to_owned();
	let mut response = next.run(request).await;

	let Some(mut body) = response.extensions_mut().remove::<ErrorBody>() else {
		return response;
	};

	body.path = path;

	let (mut parts, _) = response.into_parts();
	parts.headers.remove(header::CONTENT_LENGTH);

	Response::from_parts(parts, Body::from(body.to_json()))
}

/// Fallback handler for requests that match no route.
pub async fn unknown_route() -> AppError {
	AppError::UnknownRoute
}
