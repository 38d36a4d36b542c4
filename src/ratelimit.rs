use std::{sync::Arc, time::Duration};

use axum::{
	body::Body,
	middleware,
	response::{IntoResponse, Response},
	Router,
};
use governor::{
	clock::QuantaInstant,
	middleware::{RateLimitingMiddleware, StateInformationMiddleware},
};
use tower_governor::{
	governor::{GovernorConfig, GovernorConfigBuilder},
	key_extractor::{KeyExtractor, PeerIpKeyExtractor},
	GovernorError, GovernorLayer,
};

use crate::error::{self, AppError};

pub type Config = GovernorConfig<PeerIpKeyExtractor, StateInformationMiddleware>;

/// 10 requests per second per peer address, with bursts of up to 50.
pub fn default() -> Arc<Config> {
	quota(10, 50)
}

/// Replenishes one request every `period` seconds, holding at most `burst`.
pub fn quota(period: u64, burst: u32) -> Arc<Config> {
	Arc::new(
		GovernorConfigBuilder::default()
			.per_second(period)
			.burst_size(burst)
			.use_headers()
			.error_handler(error_handler)
			.finish()
			.expect("rate limit quota is non-zero"),
	)
}

fn error_handler(error: GovernorError) -> Response<Body> {
	AppError::from(error).into_response()
}

/// Puts the limiter in front of `app`. Rejections never reach the router, so
/// the error path is attached again out here.
pub fn limit(app: Router, config: Arc<Config>) -> Router {
	app.layer(GovernorLayer { config })
		.layer(middleware::from_fn(error::attach_path))
}

/// Periodically drops limiter state for peers that have gone quiet.
pub fn cleanup_old_limits<T, M>(configs: &[&Arc<GovernorConfig<T, M>>])
where
	T: KeyExtractor,
	<T as KeyExtractor>::Key: Send + Sync + 'static,
	M: RateLimitingMiddleware<QuantaInstant> + Send + Sync + 'static,
{
	let limiters = configs
		.iter()
		.map(|config| config.limiter().clone())
		.collect::<Vec<_>>();
	let interval = Duration::from_secs(60);

	std::thread::spawn(move || loop {
		std::thread::sleep(interval);

		for limiter in &limiters {
			tracing::debug!("rate limiting storage size: {}", limiter.len());

			limiter.retain_recent();
		}
	});
}

#[cfg(test)]
mod test {
	use std::net::SocketAddr;

	use axum::{
		extract::{ConnectInfo, Request},
		middleware::{self, Next},
	};

	use crate::test::*;

	#[tokio::test]
	async fn test_rejection_carries_path() {
		let harness = Harness::new();
		let peer = SocketAddr::from(([127, 0, 0, 1], 4000));
		let app = super::limit(crate::app(harness.state.clone()), super::quota(60, 1)).layer(
			middleware::from_fn(move |mut request: Request, next: Next| async move {
				request.extensions_mut().insert(ConnectInfo(peer));
				next.run(request).await
			}),
		);
		let server = TestServer::new(app).unwrap();

		assert_eq!(server.get("/api/v1/tags").await.status_code(), StatusCode::OK);

		let response = server.get("/api/v1/tags").await;

		assert_eq!(response.status_code(), StatusCode::TOO_MANY_REQUESTS);
		assert_eq!(response.json::<Value>()["path"], "/api/v1/tags");
	}
}
