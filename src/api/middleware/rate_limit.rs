//! Rate limiting middleware using token bucket algorithm.

use axum::{
    body::Body,
    http::{Response, header},
    response::IntoResponse,
};
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use serde_json::json;
use std::sync::Arc;
use tower_governor::{
    GovernorError, GovernorLayer, governor::GovernorConfigBuilder, key_extractor::KeyExtractor,
};

use crate::error::AppError;

/// One request of quota is replenished every 200 ms (5 per second).
const REPLENISH_MS: u64 = 200;

/// Requests a client may fire in a burst before being throttled.
const BURST_SIZE: u32 = 50;

/// Creates a per-client rate limiter for the user endpoints.
///
/// # Limits
///
/// - **Rate**: 5 requests per second (one every 200 ms)
/// - **Burst**: 50 requests
///
/// Requests exceeding the limit receive `429 Too Many Requests` in the usual
/// error envelope, with `Retry-After` set.
///
/// # Key Extraction
///
/// `key` decides what identifies a client: pass `PeerIpKeyExtractor` to use the
/// socket peer address, or `SmartIpKeyExtractor` to honour `X-Forwarded-For` /
/// `X-Real-IP` behind a trusted reverse proxy.
///
/// # Example
///
/// ```rust,ignore
/// let app = Router::new()
///     .route("/users", post(create_user_handler))
///     .layer(rate_limit::layer(PeerIpKeyExtractor));
/// ```
pub fn layer<K>(key: K) -> GovernorLayer<K, NoOpMiddleware<QuantaInstant>, axum::body::Body>
where
    K: KeyExtractor,
{
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_millisecond(REPLENISH_MS)
            .burst_size(BURST_SIZE)
            .key_extractor(key)
            .finish()
            .expect("rate limit period and burst size are non-zero"),
    );

    GovernorLayer::new(governor_conf).error_handler(rejection_response)
}

/// Renders governor rejections as [`AppError`] responses.
fn rejection_response(error: GovernorError) -> Response<Body> {
    match error {
        GovernorError::TooManyRequests { wait_time, headers } => {
            let mut response = AppError::too_many_requests(
                "Too many requests",
                json!({ "retry_after_secs": wait_time }),
            )
            .into_response();

            response.headers_mut().extend(headers.unwrap_or_default());
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, header::HeaderValue::from(wait_time));
            response
        }
        GovernorError::UnableToExtractKey => {
            tracing::warn!("Rate limiter could not determine client IP");
            AppError::internal("Unable to determine client address", json!({})).into_response()
        }
        GovernorError::Other { code, msg, headers } => {
            let mut response = AppError::internal(
                "Rate limiter error",
                json!({ "status": code.as_u16(), "reason": msg }),
            )
            .into_response();
            response.headers_mut().extend(headers.unwrap_or_default());
            response
        }
    }
}
