//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /health`  - Health check: database (public, not rate limited)
//! - `/users*`       - User API (rate limited per client IP)
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Panic recovery** - Panics become the regular `500` error envelope
//! - **Body limit** - Request bodies above the configured size are rejected
//! - **Rate limiting** - Per-IP token bucket (configurable for proxy deployments)
//! - **Path normalization** - Trailing slash handling

use crate::api;
use crate::api::handlers::health_handler;
use crate::api::middleware::{panic, rate_limit, tracing};
use crate::error::AppError;
use crate::state::AppState;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use serde_json::json;
use tower::Layer;
use tower_governor::key_extractor::{PeerIpKeyExtractor, SmartIpKeyExtractor};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Constructs the application router with all routes and middleware.
///
/// # Arguments
///
/// - `state` - shared application state injected into all handlers
/// - `behind_proxy` - when `true`, rate limiting reads client IP from
///   `X-Forwarded-For` / `X-Real-IP` headers instead of the peer socket address;
///   enable only when the service runs behind a trusted reverse proxy
/// - `max_body_bytes` - largest accepted request body
pub fn app_router(state: AppState, behind_proxy: bool, max_body_bytes: usize) -> NormalizePath<Router> {
    let users = api::routes::user_routes();
    let users = if behind_proxy {
        users.layer(rate_limit::layer(SmartIpKeyExtractor))
    } else {
        users.layer(rate_limit::layer(PeerIpKeyExtractor))
    };

    let router = Router::new()
        .route("/health", get(health_handler))
        .merge(users)
        .fallback(route_not_found)
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(CatchPanicLayer::custom(panic::handle_panic))
        .layer(tracing::layer());

    NormalizePathLayer::trim_trailing_slash().layer(router)
}

async fn route_not_found() -> AppError {
    AppError::not_found("Route not found", json!({}))
}
