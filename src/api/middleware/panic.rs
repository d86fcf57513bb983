//! Converts handler panics into the regular `500` error envelope.

use std::any::Any;

use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::error::AppError;

/// Panic handler for `tower_http::catch_panic::CatchPanicLayer::custom`.
///
/// The panic payload is logged, never returned to the client.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let reason = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic payload".to_string()
    };

    AppError::internal("Handler panicked", json!({ "reason": reason })).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_panic_becomes_internal_error() {
        let response = handle_panic(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = handle_panic(Box::new(String::from("boom")));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
