//! Extractors that deserialize and validate input in one step.
//!
//! Handlers receiving [`ValidatedBody`] or [`ValidatedQuery`] only ever see
//! values that passed [`validate_all`]; every failure short-circuits into a
//! `400 validation_error` response.

use axum::{
    Form, Json,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::{header, request::Parts},
};
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::error::AppError;
use crate::state::AppState;
use crate::validation::{AsyncValidate, validate_all};

/// Request body, read as JSON or as a urlencoded form depending on
/// `Content-Type`, then validated.
#[derive(Debug, Clone)]
pub struct ValidatedBody<T>(pub T);

impl<T> FromRequest<AppState> for ValidatedBody<T>
where
    T: DeserializeOwned + AsyncValidate + 'static,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let value = if is_form(&req) {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(|e| invalid_input("Invalid request body", e.body_text()))?;
            value
        } else {
            let Json(value) = Json::<T>::from_request(req, state)
                .await
                .map_err(|e| invalid_input("Invalid request body", e.body_text()))?;
            value
        };

        validate_all(&value, &state.validation).await?;

        Ok(Self(value))
    }
}

/// Query string, deserialized then validated.
#[derive(Debug, Clone)]
pub struct ValidatedQuery<T>(pub T);

impl<T> FromRequestParts<AppState> for ValidatedQuery<T>
where
    T: DeserializeOwned + AsyncValidate + 'static,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| invalid_input("Invalid query string", e.body_text()))?;

        validate_all(&value, &state.validation).await?;

        Ok(Self(value))
    }
}

/// Path parameters. Unparseable segments (`/users/abc`) are reported in the
/// usual error envelope.
#[derive(Debug, Clone)]
pub struct ValidatedPath<T>(pub T);

impl<T> FromRequestParts<AppState> for ValidatedPath<T>
where
    T: DeserializeOwned + Send + 'static,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| invalid_input("Invalid path parameter", e.body_text()))?;

        Ok(Self(value))
    }
}

fn is_form(req: &Request) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"))
}

fn invalid_input(message: &str, reason: String) -> AppError {
    AppError::bad_request(message, json!({ "reason": reason }))
}
