//! Declarative input validation.
//!
//! Field rules are declared on request DTOs with `validator` derive attributes
//! (required, email, length, nested containers, custom selects). Transformations
//! such as trimming happen earlier, during deserialization (see [`trim`]).
//! Rules that need I/O, like the MX check on an email domain, live behind
//! [`AsyncValidate`] and run after the synchronous pass.
//!
//! [`validate_all`] runs both passes and reports every failure as a flat
//! [`FieldErrors`] map keyed by field path (`languages[0].level`).

pub mod mail;
pub mod rules;
pub mod trim;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

use crate::domain::mail::MailDomainVerifier;

/// A single failed rule on a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub code: String,
    pub message: String,
}

impl FieldError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    fn from_validator(error: &ValidationError) -> Self {
        let code = error.code.to_string();
        let message = error
            .message
            .as_ref()
            .map(|m| m.to_string())
            .unwrap_or_else(|| default_message(&code).to_string());

        Self { code, message }
    }
}

fn default_message(code: &str) -> &'static str {
    match code {
        "required" => "This field is required",
        "email" => "Must be a valid email address",
        "length" => "Has an invalid length",
        "range" => "Is out of range",
        _ => "Is invalid",
    }
}

/// Validation failures keyed by field path, in path order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<FieldError>>);

impl FieldErrors {
    /// Flattens `validator` output, turning nested structs and lists into
    /// `parent.child` and `parent[index]` paths.
    pub fn from_validator(errors: &ValidationErrors) -> Self {
        let mut out = Self::default();
        out.absorb(errors, "");
        out
    }

    fn absorb(&mut self, errors: &ValidationErrors, prefix: &str) {
        for (field, kind) in errors.errors() {
            let path = join_path(prefix, wire_name(field));
            match kind {
                ValidationErrorsKind::Field(list) => {
                    for error in list {
                        self.add(path.clone(), FieldError::from_validator(error));
                    }
                }
                ValidationErrorsKind::Struct(inner) => self.absorb(inner, &path),
                ValidationErrorsKind::List(items) => {
                    for (index, inner) in items {
                        self.absorb(inner, &format!("{path}[{index}]"));
                    }
                }
            }
        }
    }

    pub fn add(&mut self, path: impl Into<String>, error: FieldError) {
        self.0.entry(path.into()).or_default().push(error);
    }

    /// Returns true if `path` already has at least one failure.
    pub fn has(&self, path: &str) -> bool {
        self.0.contains_key(path)
    }

    pub fn get(&self, path: &str) -> Option<&[FieldError]> {
        self.0.get(path).map(Vec::as_slice)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Moves every failure of `other` under `prefix`.
    pub fn merge_under(&mut self, prefix: &str, other: FieldErrors) {
        for (path, errors) in other.0 {
            self.0
                .entry(join_path(prefix, &path))
                .or_default()
                .extend(errors);
        }
    }
}

/// Struct fields whose JSON name differs from the Rust one (`#[serde(rename)]`).
/// `validator` reports the Rust name; clients must see the JSON one.
const WIRE_NAMES: &[(&str, &str)] = &[("user_type", "type")];

fn wire_name(field: &str) -> &str {
    WIRE_NAMES
        .iter()
        .find(|(rust, _)| *rust == field)
        .map_or(field, |&(_, wire)| wire)
}

fn join_path(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{prefix}.{field}")
    }
}

/// Shared dependencies for rules that go beyond the value itself.
#[derive(Clone)]
pub struct ValidationContext {
    mail_verifier: Arc<dyn MailDomainVerifier>,
}

impl ValidationContext {
    pub fn new(mail_verifier: Arc<dyn MailDomainVerifier>) -> Self {
        Self { mail_verifier }
    }

    pub fn mail_verifier(&self) -> &dyn MailDomainVerifier {
        self.mail_verifier.as_ref()
    }
}

/// Rules that must await something (DNS, database) before deciding.
///
/// Implementations receive the failures of the synchronous pass so they can skip
/// fields that are already invalid.
#[async_trait]
pub trait AsyncValidate: Validate + Send + Sync {
    async fn validate_async(&self, _ctx: &ValidationContext, _errors: &mut FieldErrors) {}
}

/// Runs the synchronous rules, then the asynchronous ones.
///
/// # Errors
///
/// Returns every failed rule, grouped by field path.
pub async fn validate_all<T>(value: &T, ctx: &ValidationContext) -> Result<(), FieldErrors>
where
    T: AsyncValidate,
{
    let mut errors = match value.validate() {
        Ok(()) => FieldErrors::default(),
        Err(e) => FieldErrors::from_validator(&e),
    };

    value.validate_async(ctx, &mut errors).await;

    if errors.is_empty() {
        Ok(())
    } else {
        tracing::debug!(fields = errors.len(), "Input rejected by validation");
        Err(errors)
    }
}
