//! Data Transfer Objects for API requests and responses.
//!
//! Request DTOs are deserialized with Serde and checked with
//! [`crate::validation::validate_all`] before reaching a handler.

pub mod health;
pub mod user;
pub mod user_list;
