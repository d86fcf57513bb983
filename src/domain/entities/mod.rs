//! Core domain entities.
//!
//! - [`User`] - A stored user
//! - [`NewUser`] - Validated input for creating (or fully replacing) a user
//! - [`UserPatch`] - Partial update, `None` fields are left unchanged
//! - [`UserFilter`] - Listing criteria

pub mod user;

pub use user::{LanguageLevel, LanguageSkill, NewUser, User, UserFilter, UserPatch, UserRole};
