//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer.
//!
//! # Modules
//!
//! - [`mail`] - Mail-domain verifiers (DNS MX lookup and an accept-all fallback)
//! - [`persistence`] - PostgreSQL repository implementations

pub mod mail;
pub mod persistence;
