//! PostgreSQL repository implementations.
//!
//! Concrete implementations of domain repository traits using SQLx.
//!
//! # Repositories
//!
//! - [`PgUserRepository`] - User storage, listing and partial updates

pub mod pg_user_repository;

pub use pg_user_repository::PgUserRepository;
