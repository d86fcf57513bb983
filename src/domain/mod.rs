//! Domain layer: user entities and the contracts the rest of the crate builds on.
//!
//! - [`entities`] - User data model
//! - [`repositories`] - Data access traits implemented by `crate::infrastructure::persistence`
//! - [`mail`] - Mail-domain verification trait used by the MX check
//!
//! Nothing here depends on HTTP or on a concrete database.

pub mod entities;
pub mod mail;
pub mod repositories;
