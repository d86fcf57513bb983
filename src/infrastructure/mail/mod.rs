//! Mail-domain verification for the MX check.
//!
//! Provides two [`MailDomainVerifier`](crate::domain::mail::MailDomainVerifier)
//! implementations:
//! - [`DnsMxVerifier`] - MX lookup via the system resolver
//! - [`AcceptAllVerifier`] - No-op implementation for disabled checks

mod accept_all;
mod dns_mx;

pub use accept_all::AcceptAllVerifier;
pub use dns_mx::DnsMxVerifier;
