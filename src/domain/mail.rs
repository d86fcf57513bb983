//! Mail-domain verification contract used by the MX check.

use async_trait::async_trait;

/// Errors that can occur while asking DNS about a mail domain.
#[derive(Debug, thiserror::Error)]
pub enum MailCheckError {
    #[error("DNS lookup for {domain} failed: {reason}")]
    Lookup { domain: String, reason: String },

    #[error("DNS lookup for {domain} timed out")]
    Timeout { domain: String },
}

/// Decides whether a domain can receive mail.
///
/// # Implementations
///
/// - [`crate::infrastructure::mail::DnsMxVerifier`] - MX lookup through the system resolver
/// - [`crate::infrastructure::mail::AcceptAllVerifier`] - Always accepts (check disabled)
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailDomainVerifier: Send + Sync {
    /// Returns `Ok(true)` if `domain` publishes at least one usable MX record.
    ///
    /// # Errors
    ///
    /// Returns [`MailCheckError`] if the resolver could not answer.
    async fn accepts_mail(&self, domain: &str) -> Result<bool, MailCheckError>;
}
