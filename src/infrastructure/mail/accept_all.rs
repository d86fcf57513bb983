//! No-op verifier used when the MX check is disabled.

use async_trait::async_trait;
use tracing::debug;

use crate::domain::mail::{MailCheckError, MailDomainVerifier};

/// A verifier that accepts every domain without touching the network.
///
/// # Use Cases
///
/// - Development environments without outbound DNS
/// - Testing scenarios where the MX check should be bypassed
/// - Batch imports of addresses that were verified elsewhere
pub struct AcceptAllVerifier;

impl AcceptAllVerifier {
    pub fn new() -> Self {
        debug!("Using AcceptAllVerifier (MX check disabled)");
        Self
    }
}

impl Default for AcceptAllVerifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MailDomainVerifier for AcceptAllVerifier {
    async fn accepts_mail(&self, _domain: &str) -> Result<bool, MailCheckError> {
        Ok(true)
    }
}
