//! MX-record verifier backed by the system DNS resolver.

use std::time::Duration;

use async_trait::async_trait;
use hickory_resolver::TokioAsyncResolver;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::error::ResolveErrorKind;
use hickory_resolver::proto::rr::rdata::MX;
use hickory_resolver::system_conf::read_system_conf;
use tracing::{info, warn};

use crate::domain::mail::{MailCheckError, MailDomainVerifier};

/// Checks that a domain publishes at least one MX record.
///
/// A domain whose only MX record is the null MX (`.`, RFC 7505) explicitly
/// refuses mail and is treated like a domain with no records.
pub struct DnsMxVerifier {
    resolver: TokioAsyncResolver,
    timeout: Duration,
}

impl DnsMxVerifier {
    /// Builds a resolver from `/etc/resolv.conf` (or the platform equivalent),
    /// falling back to public resolvers when it cannot be read.
    ///
    /// `timeout` bounds each lookup end to end.
    pub fn from_system_conf(timeout: Duration) -> Self {
        let (config, mut opts) = match read_system_conf() {
            Ok(conf) => conf,
            Err(e) => {
                warn!(error = %e, "Cannot read system DNS configuration, using defaults");
                (ResolverConfig::default(), ResolverOpts::default())
            }
        };
        opts.timeout = timeout;
        opts.attempts = 1;

        info!(timeout_ms = timeout.as_millis() as u64, "MX check enabled");

        Self {
            resolver: TokioAsyncResolver::tokio(config, opts),
            timeout,
        }
    }
}

/// Returns true if any record routes mail somewhere.
fn has_mail_exchanger<'a>(records: impl IntoIterator<Item = &'a MX>) -> bool {
    records.into_iter().any(|mx| !mx.exchange().is_root())
}

/// Absolute form of `domain`, so the resolver skips `search` suffixes from
/// `resolv.conf`.
fn fully_qualified(domain: &str) -> String {
    if domain.ends_with('.') {
        domain.to_string()
    } else {
        format!("{domain}.")
    }
}

#[async_trait]
impl MailDomainVerifier for DnsMxVerifier {
    async fn accepts_mail(&self, domain: &str) -> Result<bool, MailCheckError> {
        let lookup = tokio::time::timeout(self.timeout, self.resolver.mx_lookup(fully_qualified(domain)))
            .await
            .map_err(|_| MailCheckError::Timeout {
                domain: domain.to_string(),
            })?;

        match lookup {
            Ok(records) => Ok(has_mail_exchanger(records.iter())),
            Err(e) => match e.kind() {
                ResolveErrorKind::NoRecordsFound { .. } => Ok(false),
                ResolveErrorKind::Timeout => Err(MailCheckError::Timeout {
                    domain: domain.to_string(),
                }),
                _ => Err(MailCheckError::Lookup {
                    domain: domain.to_string(),
                    reason: e.to_string(),
                }),
            },
        }
    }
}
