//! MX check: an email is only accepted if its domain can receive mail.

use std::collections::{HashMap, HashSet};

use futures::future::join_all;

use super::FieldError;
use crate::domain::mail::MailDomainVerifier;

/// Returns the domain part of an address (after the last `@`), lowercased.
pub fn email_domain(email: &str) -> Option<String> {
    let (_, domain) = email.rsplit_once('@')?;
    let domain = domain.trim().trim_end_matches('.');

    if domain.is_empty() {
        None
    } else {
        Some(domain.to_ascii_lowercase())
    }
}

/// Asks `verifier` whether the domain of `email` accepts mail.
///
/// Resolver failures reject the address as well; they are logged so operators
/// can tell a DNS outage from bad input.
pub async fn check_email_domain(
    email: &str,
    verifier: &dyn MailDomainVerifier,
) -> Result<(), FieldError> {
    let Some(domain) = email_domain(email) else {
        return Err(rejected());
    };

    check_domain(&domain, verifier).await
}

async fn check_domain(domain: &str, verifier: &dyn MailDomainVerifier) -> Result<(), FieldError> {
    match verifier.accepts_mail(domain).await {
        Ok(true) => Ok(()),
        Ok(false) => {
            tracing::debug!(domain, "Email domain has no MX record");
            Err(rejected())
        }
        Err(e) => {
            tracing::warn!(domain, error = %e, "MX lookup failed");
            Err(rejected())
        }
    }
}

fn rejected() -> FieldError {
    FieldError::new("mx", "Email domain does not accept mail")
}

/// Verdicts for every distinct domain of a batch, resolved concurrently.
#[derive(Default)]
pub struct DomainVerdicts {
    seen: HashMap<String, Result<(), FieldError>>,
}

impl DomainVerdicts {
    /// Looks up each distinct domain among `emails` once, all at the same time,
    /// so a batch waits for its slowest domain instead of the sum of them.
    pub async fn resolve<'a, I>(emails: I, verifier: &dyn MailDomainVerifier) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let domains: HashSet<String> = emails.into_iter().filter_map(email_domain).collect();

        let lookups = domains.into_iter().map(|domain| async move {
            let verdict = check_domain(&domain, verifier).await;
            (domain, verdict)
        });

        Self {
            seen: join_all(lookups).await.into_iter().collect(),
        }
    }

    /// Verdict for the domain of `email`. Addresses without a domain, or whose
    /// domain was not part of the batch, are rejected.
    pub fn verdict(&self, email: &str) -> Result<(), FieldError> {
        email_domain(email)
            .and_then(|domain| self.seen.get(&domain).cloned())
            .unwrap_or_else(|| Err(rejected()))
    }

    /// Number of distinct domains resolved.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
