//! Shared application state.

use std::sync::Arc;

use crate::application::services::UserService;
use crate::domain::mail::MailDomainVerifier;
use crate::domain::repositories::UserRepository;
use crate::validation::ValidationContext;

/// State cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    /// Dependencies of asynchronous validation rules (MX check).
    pub validation: ValidationContext,
}

impl AppState {
    pub fn new(
        repository: Arc<dyn UserRepository>,
        mail_verifier: Arc<dyn MailDomainVerifier>,
    ) -> Self {
        Self {
            user_service: Arc::new(UserService::new(repository)),
            validation: ValidationContext::new(mail_verifier),
        }
    }
}
