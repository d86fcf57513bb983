//! User management service.

use std::sync::Arc;

use serde_json::json;

use crate::domain::entities::{NewUser, User, UserFilter, UserPatch};
use crate::domain::repositories::UserRepository;
use crate::error::AppError;

/// One page of users plus the size of the whole result set.
#[derive(Debug, Clone)]
pub struct UserPage {
    pub items: Vec<User>,
    pub total: i64,
}

/// Service for creating, listing and updating users.
///
/// Input reaching this service has already passed field validation; the service
/// only decides what to do with the repository's answers (missing rows become
/// 404, duplicate emails become 409).
pub struct UserService {
    repository: Arc<dyn UserRepository>,
}

impl UserService {
    /// Creates a new user service.
    pub fn new(repository: Arc<dyn UserRepository>) -> Self {
        Self { repository }
    }

    /// Stores a new user.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the email is already registered.
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn create_user(&self, new_user: NewUser) -> Result<User, AppError> {
        let user = self
            .repository
            .create(new_user)
            .await
            .map_err(email_conflict)?;

        tracing::info!(user_id = user.id, "User created");
        Ok(user)
    }

    /// Stores several users in one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if `new_users` is empty.
    /// Returns [`AppError::Conflict`] if any email is already registered; in that
    /// case nothing is stored.
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn create_users(&self, new_users: Vec<NewUser>) -> Result<Vec<User>, AppError> {
        if new_users.is_empty() {
            return Err(AppError::bad_request(
                "At least one user is required",
                json!({ "field": "users" }),
            ));
        }

        let users = self
            .repository
            .bulk_create(new_users)
            .await
            .map_err(email_conflict)?;

        tracing::info!(count = users.len(), "Users created in bulk");
        Ok(users)
    }

    /// Retrieves a user by id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no user has this id.
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn get_user(&self, id: i64) -> Result<User, AppError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| user_not_found(id))
    }

    /// Lists one page of users matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn list_users(&self, filter: UserFilter) -> Result<UserPage, AppError> {
        let items = self.repository.list(&filter).await?;
        let total = self.repository.count(&filter).await?;

        Ok(UserPage { items, total })
    }

    /// Overwrites every field of an existing user.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no user has this id.
    /// Returns [`AppError::Conflict`] if the new email belongs to another user.
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn replace_user(&self, id: i64, user: NewUser) -> Result<User, AppError> {
        self.apply(id, user.into()).await
    }

    /// Changes only the fields present in `patch`.
    ///
    /// An empty patch returns the user unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no user has this id.
    /// Returns [`AppError::Conflict`] if the new email belongs to another user.
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn update_user(&self, id: i64, patch: UserPatch) -> Result<User, AppError> {
        if patch.is_empty() {
            return self.get_user(id).await;
        }

        self.apply(id, patch).await
    }

    async fn apply(&self, id: i64, patch: UserPatch) -> Result<User, AppError> {
        let user = self
            .repository
            .update(id, patch)
            .await
            .map_err(email_conflict)?
            .ok_or_else(|| user_not_found(id))?;

        tracing::info!(user_id = user.id, "User updated");
        Ok(user)
    }

    /// Checks that the user store is reachable.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if it is not.
    pub async fn health_check(&self) -> Result<(), AppError> {
        self.repository.ping().await
    }
}

fn user_not_found(id: i64) -> AppError {
    AppError::not_found("User not found", json!({ "id": id }))
}

/// The only unique constraint on users is the email, so any conflict is reported
/// against that field.
fn email_conflict(err: AppError) -> AppError {
    match err {
        AppError::Conflict { .. } => AppError::conflict(
            "Email is already registered",
            json!({ "field": "email" }),
        ),
        other => other,
    }
}
