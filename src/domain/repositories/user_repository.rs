//! Repository trait for user data access.

use crate::domain::entities::{NewUser, User, UserFilter, UserPatch};
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for managing users.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgUserRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
///
/// # Examples
///
/// See integration tests: `tests/repository_user.rs`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Creates a new user.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the email is already registered.
    /// Returns [`AppError::Internal`] on database errors.
    async fn create(&self, new_user: NewUser) -> Result<User, AppError>;

    /// Creates several users atomically: either all rows are stored or none.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if any email is already registered or
    /// repeated within the batch.
    /// Returns [`AppError::Internal`] on database errors.
    async fn bulk_create(&self, new_users: Vec<NewUser>) -> Result<Vec<User>, AppError>;

    /// Finds a user by id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError>;

    /// Lists users matching `filter`, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn list(&self, filter: &UserFilter) -> Result<Vec<User>, AppError>;

    /// Counts users matching `filter`, ignoring its offset and limit.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn count(&self, filter: &UserFilter) -> Result<i64, AppError>;

    /// Applies `patch` to a user and bumps `updated_at`.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(User))` with the updated row
    /// - `Ok(None)` if no user has this id
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the new email is already registered.
    /// Returns [`AppError::Internal`] on database errors.
    async fn update(&self, id: i64, patch: UserPatch) -> Result<Option<User>, AppError>;

    /// Checks that the backing store answers.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the store is unreachable.
    async fn ping(&self) -> Result<(), AppError>;
}
