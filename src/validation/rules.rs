//! Custom field rules used by the request DTOs.

use std::borrow::Cow;
use std::collections::HashSet;

use validator::ValidationError;

use crate::domain::entities::{LanguageLevel, UserRole};

/// Page sizes accepted by the user listing.
pub const PER_PAGE_CHOICES: [u32; 3] = [10, 30, 50];

/// Restricts a user type to `admin` or `user`.
pub fn user_role(value: &str) -> Result<(), ValidationError> {
    if value.parse::<UserRole>().is_ok() {
        return Ok(());
    }

    Err(select_error(value, UserRole::ALL.iter().map(|r| r.as_str())))
}

/// Restricts a language level to `beginner`, `intermediate` or `advanced`.
pub fn language_level(value: &str) -> Result<(), ValidationError> {
    if value.parse::<LanguageLevel>().is_ok() {
        return Ok(());
    }

    Err(select_error(
        value,
        LanguageLevel::ALL.iter().map(|l| l.as_str()),
    ))
}

/// Every entry must be a positive database id, listed once.
pub fn ids(values: &[i64]) -> Result<(), ValidationError> {
    if let Some(bad) = values.iter().find(|id| **id <= 0) {
        let mut error = ValidationError::new("id")
            .with_message(Cow::Borrowed("Every id must be a positive integer"));
        error.add_param(Cow::Borrowed("value"), bad);
        return Err(error);
    }

    let mut seen = HashSet::with_capacity(values.len());
    if let Some(repeated) = values.iter().find(|id| !seen.insert(**id)) {
        let mut error =
            ValidationError::new("unique").with_message(Cow::Borrowed("Ids must not repeat"));
        error.add_param(Cow::Borrowed("value"), repeated);
        return Err(error);
    }

    Ok(())
}

/// Restricts a page size to [`PER_PAGE_CHOICES`].
pub fn per_page(value: u32) -> Result<(), ValidationError> {
    if PER_PAGE_CHOICES.contains(&value) {
        return Ok(());
    }

    Err(select_error(
        &value.to_string(),
        PER_PAGE_CHOICES.iter().map(|c| c.to_string()),
    ))
}

fn select_error<I, S>(value: &str, choices: I) -> ValidationError
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let choices: Vec<String> = choices.into_iter().map(|c| c.as_ref().to_string()).collect();
    let mut error = ValidationError::new("select")
        .with_message(Cow::Owned(format!("Must be one of: {}", choices.join(", "))));
    error.add_param(Cow::Borrowed("value"), &value);
    error
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_role() {
        assert!(user_role("admin").is_ok());
        assert!(user_role("user").is_ok());

        let err = user_role("root").unwrap_err();
        assert_eq!(err.code, "select");
        assert_eq!(err.message.unwrap(), "Must be one of: admin, user");
    }

    #[test]
    fn test_user_role_is_case_sensitive() {
        assert!(user_role("Admin").is_err());
    }

    #[test]
    fn test_language_level() {
        assert!(language_level("beginner").is_ok());
        assert!(language_level("intermediate").is_ok());
        assert!(language_level("advanced").is_ok());
        assert!(language_level("native").is_err());
    }

    #[test]
    fn test_ids() {
        assert!(ids(&[]).is_ok());
        assert!(ids(&[1, 2, 3]).is_ok());

        let err = ids(&[4, 0]).unwrap_err();
        assert_eq!(err.code, "id");
        assert!(ids(&[-7]).is_err());

        let err = ids(&[3, 5, 3]).unwrap_err();
        assert_eq!(err.code, "unique");
        assert_eq!(err.params["value"], 3);
    }

    #[test]
    fn test_per_page() {
        for choice in PER_PAGE_CHOICES {
            assert!(per_page(choice).is_ok());
        }
        assert!(per_page(20).is_err());
        assert!(per_page(0).is_err());

        let err = per_page(100).unwrap_err();
        assert_eq!(err.message.unwrap(), "Must be one of: 10, 30, 50");
    }
}
