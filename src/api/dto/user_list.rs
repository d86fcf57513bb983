//! Query parameters of `GET /users`.

use std::borrow::Cow;
use std::num::IntErrorKind;

use serde::Deserialize;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::domain::entities::UserFilter;
use crate::validation::{AsyncValidate, rules, trim};

const DEFAULT_PAGE: u32 = 1;

/// Listing parameters.
///
/// `page` and `perPage` arrive as raw strings so that a non-numeric value is
/// reported as a field error (`number`) instead of a rejected query string.
///
/// ```text
/// GET /users?keywords=Ad&page=2&perPage=10
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListUsersQuery {
    #[serde(default, deserialize_with = "trim::option_non_empty")]
    pub keywords: Option<String>,

    #[serde(default)]
    pub page: Option<String>,

    #[serde(default, rename = "perPage")]
    pub per_page: Option<String>,
}

impl ListUsersQuery {
    /// Requested page, `1` when absent.
    pub fn page(&self) -> Result<u32, ValidationError> {
        match self.page.as_deref().map(str::trim) {
            None | Some("") => Ok(DEFAULT_PAGE),
            Some(raw) => {
                let page = parse_number(raw)?;
                if page == 0 {
                    return Err(ValidationError::new("range")
                        .with_message(Cow::Borrowed("Page must be at least 1")));
                }
                Ok(page)
            }
        }
    }

    /// Requested page size, one of [`rules::PER_PAGE_CHOICES`].
    pub fn per_page(&self) -> Result<u32, ValidationError> {
        let raw = self
            .per_page
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                ValidationError::new("required")
                    .with_message(Cow::Borrowed("perPage is required"))
            })?;

        let per_page = parse_number(raw)?;
        rules::per_page(per_page)?;
        Ok(per_page)
    }

    /// `(page, per_page)` of validated parameters.
    ///
    /// Falls back to the defaults for values that do not parse; callers run
    /// validation first.
    pub fn pagination(&self) -> (u32, u32) {
        (
            self.page().unwrap_or(DEFAULT_PAGE),
            self.per_page().unwrap_or(rules::PER_PAGE_CHOICES[0]),
        )
    }

    /// Converts validated parameters into a repository filter.
    pub fn to_filter(&self) -> UserFilter {
        let (page, per_page) = self.pagination();

        UserFilter {
            keywords: self.keywords.clone(),
            offset: i64::from(page - 1) * i64::from(per_page),
            limit: i64::from(per_page),
        }
    }
}

fn parse_number(raw: &str) -> Result<u32, ValidationError> {
    raw.parse::<u32>().map_err(|e| {
        let mut error = match e.kind() {
            IntErrorKind::PosOverflow => ValidationError::new("range")
                .with_message(Cow::Owned(format!("Must be at most {}", u32::MAX))),
            _ => ValidationError::new("number")
                .with_message(Cow::Borrowed("Must be a positive whole number")),
        };
        error.add_param(Cow::Borrowed("value"), &raw);
        error
    })
}

impl Validate for ListUsersQuery {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(e) = self.page() {
            errors.add("page", e);
        }
        if let Err(e) = self.per_page() {
            errors.add("perPage", e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl AsyncValidate for ListUsersQuery {}
