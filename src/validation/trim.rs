//! Serde helpers that trim string input while it is deserialized.
//!
//! Used with `#[serde(default, deserialize_with = "trim::option")]` so the
//! validators downstream only ever see trimmed values.

use serde::{Deserialize, Deserializer};

/// Trims an optional string. Whitespace-only input becomes `Some("")`, which
/// `required` accepts and `length(min = 1)` rejects.
pub fn option<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.map(|s| s.trim().to_string()))
}

/// Trims an optional string and drops it entirely when nothing is left.
///
/// Suited to optional filters, where an empty value means "no filter".
pub fn option_non_empty<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = option(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}
