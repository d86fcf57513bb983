//! User entity and its value types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of account. Serialized as `admin` / `user`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    User,
}

impl UserRole {
    pub const ALL: [UserRole; 2] = [UserRole::Admin, UserRole::User];

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::User => "user",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(UserRole::Admin),
            "user" => Ok(UserRole::User),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

/// Self-assessed proficiency in a language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl LanguageLevel {
    pub const ALL: [LanguageLevel; 3] = [
        LanguageLevel::Beginner,
        LanguageLevel::Intermediate,
        LanguageLevel::Advanced,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageLevel::Beginner => "beginner",
            LanguageLevel::Intermediate => "intermediate",
            LanguageLevel::Advanced => "advanced",
        }
    }
}

impl FromStr for LanguageLevel {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "beginner" => Ok(LanguageLevel::Beginner),
            "intermediate" => Ok(LanguageLevel::Intermediate),
            "advanced" => Ok(LanguageLevel::Advanced),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

/// A string that names none of an enum's variants.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown variant `{0}`")]
pub struct UnknownVariant(pub String);

/// One language a user speaks. Stored as JSON alongside the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageSkill {
    pub id: i64,
    pub level: LanguageLevel,
}

/// A stored user.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub languages: Vec<LanguageSkill>,
    pub groups: Vec<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input data for creating a user, or for replacing every field of one.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub languages: Vec<LanguageSkill>,
    pub groups: Vec<i64>,
}

/// Partial update for an existing user.
///
/// `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<UserRole>,
    pub languages: Option<Vec<LanguageSkill>>,
    pub groups: Option<Vec<i64>>,
}

impl UserPatch {
    /// Returns true if applying the patch would change nothing.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.role.is_none()
            && self.languages.is_none()
            && self.groups.is_none()
    }
}

impl From<NewUser> for UserPatch {
    fn from(user: NewUser) -> Self {
        Self {
            name: Some(user.name),
            email: Some(user.email),
            role: Some(user.role),
            languages: Some(user.languages),
            groups: Some(user.groups),
        }
    }
}

/// Listing criteria.
///
/// `keywords` matches the start of the user's name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserFilter {
    pub keywords: Option<String>,
    pub offset: i64,
    pub limit: i64,
}

impl UserFilter {
    /// The `LIKE` pattern for `keywords`, with wildcard characters escaped.
    pub fn name_pattern(&self) -> Option<String> {
        self.keywords.as_deref().map(|kw| {
            let mut pattern = String::with_capacity(kw.len() + 1);
            for c in kw.chars() {
                if matches!(c, '\\' | '%' | '_') {
                    pattern.push('\\');
                }
                pattern.push(c);
            }
            pattern.push('%');
            pattern
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_through_str() {
        for role in UserRole::ALL {
            assert_eq!(role.as_str().parse::<UserRole>().unwrap(), role);
        }
        assert_eq!(
            "guest".parse::<UserRole>().unwrap_err(),
            UnknownVariant("guest".to_string())
        );
    }

    #[test]
    fn test_language_skill_json_shape() {
        let skill = LanguageSkill {
            id: 3,
            level: LanguageLevel::Intermediate,
        };
        let json = serde_json::to_value(&skill).unwrap();
        assert_eq!(json, serde_json::json!({ "id": 3, "level": "intermediate" }));
    }

    #[test]
    fn test_patch_is_empty() {
        assert!(UserPatch::default().is_empty());

        let patch = UserPatch {
            groups: Some(vec![]),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }

    #[test]
    fn test_patch_from_new_user_sets_every_field() {
        let patch = UserPatch::from(NewUser {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            role: UserRole::Admin,
            languages: vec![],
            groups: vec![1],
        });

        assert_eq!(patch.name.as_deref(), Some("Ada"));
        assert_eq!(patch.role, Some(UserRole::Admin));
        assert_eq!(patch.languages, Some(vec![]));
        assert_eq!(patch.groups, Some(vec![1]));
    }

    #[test]
    fn test_name_pattern_escapes_wildcards() {
        let filter = UserFilter {
            keywords: Some("50%_off\\".to_string()),
            ..Default::default()
        };
        assert_eq!(filter.name_pattern().as_deref(), Some("50\\%\\_off\\\\%"));

        assert!(UserFilter::default().name_pattern().is_none());
    }

    #[test]
    fn test_name_pattern_plain_prefix() {
        let filter = UserFilter {
            keywords: Some("Ada".to_string()),
            offset: 0,
            limit: 10,
        };
        assert_eq!(filter.name_pattern().as_deref(), Some("Ada%"));
    }
}
