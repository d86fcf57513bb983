//! DTOs for the user endpoints.
//!
//! Request types carry `Option` fields so that a missing value is reported as a
//! field error (`required`) rather than a body parse failure. After
//! [`crate::validation::validate_all`] succeeds they are converted into domain
//! inputs with `TryFrom`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_with::{DisplayFromStr, PickFirst, serde_as};
use validator::Validate;

use crate::domain::entities::{
    LanguageLevel, LanguageSkill, NewUser, User, UserPatch, UserRole,
};
use crate::error::AppError;
use crate::validation::mail::{DomainVerdicts, check_email_domain};
use crate::validation::{AsyncValidate, FieldError, FieldErrors, ValidationContext, rules, trim};

/// Largest batch accepted by `POST /users/bulk`.
pub const MAX_BULK_USERS: usize = 100;

/// Body of `POST /users` and `PUT /users/{id}`.
///
/// ```json
/// {
///   "name": "Ada Lovelace",
///   "email": "ada@example.com",
///   "type": "admin",
///   "languages": [{ "id": 1, "level": "advanced" }],
///   "groups": [3, 7]
/// }
/// ```
#[serde_as]
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[serde(default, deserialize_with = "trim::option")]
    #[validate(
        required(message = "Name is required"),
        length(min = 1, max = 255, message = "Name must be between 1 and 255 characters")
    )]
    pub name: Option<String>,

    #[serde(default)]
    #[validate(
        required(message = "Email is required"),
        email(message = "Email must be a valid address")
    )]
    pub email: Option<String>,

    #[serde(default, rename = "type")]
    #[validate(
        required(message = "Type is required"),
        custom(function = "rules::user_role")
    )]
    pub user_type: Option<String>,

    #[serde(default)]
    #[validate(nested)]
    pub languages: Vec<LanguageInput>,

    #[serde_as(as = "Vec<PickFirst<(_, DisplayFromStr)>>")]
    #[serde(default)]
    #[validate(custom(function = "rules::ids"))]
    pub groups: Vec<i64>,
}

/// One entry of the `languages` container.
#[serde_as]
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct LanguageInput {
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    #[serde(default)]
    #[validate(
        required(message = "Language id is required"),
        range(min = 1, message = "Language id must be a positive integer")
    )]
    pub id: Option<i64>,

    #[serde(default)]
    #[validate(
        required(message = "Language level is required"),
        custom(function = "rules::language_level")
    )]
    pub level: Option<String>,
}

#[async_trait]
impl AsyncValidate for CreateUserRequest {
    async fn validate_async(&self, ctx: &ValidationContext, errors: &mut FieldErrors) {
        if errors.has("email") {
            return;
        }

        if let Some(email) = &self.email
            && let Err(e) = check_email_domain(email, ctx.mail_verifier()).await
        {
            errors.add("email", e);
        }
    }
}

impl TryFrom<LanguageInput> for LanguageSkill {
    type Error = AppError;

    fn try_from(input: LanguageInput) -> Result<Self, Self::Error> {
        let id = input.id.ok_or_else(|| missing("languages.id"))?;
        let level = input
            .level
            .ok_or_else(|| missing("languages.level"))?
            .parse::<LanguageLevel>()
            .map_err(|e| AppError::bad_request("Invalid language level", json!({ "reason": e.to_string() })))?;

        Ok(LanguageSkill { id, level })
    }
}

impl TryFrom<CreateUserRequest> for NewUser {
    type Error = AppError;

    fn try_from(request: CreateUserRequest) -> Result<Self, Self::Error> {
        let name = request.name.ok_or_else(|| missing("name"))?;
        let email = request.email.ok_or_else(|| missing("email"))?;
        let role = parse_role(request.user_type.as_deref().ok_or_else(|| missing("type"))?)?;
        let languages = request
            .languages
            .into_iter()
            .map(LanguageSkill::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(NewUser {
            name,
            email,
            role,
            languages,
            groups: request.groups,
        })
    }
}

/// Body of `PATCH /users/{id}`.
///
/// Every field is optional: absent (or `null`) fields are skipped by validation
/// and left unchanged in storage, present ones must pass the same rules as on
/// creation.
#[serde_as]
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[serde(default, deserialize_with = "trim::option")]
    #[validate(length(min = 1, max = 255, message = "Name must be between 1 and 255 characters"))]
    pub name: Option<String>,

    #[serde(default)]
    #[validate(email(message = "Email must be a valid address"))]
    pub email: Option<String>,

    #[serde(default, rename = "type")]
    #[validate(custom(function = "rules::user_role"))]
    pub user_type: Option<String>,

    #[serde(default)]
    #[validate(nested)]
    pub languages: Option<Vec<LanguageInput>>,

    #[serde_as(as = "Option<Vec<PickFirst<(_, DisplayFromStr)>>>")]
    #[serde(default)]
    #[validate(custom(function = "rules::ids"))]
    pub groups: Option<Vec<i64>>,
}

#[async_trait]
impl AsyncValidate for UpdateUserRequest {
    async fn validate_async(&self, ctx: &ValidationContext, errors: &mut FieldErrors) {
        if errors.has("email") {
            return;
        }

        if let Some(email) = &self.email
            && let Err(e) = check_email_domain(email, ctx.mail_verifier()).await
        {
            errors.add("email", e);
        }
    }
}

impl TryFrom<UpdateUserRequest> for UserPatch {
    type Error = AppError;

    fn try_from(request: UpdateUserRequest) -> Result<Self, Self::Error> {
        let role = request.user_type.as_deref().map(parse_role).transpose()?;
        let languages = request
            .languages
            .map(|items| {
                items
                    .into_iter()
                    .map(LanguageSkill::try_from)
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?;

        Ok(UserPatch {
            name: request.name,
            email: request.email,
            role,
            languages,
            groups: request.groups,
        })
    }
}

/// Body of `POST /users/bulk`.
///
/// Every entry follows the `POST /users` rules; errors are reported per entry
/// (`users[2].email`). The batch is stored atomically.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct BulkCreateUsersRequest {
    #[serde(default)]
    #[validate(nested)]
    pub users: Vec<CreateUserRequest>,
}

#[async_trait]
impl AsyncValidate for BulkCreateUsersRequest {
    async fn validate_async(&self, ctx: &ValidationContext, errors: &mut FieldErrors) {
        if self.users.is_empty() || self.users.len() > MAX_BULK_USERS {
            errors.add(
                "users",
                FieldError::new(
                    "length",
                    format!("Between 1 and {MAX_BULK_USERS} users are required"),
                ),
            );
            return;
        }

        let pending: Vec<(String, &str)> = self
            .users
            .iter()
            .enumerate()
            .filter_map(|(index, user)| {
                let path = format!("users[{index}].email");
                let email = user.email.as_deref()?;
                (!errors.has(&path)).then_some((path, email))
            })
            .collect();

        let verdicts =
            DomainVerdicts::resolve(pending.iter().map(|(_, email)| *email), ctx.mail_verifier()).await;

        for (path, email) in pending {
            if let Err(e) = verdicts.verdict(email) {
                errors.add(path, e);
            }
        }
    }
}

impl TryFrom<BulkCreateUsersRequest> for Vec<NewUser> {
    type Error = AppError;

    fn try_from(request: BulkCreateUsersRequest) -> Result<Self, Self::Error> {
        request.users.into_iter().map(NewUser::try_from).collect()
    }
}

fn parse_role(value: &str) -> Result<UserRole, AppError> {
    value
        .parse::<UserRole>()
        .map_err(|e| AppError::bad_request("Invalid user type", json!({ "reason": e.to_string() })))
}

fn missing(field: &str) -> AppError {
    AppError::bad_request("Missing required field", json!({ "field": field }))
}

/// JSON representation of a user.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(rename = "type")]
    pub user_type: UserRole,
    pub languages: Vec<LanguageSkill>,
    pub groups: Vec<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            user_type: user.role,
            languages: user.languages,
            groups: user.groups,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Response of `GET /users`.
#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub items: Vec<UserResponse>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

/// Response of `POST /users/bulk`.
#[derive(Debug, Serialize)]
pub struct BulkCreateUsersResponse {
    pub items: Vec<UserResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::mail::MockMailDomainVerifier;
    use crate::validation::validate_all;
    use std::sync::Arc;

    fn ctx_accepting() -> ValidationContext {
        let mut verifier = MockMailDomainVerifier::new();
        verifier.expect_accepts_mail().returning(|_| Ok(true));
        ValidationContext::new(Arc::new(verifier))
    }

    fn ctx_rejecting(domain: &'static str) -> ValidationContext {
        let mut verifier = MockMailDomainVerifier::new();
        verifier
            .expect_accepts_mail()
            .returning(move |d| Ok(d != domain));
        ValidationContext::new(Arc::new(verifier))
    }

    fn ctx_unused() -> ValidationContext {
        let mut verifier = MockMailDomainVerifier::new();
        verifier.expect_accepts_mail().never();
        ValidationContext::new(Arc::new(verifier))
    }

    fn create(json: serde_json::Value) -> CreateUserRequest {
        serde_json::from_value(json).unwrap()
    }

    #[tokio::test]
    async fn test_create_valid_minimal() {
        let request = create(json!({
            "name": "  Ada  ",
            "email": "ada@example.com",
            "type": "user"
        }));

        validate_all(&request, &ctx_accepting()).await.unwrap();

        let user = NewUser::try_from(request).unwrap();
        assert_eq!(user.name, "Ada");
        assert_eq!(user.role, UserRole::User);
        assert!(user.languages.is_empty());
        assert!(user.groups.is_empty());
    }

    #[tokio::test]
    async fn test_create_missing_fields_are_field_errors() {
        let request = create(json!({}));

        let errors = validate_all(&request, &ctx_unused()).await.unwrap_err();

        assert_eq!(errors.get("name").unwrap()[0].code, "required");
        assert_eq!(errors.get("email").unwrap()[0].code, "required");
        assert_eq!(errors.get("type").unwrap()[0].code, "required");
    }

    #[tokio::test]
    async fn test_create_blank_name_is_rejected_after_trim() {
        let request = create(json!({
            "name": "   ",
            "email": "ada@example.com",
            "type": "admin"
        }));

        let errors = validate_all(&request, &ctx_accepting()).await.unwrap_err();

        assert_eq!(errors.paths().collect::<Vec<_>>(), vec!["name"]);
        assert_eq!(errors.get("name").unwrap()[0].code, "length");
    }

    #[tokio::test]
    async fn test_create_bad_email_skips_mx_check() {
        let request = create(json!({
            "name": "Ada",
            "email": "not-an-email",
            "type": "user"
        }));

        let errors = validate_all(&request, &ctx_unused()).await.unwrap_err();

        let email_errors = errors.get("email").unwrap();
        assert_eq!(email_errors.len(), 1);
        assert_eq!(email_errors[0].code, "email");
    }

    #[tokio::test]
    async fn test_create_domain_without_mx() {
        let request = create(json!({
            "name": "Ada",
            "email": "ada@nomail.test",
            "type": "user"
        }));

        let errors = validate_all(&request, &ctx_rejecting("nomail.test"))
            .await
            .unwrap_err();

        assert_eq!(errors.get("email").unwrap()[0].code, "mx");
    }

    #[tokio::test]
    async fn test_create_unknown_type() {
        let request = create(json!({
            "name": "Ada",
            "email": "ada@example.com",
            "type": "superuser"
        }));

        let errors = validate_all(&request, &ctx_accepting()).await.unwrap_err();

        assert_eq!(errors.get("type").unwrap()[0].code, "select");
    }

    #[tokio::test]
    async fn test_create_nested_language_errors() {
        let request = create(json!({
            "name": "Ada",
            "email": "ada@example.com",
            "type": "user",
            "languages": [
                { "id": 1, "level": "advanced" },
                { "level": "fluent" },
                { "id": 0, "level": "beginner" }
            ]
        }));

        let errors = validate_all(&request, &ctx_accepting()).await.unwrap_err();

        assert_eq!(errors.get("languages[1].id").unwrap()[0].code, "required");
        assert_eq!(errors.get("languages[1].level").unwrap()[0].code, "select");
        assert_eq!(errors.get("languages[2].id").unwrap()[0].code, "range");
        assert!(!errors.has("languages[0].id"));
        assert!(!errors.has("languages[0].level"));
    }

    #[tokio::test]
    async fn test_create_group_ids_must_be_positive() {
        let request = create(json!({
            "name": "Ada",
            "email": "ada@example.com",
            "type": "user",
            "groups": [1, -2]
        }));

        let errors = validate_all(&request, &ctx_accepting()).await.unwrap_err();

        assert_eq!(errors.get("groups").unwrap()[0].code, "id");
    }

    #[test]
    fn test_numeric_strings_are_coerced() {
        let request = create(json!({
            "languages": [{ "id": "4", "level": "beginner" }],
            "groups": ["2", 3]
        }));

        assert_eq!(request.languages[0].id, Some(4));
        assert_eq!(request.groups, vec![2, 3]);
    }

    #[tokio::test]
    async fn test_create_converts_languages() {
        let request = create(json!({
            "name": "Ada",
            "email": "ada@example.com",
            "type": "admin",
            "languages": [{ "id": 2, "level": "intermediate" }],
            "groups": [5]
        }));

        validate_all(&request, &ctx_accepting()).await.unwrap();
        let user = NewUser::try_from(request).unwrap();

        assert_eq!(
            user.languages,
            vec![LanguageSkill {
                id: 2,
                level: LanguageLevel::Intermediate
            }]
        );
        assert_eq!(user.groups, vec![5]);
    }

    #[tokio::test]
    async fn test_patch_empty_body_is_valid() {
        let request: UpdateUserRequest = serde_json::from_value(json!({})).unwrap();

        validate_all(&request, &ctx_unused()).await.unwrap();

        let patch = UserPatch::try_from(request).unwrap();
        assert!(patch.is_empty());
    }

    #[tokio::test]
    async fn test_patch_validates_present_fields_only() {
        let request: UpdateUserRequest = serde_json::from_value(json!({
            "name": " ",
            "type": "guest"
        }))
        .unwrap();

        let errors = validate_all(&request, &ctx_unused()).await.unwrap_err();

        assert_eq!(errors.paths().collect::<Vec<_>>(), vec!["name", "type"]);
    }

    #[tokio::test]
    async fn test_patch_checks_new_email_domain() {
        let request: UpdateUserRequest = serde_json::from_value(json!({
            "email": "ada@nomail.test"
        }))
        .unwrap();

        let errors = validate_all(&request, &ctx_rejecting("nomail.test"))
            .await
            .unwrap_err();

        assert_eq!(errors.get("email").unwrap()[0].code, "mx");
    }

    #[tokio::test]
    async fn test_patch_nested_languages() {
        let request: UpdateUserRequest = serde_json::from_value(json!({
            "languages": [{ "id": 1 }]
        }))
        .unwrap();

        let errors = validate_all(&request, &ctx_unused()).await.unwrap_err();

        assert!(errors.has("languages[0].level"));
    }

    #[tokio::test]
    async fn test_patch_conversion_keeps_absent_fields_empty() {
        let request: UpdateUserRequest = serde_json::from_value(json!({
            "name": " Grace ",
            "type": "admin",
            "groups": []
        }))
        .unwrap();

        validate_all(&request, &ctx_unused()).await.unwrap();
        let patch = UserPatch::try_from(request).unwrap();

        assert_eq!(patch.name.as_deref(), Some("Grace"));
        assert_eq!(patch.role, Some(UserRole::Admin));
        assert_eq!(patch.groups, Some(vec![]));
        assert!(patch.email.is_none());
        assert!(patch.languages.is_none());
    }

    #[tokio::test]
    async fn test_bulk_requires_entries() {
        let request: BulkCreateUsersRequest =
            serde_json::from_value(json!({ "users": [] })).unwrap();

        let errors = validate_all(&request, &ctx_unused()).await.unwrap_err();

        assert_eq!(errors.get("users").unwrap()[0].code, "length");
    }

    #[tokio::test]
    async fn test_bulk_reports_errors_per_entry() {
        let request: BulkCreateUsersRequest = serde_json::from_value(json!({
            "users": [
                { "name": "Ada", "email": "ada@example.com", "type": "user" },
                { "name": "", "email": "bob@nomail.test", "type": "user" },
                { "name": "Cy", "email": "cy@nomail.test", "type": "admin" }
            ]
        }))
        .unwrap();

        let mut verifier = MockMailDomainVerifier::new();
        verifier
            .expect_accepts_mail()
            .withf(|d| d == "example.com")
            .times(1)
            .returning(|_| Ok(true));
        verifier
            .expect_accepts_mail()
            .withf(|d| d == "nomail.test")
            .times(1)
            .returning(|_| Ok(false));
        let ctx = ValidationContext::new(Arc::new(verifier));

        let errors = validate_all(&request, &ctx).await.unwrap_err();

        assert_eq!(
            errors.paths().collect::<Vec<_>>(),
            vec!["users[1].email", "users[1].name", "users[2].email"]
        );
        assert_eq!(errors.get("users[2].email").unwrap()[0].code, "mx");
    }

    #[test]
    fn test_user_response_shape() {
        let now = Utc::now();
        let response = UserResponse::from(User {
            id: 9,
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            role: UserRole::Admin,
            languages: vec![LanguageSkill {
                id: 1,
                level: LanguageLevel::Beginner,
            }],
            groups: vec![2],
            created_at: now,
            updated_at: now,
        });

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["type"], "admin");
        assert_eq!(json["languages"][0]["level"], "beginner");
        assert_eq!(json["groups"], json!([2]));
    }
}
