#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use axum_test::TestServer;
use chrono::Utc;
use serde_json::json;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use user_api::api::handlers::health_handler;
use user_api::api::routes::user_routes;
use user_api::domain::entities::{NewUser, User, UserFilter, UserPatch};
use user_api::domain::mail::{MailCheckError, MailDomainVerifier};
use user_api::domain::repositories::UserRepository;
use user_api::error::AppError;
use user_api::state::AppState;

/// Users kept in memory, with the same email uniqueness rule as the database
/// (case-insensitive).
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<Vec<User>>,
    healthy: Mutex<bool>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self {
            users: Mutex::new(Vec::new()),
            healthy: Mutex::new(true),
        }
    }

    pub fn set_healthy(&self, healthy: bool) {
        *self.healthy.lock().unwrap() = healthy;
    }

    pub fn len(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    fn email_taken(users: &[User], email: &str, except: Option<i64>) -> bool {
        users
            .iter()
            .any(|u| Some(u.id) != except && u.email.eq_ignore_ascii_case(email))
    }

    fn matches(user: &User, filter: &UserFilter) -> bool {
        filter
            .keywords
            .as_deref()
            .is_none_or(|kw| user.name.starts_with(kw))
    }

    fn insert(users: &mut Vec<User>, new_user: NewUser) -> User {
        let now = Utc::now();
        let user = User {
            id: users.last().map_or(1, |u| u.id + 1),
            name: new_user.name,
            email: new_user.email,
            role: new_user.role,
            languages: new_user.languages,
            groups: new_user.groups,
            created_at: now,
            updated_at: now,
        };
        users.push(user.clone());
        user
    }
}

fn duplicate_email() -> AppError {
    AppError::conflict(
        "Unique constraint violation",
        json!({ "constraint": "users_email_key" }),
    )
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, new_user: NewUser) -> Result<User, AppError> {
        let mut users = self.users.lock().unwrap();
        if Self::email_taken(&users, &new_user.email, None) {
            return Err(duplicate_email());
        }
        Ok(Self::insert(&mut users, new_user))
    }

    async fn bulk_create(&self, new_users: Vec<NewUser>) -> Result<Vec<User>, AppError> {
        let mut users = self.users.lock().unwrap();

        let mut seen = HashSet::new();
        for new_user in &new_users {
            let email = new_user.email.to_ascii_lowercase();
            if Self::email_taken(&users, &email, None) || !seen.insert(email) {
                return Err(duplicate_email());
            }
        }

        Ok(new_users
            .into_iter()
            .map(|u| Self::insert(&mut users, u))
            .collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn list(&self, filter: &UserFilter) -> Result<Vec<User>, AppError> {
        let users = self.users.lock().unwrap();
        Ok(users
            .iter()
            .filter(|u| Self::matches(u, filter))
            .skip(filter.offset as usize)
            .take(filter.limit as usize)
            .cloned()
            .collect())
    }

    async fn count(&self, filter: &UserFilter) -> Result<i64, AppError> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().filter(|u| Self::matches(u, filter)).count() as i64)
    }

    async fn update(&self, id: i64, patch: UserPatch) -> Result<Option<User>, AppError> {
        let mut users = self.users.lock().unwrap();

        if let Some(email) = &patch.email
            && Self::email_taken(&users, email, Some(id))
        {
            return Err(duplicate_email());
        }

        let Some(user) = users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };

        if let Some(name) = patch.name {
            user.name = name;
        }
        if let Some(email) = patch.email {
            user.email = email;
        }
        if let Some(role) = patch.role {
            user.role = role;
        }
        if let Some(languages) = patch.languages {
            user.languages = languages;
        }
        if let Some(groups) = patch.groups {
            user.groups = groups;
        }
        user.updated_at = Utc::now();

        Ok(Some(user.clone()))
    }

    async fn ping(&self) -> Result<(), AppError> {
        if *self.healthy.lock().unwrap() {
            Ok(())
        } else {
            Err(AppError::internal("Database error", json!({ "reason": "down" })))
        }
    }
}

/// Accepts mail for every domain except the listed ones, and records lookups.
#[derive(Default)]
pub struct StaticVerifier {
    rejected: Vec<String>,
    failing: Vec<String>,
    lookups: Mutex<Vec<String>>,
}

impl StaticVerifier {
    pub fn accepting() -> Self {
        Self::default()
    }

    pub fn rejecting(domains: &[&str]) -> Self {
        Self {
            rejected: domains.iter().map(|d| d.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn failing(domains: &[&str]) -> Self {
        Self {
            failing: domains.iter().map(|d| d.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailDomainVerifier for StaticVerifier {
    async fn accepts_mail(&self, domain: &str) -> Result<bool, MailCheckError> {
        self.lookups.lock().unwrap().push(domain.to_string());

        if self.failing.iter().any(|d| d == domain) {
            return Err(MailCheckError::Timeout {
                domain: domain.to_string(),
            });
        }

        Ok(!self.rejected.iter().any(|d| d == domain))
    }
}

pub fn create_test_state(
    repository: Arc<InMemoryUserRepository>,
    verifier: Arc<StaticVerifier>,
) -> AppState {
    AppState::new(repository, verifier)
}

/// Server over the user routes and `/health`, without rate limiting.
pub fn create_test_server(
    repository: Arc<InMemoryUserRepository>,
    verifier: Arc<StaticVerifier>,
) -> TestServer {
    let app = Router::new()
        .route("/health", axum::routing::get(health_handler))
        .merge(user_routes())
        .with_state(create_test_state(repository, verifier));

    TestServer::new(app).unwrap()
}

pub fn user_json(name: &str, email: &str) -> serde_json::Value {
    json!({ "name": name, "email": email, "type": "user" })
}

pub async fn seed_user(server: &TestServer, name: &str, email: &str) -> i64 {
    let response = server.post("/users").json(&user_json(name, email)).await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json::<serde_json::Value>()["id"].as_i64().unwrap()
}
