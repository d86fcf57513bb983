//! PostgreSQL implementation of the user repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::PgPool;
use sqlx::types::Json;
use std::sync::Arc;

use crate::domain::entities::{LanguageSkill, NewUser, User, UserFilter, UserPatch, UserRole};
use crate::domain::repositories::UserRepository;
use crate::error::AppError;

/// Row shape shared by every query that returns users.
#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    name: String,
    email: String,
    role: String,
    languages: Json<Vec<LanguageSkill>>,
    group_ids: Vec<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = row.role.parse::<UserRole>().map_err(|e| {
            AppError::internal(
                "Corrupted user row",
                json!({ "id": row.id, "reason": e.to_string() }),
            )
        })?;

        Ok(User {
            id: row.id,
            name: row.name,
            email: row.email,
            role,
            languages: row.languages.0,
            groups: row.group_ids,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const INSERT_USER: &str = r#"
    INSERT INTO users (name, email, role, languages, group_ids)
    VALUES ($1, $2, $3, $4, $5)
    RETURNING id, name, email, role, languages, group_ids, created_at, updated_at
"#;

/// PostgreSQL repository for users.
///
/// Languages are stored as a JSONB array and group ids as `BIGINT[]`, so a user
/// is always read and written as a single row.
pub struct PgUserRepository {
    pool: Arc<PgPool>,
}

impl PgUserRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, new_user: NewUser) -> Result<User, AppError> {
        let row = sqlx::query_as::<_, UserRow>(INSERT_USER)
            .bind(new_user.name)
            .bind(new_user.email)
            .bind(new_user.role.as_str())
            .bind(Json(new_user.languages))
            .bind(new_user.groups)
            .fetch_one(self.pool.as_ref())
            .await?;

        row.try_into()
    }

    async fn bulk_create(&self, new_users: Vec<NewUser>) -> Result<Vec<User>, AppError> {
        let mut tx = self.pool.begin().await?;
        let mut created = Vec::with_capacity(new_users.len());

        for new_user in new_users {
            let row = sqlx::query_as::<_, UserRow>(INSERT_USER)
                .bind(new_user.name)
                .bind(new_user.email)
                .bind(new_user.role.as_str())
                .bind(Json(new_user.languages))
                .bind(new_user.groups)
                .fetch_one(&mut *tx)
                .await?;

            created.push(User::try_from(row)?);
        }

        tx.commit().await?;
        Ok(created)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, role, languages, group_ids, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn list(&self, filter: &UserFilter) -> Result<Vec<User>, AppError> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, role, languages, group_ids, created_at, updated_at
            FROM users
            WHERE ($1::TEXT IS NULL OR name LIKE $1 ESCAPE '\')
            ORDER BY id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(filter.name_pattern())
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(self.pool.as_ref())
        .await?;

        rows.into_iter().map(User::try_from).collect()
    }

    async fn count(&self, filter: &UserFilter) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM users
            WHERE ($1::TEXT IS NULL OR name LIKE $1 ESCAPE '\')
            "#,
        )
        .bind(filter.name_pattern())
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(count)
    }

    async fn update(&self, id: i64, patch: UserPatch) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users SET
                name       = COALESCE($2::TEXT, name),
                email      = COALESCE($3::TEXT, email),
                role       = COALESCE($4::TEXT, role),
                languages  = COALESCE($5::JSONB, languages),
                group_ids  = COALESCE($6::BIGINT[], group_ids),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, email, role, languages, group_ids, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(patch.name)
        .bind(patch.email)
        .bind(patch.role.map(|r| r.as_str()))
        .bind(patch.languages.map(Json))
        .bind(patch.groups)
        .fetch_optional(self.pool.as_ref())
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(self.pool.as_ref()).await?;
        Ok(())
    }
}
