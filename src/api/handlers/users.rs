//! Handlers for user endpoints.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::user::{
    BulkCreateUsersRequest, BulkCreateUsersResponse, CreateUserRequest, UpdateUserRequest,
    UserListResponse, UserResponse,
};
use crate::api::dto::user_list::ListUsersQuery;
use crate::api::extract::{ValidatedBody, ValidatedPath, ValidatedQuery};
use crate::domain::entities::{NewUser, UserPatch};
use crate::error::AppError;
use crate::state::AppState;

/// Creates a user.
///
/// # Endpoint
///
/// `POST /users`
///
/// # Errors
///
/// Returns 400 if any field fails validation, including the MX check on the
/// email domain.
/// Returns 409 if the email is already registered.
pub async fn create_user_handler(
    State(state): State<AppState>,
    ValidatedBody(payload): ValidatedBody<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let user = state
        .user_service
        .create_user(NewUser::try_from(payload)?)
        .await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Creates several users in one transaction.
///
/// # Endpoint
///
/// `POST /users/bulk`
///
/// Nothing is stored unless every entry is valid.
pub async fn bulk_create_users_handler(
    State(state): State<AppState>,
    ValidatedBody(payload): ValidatedBody<BulkCreateUsersRequest>,
) -> Result<(StatusCode, Json<BulkCreateUsersResponse>), AppError> {
    let users = state
        .user_service
        .create_users(Vec::<NewUser>::try_from(payload)?)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(BulkCreateUsersResponse {
            items: users.into_iter().map(UserResponse::from).collect(),
        }),
    ))
}

/// Lists users, optionally filtered by a name prefix.
///
/// # Endpoint
///
/// `GET /users?keywords=&page=&perPage=`
pub async fn list_users_handler(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<ListUsersQuery>,
) -> Result<Json<UserListResponse>, AppError> {
    let (page, per_page) = query.pagination();
    let result = state.user_service.list_users(query.to_filter()).await?;

    Ok(Json(UserListResponse {
        items: result.items.into_iter().map(UserResponse::from).collect(),
        page,
        per_page,
        total: result.total,
    }))
}

/// Returns a single user.
///
/// # Endpoint
///
/// `GET /users/{id}`
///
/// # Errors
///
/// Returns 404 if the user does not exist.
pub async fn get_user_handler(
    ValidatedPath(id): ValidatedPath<i64>,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, AppError> {
    let user = state.user_service.get_user(id).await?;
    Ok(Json(user.into()))
}

/// Replaces every field of a user.
///
/// # Endpoint
///
/// `PUT /users/{id}`
///
/// The body follows the same rules as `POST /users`.
pub async fn replace_user_handler(
    ValidatedPath(id): ValidatedPath<i64>,
    State(state): State<AppState>,
    ValidatedBody(payload): ValidatedBody<CreateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let user = state
        .user_service
        .replace_user(id, NewUser::try_from(payload)?)
        .await?;

    Ok(Json(user.into()))
}

/// Partially updates a user.
///
/// # Endpoint
///
/// `PATCH /users/{id}`
///
/// Absent fields are neither validated nor changed. An empty body returns the
/// user as stored.
pub async fn update_user_handler(
    ValidatedPath(id): ValidatedPath<i64>,
    State(state): State<AppState>,
    ValidatedBody(payload): ValidatedBody<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let user = state
        .user_service
        .update_user(id, UserPatch::try_from(payload)?)
        .await?;

    Ok(Json(user.into()))
}
