//! API route configuration.

use crate::api::handlers::{
    bulk_create_users_handler, create_user_handler, get_user_handler, list_users_handler,
    replace_user_handler, update_user_handler,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

/// User management routes.
///
/// # Endpoints
///
/// - `GET    /users`        - List users (name prefix filter, paginated)
/// - `POST   /users`        - Create a user
/// - `POST   /users/bulk`   - Create several users atomically
/// - `GET    /users/{id}`   - Fetch a user
/// - `PUT    /users/{id}`   - Replace a user
/// - `PATCH  /users/{id}`   - Partially update a user
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users_handler).post(create_user_handler))
        .route("/users/bulk", post(bulk_create_users_handler))
        .route(
            "/users/{id}",
            get(get_user_handler)
                .put(replace_user_handler)
                .patch(update_user_handler),
        )
}
