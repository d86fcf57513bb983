//! HTTP request handlers for API endpoints.
//!
//! Each handler module corresponds to a logical grouping of endpoints.

pub mod health;
pub mod users;

pub use health::health_handler;
pub use users::{
    bulk_create_users_handler, create_user_handler, get_user_handler, list_users_handler,
    replace_user_handler, update_user_handler,
};
