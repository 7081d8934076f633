//! HTTP request handlers for API endpoints.
//!
//! Each handler module corresponds to a logical grouping of endpoints.

pub mod auth;
pub mod examples;
pub mod health;
pub mod metrics;

use crate::error::AppError;

pub use auth::refresh_token_handler;
pub use examples::{
    create_example_handler, delete_example_handler, get_example_handler, list_examples_handler,
    update_example_handler,
};
pub use health::{health_handler, live_handler, ready_handler};
pub use metrics::metrics_handler;

/// Envelope 404 for paths no route matched.
pub async fn fallback_handler() -> AppError {
    AppError::NotFound
}
