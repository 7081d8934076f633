//! # Resource Service
//!
//! A CRUD web service skeleton built with Axum, with the request pipeline a
//! production API needs around it.
//!
//! ## Architecture
//!
//! This crate follows Clean Architecture principles with clear layer separation:
//!
//! - **Domain Layer** ([`domain`]) - Core entities and repository traits
//! - **Application Layer** ([`application`]) - Services, credentials, rate limiting, alerts
//! - **Infrastructure Layer** ([`infrastructure`]) - PostgreSQL and in-memory stores, metrics
//! - **API Layer** ([`api`]) - Handlers, DTOs, extractors and middleware
//!
//! ## Features
//!
//! - Example resource with ownership checks and soft delete
//! - HS256 bearer tokens with a refresh window
//! - Per-client fixed-window rate limiting
//! - Panic recovery with webhook alerts
//! - W3C trace propagation, structured access logs, Prometheus metrics
//!
//! ## Quick Start
//!
//! ```bash
//! export JWT_SECRET="$(cargo run --bin admin -- secret generate)"
//! export STORAGE_BACKEND=memory
//!
//! cargo run
//! ```
//!
//! ## Configuration
//!
//! Service configuration is loaded from environment variables via [`config::Config`].
//! See [`config`] module for available options.

pub mod api;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod state;

pub mod config;
pub mod logging;
pub mod server;

pub mod routes;

pub use error::AppError;
pub use state::AppState;

/// Commonly used types for external consumers.
///
/// Re-exports frequently used types to simplify imports for library users
/// and integration tests.
pub mod prelude {
    pub use crate::application::services::{Claims, CredentialService, ExampleService};
    pub use crate::domain::entities::{Example, ExamplePatch, NewExample};
    pub use crate::error::AppError;
    pub use crate::state::AppState;
}
