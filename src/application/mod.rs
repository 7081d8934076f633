//! Application layer services implementing business logic.
//!
//! This layer orchestrates domain operations by coordinating repository calls,
//! validation, and business rules. Services consume repository traits and provide
//! a clean API for HTTP handlers and middleware.
//!
//! # Available Services
//!
//! - [`services::example_service::ExampleService`] - Example CRUD with ownership checks
//! - [`services::credential_service::CredentialService`] - Token issue, verify and refresh
//! - [`services::alert_service::AlertNotifier`] - Panic alerts to a chat webhook
//! - [`rate_limiter::RateLimiter`] - Fixed-window per-client rate limiting

pub mod rate_limiter;
pub mod services;
