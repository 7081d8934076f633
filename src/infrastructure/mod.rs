//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer and owns the
//! process-wide observability plumbing.
//!
//! # Modules
//!
//! - [`persistence`] - Repository implementations (PostgreSQL and in-memory)
//! - [`metrics`] - Prometheus registry and HTTP instruments

pub mod metrics;
pub mod persistence;
