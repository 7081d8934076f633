//! HTTP middleware for request processing and protection.
//!
//! The global pipeline runs, outermost first: CORS, access log, panic
//! recovery, rate limiting, tracing, metrics. Authentication is applied per
//! route.

pub mod access_log;
pub mod auth;
pub mod client_ip;
pub mod cors;
pub mod metrics;
pub mod rate_limit;
pub mod recovery;
pub mod trace;
