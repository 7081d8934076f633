//! REST API layer for HTTP request/response handling.
//!
//! This layer translates HTTP requests into domain operations and formats
//! responses according to API contracts.
//!
//! # Modules
//!
//! - [`dto`] - Data Transfer Objects and the response envelope
//! - [`extract`] - Extractors that reject with enveloped errors
//! - [`handlers`] - HTTP request handlers
//! - [`middleware`] - The request pipeline and authentication
//! - [`routes`] - Route configuration and composition

pub mod dto;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod routes;
