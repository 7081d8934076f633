//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `/api/v1/examples*`   - Example resource (see [`crate::api::routes`])
//! - `/api/v1/auth/refresh` - Token refresh
//! - `/health`, `/ready`, `/live` - Probes
//! - `/metrics`            - Prometheus exposition
//!
//! # Middleware
//!
//! Every request, including unmatched ones, passes through the pipeline
//! built by [`with_pipeline`]. Authentication is a per-route layer.

use crate::api;
use crate::api::handlers::fallback_handler;
use crate::api::middleware::{access_log, cors, metrics, rate_limit, recovery, trace};
use crate::state::AppState;
use axum::{Router, middleware};
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Constructs the application router with all routes and middleware.
pub fn app_router(state: AppState) -> Router {
    let router = Router::new()
        .merge(api::routes::api_routes(&state))
        .merge(api::routes::operational_routes())
        .fallback(fallback_handler);

    with_pipeline(router, state)
}

/// Wraps `router` in the global request pipeline and binds the state.
///
/// Stages run outermost first: CORS, access log, recovery, rate limit,
/// trace, metrics. Public so tests can mount extra routes (a panicking
/// handler, for instance) behind the real pipeline.
pub fn with_pipeline(router: Router<AppState>, state: AppState) -> Router {
    router
        .layer(middleware::from_fn_with_state(state.clone(), metrics::layer))
        .layer(trace::layer())
        .layer(middleware::from_fn(trace::propagate))
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit::layer))
        .layer(middleware::from_fn_with_state(state.clone(), recovery::layer))
        .layer(middleware::from_fn_with_state(state.clone(), access_log::layer))
        .layer(cors::layer(&state.config.cors_allowed_origins))
        .with_state(state)
}

/// Adds trailing-slash normalization in front of routing.
pub fn normalized(router: Router) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(router)
}
