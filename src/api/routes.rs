//! API route configuration.
//!
//! Reads are open to anonymous callers; writes require a Bearer token
//! verified by [`crate::api::middleware::auth`].

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::api::handlers::{
    create_example_handler, delete_example_handler, get_example_handler, health_handler,
    list_examples_handler, live_handler, metrics_handler, ready_handler, refresh_token_handler,
    update_example_handler,
};
use crate::api::middleware::auth;
use crate::state::AppState;

/// Versioned resource and auth routes.
///
/// # Endpoints
///
/// - `GET    /api/v1/examples`       - Paginated list (auth optional)
/// - `POST   /api/v1/examples`       - Create (auth required)
/// - `GET    /api/v1/examples/{id}`  - Fetch one (auth optional)
/// - `PUT    /api/v1/examples/{id}`  - Partial update (auth required, owner or admin)
/// - `DELETE /api/v1/examples/{id}`  - Soft delete (auth required, owner or admin)
/// - `POST   /api/v1/auth/refresh`   - Token refresh
pub fn api_routes(state: &AppState) -> Router<AppState> {
    let optional = || middleware::from_fn_with_state(state.clone(), auth::optional);
    let require = || middleware::from_fn_with_state(state.clone(), auth::require);

    Router::new()
        .route(
            "/api/v1/examples",
            get(list_examples_handler)
                .route_layer(optional())
                .merge(post(create_example_handler).route_layer(require())),
        )
        .route(
            "/api/v1/examples/{id}",
            get(get_example_handler).route_layer(optional()).merge(
                put(update_example_handler)
                    .delete(delete_example_handler)
                    .route_layer(require()),
            ),
        )
        .route("/api/v1/auth/refresh", post(refresh_token_handler))
}

/// Unauthenticated operational endpoints.
///
/// - `GET /health`  - Storage check, 503 when degraded
/// - `GET /ready`   - Readiness probe
/// - `GET /live`    - Liveness probe
/// - `GET /metrics` - Prometheus exposition
pub fn operational_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .route("/live", get(live_handler))
        .route("/metrics", get(metrics_handler))
}
