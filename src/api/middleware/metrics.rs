//! Prometheus instrumentation stage.

use axum::{
    body::HttpBody,
    extract::{MatchedPath, Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::time::Instant;

use crate::infrastructure::metrics::UNMATCHED_ROUTE;
use crate::state::AppState;

/// Records request count, latency and body sizes per route template.
///
/// The active-connection guard is held for the whole call, so the gauge is
/// decremented even when a downstream stage unwinds.
pub async fn layer(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let _active = state.metrics.track_connection();
    let start = Instant::now();

    let method = req.method().to_string();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_ROUTE.to_string());

    if let Some(size) = content_length(&req) {
        state.metrics.record_request_size(&method, &route, size);
    }

    let response = next.run(req).await;

    let status = response.status().as_u16();
    state
        .metrics
        .record_request(&method, &route, status, start.elapsed().as_secs_f64());

    if let Some(size) = response.body().size_hint().exact() {
        state
            .metrics
            .record_response_size(&method, &route, status, size);
    }

    response
}

fn content_length(req: &Request) -> Option<u64> {
    req.headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .or_else(|| req.body().size_hint().exact())
}
