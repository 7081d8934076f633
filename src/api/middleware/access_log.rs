//! Structured access log: one event per request.
//!
//! The request body streams through untouched while its first bytes are
//! copied aside for the snapshot. The response body is buffered and
//! forwarded whole. A 5xx response, or one that carries a [`RecordedError`],
//! is logged at ERROR, everything else at INFO.

use axum::{
    body::{Body, Bytes, to_bytes},
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use futures::TryStreamExt;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::api::middleware::client_ip::ClientIp;
use crate::error::{AppError, RecordedError};
use crate::state::AppState;

const TRUNCATION_MARKER: &str = "...[truncated]";

/// Logs method, path, query, client, user agent, status, latency and body
/// snapshots for every request.
///
/// Also attaches the resolved [`ClientIp`] to the request so later stages
/// reuse it.
pub async fn layer(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let start = Instant::now();

    let client_ip = ClientIp::resolve(&req, state.config.behind_proxy);
    req.extensions_mut().insert(client_ip.clone());

    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().unwrap_or_default().to_string();
    let user_agent = req
        .headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let limit = state.config.log_body_limit;

    let (parts, body) = req.into_parts();
    let captured = Arc::new(Mutex::new(Vec::new()));
    let tap = Arc::clone(&captured);
    // One byte past the limit is kept so truncation shows in the snapshot.
    let body = body.into_data_stream().inspect_ok(move |chunk| {
        if let Ok(mut buf) = tap.lock() {
            let room = (limit + 1).saturating_sub(buf.len());
            buf.extend_from_slice(&chunk[..chunk.len().min(room)]);
        }
    });
    let response = next.run(Request::from_parts(parts, Body::from_stream(body))).await;

    let request_body = captured
        .lock()
        .map(|buf| body_snapshot(&Bytes::copy_from_slice(&buf), limit))
        .unwrap_or_default();

    let (parts, body) = response.into_parts();
    let (response_body, response) = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => (
            body_snapshot(&bytes, limit),
            Response::from_parts(parts, Body::from(bytes)),
        ),
        Err(e) => (
            String::new(),
            AppError::Internal(format!("failed to read response body: {e}")).into_response(),
        ),
    };

    let status = response.status().as_u16();
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;

    let recorded = response.extensions().get::<RecordedError>();
    let failed = recorded.is_some() || response.status().is_server_error();
    let (error_code, error) = recorded
        .map(|r| (r.code, r.detail.as_str()))
        .unwrap_or((0, ""));

    if failed {
        tracing::error!(
            method = %method,
            path = %path,
            query = %query,
            client_ip = %client_ip,
            user_agent = %user_agent,
            status,
            latency_ms,
            request_body = %request_body,
            response_body = %response_body,
            error_code,
            error,
            "request failed"
        );
    } else {
        tracing::info!(
            method = %method,
            path = %path,
            query = %query,
            client_ip = %client_ip,
            user_agent = %user_agent,
            status,
            latency_ms,
            request_body = %request_body,
            response_body = %response_body,
            "request completed"
        );
    }

    response
}

/// Renders at most `limit` bytes of `bytes` as lossy UTF-8.
pub fn body_snapshot(bytes: &Bytes, limit: usize) -> String {
    if bytes.len() <= limit {
        return String::from_utf8_lossy(bytes).into_owned();
    }

    let mut snapshot = String::from_utf8_lossy(&bytes[..limit]).into_owned();
    snapshot.push_str(TRUNCATION_MARKER);
    snapshot
}
