//! Per-client fixed-window rate limiting.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::api::middleware::client_ip::ClientIp;
use crate::application::rate_limiter::RateLimitDecision;
use crate::error::AppError;
use crate::state::AppState;

pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Admits or rejects the request against the caller's current window.
///
/// The client key is the address resolved by [`ClientIp`], so with
/// `BEHIND_PROXY=true` it follows `X-Forwarded-For`. Both outcomes carry the
/// `X-RateLimit-*` headers; a rejection is answered with 429 before any inner
/// stage runs.
///
/// # Example
///
/// ```rust,ignore
/// let app = Router::new()
///     .route("/api/v1/examples", get(list_examples_handler))
///     .layer(middleware::from_fn_with_state(state.clone(), rate_limit::layer));
/// ```
pub async fn layer(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let client_ip = ClientIp::resolve(&req, state.config.behind_proxy);
    let decision = state.rate_limiter.check(client_ip.as_str());

    let mut response = if decision.allowed {
        next.run(req).await
    } else {
        state.metrics.record_rate_limit();
        tracing::warn!(
            client_ip = %client_ip,
            limit = decision.limit,
            reset_at = decision.reset_at,
            "rate limit exceeded"
        );
        AppError::RateLimited.into_response()
    };

    apply_headers(response.headers_mut(), &decision);
    response
}

fn apply_headers(headers: &mut HeaderMap, decision: &RateLimitDecision) {
    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(decision.limit));
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(decision.remaining));
    headers.insert(X_RATELIMIT_RESET, HeaderValue::from(decision.reset_at));
}
