//! W3C trace-context propagation and the per-request span.
//!
//! Two pieces cooperate:
//!
//! - [`propagate`] reads or starts the trace, stores it in the request
//!   extensions and echoes `traceparent` / `x-trace-id` on the response.
//! - [`layer`] is a [`TraceLayer`] whose span carries that trace identity and
//!   is marked errored on 5xx responses or a recorded handler error.

use axum::{
    extract::Request,
    http::{self, HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::time::Duration;
use tower_http::classify::{ServerErrorsAsFailures, ServerErrorsFailureClass, SharedClassifier};
use tower_http::trace::{
    DefaultOnBodyChunk, DefaultOnEos, DefaultOnRequest, MakeSpan, OnFailure, OnResponse,
    TraceLayer,
};
use tracing::Span;
use tracing::field::Empty;

use crate::error::RecordedError;

pub const TRACEPARENT: HeaderName = HeaderName::from_static("traceparent");
pub const X_TRACE_ID: HeaderName = HeaderName::from_static("x-trace-id");

/// The request tracing layer built by [`layer`].
pub type HttpTraceLayer = TraceLayer<
    SharedClassifier<ServerErrorsAsFailures>,
    W3cMakeSpan,
    DefaultOnRequest,
    RecordOutcome,
    DefaultOnBodyChunk,
    DefaultOnEos,
    RecordFailure,
>;

/// Trace identity of the current request.
///
/// `span_id` is always freshly generated for this service; `parent_span_id`
/// is the caller's span when a valid `traceparent` was received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceContext {
    pub trace_id: String,
    pub span_id: String,
    pub parent_span_id: Option<String>,
    pub sampled: bool,
}

impl TraceContext {
    /// Starts a new trace with no parent.
    pub fn new_root() -> Self {
        Self {
            trace_id: format!("{:032x}", rand::random::<u128>()),
            span_id: new_span_id(),
            parent_span_id: None,
            sampled: true,
        }
    }

    /// Continues the trace described by a `traceparent` header value.
    ///
    /// Returns `None` for anything that is not a valid version-00 header,
    /// including all-zero trace or parent ids.
    pub fn from_traceparent(value: &str) -> Option<Self> {
        let mut fields = value.trim().split('-');
        let version = fields.next()?;
        let trace_id = fields.next()?;
        let parent_id = fields.next()?;
        let flags = fields.next()?;

        if version != "00" || fields.next().is_some() {
            return None;
        }
        if !is_hex_id(trace_id, 32) || !is_hex_id(parent_id, 16) || !is_lower_hex(flags, 2) {
            return None;
        }

        let flags = u8::from_str_radix(flags, 16).ok()?;

        Some(Self {
            trace_id: trace_id.to_string(),
            span_id: new_span_id(),
            parent_span_id: Some(parent_id.to_string()),
            sampled: flags & 0x01 == 0x01,
        })
    }

    /// Reads `traceparent` from `headers`, starting a new trace when it is
    /// absent or invalid.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(TRACEPARENT)
            .and_then(|v| v.to_str().ok())
            .and_then(Self::from_traceparent)
            .unwrap_or_else(Self::new_root)
    }

    /// Header value identifying this service's span to downstream peers.
    pub fn traceparent(&self) -> String {
        format!(
            "00-{}-{}-{}",
            self.trace_id,
            self.span_id,
            if self.sampled { "01" } else { "00" }
        )
    }
}

fn new_span_id() -> String {
    format!("{:016x}", rand::random::<u64>())
}

fn is_lower_hex(s: &str, len: usize) -> bool {
    s.len() == len && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

fn is_hex_id(s: &str, len: usize) -> bool {
    is_lower_hex(s, len) && s.bytes().any(|b| b != b'0')
}

/// Creates the tracing middleware.
///
/// Must sit inside [`propagate`] so the span picks up the same trace
/// identity that is echoed to the caller.
///
/// # Span fields
///
/// `http_request{otel.kind, component, trace_id, span_id, parent_span_id,
/// http.method, http.url}` on entry; `http.status_code` and `latency_ms` on
/// response; `error` and `error.message` when the request failed.
pub fn layer() -> HttpTraceLayer {
    TraceLayer::new_for_http()
        .make_span_with(W3cMakeSpan)
        .on_response(RecordOutcome)
        .on_failure(RecordFailure)
}

/// Reads or starts the trace and echoes it on the response.
pub async fn propagate(mut req: Request, next: Next) -> Response {
    let trace = TraceContext::from_headers(req.headers());
    req.extensions_mut().insert(trace.clone());

    let mut response = next.run(req).await;

    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&trace.traceparent()) {
        headers.insert(TRACEPARENT, value);
    }
    if let Ok(value) = HeaderValue::from_str(&trace.trace_id) {
        headers.insert(X_TRACE_ID, value);
    }

    response
}

/// Opens the `http_request` span tagged with the W3C trace identity.
#[derive(Debug, Clone, Copy, Default)]
pub struct W3cMakeSpan;

impl<B> MakeSpan<B> for W3cMakeSpan {
    fn make_span(&mut self, request: &http::Request<B>) -> Span {
        let trace = request
            .extensions()
            .get::<TraceContext>()
            .cloned()
            .unwrap_or_else(|| TraceContext::from_headers(request.headers()));

        tracing::info_span!(
            "http_request",
            otel.kind = "server",
            component = "axum",
            trace_id = %trace.trace_id,
            span_id = %trace.span_id,
            parent_span_id = trace.parent_span_id.as_deref().unwrap_or_default(),
            http.method = %request.method(),
            http.url = %request.uri(),
            http.status_code = Empty,
            latency_ms = Empty,
            error = Empty,
            error.message = Empty,
        )
    }
}

/// Records the status code and any error the handler recorded.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordOutcome;

impl<B> OnResponse<B> for RecordOutcome {
    fn on_response(self, response: &http::Response<B>, latency: Duration, span: &Span) {
        span.record("http.status_code", response.status().as_u16());
        span.record("latency_ms", latency.as_secs_f64() * 1000.0);

        if let Some(recorded) = response.extensions().get::<RecordedError>() {
            span.record("error", true);
            span.record("error.message", recorded.detail.as_str());
        }
    }
}

/// Marks the span errored when the classifier reports a failure (any 5xx).
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordFailure;

impl OnFailure<ServerErrorsFailureClass> for RecordFailure {
    fn on_failure(&mut self, failure: ServerErrorsFailureClass, _latency: Duration, span: &Span) {
        span.record("error", true);
        if let ServerErrorsFailureClass::Error(message) = failure {
            span.record("error.message", message.as_str());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01";

    #[test]
    fn test_valid_traceparent_is_continued() {
        let trace = TraceContext::from_traceparent(VALID).unwrap();

        assert_eq!(trace.trace_id, "4bf92f3577b34da6a3ce929d0e0e4736");
        assert_eq!(trace.parent_span_id.as_deref(), Some("00f067aa0ba902b7"));
        assert_ne!(trace.span_id, "00f067aa0ba902b7");
        assert_eq!(trace.span_id.len(), 16);
        assert!(trace.sampled);
    }

    #[test]
    fn test_unsampled_flag() {
        let header = "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-00";
        assert!(!TraceContext::from_traceparent(header).unwrap().sampled);
    }

    #[test]
    fn test_invalid_traceparents_are_rejected() {
        let invalid = [
            "",
            "garbage",
            "01-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01",
            "00-00000000000000000000000000000000-00f067aa0ba902b7-01",
            "00-4bf92f3577b34da6a3ce929d0e0e4736-0000000000000000-01",
            "00-4BF92F3577B34DA6A3CE929D0E0E4736-00f067aa0ba902b7-01",
            "00-4bf92f3577b34da6a3ce929d0e0e473-00f067aa0ba902b7-01",
            "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01-extra",
        ];

        for header in invalid {
            assert!(
                TraceContext::from_traceparent(header).is_none(),
                "accepted {header:?}"
            );
        }
    }

    #[test]
    fn test_missing_header_starts_new_root() {
        let trace = TraceContext::from_headers(&HeaderMap::new());

        assert_eq!(trace.trace_id.len(), 32);
        assert!(trace.parent_span_id.is_none());
        assert!(trace.sampled);
    }

    #[test]
    fn test_traceparent_round_trips_through_parser() {
        let root = TraceContext::new_root();
        let child = TraceContext::from_traceparent(&root.traceparent()).unwrap();

        assert_eq!(child.trace_id, root.trace_id);
        assert_eq!(child.parent_span_id.as_deref(), Some(root.span_id.as_str()));
    }
}
