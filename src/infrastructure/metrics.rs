//! Prometheus metrics collection.
//!
//! One [`Metrics`] value owns its own registry and lives in
//! [`AppState`](crate::state::AppState); nothing is registered globally.

use prometheus_client::encoding::{EncodeLabelSet, text::encode};
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::metrics::histogram::{Histogram, exponential_buckets};
use prometheus_client::registry::Registry;

/// Route label used when a request matched no route.
pub const UNMATCHED_ROUTE: &str = "unmatched";

/// HTTP request labels.
///
/// `route` is the route template (`/api/v1/examples/{id}`), never the raw path.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct HttpLabels {
    pub method: String,
    pub route: String,
    pub status: u16,
}

/// Labels for request body sizes, known before the status is.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct RouteLabels {
    pub method: String,
    pub route: String,
}

/// Application metrics.
pub struct Metrics {
    registry: Registry,

    /// HTTP request counter by method/route/status.
    pub http_requests: Family<HttpLabels, Counter>,

    /// HTTP request duration histogram.
    pub http_duration_seconds: Family<HttpLabels, Histogram>,

    pub http_request_size_bytes: Family<RouteLabels, Histogram>,

    pub http_response_size_bytes: Family<HttpLabels, Histogram>,

    /// Requests currently inside the pipeline.
    pub active_connections: Gauge,

    /// Rate limit rejections counter.
    pub rate_limit_rejections: Counter,

    /// Handler panics turned into 500 responses.
    pub panics_recovered: Counter,
}

impl Metrics {
    /// Create a new metrics registry.
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let http_requests = Family::<HttpLabels, Counter>::default();
        registry.register("http_requests", "Total HTTP requests", http_requests.clone());

        let http_duration_seconds = Family::<HttpLabels, Histogram>::new_with_constructor(|| {
            Histogram::new(exponential_buckets(0.001, 2.0, 12))
        });
        registry.register(
            "http_request_duration_seconds",
            "HTTP request duration in seconds",
            http_duration_seconds.clone(),
        );

        let http_request_size_bytes = Family::<RouteLabels, Histogram>::new_with_constructor(|| {
            Histogram::new(exponential_buckets(100.0, 10.0, 8))
        });
        registry.register(
            "http_request_size_bytes",
            "HTTP request body size in bytes",
            http_request_size_bytes.clone(),
        );

        let http_response_size_bytes = Family::<HttpLabels, Histogram>::new_with_constructor(|| {
            Histogram::new(exponential_buckets(100.0, 10.0, 8))
        });
        registry.register(
            "http_response_size_bytes",
            "HTTP response body size in bytes",
            http_response_size_bytes.clone(),
        );

        let active_connections = Gauge::default();
        registry.register(
            "http_active_connections",
            "Requests currently being served",
            active_connections.clone(),
        );

        let rate_limit_rejections = Counter::default();
        registry.register(
            "rate_limit_rejections",
            "Rate limit rejections",
            rate_limit_rejections.clone(),
        );

        let panics_recovered = Counter::default();
        registry.register(
            "panics_recovered",
            "Handler panics converted into 500 responses",
            panics_recovered.clone(),
        );

        Self {
            registry,
            http_requests,
            http_duration_seconds,
            http_request_size_bytes,
            http_response_size_bytes,
            active_connections,
            rate_limit_rejections,
            panics_recovered,
        }
    }

    /// Record an HTTP request.
    pub fn record_request(&self, method: &str, route: &str, status: u16, duration_secs: f64) {
        let labels = HttpLabels {
            method: method.to_string(),
            route: route.to_string(),
            status,
        };

        self.http_requests.get_or_create(&labels).inc();
        self.http_duration_seconds
            .get_or_create(&labels)
            .observe(duration_secs);
    }

    pub fn record_request_size(&self, method: &str, route: &str, bytes: u64) {
        let labels = RouteLabels {
            method: method.to_string(),
            route: route.to_string(),
        };

        self.http_request_size_bytes
            .get_or_create(&labels)
            .observe(bytes as f64);
    }

    pub fn record_response_size(&self, method: &str, route: &str, status: u16, bytes: u64) {
        let labels = HttpLabels {
            method: method.to_string(),
            route: route.to_string(),
            status,
        };

        self.http_response_size_bytes
            .get_or_create(&labels)
            .observe(bytes as f64);
    }

    /// Record a rate limit rejection.
    pub fn record_rate_limit(&self) {
        self.rate_limit_rejections.inc();
    }

    pub fn record_panic(&self) {
        self.panics_recovered.inc();
    }

    /// Increments the active gauge and returns a guard that decrements it on drop.
    ///
    /// The guard is dropped exactly once whether the request completes,
    /// is cancelled, or unwinds.
    pub fn track_connection(&self) -> ActiveConnection {
        self.active_connections.inc();
        ActiveConnection {
            gauge: self.active_connections.clone(),
        }
    }

    /// Encode metrics in Prometheus text format.
    ///
    /// # Errors
    ///
    /// Returns [`std::fmt::Error`] if a metric fails to encode.
    pub fn encode(&self) -> Result<String, std::fmt::Error> {
        let mut buffer = String::new();
        encode(&mut buffer, &self.registry)?;
        Ok(buffer)
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics").finish()
    }
}

/// Drop guard returned by [`Metrics::track_connection`].
#[must_use = "the gauge is decremented when the guard is dropped"]
pub struct ActiveConnection {
    gauge: Gauge,
}

impl Drop for ActiveConnection {
    fn drop(&mut self) {
        self.gauge.dec();
    }
}
