//! Shared application state injected into handlers and middleware stages.

use std::sync::Arc;

use crate::application::rate_limiter::RateLimiter;
use crate::application::services::{AlertNotifier, CredentialService, ExampleService};
use crate::config::Config;
use crate::domain::repositories::ExampleRepository;
use crate::infrastructure::metrics::Metrics;

/// Everything a request needs, cloned cheaply into each stage.
///
/// There are no globals: the limiter, metrics registry, credential service
/// and alert notifier all live here.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub example_service: Arc<ExampleService<dyn ExampleRepository>>,
    pub credentials: Arc<CredentialService>,
    pub rate_limiter: Arc<RateLimiter>,
    pub metrics: Arc<Metrics>,
    pub alerts: Arc<AlertNotifier>,
}

impl AppState {
    /// Builds state from configuration and a storage backend.
    pub fn new(config: Config, repository: Arc<dyn ExampleRepository>) -> Self {
        let credentials =
            CredentialService::new(&config.jwt_secret, config.jwt_issuer.clone(), config.jwt_ttl());
        let rate_limiter =
            RateLimiter::new(config.rate_limit_requests, config.rate_limit_period());
        let alerts = AlertNotifier::new(config.alert_webhook_url.clone());

        Self {
            example_service: Arc::new(ExampleService::new(repository)),
            credentials: Arc::new(credentials),
            rate_limiter: Arc::new(rate_limiter),
            metrics: Arc::new(Metrics::new()),
            alerts: Arc::new(alerts),
            config: Arc::new(config),
        }
    }

    /// Replaces the alert notifier, e.g. to point it at a test receiver.
    pub fn with_alerts(mut self, alerts: AlertNotifier) -> Self {
        self.alerts = Arc::new(alerts);
        self
    }
}
