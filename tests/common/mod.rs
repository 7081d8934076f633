#![allow(dead_code)]

use axum::Router;
use axum_test::TestServer;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use resource_service::config::{Config, StorageBackend};
use resource_service::domain::repositories::ExampleRepository;
use resource_service::infrastructure::persistence::MemoryExampleRepository;
use resource_service::routes::app_router;
use resource_service::state::AppState;

pub const TEST_SECRET: &str = "integration-test-secret";

/// Memory-backed config with a limit high enough not to interfere.
pub fn test_config() -> Config {
    Config {
        storage_backend: StorageBackend::Memory,
        database_url: None,
        jwt_secret: TEST_SECRET.to_string(),
        rate_limit_requests: 10_000,
        ..Config::default()
    }
}

pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    pub repository: Arc<MemoryExampleRepository>,
}

pub fn create_test_state(config: Config) -> (AppState, Arc<MemoryExampleRepository>) {
    let repository = Arc::new(MemoryExampleRepository::new());
    let state = AppState::new(config, repository.clone() as Arc<dyn ExampleRepository>);
    (state, repository)
}

pub fn spawn_app() -> TestApp {
    spawn_app_with(test_config())
}

pub fn spawn_app_with(config: Config) -> TestApp {
    let (state, repository) = create_test_state(config);
    let server = make_server(app_router(state.clone()));

    TestApp {
        server,
        state,
        repository,
    }
}

pub fn make_server(router: Router) -> TestServer {
    TestServer::new(router).unwrap()
}

/// `Authorization` header value for a fresh token.
pub fn bearer(state: &AppState, user_id: i64, name: &str) -> String {
    let issued = state
        .credentials
        .issue(user_id, name, Duration::from_secs(3600))
        .unwrap();
    format!("Bearer {}", issued.token)
}

/// `Authorization` header value for a token issued at `at` with `ttl`.
pub fn bearer_issued_at(
    state: &AppState,
    user_id: i64,
    name: &str,
    ttl: Duration,
    at: DateTime<Utc>,
) -> String {
    let issued = state
        .credentials
        .issue_at(user_id, name, ttl, at)
        .unwrap();
    format!("Bearer {}", issued.token)
}
