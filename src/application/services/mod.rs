//! Business logic services for the application layer.

pub mod alert_service;
pub mod credential_service;
pub mod example_service;

pub use alert_service::{AlertNotifier, PanicReport};
pub use credential_service::{Claims, CredentialService, IssuedToken};
pub use example_service::ExampleService;
