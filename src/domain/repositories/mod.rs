//! Repository traits implemented by the infrastructure layer.

pub mod example_repository;

pub use example_repository::ExampleRepository;

#[cfg(test)]
pub use example_repository::MockExampleRepository;
