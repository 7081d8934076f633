//! Example repository implementations.
//!
//! - [`PgExampleRepository`] - PostgreSQL storage via SQLx
//! - [`MemoryExampleRepository`] - in-process storage for local runs and tests

pub mod memory_example_repository;
pub mod pg_example_repository;

pub use memory_example_repository::MemoryExampleRepository;
pub use pg_example_repository::PgExampleRepository;
