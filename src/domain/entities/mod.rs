//! Core domain entities.
//!
//! Entities are plain data structures; creation and partial updates use
//! separate structs (`NewExample`, `ExamplePatch`).

pub mod example;

pub use example::{
    ADMIN_IDENTITY, Example, ExamplePatch, NewExample, STATUS_DISABLED, STATUS_ENABLED,
    SYSTEM_IDENTITY,
};
