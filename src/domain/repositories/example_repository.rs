//! Repository trait for example records.

use crate::domain::entities::{Example, ExamplePatch, NewExample};
use crate::error::AppError;
use async_trait::async_trait;

/// Storage contract for [`Example`] records.
///
/// Every method except [`find_by_id_unscoped`](ExampleRepository::find_by_id_unscoped)
/// ignores soft-deleted rows. Each call is atomic on its own; callers that
/// read and then write get last-writer-wins semantics.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgExampleRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::persistence::MemoryExampleRepository`] - in-process implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExampleRepository: Send + Sync {
    /// Inserts a new record and returns it with its assigned id and timestamps.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::AlreadyExists`] on a unique violation.
    /// Returns [`AppError::StorageUnavailable`] on database errors.
    async fn create(&self, new_example: NewExample) -> Result<Example, AppError>;

    /// Finds a live (not soft-deleted) record by id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::StorageUnavailable`] on database errors.
    async fn find_by_id(&self, id: i64) -> Result<Option<Example>, AppError>;

    /// Finds a record by id, including soft-deleted ones.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::StorageUnavailable`] on database errors.
    async fn find_by_id_unscoped(&self, id: i64) -> Result<Option<Example>, AppError>;

    /// Lists live records ordered by `sort_order`, then `id`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::StorageUnavailable`] on database errors.
    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<Example>, AppError>;

    /// Counts live records.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::StorageUnavailable`] on database errors.
    async fn count(&self) -> Result<i64, AppError>;

    /// Applies the present fields of `patch` and bumps `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no live record has this id.
    /// Returns [`AppError::StorageUnavailable`] on database errors.
    async fn update(&self, id: i64, patch: ExamplePatch) -> Result<Example, AppError>;

    /// Marks a live record as deleted.
    ///
    /// Returns `false` when no live record has this id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::StorageUnavailable`] on database errors.
    async fn soft_delete(&self, id: i64) -> Result<bool, AppError>;

    /// Checks that the backing store is reachable.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::StorageUnavailable`] if it is not.
    async fn ping(&self) -> Result<(), AppError>;
}
