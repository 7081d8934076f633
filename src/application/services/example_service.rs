//! Example resource service: pagination, ownership checks and soft delete.

use crate::domain::entities::{Example, ExamplePatch, NewExample, SYSTEM_IDENTITY};
use crate::domain::repositories::ExampleRepository;
use crate::error::AppError;
use std::sync::Arc;

/// Service for the example resource.
///
/// Mutations are check-then-write: the record is loaded, ownership is
/// verified, then the repository applies the change. Two concurrent updates
/// to the same record resolve as last-writer-wins.
pub struct ExampleService<R: ExampleRepository + ?Sized> {
    repository: Arc<R>,
}

impl<R: ExampleRepository + ?Sized> ExampleService<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Returns one page of live records and the total live count.
    ///
    /// `page` starts at 1. A page past the end yields an empty list with the
    /// true total.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::StorageUnavailable`] on database errors.
    pub async fn list(&self, page: u32, size: u32) -> Result<(Vec<Example>, i64), AppError> {
        let offset = i64::from(page.max(1) - 1) * i64::from(size);
        let limit = i64::from(size);

        let total = self.repository.count().await?;
        let items = self.repository.list(offset, limit).await?;

        Ok((items, total))
    }

    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the record does not exist or was deleted.
    /// Returns [`AppError::StorageUnavailable`] on database errors.
    pub async fn get(&self, id: i64) -> Result<Example, AppError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Looks a record up even if it was soft-deleted.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the id was never assigned.
    /// Returns [`AppError::StorageUnavailable`] on database errors.
    pub async fn get_including_deleted(&self, id: i64) -> Result<Example, AppError> {
        self.repository
            .find_by_id_unscoped(id)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Creates a record owned by `new_example.created_by`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the title is blank.
    /// Returns [`AppError::AlreadyExists`] on a unique violation.
    /// Returns [`AppError::StorageUnavailable`] on database errors.
    pub async fn create(&self, mut new_example: NewExample) -> Result<Example, AppError> {
        new_example.title = normalize_title(&new_example.title)?;

        let created = self.repository.create(new_example).await?;
        tracing::info!(id = created.id, owner = %created.created_by, "example created");

        Ok(created)
    }

    /// Applies `patch` if `actor` owns the record or is the admin identity.
    ///
    /// An empty patch returns the record unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the record does not exist or was deleted.
    /// Returns [`AppError::PermissionDenied`] if `actor` may not modify it.
    /// Returns [`AppError::Validation`] if the new title is blank.
    /// Returns [`AppError::StorageUnavailable`] on database errors.
    pub async fn update(
        &self,
        id: i64,
        mut patch: ExamplePatch,
        actor: &str,
    ) -> Result<Example, AppError> {
        let existing = self.get(id).await?;
        ensure_can_modify(&existing, actor)?;

        if let Some(title) = patch.title.as_deref() {
            patch.title = Some(normalize_title(title)?);
        }

        if patch.is_empty() {
            return Ok(existing);
        }

        let updated = self.repository.update(id, patch).await?;
        tracing::info!(id, actor, "example updated");

        Ok(updated)
    }

    /// Soft-deletes the record if `actor` owns it or is the admin identity.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the record does not exist or was deleted.
    /// Returns [`AppError::PermissionDenied`] if `actor` may not delete it.
    /// Returns [`AppError::StorageUnavailable`] on database errors.
    pub async fn delete(&self, id: i64, actor: &str) -> Result<(), AppError> {
        let existing = self.get(id).await?;
        ensure_can_modify(&existing, actor)?;

        if !self.repository.soft_delete(id).await? {
            // Deleted concurrently between the lookup and the write.
            return Err(AppError::NotFound);
        }
        tracing::info!(id, actor, "example deleted");

        Ok(())
    }

    /// Inserts the two starter records when the table is empty.
    ///
    /// Returns how many rows were inserted.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::StorageUnavailable`] on database errors.
    pub async fn seed_defaults(&self) -> Result<usize, AppError> {
        if self.repository.count().await? > 0 {
            return Ok(0);
        }

        let seeds = [
            ("Example one", "First seeded example record", 1),
            ("Example two", "Second seeded example record", 2),
        ];

        for (title, description, sort_order) in seeds {
            let mut draft = NewExample::new(title, SYSTEM_IDENTITY);
            draft.description = description.to_string();
            draft.sort_order = sort_order;
            self.repository.create(draft).await?;
        }
        tracing::info!(count = seeds.len(), "seeded example records");

        Ok(seeds.len())
    }

    /// # Errors
    ///
    /// Returns [`AppError::StorageUnavailable`] if the store is unreachable.
    pub async fn ping(&self) -> Result<(), AppError> {
        self.repository.ping().await
    }
}

fn ensure_can_modify(example: &Example, actor: &str) -> Result<(), AppError> {
    if example.can_be_modified_by(actor) {
        Ok(())
    } else {
        tracing::warn!(id = example.id, owner = %example.created_by, actor, "modification refused");
        Err(AppError::PermissionDenied)
    }
}

fn normalize_title(title: &str) -> Result<String, AppError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation("title: must not be blank".to_string()));
    }
    Ok(trimmed.to_string())
}
