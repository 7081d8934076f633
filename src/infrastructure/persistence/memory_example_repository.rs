//! In-process implementation of the example repository.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::entities::{Example, ExamplePatch, NewExample};
use crate::domain::repositories::ExampleRepository;
use crate::error::AppError;

/// A repository that keeps every record in memory.
///
/// Selected with `STORAGE_BACKEND=memory` and used by the HTTP integration
/// tests. Data is lost when the process exits.
///
/// [`set_available(false)`](Self::set_available) makes every call fail with
/// [`AppError::StorageUnavailable`], which lets callers exercise outage paths.
pub struct MemoryExampleRepository {
    table: RwLock<Table>,
    available: AtomicBool,
}

#[derive(Default)]
struct Table {
    rows: BTreeMap<i64, Example>,
    next_id: i64,
}

impl MemoryExampleRepository {
    pub fn new() -> Self {
        debug!("Using in-memory example storage");
        Self {
            table: RwLock::new(Table::default()),
            available: AtomicBool::new(true),
        }
    }

    /// Toggles simulated storage availability.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn ensure_available(&self) -> Result<(), AppError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(AppError::StorageUnavailable(
                "in-memory store marked unavailable".to_string(),
            ))
        }
    }
}

impl Default for MemoryExampleRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExampleRepository for MemoryExampleRepository {
    async fn create(&self, new_example: NewExample) -> Result<Example, AppError> {
        self.ensure_available()?;

        let mut table = self.table.write().await;
        table.next_id += 1;
        let now = Utc::now();
        let example = Example {
            id: table.next_id,
            title: new_example.title,
            description: new_example.description,
            status: new_example.status,
            sort_order: new_example.sort_order,
            created_by: new_example.created_by,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        table.rows.insert(example.id, example.clone());

        Ok(example)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Example>, AppError> {
        self.ensure_available()?;

        let table = self.table.read().await;
        Ok(table.rows.get(&id).filter(|e| !e.is_deleted()).cloned())
    }

    async fn find_by_id_unscoped(&self, id: i64) -> Result<Option<Example>, AppError> {
        self.ensure_available()?;

        let table = self.table.read().await;
        Ok(table.rows.get(&id).cloned())
    }

    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<Example>, AppError> {
        self.ensure_available()?;

        let table = self.table.read().await;
        let mut live: Vec<&Example> = table.rows.values().filter(|e| !e.is_deleted()).collect();
        live.sort_by_key(|e| (e.sort_order, e.id));

        Ok(live
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(0))
            .take(usize::try_from(limit).unwrap_or(0))
            .cloned()
            .collect())
    }

    async fn count(&self) -> Result<i64, AppError> {
        self.ensure_available()?;

        let table = self.table.read().await;
        let live = table.rows.values().filter(|e| !e.is_deleted()).count();
        Ok(i64::try_from(live).unwrap_or(i64::MAX))
    }

    async fn update(&self, id: i64, patch: ExamplePatch) -> Result<Example, AppError> {
        self.ensure_available()?;

        let mut table = self.table.write().await;
        let example = table
            .rows
            .get_mut(&id)
            .filter(|e| !e.is_deleted())
            .ok_or(AppError::NotFound)?;
        patch.apply_to(example, Utc::now());

        Ok(example.clone())
    }

    async fn soft_delete(&self, id: i64) -> Result<bool, AppError> {
        self.ensure_available()?;

        let mut table = self.table.write().await;
        match table.rows.get_mut(&id).filter(|e| !e.is_deleted()) {
            Some(example) => {
                let now = Utc::now();
                example.deleted_at = Some(now);
                example.updated_at = now;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn ping(&self) -> Result<(), AppError> {
        self.ensure_available()
    }
}
