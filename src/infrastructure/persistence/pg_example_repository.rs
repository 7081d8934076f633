//! PostgreSQL implementation of the example repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{Example, ExamplePatch, NewExample};
use crate::domain::repositories::ExampleRepository;
use crate::error::AppError;

/// PostgreSQL repository for example records.
///
/// Uses soft delete: `deleted_at IS NOT NULL` means deleted.
/// Queries are checked at runtime so the crate builds without a live database.
pub struct PgExampleRepository {
    pool: Arc<PgPool>,
}

impl PgExampleRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ExampleRow {
    id: i64,
    title: String,
    description: String,
    status: i32,
    sort_order: i32,
    created_by: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl From<ExampleRow> for Example {
    fn from(row: ExampleRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            status: row.status,
            sort_order: row.sort_order,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        }
    }
}

#[async_trait]
impl ExampleRepository for PgExampleRepository {
    async fn create(&self, new_example: NewExample) -> Result<Example, AppError> {
        let row = sqlx::query_as::<_, ExampleRow>(
            r#"
            INSERT INTO examples (title, description, status, sort_order, created_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, title, description, status, sort_order, created_by,
                      created_at, updated_at, deleted_at
            "#,
        )
        .bind(new_example.title)
        .bind(new_example.description)
        .bind(new_example.status)
        .bind(new_example.sort_order)
        .bind(new_example.created_by)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(row.into())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Example>, AppError> {
        let row = sqlx::query_as::<_, ExampleRow>(
            r#"
            SELECT id, title, description, status, sort_order, created_by,
                   created_at, updated_at, deleted_at
            FROM examples
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(Example::from))
    }

    async fn find_by_id_unscoped(&self, id: i64) -> Result<Option<Example>, AppError> {
        let row = sqlx::query_as::<_, ExampleRow>(
            r#"
            SELECT id, title, description, status, sort_order, created_by,
                   created_at, updated_at, deleted_at
            FROM examples
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(Example::from))
    }

    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<Example>, AppError> {
        let rows = sqlx::query_as::<_, ExampleRow>(
            r#"
            SELECT id, title, description, status, sort_order, created_by,
                   created_at, updated_at, deleted_at
            FROM examples
            WHERE deleted_at IS NULL
            ORDER BY sort_order ASC, id ASC
            OFFSET $1
            LIMIT $2
            "#,
        )
        .bind(offset)
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows.into_iter().map(Example::from).collect())
    }

    async fn count(&self) -> Result<i64, AppError> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM examples WHERE deleted_at IS NULL")
                .fetch_one(self.pool.as_ref())
                .await?;

        Ok(total)
    }

    async fn update(&self, id: i64, patch: ExamplePatch) -> Result<Example, AppError> {
        let row = sqlx::query_as::<_, ExampleRow>(
            r#"
            UPDATE examples
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                status = COALESCE($4, status),
                sort_order = COALESCE($5, sort_order),
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING id, title, description, status, sort_order, created_by,
                      created_at, updated_at, deleted_at
            "#,
        )
        .bind(id)
        .bind(patch.title)
        .bind(patch.description)
        .bind(patch.status)
        .bind(patch.sort_order)
        .fetch_optional(self.pool.as_ref())
        .await?;

        row.map(Example::from).ok_or(AppError::NotFound)
    }

    async fn soft_delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE examples
            SET deleted_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(self.pool.as_ref())
            .await?;

        Ok(())
    }
}
