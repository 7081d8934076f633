//! DTOs for the example resource endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::entities::{Example, ExamplePatch, NewExample, STATUS_ENABLED};

/// Request body for `POST /api/v1/examples`.
///
/// # Example
///
/// ```json
/// {
///   "title": "Quarterly report",
///   "description": "Draft for review",
///   "status": 1,
///   "sort": 10
/// }
/// ```
#[derive(Debug, Deserialize, Validate)]
pub struct CreateExampleRequest {
    #[validate(length(min = 1, max = 255, message = "title must be 1-255 characters"))]
    pub title: String,

    #[validate(length(max = 2000, message = "description must be at most 2000 characters"))]
    pub description: Option<String>,

    /// 0 = disabled, 1 = enabled. Defaults to enabled.
    #[validate(range(min = 0, max = 1, message = "status must be 0 or 1"))]
    pub status: Option<i32>,

    #[serde(alias = "sort")]
    #[validate(range(min = 0, message = "sort_order must not be negative"))]
    pub sort_order: Option<i32>,
}

impl CreateExampleRequest {
    pub fn into_new_example(self, owner: &str) -> NewExample {
        let mut new_example = NewExample::new(self.title, owner);
        new_example.description = self.description.unwrap_or_default();
        new_example.status = self.status.unwrap_or(STATUS_ENABLED);
        new_example.sort_order = self.sort_order.unwrap_or_default();
        new_example
    }
}

/// Request body for `PUT /api/v1/examples/{id}`.
///
/// All fields are optional. Only provided fields are changed.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateExampleRequest {
    #[validate(length(min = 1, max = 255, message = "title must be 1-255 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 2000, message = "description must be at most 2000 characters"))]
    pub description: Option<String>,

    #[validate(range(min = 0, max = 1, message = "status must be 0 or 1"))]
    pub status: Option<i32>,

    #[serde(alias = "sort")]
    #[validate(range(min = 0, message = "sort_order must not be negative"))]
    pub sort_order: Option<i32>,
}

impl From<UpdateExampleRequest> for ExamplePatch {
    fn from(req: UpdateExampleRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
            status: req.status,
            sort_order: req.sort_order,
        }
    }
}

/// Public view of an example record.
#[derive(Debug, Serialize)]
pub struct ExampleResponse {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub status: i32,
    pub sort_order: i32,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Example> for ExampleResponse {
    fn from(example: Example) -> Self {
        Self {
            id: example.id,
            title: example.title,
            description: example.description,
            status: example.status,
            sort_order: example.sort_order,
            created_by: example.created_by,
            created_at: example.created_at,
            updated_at: example.updated_at,
        }
    }
}

/// Acknowledgement for `DELETE /api/v1/examples/{id}`.
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub id: i64,
    pub deleted: bool,
}
