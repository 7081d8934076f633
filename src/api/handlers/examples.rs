//! Handlers for the example resource endpoints.

use axum::extract::{Query, State, rejection::QueryRejection};

use crate::api::dto::envelope::{Envelope, Page};
use crate::api::dto::example::{
    CreateExampleRequest, DeleteResponse, ExampleResponse, UpdateExampleRequest,
};
use crate::api::dto::pagination::PageQuery;
use crate::api::extract::{CurrentUser, ExampleId, ValidatedJson};
use crate::error::AppError;
use crate::state::AppState;

/// Lists live examples, one page at a time.
///
/// # Endpoint
///
/// `GET /api/v1/examples?page=1&size=10`
///
/// Authentication is optional. Bad `page`/`size` values fall back to the
/// defaults instead of failing.
pub async fn list_examples_handler(
    State(state): State<AppState>,
    user: Option<CurrentUser>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Envelope<Page<ExampleResponse>>, AppError> {
    let query = query.map(|Query(q)| q).unwrap_or_default();
    let (page, size) = query.resolve();

    let (items, total) = state.example_service.list(page, size).await?;

    tracing::debug!(
        page,
        size,
        total,
        caller = user.as_ref().map(CurrentUser::identity).unwrap_or("anonymous"),
        "examples listed"
    );

    Ok(Envelope::success(Page {
        list: items.into_iter().map(ExampleResponse::from).collect(),
        total,
        page,
        size,
    }))
}

/// # Endpoint
///
/// `GET /api/v1/examples/{id}`
///
/// # Errors
///
/// Returns 400 if `id` is not a positive integer.
/// Returns 404 if the record does not exist or was deleted.
pub async fn get_example_handler(
    State(state): State<AppState>,
    ExampleId(id): ExampleId,
) -> Result<Envelope<ExampleResponse>, AppError> {
    let example = state.example_service.get(id).await?;
    Ok(Envelope::success(example.into()))
}

/// Creates a record owned by the caller.
///
/// # Endpoint
///
/// `POST /api/v1/examples`
///
/// # Errors
///
/// Returns 400 for malformed JSON or rule violations.
/// Returns 401 without a valid token.
pub async fn create_example_handler(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidatedJson(payload): ValidatedJson<CreateExampleRequest>,
) -> Result<Envelope<ExampleResponse>, AppError> {
    let created = state
        .example_service
        .create(payload.into_new_example(user.identity()))
        .await?;

    Ok(Envelope::success(created.into()))
}

/// Partially updates a record.
///
/// # Endpoint
///
/// `PUT /api/v1/examples/{id}`
///
/// # Errors
///
/// Returns 403 unless the caller owns the record or is `admin`.
/// Returns 404 if the record does not exist or was deleted.
pub async fn update_example_handler(
    State(state): State<AppState>,
    user: CurrentUser,
    ExampleId(id): ExampleId,
    ValidatedJson(payload): ValidatedJson<UpdateExampleRequest>,
) -> Result<Envelope<ExampleResponse>, AppError> {
    let updated = state
        .example_service
        .update(id, payload.into(), user.identity())
        .await?;

    Ok(Envelope::success(updated.into()))
}

/// Soft-deletes a record.
///
/// # Endpoint
///
/// `DELETE /api/v1/examples/{id}`
///
/// # Errors
///
/// Returns 403 unless the caller owns the record or is `admin`.
/// Returns 404 if the record does not exist or was already deleted.
pub async fn delete_example_handler(
    State(state): State<AppState>,
    user: CurrentUser,
    ExampleId(id): ExampleId,
) -> Result<Envelope<DeleteResponse>, AppError> {
    state.example_service.delete(id, user.identity()).await?;

    Ok(Envelope::success(DeleteResponse { id, deleted: true }))
}
