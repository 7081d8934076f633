//! Application error type and its mapping onto the response envelope.
//!
//! Every failure a handler or middleware stage can produce is an [`AppError`]
//! variant. Each variant owns a fixed `(code, message, HTTP status)` triple;
//! the client only ever sees the table message, while the variant payload
//! (the internal detail) goes to the logs.
//!
//! | Variant | code | HTTP |
//! |---|---|---|
//! | `Internal` | 10001 | 500 |
//! | `Bind` | 10002 | 400 |
//! | `Validation` | 10003 | 400 |
//! | `StorageUnavailable` | 10004 | 500 |
//! | `RateLimited` | 10007 | 429 |
//! | `InvalidCredential` | 20001 | 401 |
//! | `TokenExpired` | 20002 | 401 |
//! | `TokenNotFound` | 20003 | 401 |
//! | `PermissionDenied` | 20004 | 403 |
//! | `Unauthorized` | 20005 | 401 |
//! | `NotRefreshable` | 20006 | 400 |
//! | `NotFound` | 40001 | 404 |
//! | `AlreadyExists` | 40002 | 409 |
//! | `Conflict` | 40003 | 409 |
//! | `Business` | 50001 | 422 |

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::api::dto::envelope::Envelope;

/// Marker left in the response extensions whenever an [`AppError`] is rendered.
///
/// The access log and tracing stages read it on the way out to decide the log
/// level and whether the span is marked as errored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedError {
    pub code: i32,
    pub detail: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("internal error: {0}")]
    Internal(String),

    #[error("malformed request: {0}")]
    Bind(String),

    /// Rule violations are client-facing, so the detail doubles as the message.
    #[error("{0}")]
    Validation(String),

    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("rate limit exceeded")]
    RateLimited,

    #[error("invalid credential")]
    InvalidCredential,

    #[error("token expired")]
    TokenExpired,

    #[error("authorization header missing")]
    TokenNotFound,

    #[error("permission denied")]
    PermissionDenied,

    #[error("unauthorized")]
    Unauthorized,

    #[error("token is not within its refresh window")]
    NotRefreshable,

    #[error("resource not found")]
    NotFound,

    #[error("resource already exists")]
    AlreadyExists,

    #[error("resource conflict")]
    Conflict,

    #[error("{0}")]
    Business(String),
}

impl AppError {
    /// Numeric envelope code.
    pub fn code(&self) -> i32 {
        match self {
            Self::Internal(_) => 10001,
            Self::Bind(_) => 10002,
            Self::Validation(_) => 10003,
            Self::StorageUnavailable(_) => 10004,
            Self::RateLimited => 10007,
            Self::InvalidCredential => 20001,
            Self::TokenExpired => 20002,
            Self::TokenNotFound => 20003,
            Self::PermissionDenied => 20004,
            Self::Unauthorized => 20005,
            Self::NotRefreshable => 20006,
            Self::NotFound => 40001,
            Self::AlreadyExists => 40002,
            Self::Conflict => 40003,
            Self::Business(_) => 50001,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Internal(_) | Self::StorageUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Bind(_) | Self::Validation(_) | Self::NotRefreshable => StatusCode::BAD_REQUEST,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::InvalidCredential
            | Self::TokenExpired
            | Self::TokenNotFound
            | Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::PermissionDenied => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::AlreadyExists | Self::Conflict => StatusCode::CONFLICT,
            Self::Business(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    /// Message written into the envelope.
    ///
    /// Internal and storage faults never leak their detail.
    pub fn public_message(&self) -> String {
        match self {
            Self::Internal(_) => "Internal server error".to_string(),
            Self::Bind(_) => "Invalid request parameters".to_string(),
            Self::Validation(detail) => format!("Validation failed: {detail}"),
            Self::StorageUnavailable(_) => "Database error".to_string(),
            Self::RateLimited => "Too many requests, please try again later".to_string(),
            Self::InvalidCredential => "Invalid token".to_string(),
            Self::TokenExpired => "Token expired".to_string(),
            Self::TokenNotFound => "Authorization token not provided".to_string(),
            Self::PermissionDenied => "Permission denied".to_string(),
            Self::Unauthorized => "Unauthorized".to_string(),
            Self::NotRefreshable => "Token is not eligible for refresh yet".to_string(),
            Self::NotFound => "Resource not found".to_string(),
            Self::AlreadyExists => "Resource already exists".to_string(),
            Self::Conflict => "Resource conflict".to_string(),
            Self::Business(detail) => detail.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "request failed");
        } else {
            tracing::debug!(code = self.code(), error = %self, "request rejected");
        }

        let body = Envelope::<()>::failure(self.code(), self.public_message());
        let mut response = (status, Json(body)).into_response();

        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }

        response.extensions_mut().insert(RecordedError {
            code: self.code(),
            detail: self.to_string(),
        });

        response
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        if let Some(db) = e.as_database_error() {
            if db.is_unique_violation() {
                return AppError::AlreadyExists;
            }
        }

        match e {
            sqlx::Error::RowNotFound => AppError::NotFound,
            other => AppError::StorageUnavailable(other.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}
