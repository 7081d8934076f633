//! Uniform response envelope.

use axum::{
    Json,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// `{code, message, data?}` wrapper around every API body.
///
/// `code == 0` means success. Errors are rendered by
/// [`AppError`](crate::error::AppError), which picks the HTTP status.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub code: i32,
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: 0,
            message: "OK".to_string(),
            data: Some(data),
        }
    }

    pub fn failure(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Paginated list payload.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub list: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub size: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_shape() {
        let value = serde_json::to_value(Envelope::success(json!({"id": 1}))).unwrap();
        assert_eq!(value, json!({"code": 0, "message": "OK", "data": {"id": 1}}));
    }

    #[test]
    fn test_failure_omits_data() {
        let value = serde_json::to_value(Envelope::<()>::failure(40001, "Resource not found")).unwrap();
        assert_eq!(value, json!({"code": 40001, "message": "Resource not found"}));
    }

    #[test]
    fn test_page_shape() {
        let page = Page {
            list: vec![1, 2],
            total: 12,
            page: 2,
            size: 2,
        };
        let value = serde_json::to_value(Envelope::success(page)).unwrap();
        assert_eq!(value["data"], json!({"list": [1, 2], "total": 12, "page": 2, "size": 2}));
    }
}
