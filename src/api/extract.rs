//! Request extractors that reject with [`AppError`] instead of axum's plain-text rejections.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, OptionalFromRequestParts, Path, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use std::convert::Infallible;
use validator::Validate;

use crate::application::services::Claims;
use crate::error::AppError;

/// Claims attached by the auth stage.
///
/// As a required extractor it fails with [`AppError::Unauthorized`] when the
/// route was not behind authentication; `Option<CurrentUser>` never fails.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Claims);

impl CurrentUser {
    pub fn identity(&self) -> &str {
        self.0.identity()
    }
}

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(CurrentUser)
            .ok_or(AppError::Unauthorized)
    }
}

impl<S: Send + Sync> OptionalFromRequestParts<S> for CurrentUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<Claims>().cloned().map(CurrentUser))
    }
}

/// JSON body that has passed its `validator` rules.
///
/// Malformed JSON is [`AppError::Bind`]; rule violations are
/// [`AppError::Validation`].
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::Bind(rejection.body_text()))?;

        value.validate()?;

        Ok(Self(value))
    }
}

/// Positive numeric `{id}` path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExampleId(pub i64);

impl<S: Send + Sync> FromRequestParts<S> for ExampleId {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = <Path<i64> as FromRequestParts<S>>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::Bind(rejection.body_text()))?;

        if id < 1 {
            return Err(AppError::Bind(format!("id must be positive, got {id}")));
        }

        Ok(Self(id))
    }
}
