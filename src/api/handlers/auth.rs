//! Handler for token refresh.

use axum::{extract::State, http::HeaderMap};

use crate::api::dto::auth::TokenResponse;
use crate::api::dto::envelope::Envelope;
use crate::api::middleware::auth::token_from_headers;
use crate::error::AppError;
use crate::state::AppState;

/// Exchanges a token in its last 30 minutes for a new one.
///
/// # Endpoint
///
/// `POST /api/v1/auth/refresh` with `Authorization: Bearer <token>`
///
/// # Errors
///
/// Returns 401 if the header is missing or the token does not verify.
/// Returns 400 (code 20006) if the token is not yet in its refresh window.
pub async fn refresh_token_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Envelope<TokenResponse>, AppError> {
    let token = token_from_headers(&headers)?;
    let issued = state.credentials.refresh(token)?;

    tracing::info!(user = %issued.claims.username, "token refreshed");

    Ok(Envelope::success(issued.into()))
}
