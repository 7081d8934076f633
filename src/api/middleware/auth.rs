//! Bearer token authentication middleware.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};

use crate::application::services::{Claims, CredentialService};
use crate::{error::AppError, state::AppState};

const BEARER_PREFIX: &str = "Bearer ";

/// Authenticates requests using Bearer tokens from the Authorization header.
///
/// # Header Format
///
/// ```text
/// Authorization: Bearer <token>
/// ```
///
/// On success the verified [`Claims`] are inserted into the request
/// extensions, where the `CurrentUser` extractor picks them up.
///
/// # Errors
///
/// - header missing or empty: `401` with code 20003
/// - wrong scheme, bad signature, expired or not yet valid: `401` with code 20001
///
/// Adds `WWW-Authenticate: Bearer` header to 401 responses per RFC 6750.
///
/// # Example
///
/// ```rust,ignore
/// use axum::{Router, routing::post, middleware};
/// use crate::api::middleware::auth;
///
/// let protected = Router::new()
///     .route("/api/v1/examples", post(create_example_handler))
///     .route_layer(middleware::from_fn_with_state(state.clone(), auth::require));
/// ```
pub async fn require(
    State(st): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = authenticate(&st.credentials, req.headers())?;
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Like [`require`] but never rejects.
///
/// Claims are attached only when a valid token is present.
pub async fn optional(State(st): State<AppState>, mut req: Request, next: Next) -> Response {
    if let Ok(claims) = authenticate(&st.credentials, req.headers()) {
        req.extensions_mut().insert(claims);
    }

    next.run(req).await
}

/// Verifies the bearer token carried in `headers`.
///
/// # Errors
///
/// Returns [`AppError::TokenNotFound`] when the header is absent or empty.
/// Returns [`AppError::InvalidCredential`] for any other failure.
pub fn authenticate(credentials: &CredentialService, headers: &HeaderMap) -> Result<Claims, AppError> {
    credentials.verify(token_from_headers(headers)?)
}

/// Returns the raw token from the `Authorization` header without verifying it.
///
/// # Errors
///
/// Same classification as [`authenticate`] for header problems.
pub fn token_from_headers(headers: &HeaderMap) -> Result<&str, AppError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AppError::TokenNotFound)?;

    if value.is_empty() {
        return Err(AppError::TokenNotFound);
    }

    let value = value.to_str().map_err(|_| AppError::InvalidCredential)?;
    bearer_token(value).ok_or(AppError::InvalidCredential)
}

/// Strips the `Bearer ` scheme. Returns `None` for other schemes or an empty token.
pub fn bearer_token(value: &str) -> Option<&str> {
    value
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use std::time::Duration;

    fn credentials() -> CredentialService {
        CredentialService::new("test-secret", "resource-service", Duration::from_secs(3600))
    }

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("bearer abc"), None);
    }

    #[test]
    fn test_missing_header_is_token_not_found() {
        let result = authenticate(&credentials(), &HeaderMap::new());
        assert!(matches!(result, Err(AppError::TokenNotFound)));
    }

    #[test]
    fn test_wrong_scheme_is_invalid_credential() {
        let result = authenticate(&credentials(), &headers_with("Basic dTE6cHc="));
        assert!(matches!(result, Err(AppError::InvalidCredential)));
    }

    #[test]
    fn test_valid_token_yields_claims() {
        let credentials = credentials();
        let issued = credentials.issue(7, "u1", Duration::from_secs(3600)).unwrap();

        let claims =
            authenticate(&credentials, &headers_with(&format!("Bearer {}", issued.token))).unwrap();

        assert_eq!(claims.user_id, 7);
        assert_eq!(claims.identity(), "u1");
    }

    #[test]
    fn test_garbage_token_is_invalid_credential() {
        let result = authenticate(&credentials(), &headers_with("Bearer not.a.jwt"));
        assert!(matches!(result, Err(AppError::InvalidCredential)));
    }
}
