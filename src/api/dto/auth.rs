//! DTOs for the token endpoints.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::application::services::IssuedToken;

/// Body of a successful `POST /api/v1/auth/refresh`.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_at: DateTime<Utc>,
}

impl From<IssuedToken> for TokenResponse {
    fn from(issued: IssuedToken) -> Self {
        Self {
            expires_at: issued.claims.expires_at(),
            token: issued.token,
            token_type: "Bearer",
        }
    }
}
