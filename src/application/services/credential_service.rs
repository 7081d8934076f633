//! Signed bearer credentials (JWT, HS256).

use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::AppError;

/// A token may only be refreshed in the last 30 minutes of its lifetime.
pub const REFRESH_WINDOW_SECONDS: i64 = 30 * 60;

/// Longest lifetime a token may be issued with (one year).
pub const MAX_TTL_SECONDS: u64 = 365 * 24 * 60 * 60;

/// Longest subject name, in characters. Matches the `created_by` column.
pub const MAX_IDENTITY_CHARS: usize = 255;

/// Identity claims carried by a verified token.
///
/// Inserted into the request extensions by the auth stage and read back by
/// [`CurrentUser`](crate::api::extract::CurrentUser).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub username: String,
    pub iss: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
}

impl Claims {
    /// Identity string used for ownership checks.
    pub fn identity(&self) -> &str {
        &self.username
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

/// A freshly signed token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

/// Issues, verifies and refreshes HS256 tokens.
///
/// The secret is read-only after construction, so one instance is shared
/// across all request tasks behind an `Arc`.
pub struct CredentialService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    default_ttl: Duration,
}

impl CredentialService {
    pub fn new(secret: &str, issuer: impl Into<String>, default_ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.into(),
            default_ttl,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Signs a token for the given identity, valid from now for `ttl`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if signing fails.
    pub fn issue(
        &self,
        subject_id: i64,
        subject_name: &str,
        ttl: Duration,
    ) -> Result<IssuedToken, AppError> {
        self.issue_at(subject_id, subject_name, ttl, Utc::now())
    }

    /// Signs a token as if issued at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if `subject_name` is longer than
    /// [`MAX_IDENTITY_CHARS`], and [`AppError::Internal`] if signing fails or
    /// `ttl` is out of range.
    pub fn issue_at(
        &self,
        subject_id: i64,
        subject_name: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, AppError> {
        if subject_name.chars().count() > MAX_IDENTITY_CHARS {
            return Err(AppError::Validation(format!(
                "subject name must be at most {MAX_IDENTITY_CHARS} characters"
            )));
        }
        if ttl.as_secs() > MAX_TTL_SECONDS {
            return Err(AppError::Internal(format!(
                "token ttl of {}s exceeds {MAX_TTL_SECONDS}s",
                ttl.as_secs()
            )));
        }
        let ttl = TimeDelta::from_std(ttl)
            .map_err(|e| AppError::Internal(format!("token ttl out of range: {e}")))?;
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| AppError::Internal("token expiry out of range".to_string()))?;

        let issued_at = now.timestamp();
        let claims = Claims {
            user_id: subject_id,
            username: subject_name.to_string(),
            iss: self.issuer.clone(),
            iat: issued_at,
            nbf: issued_at,
            exp: expires_at.timestamp(),
        };

        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("failed to sign token: {e}")))?;

        Ok(IssuedToken { token, claims })
    }

    /// Verifies signature, issuer and validity window.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidCredential`] for every failure, including a
    /// subject name longer than [`MAX_IDENTITY_CHARS`]. The reason is logged
    /// at debug level only.
    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "nbf", "iss"]);

        let claims = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(reason = %e, "credential rejected");
                AppError::InvalidCredential
            })?;

        if claims.username.chars().count() > MAX_IDENTITY_CHARS {
            tracing::debug!(user_id = claims.user_id, "credential rejected: subject name too long");
            return Err(AppError::InvalidCredential);
        }

        Ok(claims)
    }

    /// Exchanges a token that is close to expiry for a fresh one.
    ///
    /// The old token stays valid until its own expiry; there is no revocation.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidCredential`] if the token does not verify.
    /// Returns [`AppError::NotRefreshable`] if more than
    /// [`REFRESH_WINDOW_SECONDS`] remain before expiry.
    pub fn refresh(&self, token: &str) -> Result<IssuedToken, AppError> {
        self.refresh_at(token, Utc::now())
    }

    /// Same as [`refresh`](Self::refresh) with an explicit clock for the
    /// window check.
    ///
    /// # Errors
    ///
    /// See [`refresh`](Self::refresh).
    pub fn refresh_at(&self, token: &str, now: DateTime<Utc>) -> Result<IssuedToken, AppError> {
        let claims = self.verify(token)?;

        if claims.exp - now.timestamp() > REFRESH_WINDOW_SECONDS {
            return Err(AppError::NotRefreshable);
        }

        self.issue_at(claims.user_id, &claims.username, self.default_ttl, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    fn service() -> CredentialService {
        CredentialService::new("test-secret", "resource-service", HOUR)
    }

    #[test]
    fn test_issue_then_verify_round_trip() {
        let service = service();
        let issued = service.issue(42, "u1", HOUR).unwrap();

        let claims = service.verify(&issued.token).unwrap();
        assert_eq!(claims, issued.claims);
        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.identity(), "u1");
        assert_eq!(claims.iss, "resource-service");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let service = service();
        let two_hours_ago = Utc::now() - TimeDelta::hours(2);
        let issued = service.issue_at(1, "u1", HOUR, two_hours_ago).unwrap();

        assert!(matches!(
            service.verify(&issued.token),
            Err(AppError::InvalidCredential)
        ));
    }

    #[test]
    fn test_not_yet_valid_token_is_rejected() {
        let service = service();
        let later = Utc::now() + TimeDelta::minutes(10);
        let issued = service.issue_at(1, "u1", HOUR, later).unwrap();

        assert!(matches!(
            service.verify(&issued.token),
            Err(AppError::InvalidCredential)
        ));
    }

    #[test]
    fn test_flipping_any_byte_invalidates_token() {
        let service = service();
        let token = service.issue(1, "u1", HOUR).unwrap().token;

        for i in 0..token.len() {
            let mut bytes = token.clone().into_bytes();
            bytes[i] = if bytes[i] == b'A' { b'B' } else { b'A' };
            let tampered = String::from_utf8(bytes).unwrap();

            assert!(
                service.verify(&tampered).is_err(),
                "tampered byte {i} still verified"
            );
        }
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = service().issue(1, "u1", HOUR).unwrap().token;
        let other = CredentialService::new("other-secret", "resource-service", HOUR);

        assert!(other.verify(&token).is_err());
    }

    #[test]
    fn test_wrong_issuer_is_rejected() {
        let token = CredentialService::new("test-secret", "someone-else", HOUR)
            .issue(1, "u1", HOUR)
            .unwrap()
            .token;

        assert!(service().verify(&token).is_err());
    }

    #[test]
    fn test_garbage_is_rejected() {
        let service = service();
        assert!(service.verify("").is_err());
        assert!(service.verify("not.a.jwt").is_err());
    }

    #[test]
    fn test_refresh_outside_window_is_refused() {
        let service = service();
        let issued = service.issue(1, "u1", HOUR).unwrap();

        assert!(matches!(
            service.refresh(&issued.token),
            Err(AppError::NotRefreshable)
        ));
    }

    #[test]
    fn test_refresh_inside_window_issues_new_token() {
        let service = service();
        let issued = service.issue(7, "u1", HOUR).unwrap();
        let near_expiry = issued.claims.expires_at() - TimeDelta::minutes(10);

        let refreshed = service.refresh_at(&issued.token, near_expiry).unwrap();

        assert_eq!(refreshed.claims.user_id, 7);
        assert_eq!(refreshed.claims.username, "u1");
        assert!(refreshed.claims.exp > issued.claims.exp);
        // The old token is not revoked.
        assert!(service.verify(&issued.token).is_ok());
    }

    #[test]
    fn test_refresh_window_boundary() {
        let service = service();
        let issued = service.issue(1, "u1", HOUR).unwrap();
        let expiry = issued.claims.expires_at();

        let just_inside = expiry - TimeDelta::seconds(REFRESH_WINDOW_SECONDS);
        assert!(service.refresh_at(&issued.token, just_inside).is_ok());

        let just_outside = expiry - TimeDelta::seconds(REFRESH_WINDOW_SECONDS + 1);
        assert!(matches!(
            service.refresh_at(&issued.token, just_outside),
            Err(AppError::NotRefreshable)
        ));
    }

    #[test]
    fn test_oversized_ttl_is_an_error_not_a_panic() {
        let service = CredentialService::new(
            "test-secret",
            "resource-service",
            Duration::from_secs(10_000_000_000_000),
        );

        assert!(matches!(
            service.issue(1, "alice", service.default_ttl()),
            Err(AppError::Internal(_))
        ));
        assert!(matches!(
            service.issue(1, "alice", Duration::from_secs(MAX_TTL_SECONDS + 1)),
            Err(AppError::Internal(_))
        ));
        assert!(service.issue(1, "alice", Duration::from_secs(MAX_TTL_SECONDS)).is_ok());
    }

    #[test]
    fn test_refresh_with_oversized_default_ttl_is_an_error() {
        let issuer = service();
        let token = issuer.issue(1, "alice", HOUR).unwrap().token;
        let near_expiry = Utc::now() + TimeDelta::minutes(50);
        let huge = CredentialService::new(
            "test-secret",
            "resource-service",
            Duration::from_secs(u64::MAX),
        );

        assert!(matches!(
            huge.refresh_at(&token, near_expiry),
            Err(AppError::Internal(_))
        ));
    }

    #[test]
    fn test_overlong_subject_name_is_refused() {
        let service = service();
        let longest = "n".repeat(MAX_IDENTITY_CHARS);
        let too_long = "n".repeat(MAX_IDENTITY_CHARS + 1);

        let issued = service.issue(1, &longest, HOUR).unwrap();
        assert_eq!(service.verify(&issued.token).unwrap().username, longest);

        assert!(matches!(
            service.issue(1, &too_long, HOUR),
            Err(AppError::Validation(_))
        ));

        // Signed with the right secret by someone other than this service.
        let now = Utc::now().timestamp();
        let claims = Claims {
            user_id: 1,
            username: too_long,
            iss: "resource-service".to_string(),
            iat: now,
            nbf: now,
            exp: now + 3600,
        };
        let forged = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();
        assert!(matches!(
            service.verify(&forged),
            Err(AppError::InvalidCredential)
        ));
    }

    #[test]
    fn test_refresh_of_invalid_token_is_invalid_credential() {
        assert!(matches!(
            service().refresh("garbage"),
            Err(AppError::InvalidCredential)
        ));
    }
}
