//! API error type for the authentication endpoints.
//!
//! Every failure surfaces as a typed variant; nothing is swallowed. The
//! `IntoResponse` impl maps each variant to a status code and a small JSON
//! body. Variants carrying internal detail (database, crypto) log the detail
//! and return a generic message to the caller.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Errors returned by the authentication API.
#[derive(Debug, Error)]
pub enum ApiAuthError {
    /// Malformed request payload (shape or charset), rejected at the boundary.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A TOTP token or backup code failed verification.
    #[error("Invalid verification code")]
    InvalidToken,

    /// Primary credential check failed.
    ///
    /// Also covers a Disable request where either the password or the second
    /// factor failed; the merged message deliberately hides which one.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Setup requested while 2FA is already enabled.
    #[error("Two-factor authentication is already enabled")]
    AlreadyEnabled,

    /// Operation requires 2FA to be enabled.
    #[error("Two-factor authentication is not enabled")]
    NotEnabled,

    /// VerifySetup called with no enrollment in flight.
    #[error("No two-factor setup is pending")]
    NoPendingSetup,

    /// The login challenge TTL elapsed before resolution.
    #[error("Login challenge has expired")]
    ChallengeExpired,

    /// The bounded retry count on a login challenge was exhausted.
    #[error("Too many failed attempts; restart login")]
    ChallengeExhausted,

    /// Database failure.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal failure (crypto, token issuance).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiAuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::InvalidToken => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::AlreadyEnabled | Self::NotEnabled | Self::NoPendingSetup => StatusCode::CONFLICT,
            // Expired and exhausted challenges both force a fresh login.
            Self::ChallengeExpired | Self::ChallengeExhausted => StatusCode::UNAUTHORIZED,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::InvalidToken => "invalid_token",
            Self::InvalidCredentials => "invalid_credentials",
            Self::AlreadyEnabled => "already_enabled",
            Self::NotEnabled => "not_enabled",
            Self::NoPendingSetup => "no_pending_setup",
            Self::ChallengeExpired => "challenge_expired",
            Self::ChallengeExhausted => "challenge_exhausted",
            Self::Database(_) | Self::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for ApiAuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Internal detail stays in the logs, never in the response body.
        let message = match &self {
            Self::Database(e) => {
                tracing::error!(error = %e, "Database error in auth API");
                "An internal error occurred".to_string()
            }
            Self::Internal(detail) => {
                tracing::error!(detail = %detail, "Internal error in auth API");
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": self.error_code(),
            "message": message,
        }));

        (status, body).into_response()
    }
}
