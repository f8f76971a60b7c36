//! Request payloads.

use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Password step of login.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Second-factor step of login.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct VerifyLoginRequest {
    /// Challenge handle returned by the password step.
    pub challenge_id: Uuid,

    /// A 6-digit TOTP code or an 8-character backup code.
    #[validate(length(min = 6, max = 16, message = "Invalid code format"))]
    pub code: String,
}

/// Confirmation token for completing 2FA setup.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct VerifySetupRequest {
    /// 6-digit code from the authenticator app.
    #[validate(length(equal = 6, message = "Token must be 6 digits"))]
    pub token: String,
}

/// Proofs required to disable 2FA.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct DisableRequest {
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,

    /// A current TOTP code or an unused backup code.
    #[validate(length(min = 6, max = 16, message = "Invalid code format"))]
    pub code: String,
}

/// Proof required to regenerate backup codes.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegenerateBackupCodesRequest {
    /// 6-digit code from the authenticator app. Backup codes are not
    /// accepted here.
    #[validate(length(equal = 6, message = "Token must be 6 digits"))]
    pub token: String,
}
