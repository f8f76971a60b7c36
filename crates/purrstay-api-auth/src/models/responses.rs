//! Response payloads.
//!
//! The setup secret and plaintext backup codes appear only in these bodies,
//! exactly once per generation. Nothing here is logged.

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// Returned by the setup endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct SetupResponse {
    /// Base32-encoded secret for manual entry.
    pub secret: String,
    /// otpauth:// URI for rendering as a QR code.
    pub provisioning_uri: String,
}

/// Returned once when setup verification succeeds.
#[derive(Debug, Serialize, ToSchema)]
pub struct VerifySetupResponse {
    pub enabled: bool,
    /// Plaintext backup codes. Shown once and never recoverable.
    pub backup_codes: Vec<String>,
}

/// Current 2FA status for the authenticated account.
#[derive(Debug, Serialize, ToSchema)]
pub struct StatusResponse {
    pub enabled: bool,
    pub has_pending_setup: bool,
    pub backup_codes_remaining: i64,
}

/// Returned when 2FA is disabled. Deliberately empty: success is the whole
/// message.
#[derive(Debug, Serialize, ToSchema)]
pub struct DisableResponse {}

/// Returned by backup-code regeneration.
#[derive(Debug, Serialize, ToSchema)]
pub struct BackupCodesResponse {
    /// Plaintext backup codes. Shown once and never recoverable.
    pub backup_codes: Vec<String>,
}

/// Returned by the password step of login.
#[derive(Debug, Serialize, ToSchema)]
#[serde(untagged)]
pub enum LoginResponse {
    /// 2FA disabled: a full session.
    Session { token: String, expires_in: i64 },
    /// 2FA enabled: answer the challenge to get a session.
    MfaRequired {
        mfa_required: bool,
        challenge_id: Uuid,
        expires_in: i64,
    },
}
