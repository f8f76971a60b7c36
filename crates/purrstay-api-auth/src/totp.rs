//! TOTP engine (RFC 6238).
//!
//! Pure code generation and verification: deterministic given a secret and a
//! timestamp, no side effects. Replay prevention and retry bounds belong to
//! the callers (lifecycle and login challenge).

use crate::error::ApiAuthError;
use data_encoding::BASE32_NOPAD;
use totp_rs::{Algorithm, TOTP};

/// TOTP secret length in bytes (160 bits).
const SECRET_LENGTH: usize = 20;

/// Number of digits in a generated code.
pub const CODE_DIGITS: usize = 6;

/// Time step in seconds.
const STEP_SECONDS: u64 = 30;

/// Accepted clock skew, in steps (one step either side).
const SKEW_STEPS: u8 = 1;

/// Stateless TOTP code generator and verifier.
#[derive(Debug, Clone)]
pub struct TotpEngine {
    issuer: String,
}

impl TotpEngine {
    /// Create an engine that labels provisioning URIs with `issuer`.
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
        }
    }

    /// Generate a fresh 160-bit secret from the OS CSPRNG.
    #[must_use]
    pub fn generate_secret() -> Vec<u8> {
        use rand::rngs::OsRng;
        use rand::RngCore;
        let mut secret = vec![0u8; SECRET_LENGTH];
        OsRng.fill_bytes(&mut secret[..]);
        secret
    }

    /// Base32 rendering of a secret, for manual entry in authenticator apps.
    #[must_use]
    pub fn secret_base32(secret: &[u8]) -> String {
        BASE32_NOPAD.encode(secret)
    }

    /// Build the otpauth:// provisioning URI for QR encoding.
    pub fn provisioning_uri(&self, secret: &[u8], account: &str) -> Result<String, ApiAuthError> {
        let totp = self.build(secret, Some(account))?;
        Ok(totp.get_url())
    }

    /// The 6-digit code for `secret` at Unix time `time`.
    pub fn current_code(&self, secret: &[u8], time: u64) -> Result<String, ApiAuthError> {
        let totp = self.build(secret, None)?;
        Ok(totp.generate(time))
    }

    /// Verify `code` against `secret` at Unix time `time`.
    ///
    /// Accepts the current step and one adjacent step either side (±30 s of
    /// clock skew); anything further out is rejected.
    pub fn verify(&self, secret: &[u8], code: &str, time: u64) -> Result<bool, ApiAuthError> {
        if code.len() != CODE_DIGITS || !code.bytes().all(|b| b.is_ascii_digit()) {
            return Ok(false);
        }

        let totp = self.build(secret, None)?;
        Ok(totp.check(code, time))
    }

    fn build(&self, secret: &[u8], account: Option<&str>) -> Result<TOTP, ApiAuthError> {
        TOTP::new(
            Algorithm::SHA1,
            CODE_DIGITS,
            SKEW_STEPS,
            STEP_SECONDS,
            secret.to_vec(),
            Some(self.issuer.clone()),
            account.unwrap_or_default().to_string(),
        )
        .map_err(|e| ApiAuthError::Internal(format!("TOTP construction failed: {e}")))
    }
}
