//! Two-factor authentication lifecycle.
//!
//! The per-account state machine: `DISABLED → SETUP_PENDING → ENABLED`, with
//! `ENABLED → DISABLED` as the only way back. A fresh Setup simply overwrites
//! the pending secret, so no explicit `SETUP_PENDING → DISABLED` transition
//! exists.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use uuid::Uuid;

use crate::backup_codes;
use crate::backup_codes::{BACKUP_CODE_COUNT, BACKUP_CODE_LENGTH};
use crate::crypto::SecretCipher;
use crate::error::ApiAuthError;
use crate::services::password::verify_password;
use crate::store::{CredentialStore, SecretStore};
use crate::totp::{TotpEngine, CODE_DIGITS};

/// Data returned when initiating setup. The secret appears here and nowhere
/// else afterwards.
#[derive(Debug)]
pub struct TwoFactorSetup {
    /// Base32-encoded secret for manual entry.
    pub secret: String,
    /// otpauth:// URI for QR encoding by the caller.
    pub provisioning_uri: String,
}

/// Read-only lifecycle status. Flags and counts only, never secret material.
#[derive(Debug, Clone, Copy)]
pub struct TwoFactorStatus {
    pub enabled: bool,
    pub has_pending_setup: bool,
    pub backup_codes_remaining: i64,
}

/// A classified second-factor submission.
///
/// Classification looks at length AND charset, not length alone: six ASCII
/// digits route to TOTP, eight ASCII alphanumerics to the backup-code path,
/// and anything else is rejected at the boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecondFactor {
    /// A 6-digit TOTP code.
    Totp(String),
    /// A normalized 8-character backup code.
    BackupCode(String),
}

impl SecondFactor {
    /// Classify raw user input, or reject it as malformed.
    pub fn classify(input: &str) -> Result<Self, ApiAuthError> {
        let trimmed = input.trim();

        if trimmed.len() == CODE_DIGITS && trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Ok(Self::Totp(trimmed.to_string()));
        }

        let normalized = backup_codes::normalize(trimmed);
        if normalized.len() == BACKUP_CODE_LENGTH
            && normalized.bytes().all(|b| b.is_ascii_alphanumeric())
        {
            return Ok(Self::BackupCode(normalized));
        }

        Err(ApiAuthError::Validation(
            "Expected a 6-digit code or an 8-character backup code".into(),
        ))
    }
}

/// Orchestrates setup, verification, enable, disable, and backup-code
/// regeneration over the secret store.
#[derive(Clone)]
pub struct TwoFactorService {
    store: Arc<dyn SecretStore>,
    credentials: Arc<dyn CredentialStore>,
    cipher: SecretCipher,
    totp: TotpEngine,
}

impl TwoFactorService {
    pub fn new(
        store: Arc<dyn SecretStore>,
        credentials: Arc<dyn CredentialStore>,
        cipher: SecretCipher,
        totp: TotpEngine,
    ) -> Self {
        Self {
            store,
            credentials,
            cipher,
            totp,
        }
    }

    /// Begin enrollment: generate a secret into the pending slot.
    ///
    /// Idempotent while unverified: a repeat call discards the previous
    /// pending secret. The active secret and `enabled` are never touched.
    pub async fn setup(&self, user_id: Uuid) -> Result<TwoFactorSetup, ApiAuthError> {
        if let Some(config) = self.store.find_config(user_id).await? {
            if config.enabled {
                return Err(ApiAuthError::AlreadyEnabled);
            }
        }

        let user = self
            .credentials
            .find_user_by_id(user_id)
            .await?
            .ok_or(ApiAuthError::InvalidCredentials)?;

        let secret = TotpEngine::generate_secret();
        let blob = self
            .cipher
            .encrypt(&secret)
            .map_err(|e| ApiAuthError::Internal(format!("Secret encryption failed: {e}")))?;

        self.store.set_pending_secret(user_id, &blob).await?;

        tracing::info!(user_id = %user_id, "2FA setup initiated");

        Ok(TwoFactorSetup {
            secret: TotpEngine::secret_base32(&secret),
            provisioning_uri: self.totp.provisioning_uri(&secret, &user.email)?,
        })
    }

    /// Complete enrollment: prove possession of the pending secret.
    ///
    /// On success the pending secret becomes the active one, 2FA is enabled,
    /// and a fresh backup-code batch is returned, the only time the
    /// plaintext codes exist. On failure the pending secret survives so the
    /// user can retry.
    pub async fn verify_setup(
        &self,
        user_id: Uuid,
        token: &str,
    ) -> Result<Vec<String>, ApiAuthError> {
        let config = self
            .store
            .find_config(user_id)
            .await?
            .ok_or(ApiAuthError::NoPendingSetup)?;

        // An account with no enrollment in flight gets NoPendingSetup even
        // when 2FA is already on; a repeated VerifySetup is a stale retry,
        // not a conflict.
        let pending = config
            .pending_secret_enc
            .as_deref()
            .ok_or(ApiAuthError::NoPendingSetup)?;

        let secret = self
            .cipher
            .decrypt(pending)
            .map_err(|e| ApiAuthError::Internal(format!("Secret decryption failed: {e}")))?;

        if !self.totp.verify(&secret, token, unix_now()?)? {
            return Err(ApiAuthError::InvalidToken);
        }

        let (codes, hashes) = backup_codes::generate_batch(BACKUP_CODE_COUNT);

        // Conditional on the pending secret still being present; a concurrent
        // clear losing the race surfaces as NoPendingSetup, not a half-enable.
        if !self.store.promote_pending(user_id, &hashes).await? {
            return Err(ApiAuthError::NoPendingSetup);
        }

        tracing::info!(user_id = %user_id, "2FA enabled");

        Ok(codes)
    }

    /// Read-only status for the account.
    pub async fn status(&self, user_id: Uuid) -> Result<TwoFactorStatus, ApiAuthError> {
        let config = self.store.find_config(user_id).await?;

        let (enabled, has_pending_setup) = config
            .map(|c| (c.enabled, c.has_pending_setup()))
            .unwrap_or((false, false));

        let backup_codes_remaining = if enabled {
            self.store.count_unused_backup_codes(user_id).await?
        } else {
            0
        };

        Ok(TwoFactorStatus {
            enabled,
            has_pending_setup,
            backup_codes_remaining,
        })
    }

    /// Disable 2FA. Requires re-proof of the password AND a current second
    /// factor (TOTP or unused backup code).
    ///
    /// All check failures collapse into one `InvalidCredentials` so the
    /// response never reveals which proof was wrong.
    pub async fn disable(
        &self,
        user_id: Uuid,
        password: &str,
        second_factor: &str,
    ) -> Result<(), ApiAuthError> {
        let config = self
            .store
            .find_config(user_id)
            .await?
            .ok_or(ApiAuthError::NotEnabled)?;
        if !config.enabled {
            return Err(ApiAuthError::NotEnabled);
        }

        let user = self
            .credentials
            .find_user_by_id(user_id)
            .await?
            .ok_or(ApiAuthError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash)? {
            return Err(ApiAuthError::InvalidCredentials);
        }

        match self.verify_second_factor(user_id, second_factor).await {
            Ok(()) => {}
            Err(ApiAuthError::InvalidToken | ApiAuthError::Validation(_)) => {
                return Err(ApiAuthError::InvalidCredentials);
            }
            Err(other) => return Err(other),
        }

        // Clears both secret slots and deletes every backup code.
        self.store.disable(user_id).await?;

        tracing::info!(user_id = %user_id, "2FA disabled");

        Ok(())
    }

    /// Replace the backup-code batch wholesale.
    ///
    /// Requires a current TOTP token, never a backup code, so a leaked code
    /// cannot be recycled into minting a fresh attacker-known batch. All
    /// previously issued codes die, used or not.
    pub async fn regenerate_backup_codes(
        &self,
        user_id: Uuid,
        token: &str,
    ) -> Result<Vec<String>, ApiAuthError> {
        let config = self
            .store
            .find_config(user_id)
            .await?
            .ok_or(ApiAuthError::NotEnabled)?;
        if !config.enabled {
            return Err(ApiAuthError::NotEnabled);
        }

        let secret = self.active_secret(&config)?;
        if !self.totp.verify(&secret, token, unix_now()?)? {
            return Err(ApiAuthError::InvalidToken);
        }

        let (codes, hashes) = backup_codes::generate_batch(BACKUP_CODE_COUNT);
        self.store.replace_backup_codes(user_id, &hashes).await?;

        tracing::info!(user_id = %user_id, "Backup codes regenerated");

        Ok(codes)
    }

    /// Verify a classified second factor against the account's active
    /// configuration. Burning a backup code is atomic per code.
    pub async fn verify_second_factor(
        &self,
        user_id: Uuid,
        submission: &str,
    ) -> Result<(), ApiAuthError> {
        match SecondFactor::classify(submission)? {
            SecondFactor::Totp(code) => {
                let config = self
                    .store
                    .find_config(user_id)
                    .await?
                    .ok_or(ApiAuthError::NotEnabled)?;
                if !config.enabled {
                    return Err(ApiAuthError::NotEnabled);
                }

                let secret = self.active_secret(&config)?;
                if self.totp.verify(&secret, &code, unix_now()?)? {
                    Ok(())
                } else {
                    Err(ApiAuthError::InvalidToken)
                }
            }
            SecondFactor::BackupCode(code) => {
                let hash = backup_codes::hash_code(&code);
                if self.store.consume_backup_code(user_id, &hash).await? {
                    tracing::info!(user_id = %user_id, "Backup code consumed");
                    Ok(())
                } else {
                    Err(ApiAuthError::InvalidToken)
                }
            }
        }
    }

    fn active_secret(
        &self,
        config: &purrstay_db::TwoFactorConfig,
    ) -> Result<Vec<u8>, ApiAuthError> {
        let blob = config
            .secret_enc
            .as_deref()
            .ok_or_else(|| ApiAuthError::Internal("Enabled config without a secret".into()))?;
        self.cipher
            .decrypt(blob)
            .map_err(|e| ApiAuthError::Internal(format!("Secret decryption failed: {e}")))
    }
}

fn unix_now() -> Result<u64, ApiAuthError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|_| ApiAuthError::Internal("System clock is before the Unix epoch".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_six_digits_as_totp() {
        assert_eq!(
            SecondFactor::classify("123456").unwrap(),
            SecondFactor::Totp("123456".into())
        );
    }

    #[test]
    fn classify_eight_alphanumerics_as_backup_code() {
        assert_eq!(
            SecondFactor::classify("ab12cd34").unwrap(),
            SecondFactor::BackupCode("AB12CD34".into())
        );
    }

    #[test]
    fn classify_eight_digits_as_backup_code() {
        // All-numeric is still a syntactically valid backup code; the charset
        // check rejects malformed shapes, it does not disambiguate valid ones.
        assert_eq!(
            SecondFactor::classify("12345678").unwrap(),
            SecondFactor::BackupCode("12345678".into())
        );
    }

    #[test]
    fn classify_normalizes_separators() {
        assert_eq!(
            SecondFactor::classify("ab12-cd34").unwrap(),
            SecondFactor::BackupCode("AB12CD34".into())
        );
    }

    #[test]
    fn classify_rejects_malformed_input() {
        assert!(SecondFactor::classify("12345").is_err());
        assert!(SecondFactor::classify("1234567").is_err());
        assert!(SecondFactor::classify("ab12cd3!").is_err());
        assert!(SecondFactor::classify("").is_err());
        assert!(SecondFactor::classify("12a456").is_err());
    }
}
