//! Persistence seams for the 2FA lifecycle.
//!
//! The lifecycle and challenge services talk to storage through these traits
//! so the state machine can be exercised without a database. `PgStore` is the
//! production implementation over the `purrstay-db` models; the multi-step
//! transitions (promote + issue codes, disable + delete codes) run inside a
//! transaction so no partial write can be observed.

use async_trait::async_trait;
use chrono::Duration;
use purrstay_db::{BackupCode, LoginChallenge, TwoFactorConfig, User};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ApiAuthError;

/// Persists per-account 2FA configuration and backup codes.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Load the 2FA configuration for an account, if any exists.
    async fn find_config(&self, user_id: Uuid) -> Result<Option<TwoFactorConfig>, ApiAuthError>;

    /// Store an encrypted secret in the pending slot, overwriting any
    /// previous pending secret. Creates the configuration row if absent.
    async fn set_pending_secret(&self, user_id: Uuid, blob: &[u8]) -> Result<(), ApiAuthError>;

    /// Promote the pending secret to active, enable 2FA, and replace the
    /// backup-code batch as one atomic unit. Returns false if no pending
    /// secret was present (a concurrent clear won the race).
    async fn promote_pending(
        &self,
        user_id: Uuid,
        backup_code_hashes: &[String],
    ) -> Result<bool, ApiAuthError>;

    /// Clear both secret slots, disable 2FA, and delete every backup code as
    /// one atomic unit.
    async fn disable(&self, user_id: Uuid) -> Result<(), ApiAuthError>;

    /// Replace the whole backup-code batch (regeneration).
    async fn replace_backup_codes(
        &self,
        user_id: Uuid,
        hashes: &[String],
    ) -> Result<(), ApiAuthError>;

    /// Burn the unused backup code matching `hash`, if any. Atomic per code:
    /// concurrent calls for the same code succeed at most once.
    async fn consume_backup_code(&self, user_id: Uuid, hash: &str) -> Result<bool, ApiAuthError>;

    /// Count unused backup codes for an account.
    async fn count_unused_backup_codes(&self, user_id: Uuid) -> Result<i64, ApiAuthError>;
}

/// Persists pending login challenges.
#[async_trait]
pub trait ChallengeStore: Send + Sync {
    /// Issue a challenge with the given TTL.
    async fn create_challenge(
        &self,
        user_id: Uuid,
        ttl: Duration,
    ) -> Result<LoginChallenge, ApiAuthError>;

    /// Look up a challenge by handle.
    async fn find_challenge(&self, id: Uuid) -> Result<Option<LoginChallenge>, ApiAuthError>;

    /// Record a failed attempt, returning the new count. A challenge that
    /// no longer exists surfaces as `ChallengeExpired`.
    async fn record_challenge_failure(&self, id: Uuid) -> Result<i32, ApiAuthError>;

    /// Destroy a challenge.
    async fn delete_challenge(&self, id: Uuid) -> Result<(), ApiAuthError>;

    /// Sweep expired challenges; returns how many were removed.
    async fn delete_expired_challenges(&self) -> Result<u64, ApiAuthError>;
}

/// Read access to the identity subsystem's credential records.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Find an account by login email.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, ApiAuthError>;

    /// Find an account by ID.
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, ApiAuthError>;
}

/// Production store backed by Postgres.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SecretStore for PgStore {
    async fn find_config(&self, user_id: Uuid) -> Result<Option<TwoFactorConfig>, ApiAuthError> {
        Ok(TwoFactorConfig::find_by_user_id(&self.pool, user_id).await?)
    }

    async fn set_pending_secret(&self, user_id: Uuid, blob: &[u8]) -> Result<(), ApiAuthError> {
        TwoFactorConfig::set_pending_secret(&self.pool, user_id, blob).await?;
        Ok(())
    }

    async fn promote_pending(
        &self,
        user_id: Uuid,
        backup_code_hashes: &[String],
    ) -> Result<bool, ApiAuthError> {
        let mut tx = self.pool.begin().await?;

        let promoted = TwoFactorConfig::promote_pending(&mut *tx, user_id)
            .await?
            .is_some();
        if !promoted {
            tx.rollback().await?;
            return Ok(false);
        }

        BackupCode::delete_all_for_user(&mut *tx, user_id).await?;
        BackupCode::create_batch(&mut *tx, user_id, backup_code_hashes).await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn disable(&self, user_id: Uuid) -> Result<(), ApiAuthError> {
        let mut tx = self.pool.begin().await?;
        TwoFactorConfig::clear(&mut *tx, user_id).await?;
        BackupCode::delete_all_for_user(&mut *tx, user_id).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn replace_backup_codes(
        &self,
        user_id: Uuid,
        hashes: &[String],
    ) -> Result<(), ApiAuthError> {
        let mut tx = self.pool.begin().await?;
        BackupCode::delete_all_for_user(&mut *tx, user_id).await?;
        BackupCode::create_batch(&mut *tx, user_id, hashes).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn consume_backup_code(&self, user_id: Uuid, hash: &str) -> Result<bool, ApiAuthError> {
        Ok(BackupCode::consume(&self.pool, user_id, hash).await?)
    }

    async fn count_unused_backup_codes(&self, user_id: Uuid) -> Result<i64, ApiAuthError> {
        Ok(BackupCode::count_unused(&self.pool, user_id).await?)
    }
}

#[async_trait]
impl ChallengeStore for PgStore {
    async fn create_challenge(
        &self,
        user_id: Uuid,
        ttl: Duration,
    ) -> Result<LoginChallenge, ApiAuthError> {
        Ok(LoginChallenge::create(&self.pool, user_id, ttl).await?)
    }

    async fn find_challenge(&self, id: Uuid) -> Result<Option<LoginChallenge>, ApiAuthError> {
        Ok(LoginChallenge::find_by_id(&self.pool, id).await?)
    }

    async fn record_challenge_failure(&self, id: Uuid) -> Result<i32, ApiAuthError> {
        // A concurrent resolution or sweep may have removed the row; that is
        // an expired challenge from the caller's point of view, not a 500.
        LoginChallenge::record_failure(&self.pool, id)
            .await?
            .ok_or(ApiAuthError::ChallengeExpired)
    }

    async fn delete_challenge(&self, id: Uuid) -> Result<(), ApiAuthError> {
        LoginChallenge::delete(&self.pool, id).await?;
        Ok(())
    }

    async fn delete_expired_challenges(&self) -> Result<u64, ApiAuthError> {
        Ok(LoginChallenge::delete_expired(&self.pool).await?)
    }
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, ApiAuthError> {
        Ok(User::find_by_email(&self.pool, email).await?)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, ApiAuthError> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }
}
