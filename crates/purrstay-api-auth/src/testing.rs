//! In-memory store for exercising the lifecycle without a database.
//!
//! `MemoryStore` mirrors the conditional semantics of the Postgres store:
//! promote-if-pending, consume-at-most-once, atomic disable. It backs the
//! unit and integration tests and is usable by downstream crates that want
//! to test against the auth services directly.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use purrstay_db::{LoginChallenge, TwoFactorConfig, User};
use uuid::Uuid;

use crate::error::ApiAuthError;
use crate::store::{ChallengeStore, CredentialStore, SecretStore};

#[derive(Debug, Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    configs: HashMap<Uuid, TwoFactorConfig>,
    // user_id -> [(code_hash, used)]
    backup_codes: HashMap<Uuid, Vec<(String, bool)>>,
    challenges: HashMap<Uuid, LoginChallenge>,
}

/// In-memory implementation of all three store traits.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a user fixture and return its ID.
    pub fn add_user(&self, email: &str, password_hash: &str, is_active: bool) -> Uuid {
        let id = Uuid::new_v4();
        let user = User {
            id,
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            is_active,
            created_at: Utc::now(),
        };
        self.lock().users.insert(id, user);
        id
    }

    /// Backdate a challenge's expiry so it reads as expired.
    pub fn expire_challenge(&self, id: Uuid) {
        if let Some(c) = self.lock().challenges.get_mut(&id) {
            c.expires_at = Utc::now() - Duration::seconds(1);
        }
    }

    /// Hashes of the unused backup codes currently stored for a user.
    pub fn unused_code_hashes(&self, user_id: Uuid) -> Vec<String> {
        self.lock()
            .backup_codes
            .get(&user_id)
            .map(|codes| {
                codes
                    .iter()
                    .filter(|(_, used)| !used)
                    .map(|(hash, _)| hash.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn fresh_config(user_id: Uuid, now: DateTime<Utc>) -> TwoFactorConfig {
        TwoFactorConfig {
            id: Uuid::new_v4(),
            user_id,
            secret_enc: None,
            pending_secret_enc: None,
            enabled: false,
            verified_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[async_trait]
impl SecretStore for MemoryStore {
    async fn find_config(&self, user_id: Uuid) -> Result<Option<TwoFactorConfig>, ApiAuthError> {
        Ok(self.lock().configs.get(&user_id).cloned())
    }

    async fn set_pending_secret(&self, user_id: Uuid, blob: &[u8]) -> Result<(), ApiAuthError> {
        let now = Utc::now();
        let mut inner = self.lock();
        let config = inner
            .configs
            .entry(user_id)
            .or_insert_with(|| Self::fresh_config(user_id, now));
        config.pending_secret_enc = Some(blob.to_vec());
        config.updated_at = now;
        Ok(())
    }

    async fn promote_pending(
        &self,
        user_id: Uuid,
        backup_code_hashes: &[String],
    ) -> Result<bool, ApiAuthError> {
        let now = Utc::now();
        let mut inner = self.lock();

        let promoted = match inner.configs.get_mut(&user_id) {
            Some(config) if config.pending_secret_enc.is_some() => {
                config.secret_enc = config.pending_secret_enc.take();
                config.enabled = true;
                config.verified_at = Some(now);
                config.updated_at = now;
                true
            }
            _ => false,
        };
        if !promoted {
            return Ok(false);
        }

        inner.backup_codes.insert(
            user_id,
            backup_code_hashes
                .iter()
                .map(|h| (h.clone(), false))
                .collect(),
        );
        Ok(true)
    }

    async fn disable(&self, user_id: Uuid) -> Result<(), ApiAuthError> {
        let mut inner = self.lock();
        if let Some(config) = inner.configs.get_mut(&user_id) {
            config.secret_enc = None;
            config.pending_secret_enc = None;
            config.enabled = false;
            config.verified_at = None;
            config.updated_at = Utc::now();
        }
        inner.backup_codes.remove(&user_id);
        Ok(())
    }

    async fn replace_backup_codes(
        &self,
        user_id: Uuid,
        hashes: &[String],
    ) -> Result<(), ApiAuthError> {
        self.lock()
            .backup_codes
            .insert(user_id, hashes.iter().map(|h| (h.clone(), false)).collect());
        Ok(())
    }

    async fn consume_backup_code(&self, user_id: Uuid, hash: &str) -> Result<bool, ApiAuthError> {
        let mut inner = self.lock();
        let Some(codes) = inner.backup_codes.get_mut(&user_id) else {
            return Ok(false);
        };
        for (stored, used) in codes.iter_mut() {
            if stored == hash && !*used {
                *used = true;
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn count_unused_backup_codes(&self, user_id: Uuid) -> Result<i64, ApiAuthError> {
        Ok(self
            .lock()
            .backup_codes
            .get(&user_id)
            .map(|codes| codes.iter().filter(|(_, used)| !used).count() as i64)
            .unwrap_or(0))
    }
}

#[async_trait]
impl ChallengeStore for MemoryStore {
    async fn create_challenge(
        &self,
        user_id: Uuid,
        ttl: Duration,
    ) -> Result<LoginChallenge, ApiAuthError> {
        let now = Utc::now();
        let challenge = LoginChallenge {
            id: Uuid::new_v4(),
            user_id,
            attempts: 0,
            issued_at: now,
            expires_at: now + ttl,
        };
        self.lock().challenges.insert(challenge.id, challenge.clone());
        Ok(challenge)
    }

    async fn find_challenge(&self, id: Uuid) -> Result<Option<LoginChallenge>, ApiAuthError> {
        Ok(self.lock().challenges.get(&id).cloned())
    }

    async fn record_challenge_failure(&self, id: Uuid) -> Result<i32, ApiAuthError> {
        let mut inner = self.lock();
        let challenge = inner
            .challenges
            .get_mut(&id)
            .ok_or(ApiAuthError::ChallengeExpired)?;
        challenge.attempts += 1;
        Ok(challenge.attempts)
    }

    async fn delete_challenge(&self, id: Uuid) -> Result<(), ApiAuthError> {
        self.lock().challenges.remove(&id);
        Ok(())
    }

    async fn delete_expired_challenges(&self) -> Result<u64, ApiAuthError> {
        let now = Utc::now();
        let mut inner = self.lock();
        let before = inner.challenges.len();
        inner.challenges.retain(|_, c| c.expires_at > now);
        Ok((before - inner.challenges.len()) as u64)
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, ApiAuthError> {
        let needle = email.to_lowercase();
        Ok(self
            .lock()
            .users
            .values()
            .find(|u| u.email.to_lowercase() == needle)
            .cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, ApiAuthError> {
        Ok(self.lock().users.get(&id).cloned())
    }
}
