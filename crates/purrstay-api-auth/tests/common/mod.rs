//! Shared test harness: services wired over the in-memory store.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::Duration;
use data_encoding::BASE32_NOPAD;
use uuid::Uuid;

use purrstay_api_auth::crypto::SecretCipher;
use purrstay_api_auth::services::password::hash_password;
use purrstay_api_auth::services::{JwtSessionIssuer, LoginChallengeService, TwoFactorService};
use purrstay_api_auth::testing::MemoryStore;
use purrstay_api_auth::totp::TotpEngine;

pub const PASSWORD: &str = "whiskers-and-tuna";

pub struct TestEnv {
    pub store: MemoryStore,
    pub two_factor: TwoFactorService,
    pub challenges: LoginChallengeService,
}

impl TestEnv {
    pub fn new() -> Self {
        let store = MemoryStore::new();
        let cipher = SecretCipher::from_hex_key(&SecretCipher::generate_key()).unwrap();
        let totp = TotpEngine::new("Purrstay");

        let two_factor = TwoFactorService::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            cipher,
            totp,
        );
        let challenges = LoginChallengeService::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            two_factor.clone(),
            Arc::new(JwtSessionIssuer::new(b"test-secret", Duration::hours(1))),
        );

        Self {
            store,
            two_factor,
            challenges,
        }
    }

    pub fn add_user(&self, email: &str) -> Uuid {
        self.store
            .add_user(email, &hash_password(PASSWORD).unwrap(), true)
    }

    /// Run setup and verify it, returning the secret bytes and the backup
    /// codes handed out at enablement.
    pub async fn enroll(&self, user_id: Uuid) -> (Vec<u8>, Vec<String>) {
        let setup = self.two_factor.setup(user_id).await.unwrap();
        let secret = BASE32_NOPAD.decode(setup.secret.as_bytes()).unwrap();
        let code = current_code(&secret);
        let backup_codes = self.two_factor.verify_setup(user_id, &code).await.unwrap();
        (secret, backup_codes)
    }
}

pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

pub fn current_code(secret: &[u8]) -> String {
    TotpEngine::new("Purrstay")
        .current_code(secret, unix_now())
        .unwrap()
}

/// A 6-digit code guaranteed not to verify right now.
pub fn wrong_code(secret: &[u8]) -> String {
    let valid = current_code(secret);
    if valid == "000000" {
        "111111".to_string()
    } else {
        "000000".to_string()
    }
}
