//! Route wiring and shared state.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use sqlx::PgPool;

use crate::crypto::SecretCipher;
use crate::error::ApiAuthError;
use crate::handlers::login::{login, verify_login};
use crate::handlers::twofa::{
    disable_two_factor, regenerate_backup_codes, setup_two_factor, two_factor_status,
    verify_two_factor_setup,
};
use crate::services::{JwtSessionIssuer, LoginChallengeService, SessionIssuer, TwoFactorService};
use crate::store::{ChallengeStore, CredentialStore, PgStore, SecretStore};
use crate::totp::TotpEngine;

/// Shared state for the auth routers.
#[derive(Clone)]
pub struct AuthState {
    pub two_factor: TwoFactorService,
    pub challenges: LoginChallengeService,
}

impl AuthState {
    /// Wire services over explicit store and session-issuer implementations.
    pub fn new(
        secrets: Arc<dyn SecretStore>,
        challenges: Arc<dyn ChallengeStore>,
        credentials: Arc<dyn CredentialStore>,
        sessions: Arc<dyn SessionIssuer>,
        cipher: SecretCipher,
        totp: TotpEngine,
    ) -> Self {
        let two_factor = TwoFactorService::new(secrets, credentials.clone(), cipher, totp);
        let challenges =
            LoginChallengeService::new(challenges, credentials, two_factor.clone(), sessions);
        Self {
            two_factor,
            challenges,
        }
    }

    /// Production wiring: Postgres stores plus configuration from the
    /// environment (`TWOFA_ENCRYPTION_KEY`, `SESSION_JWT_SECRET`, optional
    /// `TWOFA_ISSUER`).
    pub fn from_env(pool: PgPool) -> Result<Self, ApiAuthError> {
        let store = Arc::new(PgStore::new(pool));
        let issuer = std::env::var("TWOFA_ISSUER").unwrap_or_else(|_| "Purrstay".to_string());

        Ok(Self::new(
            store.clone(),
            store.clone(),
            store,
            Arc::new(JwtSessionIssuer::from_env()?),
            SecretCipher::from_env()
                .map_err(|e| ApiAuthError::Internal(format!("Cipher setup failed: {e}")))?,
            TotpEngine::new(issuer),
        ))
    }
}

/// Spawn the periodic sweep of expired login challenges.
pub fn spawn_challenge_sweeper(service: LoginChallengeService) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(60));
        loop {
            interval.tick().await;
            if let Err(e) = service.sweep_expired().await {
                tracing::warn!(error = %e, "Challenge sweep failed");
            }
        }
    })
}

/// Routes that require an authenticated session (`CurrentUser` extension).
pub fn two_factor_router(state: AuthState) -> Router {
    Router::new()
        .route("/2fa/setup", post(setup_two_factor))
        .route("/2fa/verify-setup", post(verify_two_factor_setup))
        .route("/2fa/status", get(two_factor_status))
        .route("/2fa/disable", post(disable_two_factor))
        .route(
            "/2fa/backup-codes/regenerate",
            post(regenerate_backup_codes),
        )
        .with_state(state)
}

/// Unauthenticated login routes.
pub fn login_router(state: AuthState) -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/login/verify", post(verify_login))
        .with_state(state)
}
