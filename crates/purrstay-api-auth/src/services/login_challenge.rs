//! Two-step login coordination.
//!
//! Password success against a 2FA-enabled account does not produce a session;
//! it produces a short-lived challenge the client must answer with a second
//! factor. The challenge handle is single-use and bounds retries.

use std::sync::Arc;

use chrono::Duration;
use uuid::Uuid;

use crate::error::ApiAuthError;
use crate::services::password::verify_password;
use crate::services::session::{IssuedSession, SessionIssuer};
use crate::services::two_factor::TwoFactorService;
use crate::store::{ChallengeStore, CredentialStore};

/// How long a challenge stays answerable.
pub const CHALLENGE_TTL_SECONDS: i64 = 300;

/// Failed attempts before a challenge is destroyed.
pub const MAX_CHALLENGE_ATTEMPTS: i32 = 5;

/// Outcome of the password step.
#[derive(Debug)]
pub enum LoginOutcome {
    /// 2FA is not enabled; a full session was issued directly.
    Session(IssuedSession),
    /// 2FA is enabled; the client must answer this challenge.
    ChallengeRequired {
        challenge_id: Uuid,
        expires_in: i64,
    },
}

/// Coordinates the password step and the second-factor step of login.
#[derive(Clone)]
pub struct LoginChallengeService {
    challenges: Arc<dyn ChallengeStore>,
    credentials: Arc<dyn CredentialStore>,
    two_factor: TwoFactorService,
    sessions: Arc<dyn SessionIssuer>,
}

impl LoginChallengeService {
    pub fn new(
        challenges: Arc<dyn ChallengeStore>,
        credentials: Arc<dyn CredentialStore>,
        two_factor: TwoFactorService,
        sessions: Arc<dyn SessionIssuer>,
    ) -> Self {
        Self {
            challenges,
            credentials,
            two_factor,
            sessions,
        }
    }

    /// Password step. Unknown email, inactive account, and wrong password all
    /// collapse into `InvalidCredentials`.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, ApiAuthError> {
        let user = self
            .credentials
            .find_user_by_email(email)
            .await?
            .filter(|u| u.is_active)
            .ok_or(ApiAuthError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash)? {
            return Err(ApiAuthError::InvalidCredentials);
        }

        let status = self.two_factor.status(user.id).await?;
        if !status.enabled {
            let session = self.sessions.issue(user.id).await?;
            tracing::info!(user_id = %user.id, "Login completed without second factor");
            return Ok(LoginOutcome::Session(session));
        }

        let challenge = self
            .challenges
            .create_challenge(user.id, Duration::seconds(CHALLENGE_TTL_SECONDS))
            .await?;

        tracing::info!(user_id = %user.id, challenge_id = %challenge.id, "Login challenge issued");

        Ok(LoginOutcome::ChallengeRequired {
            challenge_id: challenge.id,
            expires_in: CHALLENGE_TTL_SECONDS,
        })
    }

    /// Second-factor step. Consumes the challenge on success; destroys it on
    /// expiry or once the attempt bound is reached.
    pub async fn verify(
        &self,
        challenge_id: Uuid,
        submission: &str,
    ) -> Result<IssuedSession, ApiAuthError> {
        let challenge = self
            .challenges
            .find_challenge(challenge_id)
            .await?
            .ok_or(ApiAuthError::ChallengeExpired)?;

        if challenge.is_expired() {
            self.challenges.delete_challenge(challenge_id).await?;
            return Err(ApiAuthError::ChallengeExpired);
        }

        match self
            .two_factor
            .verify_second_factor(challenge.user_id, submission)
            .await
        {
            Ok(()) => {
                self.challenges.delete_challenge(challenge_id).await?;
                let session = self.sessions.issue(challenge.user_id).await?;
                tracing::info!(user_id = %challenge.user_id, "Login challenge answered");
                Ok(session)
            }
            Err(ApiAuthError::InvalidToken) | Err(ApiAuthError::Validation(_)) => {
                let attempts = self.challenges.record_challenge_failure(challenge_id).await?;
                if attempts >= MAX_CHALLENGE_ATTEMPTS {
                    self.challenges.delete_challenge(challenge_id).await?;
                    tracing::warn!(
                        user_id = %challenge.user_id,
                        challenge_id = %challenge_id,
                        "Login challenge exhausted"
                    );
                    return Err(ApiAuthError::ChallengeExhausted);
                }
                Err(ApiAuthError::InvalidToken)
            }
            Err(other) => Err(other),
        }
    }

    /// Remove expired challenges. Intended for a periodic background task.
    pub async fn sweep_expired(&self) -> Result<u64, ApiAuthError> {
        let removed = self.challenges.delete_expired_challenges().await?;
        if removed > 0 {
            tracing::info!(removed, "Swept expired login challenges");
        }
        Ok(removed)
    }
}
