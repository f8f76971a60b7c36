//! Session issuance seam.
//!
//! The 2FA core never defines what a session is; it asks a `SessionIssuer`
//! for one after authentication completes. `JwtSessionIssuer` is the default
//! wiring (HS256), but callers may plug in whatever the surrounding
//! application uses for sessions.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiAuthError;

/// A fully authenticated session, opaque to this crate.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    /// The session token handed to the client.
    pub token: String,
    /// Seconds until the token expires.
    pub expires_in: i64,
}

/// Issues full sessions once authentication (both factors) has completed.
#[async_trait]
pub trait SessionIssuer: Send + Sync {
    async fn issue(&self, user_id: Uuid) -> Result<IssuedSession, ApiAuthError>;
}

/// Claims carried by the default JWT session.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

/// Default session issuer: HS256 JWTs.
pub struct JwtSessionIssuer {
    key: EncodingKey,
    ttl: Duration,
}

impl JwtSessionIssuer {
    /// Create an issuer with an explicit signing secret and token lifetime.
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            key: EncodingKey::from_secret(secret),
            ttl,
        }
    }

    /// Create from the `SESSION_JWT_SECRET` environment variable with a
    /// 24-hour token lifetime.
    pub fn from_env() -> Result<Self, ApiAuthError> {
        let secret = std::env::var("SESSION_JWT_SECRET").map_err(|_| {
            ApiAuthError::Internal("SESSION_JWT_SECRET environment variable not set".into())
        })?;
        Ok(Self::new(secret.as_bytes(), Duration::hours(24)))
    }
}

#[async_trait]
impl SessionIssuer for JwtSessionIssuer {
    async fn issue(&self, user_id: Uuid) -> Result<IssuedSession, ApiAuthError> {
        let now = Utc::now();
        let expires_at = now + self.ttl;

        let claims = SessionClaims {
            sub: user_id.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::default(), &claims, &self.key)
            .map_err(|e| ApiAuthError::Internal(format!("Session token encoding failed: {e}")))?;

        Ok(IssuedSession {
            token,
            expires_in: self.ttl.num_seconds(),
        })
    }
}

impl std::fmt::Debug for JwtSessionIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSessionIssuer")
            .field("key", &"[REDACTED]")
            .field("ttl", &self.ttl)
            .finish()
    }
}
