//! Pending login challenge model.
//!
//! A challenge exists only between a successful primary-credential check and
//! the resolution of the second factor. It is single-use: success destroys
//! it, and so does exhausting the bounded retry count or the TTL.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgExecutor};
use uuid::Uuid;

/// A short-lived "second factor outstanding" handle.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LoginChallenge {
    /// The challenge handle returned to the caller.
    pub id: Uuid,

    /// The account that passed the primary-credential check.
    pub user_id: Uuid,

    /// Failed verification attempts so far.
    pub attempts: i32,

    /// When the challenge was issued.
    pub issued_at: DateTime<Utc>,

    /// When the challenge stops being resolvable.
    pub expires_at: DateTime<Utc>,
}

impl LoginChallenge {
    /// Whether the challenge TTL has elapsed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }

    /// Issue a new challenge with the given TTL.
    pub async fn create<'e, E>(
        executor: E,
        user_id: Uuid,
        ttl: chrono::Duration,
    ) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as(
            r"
            INSERT INTO login_challenges (user_id, expires_at)
            VALUES ($1, $2)
            RETURNING *
            ",
        )
        .bind(user_id)
        .bind(Utc::now() + ttl)
        .fetch_one(executor)
        .await
    }

    /// Look up a challenge by its handle.
    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as("SELECT * FROM login_challenges WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Record a failed verification attempt and return the new count, or
    /// `None` if the challenge no longer exists (resolved or swept).
    pub async fn record_failure<'e, E>(executor: E, id: Uuid) -> Result<Option<i32>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result: Option<(i32,)> = sqlx::query_as(
            r"
            UPDATE login_challenges
            SET attempts = attempts + 1
            WHERE id = $1
            RETURNING attempts
            ",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(result.map(|r| r.0))
    }

    /// Destroy a challenge (resolution, exhaustion, or cleanup).
    pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM login_challenges WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Sweep expired challenges. Returns the number deleted.
    pub async fn delete_expired<'e, E>(executor: E) -> Result<u64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM login_challenges WHERE expires_at <= NOW()")
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
