//! Single-use backup code model.
//!
//! Backup codes let a user complete 2FA when the authenticator device is
//! unavailable. Only SHA-256 hashes are stored; the plaintext exists exactly
//! once, in the response that created the batch.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgExecutor};
use uuid::Uuid;

/// A backup code for 2FA account recovery.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BackupCode {
    /// Unique identifier for this code.
    pub id: Uuid,

    /// The account this code belongs to.
    pub user_id: Uuid,

    /// SHA-256 hash of the code, hex-encoded.
    #[serde(skip_serializing)]
    pub code_hash: String,

    /// When this code was consumed (NULL if unused).
    pub used_at: Option<DateTime<Utc>>,

    /// When this code was created.
    pub created_at: DateTime<Utc>,
}

impl BackupCode {
    /// Insert a batch of code hashes for an account.
    pub async fn create_batch<'e, E>(
        executor: E,
        user_id: Uuid,
        code_hashes: &[String],
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let hashes: Vec<&str> = code_hashes.iter().map(String::as_str).collect();

        sqlx::query_as(
            r"
            INSERT INTO backup_codes (user_id, code_hash)
            SELECT $1, unnest($2::text[])
            RETURNING *
            ",
        )
        .bind(user_id)
        .bind(&hashes)
        .fetch_all(executor)
        .await
    }

    /// Consume the code matching `code_hash`, if one is still unused.
    ///
    /// The find-and-burn is a single conditional update, so two requests
    /// racing on the same code cannot both succeed. Returns true if a code
    /// was consumed.
    pub async fn consume<'e, E>(
        executor: E,
        user_id: Uuid,
        code_hash: &str,
    ) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            r"
            UPDATE backup_codes
            SET used_at = NOW()
            WHERE id = (
                SELECT id FROM backup_codes
                WHERE user_id = $1 AND code_hash = $2 AND used_at IS NULL
                LIMIT 1
                FOR UPDATE SKIP LOCKED
            )
            ",
        )
        .bind(user_id)
        .bind(code_hash)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Count unused codes for an account.
    pub async fn count_unused<'e, E>(executor: E, user_id: Uuid) -> Result<i64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM backup_codes WHERE user_id = $1 AND used_at IS NULL",
        )
        .bind(user_id)
        .fetch_one(executor)
        .await?;
        Ok(result.0)
    }

    /// Delete every code for an account (regeneration or 2FA disable).
    pub async fn delete_all_for_user<'e, E>(executor: E, user_id: Uuid) -> Result<u64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM backup_codes WHERE user_id = $1")
            .bind(user_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
