//! Minimal user model.
//!
//! Accounts are owned by the surrounding identity subsystem; the 2FA core
//! only needs enough of the row to re-prove the primary credential.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgExecutor};
use uuid::Uuid;

/// A user account, as seen by the authentication core.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    /// Unique account identifier.
    pub id: Uuid,

    /// Login email, unique per account.
    pub email: String,

    /// Argon2id PHC-formatted password hash.
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Whether the account may log in at all.
    pub is_active: bool,

    /// When this account was created.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Find a user by ID.
    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Find a user by email (case-insensitive).
    pub async fn find_by_email<'e, E>(
        executor: E,
        email: &str,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .fetch_optional(executor)
            .await
    }

    /// Create a user. Used by account provisioning and test fixtures.
    pub async fn create<'e, E>(
        executor: E,
        email: &str,
        password_hash: &str,
    ) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as(
            r"
            INSERT INTO users (email, password_hash)
            VALUES ($1, $2)
            RETURNING *
            ",
        )
        .bind(email)
        .bind(password_hash)
        .fetch_one(executor)
        .await
    }
}
