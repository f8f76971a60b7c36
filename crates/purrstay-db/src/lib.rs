//! Database layer for the purrstay authentication core.
//!
//! Models follow a thin pattern: `FromRow` structs with associated functions
//! generic over `PgExecutor`, so callers decide whether an operation runs on
//! the pool or inside a transaction. State transitions that must be atomic
//! (backup-code consumption, pending-secret promotion) are expressed as
//! single conditional statements rather than read-then-write pairs.

pub mod migrations;
pub mod models;

pub use models::backup_code::BackupCode;
pub use models::login_challenge::LoginChallenge;
pub use models::two_factor_config::TwoFactorConfig;
pub use models::user::User;
