//! Two-factor authentication for the purrstay booking platform.
//!
//! Covers the full 2FA lifecycle (TOTP enrollment, verification, disable,
//! backup codes) and the two-step login flow that sits in front of session
//! issuance. Persistence goes through the store traits in [`store`]; the
//! production implementation is Postgres via `purrstay-db`.

pub mod backup_codes;
pub mod crypto;
pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;
pub mod store;
pub mod testing;
pub mod totp;

pub use error::ApiAuthError;
pub use router::{login_router, spawn_challenge_sweeper, two_factor_router, AuthState};
pub use services::{LoginChallengeService, TwoFactorService};
pub use store::{ChallengeStore, CredentialStore, PgStore, SecretStore};
pub use totp::TotpEngine;
