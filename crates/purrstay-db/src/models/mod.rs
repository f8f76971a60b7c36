//! Database models for the authentication core.

pub mod backup_code;
pub mod login_challenge;
pub mod two_factor_config;
pub mod user;
