//! Password verification with Argon2id.
//!
//! Hashing and storage of primary credentials belong to the identity
//! subsystem; the 2FA core only re-proves a password during Disable and at
//! primary login.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, SaltString},
    Argon2, PasswordVerifier,
};

use crate::error::ApiAuthError;

/// Verify a password against a PHC-formatted Argon2 hash.
///
/// Returns `Ok(false)` on mismatch; a malformed stored hash is an error.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, ApiAuthError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| ApiAuthError::Internal(format!("Stored password hash is invalid: {e}")))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(ApiAuthError::Internal(format!(
            "Password verification failed: {e}"
        ))),
    }
}

/// Hash a password with Argon2id. Used by account provisioning and fixtures.
pub fn hash_password(password: &str) -> Result<String, ApiAuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| ApiAuthError::Internal(format!("Password hashing failed: {e}")))
}
