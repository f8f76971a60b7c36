//! Backup code generation and hashing.
//!
//! Codes are 8-character uppercase alphanumerics, generated from the OS
//! CSPRNG and distinct within a batch. Plaintext leaves this module exactly
//! once, in the return value of `generate_batch`; only SHA-256 hashes are
//! ever persisted.

use sha2::{Digest, Sha256};

/// Number of backup codes in a batch.
pub const BACKUP_CODE_COUNT: usize = 10;

/// Length of a backup code in characters.
pub const BACKUP_CODE_LENGTH: usize = 8;

/// Generate a batch of backup codes.
///
/// Returns `(plaintext_codes, hashes)` in matching order.
#[must_use]
pub fn generate_batch(count: usize) -> (Vec<String>, Vec<String>) {
    use rand::distributions::Alphanumeric;
    use rand::rngs::OsRng;
    use rand::Rng;

    let mut codes: Vec<String> = Vec::with_capacity(count);
    let mut hashes = Vec::with_capacity(count);

    while codes.len() < count {
        let code: String = (0..BACKUP_CODE_LENGTH)
            .map(|_| OsRng.sample(Alphanumeric) as char)
            .collect::<String>()
            .to_uppercase();

        // Duplicates within a batch are astronomically unlikely but would
        // break the one-code-one-use accounting, so regenerate on collision.
        if codes.contains(&code) {
            continue;
        }

        hashes.push(hash_code(&code));
        codes.push(code);
    }

    (codes, hashes)
}

/// SHA-256 hash of a backup code, hex-encoded.
#[must_use]
pub fn hash_code(code: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(code.as_bytes());
    hex::encode(hasher.finalize())
}

/// Normalize user input: strip separators and uppercase.
#[must_use]
pub fn normalize(input: &str) -> String {
    input.replace(['-', ' '], "").to_uppercase()
}
