//! TOTP secret encryption using AES-256-GCM.
//!
//! Secrets are stored as a single opaque blob: a random 12-byte nonce
//! followed by the ciphertext. Keeping the nonce inside the blob means the
//! storage layer only ever sees one column.

use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use rand::RngCore;
use thiserror::Error;

/// Size of the AES-256 key in bytes.
const KEY_SIZE: usize = 32;

/// Size of the GCM nonce in bytes.
const NONCE_SIZE: usize = 12;

/// Errors from secret encryption operations.
#[derive(Debug, Error)]
pub enum SecretCipherError {
    #[error("Encryption key not configured (TWOFA_ENCRYPTION_KEY environment variable)")]
    KeyNotConfigured,

    #[error("Invalid encryption key length: expected {KEY_SIZE} bytes, got {0}")]
    InvalidKeyLength(usize),

    #[error("Invalid key format: {0}")]
    InvalidKeyFormat(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Ciphertext blob too short to contain a nonce")]
    BlobTooShort,
}

/// Encrypts and decrypts TOTP secrets at rest.
#[derive(Clone)]
pub struct SecretCipher {
    cipher: Aes256Gcm,
}

impl SecretCipher {
    /// Create from the `TWOFA_ENCRYPTION_KEY` environment variable
    /// (hex-encoded, 32 bytes).
    pub fn from_env() -> Result<Self, SecretCipherError> {
        let key_hex = std::env::var("TWOFA_ENCRYPTION_KEY")
            .map_err(|_| SecretCipherError::KeyNotConfigured)?;
        Self::from_hex_key(&key_hex)
    }

    /// Create from a hex-encoded key string.
    pub fn from_hex_key(key_hex: &str) -> Result<Self, SecretCipherError> {
        let key_bytes = hex::decode(key_hex.trim())
            .map_err(|e| SecretCipherError::InvalidKeyFormat(e.to_string()))?;
        Self::from_key(&key_bytes)
    }

    /// Create from raw key bytes.
    pub fn from_key(key: &[u8]) -> Result<Self, SecretCipherError> {
        if key.len() != KEY_SIZE {
            return Err(SecretCipherError::InvalidKeyLength(key.len()));
        }

        let cipher = Aes256Gcm::new_from_slice(key)
            .map_err(|e| SecretCipherError::InvalidKeyFormat(e.to_string()))?;

        Ok(Self { cipher })
    }

    /// Encrypt a secret into a nonce-prefixed blob.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, SecretCipherError> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext)
            .map_err(|e| SecretCipherError::EncryptionFailed(e.to_string()))?;

        let mut blob = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        blob.extend_from_slice(&nonce_bytes);
        blob.extend_from_slice(&ciphertext);
        Ok(blob)
    }

    /// Decrypt a nonce-prefixed blob back into the secret.
    pub fn decrypt(&self, blob: &[u8]) -> Result<Vec<u8>, SecretCipherError> {
        if blob.len() <= NONCE_SIZE {
            return Err(SecretCipherError::BlobTooShort);
        }

        let (nonce_bytes, ciphertext) = blob.split_at(NONCE_SIZE);
        let nonce = Nonce::from_slice(nonce_bytes);

        self.cipher
            .decrypt(nonce, ciphertext)
            .map_err(|e| SecretCipherError::DecryptionFailed(e.to_string()))
    }

    /// Generate a new random hex-encoded key (for initial deployment setup).
    #[must_use]
    pub fn generate_key() -> String {
        let mut key = [0u8; KEY_SIZE];
        OsRng.fill_bytes(&mut key);
        hex::encode(key)
    }
}

impl std::fmt::Debug for SecretCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretCipher")
            .field("cipher", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> Vec<u8> {
        (0u8..32).collect()
    }

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let cipher = SecretCipher::from_key(&test_key()).unwrap();
        let secret = b"JBSWY3DPEHPK3PXP";

        let blob = cipher.encrypt(secret).unwrap();
        assert_ne!(&blob[NONCE_SIZE..], secret.as_slice());

        let decrypted = cipher.decrypt(&blob).unwrap();
        assert_eq!(decrypted, secret);
    }

    #[test]
    fn nonces_are_unique_per_encryption() {
        let cipher = SecretCipher::from_key(&test_key()).unwrap();
        let blob1 = cipher.encrypt(b"secret").unwrap();
        let blob2 = cipher.encrypt(b"secret").unwrap();
        assert_ne!(blob1, blob2);
    }

    #[test]
    fn wrong_key_fails_decryption() {
        let cipher = SecretCipher::from_key(&test_key()).unwrap();
        let blob = cipher.encrypt(b"secret").unwrap();

        let mut other_key = test_key();
        other_key[0] ^= 0xFF;
        let other = SecretCipher::from_key(&other_key).unwrap();

        assert!(matches!(
            other.decrypt(&blob),
            Err(SecretCipherError::DecryptionFailed(_))
        ));
    }

    #[test]
    fn rejects_short_blob() {
        let cipher = SecretCipher::from_key(&test_key()).unwrap();
        assert!(matches!(
            cipher.decrypt(&[0u8; NONCE_SIZE]),
            Err(SecretCipherError::BlobTooShort)
        ));
    }

    #[test]
    fn rejects_bad_key_length() {
        assert!(matches!(
            SecretCipher::from_key(&[0u8; 16]),
            Err(SecretCipherError::InvalidKeyLength(16))
        ));
    }

    #[test]
    fn generated_key_is_usable() {
        let key = SecretCipher::generate_key();
        assert_eq!(key.len(), 64);
        assert!(SecretCipher::from_hex_key(&key).is_ok());
    }
}
