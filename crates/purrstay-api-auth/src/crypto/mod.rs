//! Cryptographic helpers for secrets at rest.

pub mod secret_cipher;

pub use secret_cipher::{SecretCipher, SecretCipherError};
