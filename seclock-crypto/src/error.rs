//! Error types for the crypto layer.

use thiserror::Error;

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors that can occur in cryptographic operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// RSA key generation failed.
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    /// PEM or base64 encoding of key material failed.
    #[error("key encoding failed: {0}")]
    Encoding(String),

    /// Stored key material could not be parsed.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Input was not valid base64.
    #[error("invalid base64: {0}")]
    Base64(String),

    /// Encryption failed.
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// Decryption failed (wrong key or tampered data).
    #[error("decryption failed: {0}")]
    Decryption(String),
}
