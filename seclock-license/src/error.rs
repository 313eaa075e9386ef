//! Error types for the licensing module.

use seclock_crypto::CryptoError;
use thiserror::Error;

/// Licensing-specific errors.
#[derive(Debug, Error)]
pub enum LicenseError {
    /// A license is already installed.
    #[error("a license is already installed; remove it before importing another")]
    Conflict,

    /// No license (or other required record) is stored.
    #[error("not found: {0}")]
    NotFound(String),

    /// The private key needed to open the license has not been generated.
    #[error("license private key is missing")]
    MissingKey,

    /// The RSA step failed (wrong key or tampered ciphertext).
    #[error("license decryption failed: {0}")]
    Decryption(String),

    /// The payload decrypted but is not a valid license.
    #[error("invalid license payload: {0}")]
    MalformedGrant(String),

    /// Key pair generation failed.
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    /// Backing store failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// The grant store refused to persist a new license.
    #[error("failed to persist license: {0}")]
    Persistence(String),

    /// A single peer did not report its license identity.
    #[error("license probe of {service} failed: {reason}")]
    PeerProbe { service: String, reason: String },

    /// Registry or user service unreachable or misbehaving.
    #[error("network error: {0}")]
    Network(String),

    /// A scheduled compliance cycle failed.
    #[error("license cycle failed: {0}")]
    SchedulerCycle(#[source] Box<LicenseError>),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<CryptoError> for LicenseError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::KeyGeneration(msg) | CryptoError::Encoding(msg) => Self::KeyGeneration(msg),
            CryptoError::Base64(msg) => Self::MalformedGrant(format!("invalid base64: {msg}")),
            CryptoError::InvalidKey(msg) => Self::Decryption(format!("unusable private key: {msg}")),
            CryptoError::Encryption(msg) | CryptoError::Decryption(msg) => Self::Decryption(msg),
        }
    }
}

/// Result type for license operations.
pub type LicenseResult<T> = Result<T, LicenseError>;
