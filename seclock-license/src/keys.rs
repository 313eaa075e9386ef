//! License key pair lifecycle.

use crate::error::{LicenseError, LicenseResult};
use crate::grant::KeyPair;
use crate::store::KeyStore;
use seclock_crypto::{generate_keypair, LICENSE_KEY_BITS};
use std::sync::Arc;
use tracing::{debug, info};

/// Generates the deployment's key pair once and hands out its halves.
pub struct KeyManager {
    store: Arc<dyn KeyStore>,
    key_bits: usize,
}

impl KeyManager {
    /// Creates a manager that generates [`LICENSE_KEY_BITS`] keys.
    pub fn new(store: Arc<dyn KeyStore>) -> Self {
        Self::with_key_bits(store, LICENSE_KEY_BITS)
    }

    /// Creates a manager with a custom modulus size.
    pub fn with_key_bits(store: Arc<dyn KeyStore>, key_bits: usize) -> Self {
        Self { store, key_bits }
    }

    /// Returns the modulus size used by [`generate`](Self::generate).
    pub fn key_bits(&self) -> usize {
        self.key_bits
    }

    /// Returns true if a key pair is stored.
    pub async fn exists(&self) -> LicenseResult<bool> {
        Ok(self.store.load_keys().await?.is_some())
    }

    /// Generates and stores a new key pair.
    ///
    /// Not safe to run concurrently with itself; the bootstrap path calls it
    /// once through [`ensure_keypair`](Self::ensure_keypair).
    pub async fn generate(&self) -> LicenseResult<KeyPair> {
        let bits = self.key_bits;
        info!("Generating {}-bit license key pair", bits);

        let pem = tokio::task::spawn_blocking(move || generate_keypair(bits))
            .await
            .map_err(|e| LicenseError::KeyGeneration(format!("key generation task failed: {e}")))??;

        let keys = KeyPair::from(pem);
        self.store.add_keys(keys.clone()).await?;
        info!("License key pair stored");
        Ok(keys)
    }

    /// Generates a key pair unless one already exists. Returns whether a key
    /// pair was generated.
    pub async fn ensure_keypair(&self) -> LicenseResult<bool> {
        if self.exists().await? {
            debug!("License key pair already present");
            return Ok(false);
        }
        self.generate().await?;
        Ok(true)
    }

    /// Returns the base64-encoded public key PEM, if generated.
    pub async fn load_public_key(&self) -> LicenseResult<Option<String>> {
        Ok(self.store.load_keys().await?.map(|k| k.public_key))
    }

    /// Returns the base64-encoded private key PEM, if generated.
    pub async fn load_private_key(&self) -> LicenseResult<Option<String>> {
        Ok(self.store.load_keys().await?.map(|k| k.private_key))
    }
}
