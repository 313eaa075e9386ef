//! Opens encrypted licenses with the deployment's private key.
//!
//! Decrypting with an 8192-bit key is expensive, so [`LicenseCodec::load`]
//! remembers the last result keyed by the SHA3-256 of the ciphertext. A
//! different ciphertext misses the memo and replaces it.

use crate::error::{LicenseError, LicenseResult};
use crate::grant::DecryptedGrant;
use crate::store::KeyStore;
use base64::{engine::general_purpose::STANDARD, Engine};
use seclock_crypto::{decrypt_base64, sha3_hex, LicensePrivateKey};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

struct Memo {
    hash: String,
    grant: DecryptedGrant,
}

/// Decrypts license ciphertexts, memoizing the latest one.
pub struct LicenseCodec {
    keys: Arc<dyn KeyStore>,
    memo: RwLock<Option<Memo>>,
    gate: Mutex<()>,
    decryptions: AtomicU64,
}

impl LicenseCodec {
    pub fn new(keys: Arc<dyn KeyStore>) -> Self {
        Self {
            keys,
            memo: RwLock::new(None),
            gate: Mutex::new(()),
            decryptions: AtomicU64::new(0),
        }
    }

    /// Decrypts `ciphertext` without consulting the memo.
    ///
    /// The ciphertext is base64 of the RSA output; the plaintext is itself
    /// base64 of the JSON payload.
    pub async fn decrypt(&self, ciphertext: &str) -> LicenseResult<DecryptedGrant> {
        let keys = self.keys.load_keys().await?.ok_or(LicenseError::MissingKey)?;
        let ciphertext = ciphertext.to_string();

        let plaintext = tokio::task::spawn_blocking(move || {
            let key = LicensePrivateKey::from_base64_pem(&keys.private_key)?;
            decrypt_base64(&key, &ciphertext)
        })
        .await
        .map_err(|e| LicenseError::Decryption(format!("decryption task failed: {e}")))??;
        self.decryptions.fetch_add(1, Ordering::Relaxed);

        let json = STANDARD
            .decode(plaintext.trim_ascii())
            .map_err(|e| LicenseError::MalformedGrant(format!("payload is not base64: {e}")))?;
        DecryptedGrant::from_json(&json)
    }

    /// Returns the decrypted grant for `ciphertext`, reusing the memo when the
    /// ciphertext is unchanged.
    pub async fn load(&self, ciphertext: &str) -> LicenseResult<DecryptedGrant> {
        let hash = sha3_hex(ciphertext);
        if let Some(grant) = self.lookup(&hash).await {
            return Ok(grant);
        }

        // Concurrent misses on the same ciphertext decrypt once.
        let _gate = self.gate.lock().await;
        if let Some(grant) = self.lookup(&hash).await {
            return Ok(grant);
        }

        debug!("License memo miss, decrypting");
        let grant = self.decrypt(ciphertext).await?;
        *self.memo.write().await = Some(Memo {
            hash,
            grant: grant.clone(),
        });
        Ok(grant)
    }

    /// Number of RSA decryptions performed so far.
    pub fn decryptions(&self) -> u64 {
        self.decryptions.load(Ordering::Relaxed)
    }

    async fn lookup(&self, hash: &str) -> Option<DecryptedGrant> {
        self.memo
            .read()
            .await
            .as_ref()
            .filter(|m| m.hash == hash)
            .map(|m| m.grant.clone())
    }
}
