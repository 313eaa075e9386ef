//! The installed license: import, removal and decrypted access.

use crate::codec::LicenseCodec;
use crate::error::{LicenseError, LicenseResult};
use crate::grant::{DecryptedGrant, EncryptedGrant};
use crate::keys::KeyManager;
use crate::store::GrantStore;
use std::sync::Arc;
use tracing::{debug, info};

/// Owns the single installed license.
pub struct LicenseManager {
    grants: Arc<dyn GrantStore>,
    keys: Arc<KeyManager>,
    codec: Arc<LicenseCodec>,
}

impl LicenseManager {
    pub fn new(grants: Arc<dyn GrantStore>, keys: Arc<KeyManager>, codec: Arc<LicenseCodec>) -> Self {
        Self {
            grants,
            keys,
            codec,
        }
    }

    /// Installs a license.
    ///
    /// The ciphertext is decrypted before anything is stored, so a license
    /// this deployment cannot open is never persisted.
    pub async fn import_license(&self, ciphertext: &str) -> LicenseResult<EncryptedGrant> {
        if self.grants.load_grant().await?.is_some() {
            return Err(LicenseError::Conflict);
        }

        let grant = self.codec.decrypt(ciphertext).await?;
        debug!(tpld = %grant.tpld, "License decrypted");

        let stored = self
            .grants
            .add_grant(EncryptedGrant::new(ciphertext))
            .await?
            .ok_or_else(|| LicenseError::Persistence("store returned no record".to_string()))?;
        info!(id = %stored.id, "License imported");
        Ok(stored)
    }

    /// Deletes the installed license. Returns whether one was installed.
    pub async fn remove_license(&self) -> LicenseResult<bool> {
        let removed = self.grants.remove_grant().await?;
        if removed {
            info!("License removed");
        }
        Ok(removed)
    }

    /// Returns the decrypted installed license.
    pub async fn load_decrypted_license(&self) -> LicenseResult<DecryptedGrant> {
        let stored = self
            .grants
            .load_grant()
            .await?
            .ok_or_else(|| LicenseError::NotFound("no license installed".to_string()))?;
        self.codec.load(&stored.ciphertext).await
    }

    /// Returns the base64-encoded private key PEM, if generated.
    pub async fn load_private_key(&self) -> LicenseResult<Option<String>> {
        self.keys.load_private_key().await
    }
}
