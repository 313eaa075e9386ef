//! In-process storage backend.

use super::backend::{CycleCache, GrantStore, KeyStore};
use crate::error::{LicenseError, LicenseResult};
use crate::grant::{EncryptedGrant, KeyPair};
use crate::verdict::CachedCycleResult;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Keeps keys, the license and cached cycle results in memory.
#[derive(Default)]
pub struct MemoryStore {
    keys: RwLock<Option<KeyPair>>,
    grant: RwLock<Option<EncryptedGrant>>,
    cache: RwLock<HashMap<String, CachedCycleResult>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyStore for MemoryStore {
    async fn load_keys(&self) -> LicenseResult<Option<KeyPair>> {
        Ok(self.keys.read().await.clone())
    }

    async fn add_keys(&self, keys: KeyPair) -> LicenseResult<()> {
        let mut slot = self.keys.write().await;
        if slot.is_some() {
            return Err(LicenseError::Storage("a key pair is already stored".to_string()));
        }
        *slot = Some(keys);
        Ok(())
    }
}

#[async_trait]
impl GrantStore for MemoryStore {
    async fn load_grant(&self) -> LicenseResult<Option<EncryptedGrant>> {
        Ok(self.grant.read().await.clone())
    }

    async fn add_grant(&self, grant: EncryptedGrant) -> LicenseResult<Option<EncryptedGrant>> {
        let mut slot = self.grant.write().await;
        if slot.is_some() {
            return Ok(None);
        }
        *slot = Some(grant.clone());
        Ok(Some(grant))
    }

    async fn remove_grant(&self) -> LicenseResult<bool> {
        Ok(self.grant.write().await.take().is_some())
    }
}

#[async_trait]
impl CycleCache for MemoryStore {
    async fn get(&self, key: &str) -> LicenseResult<Option<CachedCycleResult>> {
        Ok(self.cache.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &CachedCycleResult) -> LicenseResult<()> {
        self.cache
            .write()
            .await
            .insert(key.to_string(), value.clone());
        Ok(())
    }
}
