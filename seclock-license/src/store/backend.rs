//! Storage abstraction traits.

use crate::error::LicenseResult;
use crate::grant::{EncryptedGrant, KeyPair};
use crate::verdict::CachedCycleResult;
use async_trait::async_trait;

/// Holds the deployment's single key pair.
#[async_trait]
pub trait KeyStore: Send + Sync {
    /// Loads the key pair, if one was generated.
    async fn load_keys(&self) -> LicenseResult<Option<KeyPair>>;

    /// Persists a freshly generated key pair.
    async fn add_keys(&self, keys: KeyPair) -> LicenseResult<()>;
}

/// Holds at most one encrypted license.
#[async_trait]
pub trait GrantStore: Send + Sync {
    /// Loads the stored license, if any.
    async fn load_grant(&self) -> LicenseResult<Option<EncryptedGrant>>;

    /// Stores a license. Returns `None` when the store declined the write
    /// (e.g. because a license is already present).
    async fn add_grant(&self, grant: EncryptedGrant) -> LicenseResult<Option<EncryptedGrant>>;

    /// Deletes the stored license. Returns whether one was deleted.
    async fn remove_grant(&self) -> LicenseResult<bool>;
}

/// Shared key/value cache for cycle results.
///
/// `set` must replace the whole entry atomically so readers never observe a
/// partially written record.
#[async_trait]
pub trait CycleCache: Send + Sync {
    /// Reads the entry under `key`.
    async fn get(&self, key: &str) -> LicenseResult<Option<CachedCycleResult>>;

    /// Overwrites the entry under `key`.
    async fn set(&self, key: &str, value: &CachedCycleResult) -> LicenseResult<()>;
}
