//! Licensing operations exposed to the HTTP layer.

use crate::cycle::LicenseCycle;
use crate::error::LicenseResult;
use crate::grant::{DecryptedGrant, EncryptedGrant};
use crate::keys::KeyManager;
use crate::manager::LicenseManager;
use crate::validator::ComplianceChecker;
use crate::verdict::{CachedCycleResult, ComplianceVerdict};
use std::sync::Arc;

/// Facade over the license components.
///
/// Installing or removing a license starts a cycle so the cached state
/// follows the change without waiting for the timer.
#[derive(Clone)]
pub struct LicenseService {
    keys: Arc<KeyManager>,
    manager: Arc<LicenseManager>,
    checker: Arc<ComplianceChecker>,
    cycle: Arc<LicenseCycle>,
}

impl LicenseService {
    pub fn new(
        keys: Arc<KeyManager>,
        manager: Arc<LicenseManager>,
        checker: Arc<ComplianceChecker>,
        cycle: Arc<LicenseCycle>,
    ) -> Self {
        Self {
            keys,
            manager,
            checker,
            cycle,
        }
    }

    pub async fn add_license(&self, ciphertext: &str) -> LicenseResult<EncryptedGrant> {
        let stored = self.manager.import_license(ciphertext).await?;
        self.cycle.trigger();
        Ok(stored)
    }

    pub async fn load_license(&self) -> LicenseResult<DecryptedGrant> {
        self.manager.load_decrypted_license().await
    }

    pub async fn remove_license(&self) -> LicenseResult<bool> {
        let removed = self.manager.remove_license().await?;
        self.cycle.trigger();
        Ok(removed)
    }

    /// Runs the full check now, bypassing the cache.
    pub async fn validate(&self) -> LicenseResult<ComplianceVerdict> {
        self.checker.validate().await
    }

    /// Returns the result of the last completed cycle.
    pub async fn read_cached_state(&self) -> CachedCycleResult {
        self.cycle.read_cached_state().await
    }

    pub async fn checksum(&self) -> LicenseResult<String> {
        self.checker.checksum().await
    }

    pub async fn load_public_key(&self) -> LicenseResult<Option<String>> {
        self.keys.load_public_key().await
    }

    pub async fn load_private_key(&self) -> LicenseResult<Option<String>> {
        self.manager.load_private_key().await
    }
}
