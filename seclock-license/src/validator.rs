//! Authoritative compliance check of the installed license against live
//! usage.

use crate::error::LicenseResult;
use crate::grant::DecryptedGrant;
use crate::manager::LicenseManager;
use crate::remote::{PeerLicenseEntry, PeerProbe, ServiceRegistry, UserCounter};
use crate::verdict::ComplianceVerdict;
use chrono::Utc;
use seclock_crypto::sha3_hex;
use std::sync::Arc;
use tracing::{debug, warn};

/// Checks the installed license against users, peers and the clock.
///
/// Holds no state of its own; every call reads the current license and
/// queries the collaborators afresh.
pub struct ComplianceChecker {
    manager: Arc<LicenseManager>,
    registry: Arc<dyn ServiceRegistry>,
    probe: Arc<dyn PeerProbe>,
    users: Arc<dyn UserCounter>,
}

impl ComplianceChecker {
    pub fn new(
        manager: Arc<LicenseManager>,
        registry: Arc<dyn ServiceRegistry>,
        probe: Arc<dyn PeerProbe>,
        users: Arc<dyn UserCounter>,
    ) -> Self {
        Self {
            manager,
            registry,
            probe,
            users,
        }
    }

    /// SHA3-256 hex fingerprint of the installed license, ignoring its
    /// record id.
    pub async fn checksum(&self) -> LicenseResult<String> {
        let grant = self.manager.load_decrypted_license().await?;
        Ok(sha3_hex(grant.checksum_material()?))
    }

    /// Runs the date, user and service checks.
    ///
    /// Registry and user-service failures are returned as errors. Peers that
    /// fail to answer are left out of the service check.
    pub async fn validate(&self) -> LicenseResult<ComplianceVerdict> {
        let grant = self.manager.load_decrypted_license().await?;

        let date_exceeded = grant.is_date_exceeded(Utc::now());
        let (exceeded_users, unlicensed_services) =
            futures::try_join!(self.check_users(&grant), self.check_services(&grant))?;

        let verdict = ComplianceVerdict {
            exceeded_users,
            unlicensed_services,
            date_exceeded,
            tpld: grant.tpld,
        };
        debug!(
            exceeded_users = verdict.exceeded_users,
            unlicensed = verdict.unlicensed_services.len(),
            date_exceeded = verdict.date_exceeded,
            "Compliance check finished"
        );
        Ok(verdict)
    }

    async fn check_users(&self, grant: &DecryptedGrant) -> LicenseResult<u64> {
        let active = self.users.activated_user_count().await?;
        Ok(grant.exceeded_users(active))
    }

    async fn check_services(&self, grant: &DecryptedGrant) -> LicenseResult<Vec<String>> {
        let peers = self.collect_peer_licenses().await?;
        Ok(peers
            .into_iter()
            .filter(|peer| !grant.licenses_service(&peer.id))
            .map(|peer| peer.name)
            .collect())
    }

    /// Probes every registered service, keeping registry order and dropping
    /// the ones that did not answer.
    async fn collect_peer_licenses(&self) -> LicenseResult<Vec<PeerLicenseEntry>> {
        let services = self.registry.list_services().await?;
        let probes = services.iter().map(|svc| self.probe.probe(svc));
        let results = futures::future::join_all(probes).await;

        Ok(results
            .into_iter()
            .filter_map(|result| match result {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Excluding peer from license check: {e}");
                    None
                }
            })
            .collect())
    }
}
