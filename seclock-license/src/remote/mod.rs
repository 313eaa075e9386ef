//! Remote collaborators of the compliance check: the service registry, the
//! peers it lists and the user service.

#[cfg(feature = "online")]
mod http;

#[cfg(feature = "online")]
pub use http::{HttpRegistryClient, HttpUserClient, RemoteConfig};

use crate::error::LicenseResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One registry entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEndpoint {
    pub name: String,
    pub url: String,
}

/// A peer's self-reported license identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerLicenseEntry {
    pub id: String,
    pub name: String,
}

/// Lists the services of the platform.
#[async_trait]
pub trait ServiceRegistry: Send + Sync {
    async fn list_services(&self) -> LicenseResult<Vec<ServiceEndpoint>>;
}

/// Asks one peer for its license identity.
///
/// Errors are reported as [`LicenseError::PeerProbe`](crate::LicenseError::PeerProbe)
/// and are never escalated by the checker.
#[async_trait]
pub trait PeerProbe: Send + Sync {
    async fn probe(&self, endpoint: &ServiceEndpoint) -> LicenseResult<PeerLicenseEntry>;
}

/// Counts activated users.
#[async_trait]
pub trait UserCounter: Send + Sync {
    async fn activated_user_count(&self) -> LicenseResult<u64>;
}
