//! reqwest adapters for the registry, peer probes and the user service.

use super::{PeerLicenseEntry, PeerProbe, ServiceEndpoint, ServiceRegistry, UserCounter};
use crate::error::{LicenseError, LicenseResult};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Endpoints and timeouts of the remote collaborators.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Base URL of the service registry (`{registry_url}/registry`).
    pub registry_url: String,
    /// Base URL of the user service.
    pub user_service_url: String,
    /// Timeout of one peer probe.
    pub probe_timeout: Duration,
    /// Timeout of registry and user-service requests.
    pub request_timeout: Duration,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            registry_url: "http://localhost:8080".to_string(),
            user_service_url: "http://localhost:8081".to_string(),
            probe_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(5),
        }
    }
}

fn join(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path)
}

fn build_client(timeout: Duration) -> LicenseResult<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| LicenseError::Network(format!("failed to create HTTP client: {e}")))
}

/// Registry client that also probes the peers it lists.
pub struct HttpRegistryClient {
    client: Client,
    registry_url: String,
    probe_timeout: Duration,
}

impl HttpRegistryClient {
    pub fn new(config: &RemoteConfig) -> LicenseResult<Self> {
        Ok(Self {
            client: build_client(config.request_timeout)?,
            registry_url: config.registry_url.clone(),
            probe_timeout: config.probe_timeout,
        })
    }
}

#[async_trait]
impl ServiceRegistry for HttpRegistryClient {
    async fn list_services(&self) -> LicenseResult<Vec<ServiceEndpoint>> {
        let url = join(&self.registry_url, "registry");
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| LicenseError::Network(format!("registry request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(LicenseError::Network(format!(
                "registry returned {}",
                resp.status()
            )));
        }

        let entries: Vec<serde_json::Value> = resp
            .json()
            .await
            .map_err(|e| LicenseError::Network(format!("invalid registry response: {e}")))?;

        let services: Vec<ServiceEndpoint> = entries.into_iter().filter_map(to_endpoint).collect();
        debug!("Registry lists {} probeable services", services.len());
        Ok(services)
    }
}

#[async_trait]
impl PeerProbe for HttpRegistryClient {
    async fn probe(&self, endpoint: &ServiceEndpoint) -> LicenseResult<PeerLicenseEntry> {
        let failed = |reason: String| LicenseError::PeerProbe {
            service: endpoint.name.clone(),
            reason,
        };

        let resp = self
            .client
            .get(join(&endpoint.url, "license"))
            .timeout(self.probe_timeout)
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;

        if resp.status() != StatusCode::OK {
            return Err(failed(format!("status {}", resp.status())));
        }

        resp.json()
            .await
            .map_err(|e| failed(format!("invalid body: {e}")))
    }
}

#[derive(Deserialize)]
struct RegistryEntry {
    name: Option<String>,
    url: Option<String>,
}

/// Converts one registry entry. Entries without a URL cannot be probed and
/// are left out, like a peer that does not answer.
fn to_endpoint(entry: serde_json::Value) -> Option<ServiceEndpoint> {
    let parsed = match serde_json::from_value::<RegistryEntry>(entry.clone()) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("Skipping registry entry {entry}: {e}");
            return None;
        }
    };
    let Some(url) = parsed.url.filter(|u| !u.trim().is_empty()) else {
        warn!("Skipping registry entry without url: {entry}");
        return None;
    };
    Some(ServiceEndpoint {
        name: parsed.name.unwrap_or_else(|| url.clone()),
        url,
    })
}

#[derive(Deserialize)]
struct CountResponse {
    count: u64,
}

/// User-service client.
pub struct HttpUserClient {
    client: Client,
    user_service_url: String,
}

impl HttpUserClient {
    pub fn new(config: &RemoteConfig) -> LicenseResult<Self> {
        Ok(Self {
            client: build_client(config.request_timeout)?,
            user_service_url: config.user_service_url.clone(),
        })
    }
}

#[async_trait]
impl UserCounter for HttpUserClient {
    async fn activated_user_count(&self) -> LicenseResult<u64> {
        let url = join(&self.user_service_url, "users/count/activated");
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| LicenseError::Network(format!("user service request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(LicenseError::Network(format!(
                "user service returned {}",
                resp.status()
            )));
        }

        let body: CountResponse = resp
            .json()
            .await
            .map_err(|e| LicenseError::Network(format!("invalid user count response: {e}")))?;
        Ok(body.count)
    }
}
