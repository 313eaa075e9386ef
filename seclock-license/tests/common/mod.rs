//! Shared test helpers for license tests.

#![allow(dead_code)]

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, Duration, Utc};
use seclock_crypto::{encrypt_to_base64, generate_keypair, LicensePublicKey};
use seclock_license::{
    ComplianceChecker, CycleConfig, KeyManager, KeyPair, KeyStore, LicenseCodec, LicenseCycle,
    LicenseError, LicenseManager, LicenseResult, LicenseService, MemoryStore, PeerLicenseEntry,
    PeerProbe, ServiceEndpoint, ServiceRegistry, UserCounter,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

/// Modulus size for tests; leaves room for a small grant under OAEP-SHA512.
pub const TEST_KEY_BITS: usize = 4096;

/// Returns a key pair generated once per test binary.
pub fn test_keypair() -> KeyPair {
    static KEYS: OnceLock<KeyPair> = OnceLock::new();
    KEYS.get_or_init(|| KeyPair::from(generate_keypair(TEST_KEY_BITS).unwrap()))
        .clone()
}

/// Returns a memory store holding the test key pair.
pub async fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store.add_keys(test_keypair()).await.unwrap();
    store
}

/// Builds a grant payload.
pub fn grant_json(max_users: u64, features: &[&str], expiration: DateTime<Utc>) -> Value {
    let features: Vec<Value> = features.iter().map(|id| json!({ "id": id })).collect();
    json!({
        "_id": "issuer-7",
        "expirationDate": expiration.to_rfc3339(),
        "maxUsers": max_users,
        "features": features,
        "tpld": "tenant-1",
    })
}

/// A grant for "svc-a" and "svc-b" with 10 users that expired a year ago.
pub fn default_grant() -> Value {
    grant_json(10, &["svc-a", "svc-b"], Utc::now() - Duration::days(365))
}

/// Encrypts a payload for the test key pair.
pub fn encrypt_grant(payload: &Value) -> String {
    encrypt_raw(STANDARD.encode(payload.to_string()).as_bytes())
}

/// Encrypts arbitrary plaintext for the test key pair.
pub fn encrypt_raw(plaintext: &[u8]) -> String {
    let public = LicensePublicKey::from_base64_pem(&test_keypair().public_key).unwrap();
    encrypt_to_base64(&public, plaintext).unwrap()
}

pub fn endpoint(name: &str) -> ServiceEndpoint {
    ServiceEndpoint {
        name: name.to_string(),
        url: format!("http://{name}.internal"),
    }
}

/// Registry returning a fixed list, or failing on demand.
#[derive(Default)]
pub struct StaticRegistry {
    pub services: Vec<ServiceEndpoint>,
    pub fail: AtomicBool,
}

impl StaticRegistry {
    pub fn new(names: &[&str]) -> Self {
        Self {
            services: names.iter().map(|n| endpoint(n)).collect(),
            fail: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl ServiceRegistry for StaticRegistry {
    async fn list_services(&self) -> LicenseResult<Vec<ServiceEndpoint>> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(LicenseError::Network("registry down".to_string()));
        }
        Ok(self.services.clone())
    }
}

/// Probe answering from a table keyed by service name; unknown names fail.
#[derive(Default)]
pub struct TableProbe {
    pub answers: HashMap<String, String>,
}

impl TableProbe {
    /// `pairs` maps service name to reported license id.
    pub fn new(pairs: &[(&str, &str)]) -> Self {
        Self {
            answers: pairs
                .iter()
                .map(|(name, id)| (name.to_string(), id.to_string()))
                .collect(),
        }
    }
}

#[async_trait]
impl PeerProbe for TableProbe {
    async fn probe(&self, endpoint: &ServiceEndpoint) -> LicenseResult<PeerLicenseEntry> {
        match self.answers.get(&endpoint.name) {
            Some(id) => Ok(PeerLicenseEntry {
                id: id.clone(),
                name: endpoint.name.clone(),
            }),
            None => Err(LicenseError::PeerProbe {
                service: endpoint.name.clone(),
                reason: "unreachable".to_string(),
            }),
        }
    }
}

/// User counter with an adjustable count.
#[derive(Default)]
pub struct StaticUsers {
    pub count: AtomicU64,
    pub fail: AtomicBool,
}

impl StaticUsers {
    pub fn new(count: u64) -> Self {
        Self {
            count: AtomicU64::new(count),
            fail: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl UserCounter for StaticUsers {
    async fn activated_user_count(&self) -> LicenseResult<u64> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(LicenseError::Network("user service down".to_string()));
        }
        Ok(self.count.load(Ordering::SeqCst))
    }
}

/// The full component graph over a memory store and in-process collaborators.
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub keys: Arc<KeyManager>,
    pub codec: Arc<LicenseCodec>,
    pub manager: Arc<LicenseManager>,
    pub registry: Arc<StaticRegistry>,
    pub users: Arc<StaticUsers>,
    pub checker: Arc<ComplianceChecker>,
    pub cycle: Arc<LicenseCycle>,
    pub service: LicenseService,
}

impl Harness {
    /// Registry lists "svc-a" and "svc-b", both reporting their own name as
    /// license id; 10 activated users.
    pub async fn new() -> Self {
        Self::with(
            StaticRegistry::new(&["svc-a", "svc-b"]),
            TableProbe::new(&[("svc-a", "svc-a"), ("svc-b", "svc-b")]),
            StaticUsers::new(10),
        )
        .await
    }

    pub async fn with(registry: StaticRegistry, probe: TableProbe, users: StaticUsers) -> Self {
        let store = seeded_store().await;
        let keys = Arc::new(KeyManager::with_key_bits(store.clone(), TEST_KEY_BITS));
        let codec = Arc::new(LicenseCodec::new(store.clone()));
        let manager = Arc::new(LicenseManager::new(store.clone(), keys.clone(), codec.clone()));
        let registry = Arc::new(registry);
        let users = Arc::new(users);
        let checker = Arc::new(ComplianceChecker::new(
            manager.clone(),
            registry.clone(),
            Arc::new(probe),
            users.clone(),
        ));
        let cycle = Arc::new(LicenseCycle::new(
            checker.clone(),
            store.clone(),
            CycleConfig::default(),
        ));
        let service = LicenseService::new(keys.clone(), manager.clone(), checker.clone(), cycle.clone());

        Self {
            store,
            keys,
            codec,
            manager,
            registry,
            users,
            checker,
            cycle,
            service,
        }
    }

    /// Imports `payload` directly through the manager.
    pub async fn install(&self, payload: &Value) {
        self.manager
            .import_license(&encrypt_grant(payload))
            .await
            .unwrap();
    }
}
