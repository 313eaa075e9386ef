//! Shared helpers for API tests.

#![allow(dead_code)]

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{Duration, Utc};
use seclock_crypto::{encrypt_to_base64, generate_keypair, LicensePublicKey};
use seclock_license::{
    ComplianceChecker, CycleConfig, KeyManager, KeyPair, KeyStore, LicenseCodec, LicenseCycle,
    LicenseError, LicenseManager, LicenseResult, LicenseService, MemoryStore, PeerLicenseEntry,
    PeerProbe, ServiceEndpoint, ServiceRegistry, UserCounter,
};
use seclock_server::{build_router, AppState, SelfReport};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

pub const TEST_KEY_BITS: usize = 4096;

pub fn test_keypair() -> KeyPair {
    static KEYS: OnceLock<KeyPair> = OnceLock::new();
    KEYS.get_or_init(|| KeyPair::from(generate_keypair(TEST_KEY_BITS).unwrap()))
        .clone()
}

pub fn encrypt_grant(payload: &Value) -> String {
    let public = LicensePublicKey::from_base64_pem(&test_keypair().public_key).unwrap();
    encrypt_to_base64(&public, STANDARD.encode(payload.to_string()).as_bytes()).unwrap()
}

pub fn grant(max_users: u64, tpld: &str) -> Value {
    json!({
        "_id": "issuer-1",
        "expirationDate": (Utc::now() - Duration::days(1)).to_rfc3339(),
        "maxUsers": max_users,
        "features": [{ "id": "svc-a" }],
        "tpld": tpld,
    })
}

/// Registry of one peer "A" licensed as "svc-a" and one peer "B" reporting
/// "svc-b".
pub struct Peers {
    pub registry_down: AtomicBool,
}

#[async_trait]
impl ServiceRegistry for Peers {
    async fn list_services(&self) -> LicenseResult<Vec<ServiceEndpoint>> {
        if self.registry_down.load(Ordering::SeqCst) {
            return Err(LicenseError::Network("registry down".to_string()));
        }
        Ok(["A", "B"]
            .iter()
            .map(|n| ServiceEndpoint {
                name: n.to_string(),
                url: format!("http://{n}"),
            })
            .collect())
    }
}

#[async_trait]
impl PeerProbe for Peers {
    async fn probe(&self, endpoint: &ServiceEndpoint) -> LicenseResult<PeerLicenseEntry> {
        let id = if endpoint.name == "A" { "svc-a" } else { "svc-b" };
        Ok(PeerLicenseEntry {
            id: id.to_string(),
            name: endpoint.name.clone(),
        })
    }
}

pub struct Users(pub u64);

#[async_trait]
impl UserCounter for Users {
    async fn activated_user_count(&self) -> LicenseResult<u64> {
        Ok(self.0)
    }
}

pub struct TestServer {
    pub base: String,
    pub peers: Arc<Peers>,
    pub cycle: Arc<LicenseCycle>,
}

/// Spin up the HTTP server on an OS-assigned port.
pub async fn spawn_test_server(with_keys: bool) -> TestServer {
    let store = Arc::new(MemoryStore::new());
    if with_keys {
        store.add_keys(test_keypair()).await.unwrap();
    }
    let keys = Arc::new(KeyManager::with_key_bits(store.clone(), TEST_KEY_BITS));
    let codec = Arc::new(LicenseCodec::new(store.clone()));
    let manager = Arc::new(LicenseManager::new(store.clone(), keys.clone(), codec));
    let peers = Arc::new(Peers {
        registry_down: AtomicBool::new(false),
    });
    let checker = Arc::new(ComplianceChecker::new(
        manager.clone(),
        peers.clone(),
        peers.clone(),
        Arc::new(Users(3)),
    ));
    let cycle = Arc::new(LicenseCycle::new(checker.clone(), store, CycleConfig::default()));

    let state = AppState {
        service: LicenseService::new(keys, manager, checker, cycle.clone()),
        identity: Arc::new(SelfReport {
            id: "licensing".to_string(),
            name: "Licensing".to_string(),
        }),
    };

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer {
        base: format!("http://127.0.0.1:{}", port),
        peers,
        cycle,
    }
}
