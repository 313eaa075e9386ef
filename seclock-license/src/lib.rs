//! License enforcement for a Second Lock deployment.
//!
//! This crate handles:
//! - The deployment's RSA key pair, generated once at first start
//! - Importing, decrypting and removing the single installed license
//! - Checking the license against activated users, peer services and its
//!   expiration date
//! - A periodic cycle that caches the last check for cheap reads
//!
//! # License Format
//!
//! A license is `base64(RSA-OAEP-SHA512(base64(json)))`, encrypted for the
//! deployment's public key. See [`DecryptedGrant`] for the payload fields.
//!
//! # Composition
//!
//! Persistence and remote services are reached through traits
//! ([`KeyStore`], [`GrantStore`], [`CycleCache`], [`ServiceRegistry`],
//! [`PeerProbe`], [`UserCounter`]) and injected as `Arc<dyn Trait>`.

mod codec;
mod cycle;
mod error;
mod grant;
mod keys;
mod manager;
pub mod remote;
mod service;
pub mod store;
mod validator;
mod verdict;

pub use codec::LicenseCodec;
pub use cycle::{CycleConfig, LicenseCycle, CYCLE_CACHE_KEY, DEFAULT_CYCLE_INTERVAL};
pub use error::{LicenseError, LicenseResult};
pub use grant::{
    DecryptedGrant, EncryptedGrant, ExpirationDate, Feature, KeyPair, RecordTag, RECORD_ID_FIELD,
};
pub use keys::KeyManager;
pub use manager::LicenseManager;
pub use remote::{PeerLicenseEntry, PeerProbe, ServiceEndpoint, ServiceRegistry, UserCounter};
pub use service::LicenseService;
pub use store::{CycleCache, GrantStore, KeyStore, MemoryStore, SqliteStore};
pub use validator::ComplianceChecker;
pub use verdict::{CachedCycleResult, ComplianceVerdict, REMEDIATION_MESSAGE};

#[cfg(feature = "online")]
pub use remote::{HttpRegistryClient, HttpUserClient, RemoteConfig};
