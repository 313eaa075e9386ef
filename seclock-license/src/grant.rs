//! License records: the key pair, the stored encrypted grant and the
//! decrypted grant it opens to.
//!
//! The decrypted payload is a JSON object using the platform's camelCase
//! field names:
//! - `expirationDate`: RFC 3339 timestamp
//! - `maxUsers`: number of activated users the deployment may have
//! - `features`: licensed services, each `{ "id": ..., ... }`
//! - `tpld`: opaque license/tenant identifier
//! - `_id`: storage-layer record id of the issuing system (optional)
//!
//! Unknown fields are kept so that fingerprints cover the whole payload.

use crate::error::{LicenseError, LicenseResult};
use chrono::{DateTime, SecondsFormat, Utc};
use seclock_crypto::PemKeyPair;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Name of the issuer-side record id, excluded from fingerprints.
pub const RECORD_ID_FIELD: &str = "_id";

/// Storage tag distinguishing key records from license records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordTag {
    /// The license key pair.
    Key,
    /// The encrypted license.
    License,
}

/// The deployment's license key pair, as stored.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyPair {
    /// Base64-encoded public key PEM.
    pub public_key: String,
    /// Base64-encoded private key PEM.
    pub private_key: String,
    /// Always [`RecordTag::Key`].
    pub tag_name: RecordTag,
}

impl From<PemKeyPair> for KeyPair {
    fn from(pair: PemKeyPair) -> Self {
        Self {
            public_key: pair.public_key().to_string(),
            private_key: pair.private_key().to_string(),
            tag_name: RecordTag::Key,
        }
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key)
            .field("private_key", &"[REDACTED]")
            .field("tag_name", &self.tag_name)
            .finish()
    }
}

/// The stored, still-encrypted license.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedGrant {
    /// Record id assigned on import.
    #[serde(rename = "_id")]
    pub id: Uuid,
    /// Base64 RSA-OAEP ciphertext.
    #[serde(rename = "license")]
    pub ciphertext: String,
    /// Always [`RecordTag::License`].
    pub tag_name: RecordTag,
}

impl EncryptedGrant {
    /// Creates a new record for the given ciphertext.
    #[must_use]
    pub fn new(ciphertext: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            ciphertext: ciphertext.into(),
            tag_name: RecordTag::License,
        }
    }
}

/// One licensed service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    /// Service license identifier, matched against peer self-reports.
    pub id: String,
    /// Any further attributes of the entitlement.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Feature {
    /// Creates a feature with no extra attributes.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            extra: Map::new(),
        }
    }
}

/// A grant's expiration date.
///
/// Serializes back to the issuer's text unchanged, so a decrypted grant hashes
/// and reads exactly as it was issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpirationDate {
    text: String,
    instant: DateTime<Utc>,
}

impl ExpirationDate {
    /// Parses an RFC 3339 timestamp, keeping its original text.
    pub fn parse(text: impl Into<String>) -> LicenseResult<Self> {
        let text = text.into();
        let instant = text
            .parse::<DateTime<Utc>>()
            .map_err(|e| LicenseError::MalformedGrant(format!("invalid expirationDate {text:?}: {e}")))?;
        Ok(Self { text, instant })
    }

    /// The timestamp as issued.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The parsed instant.
    #[must_use]
    pub fn instant(&self) -> DateTime<Utc> {
        self.instant
    }
}

impl From<DateTime<Utc>> for ExpirationDate {
    fn from(instant: DateTime<Utc>) -> Self {
        Self {
            text: instant.to_rfc3339_opts(SecondsFormat::Millis, true),
            instant,
        }
    }
}

impl Serialize for ExpirationDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

impl<'de> Deserialize<'de> for ExpirationDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(text).map_err(serde::de::Error::custom)
    }
}

/// The decrypted license.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecryptedGrant {
    /// Issuer-side record id; not part of the fingerprint.
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<Value>,
    /// Expiration timestamp.
    pub expiration_date: ExpirationDate,
    /// Maximum number of activated users.
    pub max_users: u64,
    /// Licensed services, in grant order.
    #[serde(default)]
    pub features: Vec<Feature>,
    /// License/tenant identifier.
    pub tpld: String,
    /// Remaining payload fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DecryptedGrant {
    /// Parses a JSON payload.
    pub fn from_json(bytes: &[u8]) -> LicenseResult<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| LicenseError::MalformedGrant(format!("invalid license JSON: {e}")))
    }

    /// Returns true if `service_id` is one of the licensed features.
    #[must_use]
    pub fn licenses_service(&self, service_id: &str) -> bool {
        self.features.iter().any(|f| f.id == service_id)
    }

    /// Returns how many activated users exceed the limit (0 when within it).
    #[must_use]
    pub fn exceeded_users(&self, activated_users: u64) -> u64 {
        activated_users.saturating_sub(self.max_users)
    }

    /// Reports the license date as exceeded when the expiration lies after
    /// `now`. A grant whose expiration is in the past is *not* reported.
    #[must_use]
    pub fn is_date_exceeded(&self, now: DateTime<Utc>) -> bool {
        self.expiration_date.instant() > now
    }

    /// Returns the canonical JSON the fingerprint is computed over: the whole
    /// payload as issued minus the record id, with object keys sorted.
    pub fn checksum_material(&self) -> LicenseResult<String> {
        let mut value = serde_json::to_value(self)?;
        if let Value::Object(map) = &mut value {
            map.remove(RECORD_ID_FIELD);
        }
        Ok(serde_json::to_string(&sort_keys(value))?)
    }
}

/// Rebuilds every object with its keys in ascending order.
fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(entries.into_iter().map(|(k, v)| (k, sort_keys(v))).collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}
