//! Shared test helpers for crypto tests.

#![allow(dead_code)]

use seclock_crypto::{generate_keypair, LicensePrivateKey, LicensePublicKey, PemKeyPair};
use std::sync::OnceLock;

/// Modulus size for tests; large enough for OAEP-SHA512 with small payloads.
pub const TEST_KEY_BITS: usize = 2048;

/// Returns a key pair generated once per test binary.
pub fn test_keypair() -> &'static PemKeyPair {
    static KEYS: OnceLock<PemKeyPair> = OnceLock::new();
    KEYS.get_or_init(|| generate_keypair(TEST_KEY_BITS).unwrap())
}

/// Returns a second, unrelated key pair.
pub fn other_keypair() -> &'static PemKeyPair {
    static KEYS: OnceLock<PemKeyPair> = OnceLock::new();
    KEYS.get_or_init(|| generate_keypair(TEST_KEY_BITS).unwrap())
}

pub fn private_key(pair: &PemKeyPair) -> LicensePrivateKey {
    LicensePrivateKey::from_base64_pem(pair.private_key()).unwrap()
}

pub fn public_key(pair: &PemKeyPair) -> LicensePublicKey {
    LicensePublicKey::from_base64_pem(pair.public_key()).unwrap()
}
