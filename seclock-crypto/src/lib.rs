//! Cryptographic primitives for license handling.
//!
//! - RSA key pairs (8192-bit by default), exchanged as base64-encoded PEM
//! - RSA-OAEP with SHA-512 for license payloads
//! - SHA3-256 content fingerprints
//!
//! Nothing here knows what a license is; the license crate builds on these
//! functions.

mod cipher;
mod digest;
mod error;
mod key;

pub use cipher::{decrypt, decrypt_base64, encrypt, encrypt_to_base64, OAEP_SHA512_OVERHEAD};
pub use digest::sha3_hex;
pub use error::{CryptoError, CryptoResult};
pub use key::{generate_keypair, LicensePrivateKey, LicensePublicKey, PemKeyPair, LICENSE_KEY_BITS};
