//! RSA key generation and PEM handling.
//!
//! Keys are exchanged as base64-encoded PEM text: the private key in PKCS#1
//! (`RSA PRIVATE KEY`), the public key as SubjectPublicKeyInfo
//! (`PUBLIC KEY`). Decoding also accepts PKCS#8 private keys and PKCS#1
//! public keys.

use crate::error::{CryptoError, CryptoResult};
use base64::{engine::general_purpose::STANDARD, Engine};
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey, EncodeRsaPrivateKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePublicKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Modulus size for license key pairs.
///
/// License material is long-lived and decrypted rarely (results are cached),
/// so the large modulus is worth the slow generation and decryption.
pub const LICENSE_KEY_BITS: usize = 8192;

/// A key pair encoded for storage: base64 of the PEM text of each key.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct PemKeyPair {
    public_key: String,
    private_key: String,
}

impl PemKeyPair {
    /// Returns the base64-encoded public key PEM.
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    /// Returns the base64-encoded private key PEM.
    pub fn private_key(&self) -> &str {
        &self.private_key
    }
}

impl std::fmt::Debug for PemKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PemKeyPair")
            .field("public_key", &self.public_key)
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

/// Generates a new RSA key pair with the given modulus size.
///
/// This is CPU-bound and slow for large moduli; async callers should run it
/// on a blocking thread.
pub fn generate_keypair(bits: usize) -> CryptoResult<PemKeyPair> {
    let private = RsaPrivateKey::new(&mut rand::rngs::OsRng, bits)
        .map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;
    let public = RsaPublicKey::from(&private);

    let private_pem = private
        .to_pkcs1_pem(LineEnding::LF)
        .map_err(|e| CryptoError::Encoding(e.to_string()))?;
    let public_pem = public
        .to_public_key_pem(LineEnding::LF)
        .map_err(|e| CryptoError::Encoding(e.to_string()))?;

    Ok(PemKeyPair {
        public_key: STANDARD.encode(public_pem.as_bytes()),
        private_key: STANDARD.encode(private_pem.as_bytes()),
    })
}

/// A parsed private key used to open license payloads.
#[derive(Clone)]
pub struct LicensePrivateKey {
    inner: RsaPrivateKey,
}

impl LicensePrivateKey {
    /// Parses a base64-encoded PEM private key.
    pub fn from_base64_pem(encoded: &str) -> CryptoResult<Self> {
        let pem = decode_pem_text(encoded)?;
        let inner = RsaPrivateKey::from_pkcs1_pem(&pem)
            .or_else(|_| RsaPrivateKey::from_pkcs8_pem(&pem))
            .map_err(|e| CryptoError::InvalidKey(format!("unreadable private key: {e}")))?;
        Ok(Self { inner })
    }

    /// Returns the matching public key.
    pub fn public_key(&self) -> LicensePublicKey {
        LicensePublicKey {
            inner: RsaPublicKey::from(&self.inner),
        }
    }

    pub(crate) fn as_rsa(&self) -> &RsaPrivateKey {
        &self.inner
    }
}

impl std::fmt::Debug for LicensePrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LicensePrivateKey")
            .field("inner", &"[REDACTED]")
            .finish()
    }
}

/// A parsed public key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LicensePublicKey {
    inner: RsaPublicKey,
}

impl LicensePublicKey {
    /// Parses a base64-encoded PEM public key (SPKI or PKCS#1).
    pub fn from_base64_pem(encoded: &str) -> CryptoResult<Self> {
        let pem = decode_pem_text(encoded)?;
        let inner = RsaPublicKey::from_public_key_pem(&pem)
            .or_else(|_| RsaPublicKey::from_pkcs1_pem(&pem))
            .map_err(|e| CryptoError::InvalidKey(format!("unreadable public key: {e}")))?;
        Ok(Self { inner })
    }

    pub(crate) fn as_rsa(&self) -> &RsaPublicKey {
        &self.inner
    }
}

fn decode_pem_text(encoded: &str) -> CryptoResult<String> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| CryptoError::Base64(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| CryptoError::InvalidKey(format!("PEM is not UTF-8: {e}")))
}
