//! RSA-OAEP payload encryption.
//!
//! OAEP uses SHA-512 both as the label digest and for MGF1.

use crate::error::{CryptoError, CryptoResult};
use crate::key::{LicensePrivateKey, LicensePublicKey};
use base64::{engine::general_purpose::STANDARD, Engine};
use rsa::Oaep;
use sha2::Sha512;

/// Bytes of OAEP overhead for a SHA-512 digest (2 * 64 + 2).
pub const OAEP_SHA512_OVERHEAD: usize = 130;

/// Encrypts `plaintext` for the holder of the matching private key.
pub fn encrypt(key: &LicensePublicKey, plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
    key.as_rsa()
        .encrypt(&mut rand::rngs::OsRng, Oaep::new::<Sha512>(), plaintext)
        .map_err(|e| CryptoError::Encryption(e.to_string()))
}

/// Decrypts an OAEP ciphertext.
pub fn decrypt(key: &LicensePrivateKey, ciphertext: &[u8]) -> CryptoResult<Vec<u8>> {
    key.as_rsa()
        .decrypt(Oaep::new::<Sha512>(), ciphertext)
        .map_err(|_| {
            CryptoError::Decryption("decryption failed (wrong key or tampered data)".to_string())
        })
}

/// Encrypts and returns the ciphertext as standard base64.
pub fn encrypt_to_base64(key: &LicensePublicKey, plaintext: &[u8]) -> CryptoResult<String> {
    let ciphertext = encrypt(key, plaintext)?;
    Ok(STANDARD.encode(ciphertext))
}

/// Decrypts a standard-base64 ciphertext.
pub fn decrypt_base64(key: &LicensePrivateKey, encoded: &str) -> CryptoResult<Vec<u8>> {
    let ciphertext = STANDARD
        .decode(encoded.trim())
        .map_err(|e| CryptoError::Base64(e.to_string()))?;
    decrypt(key, &ciphertext)
}
