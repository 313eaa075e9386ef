//! Content fingerprints.

use sha3::{Digest, Sha3_256};

/// Returns the lowercase hex SHA3-256 digest of `data`.
pub fn sha3_hex(data: impl AsRef<[u8]>) -> String {
    let mut hasher = Sha3_256::new();
    hasher.update(data.as_ref());
    hex::encode(hasher.finalize())
}
