//! SHA-256 content digests

use crate::types::{ContentHash, HASH_LEN};
use sha2::{Digest, Sha256};

/// Computes fixed-length content hashes
pub struct ContentDigest;

impl ContentDigest {
    /// SHA-256 over arbitrary bytes
    pub fn sha256(data: &[u8]) -> [u8; HASH_LEN] {
        Sha256::digest(data).into()
    }

    /// SHA-256 over arbitrary bytes, as a [`ContentHash`]
    pub fn sha256_hash(data: &[u8]) -> ContentHash {
        ContentHash::from_bytes(Self::sha256(data))
    }

    /// SHA-256 over arbitrary bytes, as `0x`-hex text
    pub fn sha256_hex(data: &[u8]) -> String {
        Self::sha256_hash(data).to_hex()
    }
}
