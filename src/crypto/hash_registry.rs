//! Audit hash derivation
//!
//! Ballot hashes, token hashes and tally hashes all use SHA-256 but are
//! derived from different inputs and returned as different types:
//!
//! - **Ballot hash**: SHA-256 of the hex-decoded raw ciphertext bytes. The
//!   hex text itself is never hashed, so upper- and lowercase renderings of
//!   the same ciphertext produce the same ballot hash.
//! - **Token hash**: SHA-256 of the token's 32 raw bytes.
//! - **Tally hash**: SHA-256 of the record's canonical JSON, with object
//!   keys sorted at every depth so field order never changes the hash.

use crate::Result;
use crate::crypto::digest::ContentDigest;
use crate::crypto::hex_codec::HexCodec;
use crate::crypto::voting_token::VotingToken;
use crate::types::{BallotHash, ContentHash, HASH_LEN, TokenHash};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use subtle::ConstantTimeEq;

/// Derives the hashes surfaced to the audit ledger
pub struct HashRegistry;

impl HashRegistry {
    /// Hash of a ballot's raw ciphertext bytes
    pub fn ballot_hash(ciphertext_hex: &str) -> Result<BallotHash> {
        let ciphertext = HexCodec::decode(ciphertext_hex)?;
        Ok(BallotHash(ContentDigest::sha256_hash(&ciphertext)))
    }

    /// Hash of a token's raw bytes
    pub fn token_hash(token: &VotingToken) -> TokenHash {
        TokenHash(ContentDigest::sha256_hash(token.as_bytes()))
    }

    /// Hash of a tally record's canonical JSON
    pub fn tally_hash<T: Serialize + ?Sized>(record: &T) -> Result<ContentHash> {
        let json = Self::canonical_json(record)?;
        Ok(ContentDigest::sha256_hash(json.as_bytes()))
    }

    /// Compact JSON with object keys sorted lexicographically at every depth
    pub fn canonical_json<T: Serialize + ?Sized>(record: &T) -> Result<String> {
        let value = serde_json::to_value(record)?;
        Ok(serde_json::to_string(&sort_keys(value))?)
    }

    /// Check a ciphertext against a recorded ballot hash in constant time
    pub fn verify_ballot_hash(ciphertext_hex: &str, expected: &BallotHash) -> Result<bool> {
        let actual = Self::ballot_hash(ciphertext_hex)?;
        Ok(hashes_equal(actual.content(), expected.content()))
    }

    /// Check a token against a recorded token hash in constant time
    pub fn verify_token_hash(token: &VotingToken, expected: &TokenHash) -> bool {
        hashes_equal(Self::token_hash(token).content(), expected.content())
    }

    /// True iff `text` is `0x` followed by exactly 64 hex characters
    pub fn is_valid_hash_format(text: &str) -> bool {
        HexCodec::is_prefixed_hex(text, HASH_LEN * 2)
    }
}

fn hashes_equal(a: &ContentHash, b: &ContentHash) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<String, Value> = map
                .into_iter()
                .map(|(key, value)| (key, sort_keys(value)))
                .collect();
            Value::Object(sorted.into_iter().collect::<Map<String, Value>>())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}
