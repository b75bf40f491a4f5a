//! # Core Types for the Ballot Encryption Core
//!
//! Value types shared by the crypto modules and the ledger collaborator
//! contracts.
//!
//! ## Type Categories
//!
//! ### Content hashes
//! - [`ContentHash`]: 32-byte SHA-256 digest with `0x`-hex text form
//! - [`BallotHash`]: proves a ciphertext was recorded
//! - [`TokenHash`]: proves a token was consumed
//!
//! The two audit hashes share a hash function but are distinct types so
//! that one can never be passed where the other is expected.
//!
//! ### Election records
//! - [`ElectionConfig`]: election metadata and candidate list
//! - [`TallyRecord`]: aggregated per-candidate results
//!
//! ## Usage Examples
//!
//! ```rust
//! use securevote::types::ContentHash;
//!
//! let hash = ContentHash::parse(
//!     "0x1234567890ABCDEF1234567890abcdef1234567890abcdef1234567890abcdef",
//! ).unwrap();
//!
//! // Canonical output is lowercase
//! assert_eq!(
//!     hash.to_hex(),
//!     "0x1234567890abcdef1234567890abcdef1234567890abcdef1234567890abcdef"
//! );
//! ```

use crate::crypto::HexCodec;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use uuid::Uuid;

/// Length in bytes of every content hash
pub const HASH_LEN: usize = 32;

/// A SHA-256 digest of a byte sequence
///
/// Text form is `0x` followed by 64 lowercase hex characters. Parsing
/// accepts mixed case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentHash([u8; HASH_LEN]);

impl ContentHash {
    /// Wrap raw digest bytes
    pub fn from_bytes(bytes: [u8; HASH_LEN]) -> Self {
        Self(bytes)
    }

    /// Parse `0x`-prefixed hex text
    pub fn parse(text: &str) -> Result<Self> {
        if !HexCodec::is_prefixed_hex(text, HASH_LEN * 2) {
            return Err(Error::invalid_format("hash"));
        }
        HexCodec::decode_array(text).map(Self)
    }

    /// Raw digest bytes
    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }

    /// Canonical `0x`-hex text
    pub fn to_hex(&self) -> String {
        HexCodec::encode(&self.0)
    }

    /// Short prefix for log lines
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl TryFrom<String> for ContentHash {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<ContentHash> for String {
    fn from(hash: ContentHash) -> Self {
        hash.to_hex()
    }
}

/// Hash of a ballot's raw ciphertext bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BallotHash(pub ContentHash);

/// Hash of a voting token's raw bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenHash(pub ContentHash);

impl BallotHash {
    /// Parse `0x`-prefixed hex text
    pub fn parse(text: &str) -> Result<Self> {
        ContentHash::parse(text).map(Self)
    }

    /// Underlying digest
    pub fn content(&self) -> &ContentHash {
        &self.0
    }
}

impl TokenHash {
    /// Parse `0x`-prefixed hex text
    pub fn parse(text: &str) -> Result<Self> {
        ContentHash::parse(text).map(Self)
    }

    /// Underlying digest
    pub fn content(&self) -> &ContentHash {
        &self.0
    }
}

impl fmt::Display for BallotHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Display for TokenHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Election metadata configured at setup time
///
/// # Examples
///
/// ```rust
/// use securevote::types::ElectionConfig;
/// use chrono::{Duration, Utc};
/// use uuid::Uuid;
///
/// let config = ElectionConfig {
///     id: Uuid::new_v4(),
///     title: "Board Election".to_string(),
///     description: String::new(),
///     start_date: Utc::now(),
///     end_date: Utc::now() + Duration::days(1),
///     candidates: vec!["Candidate A".to_string(), "".to_string()],
/// };
///
/// assert!(config.validate().is_ok());
/// assert_eq!(config.active_candidates(), vec!["Candidate A"]);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ElectionConfig {
    /// Unique election identifier
    pub id: Uuid,

    /// Human-readable election title
    pub title: String,

    /// Free-form description, may be empty
    pub description: String,

    /// When voting opens
    pub start_date: DateTime<Utc>,

    /// When voting closes
    pub end_date: DateTime<Utc>,

    /// Candidate names; blank entries are placeholders and ignored
    pub candidates: Vec<String>,
}

impl ElectionConfig {
    /// Candidate names with blank placeholders removed
    pub fn active_candidates(&self) -> Vec<&str> {
        self.candidates
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .collect()
    }

    /// Check the configuration is usable for an election
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::validation("title"));
        }

        let candidates = self.active_candidates();
        if candidates.is_empty() {
            return Err(Error::validation("candidates"));
        }

        let mut seen = HashSet::new();
        if !candidates.iter().all(|c| seen.insert(*c)) {
            return Err(Error::validation("candidates: duplicate name"));
        }

        if self.end_date <= self.start_date {
            return Err(Error::validation("end_date"));
        }

        Ok(())
    }

    /// Check whether `at` falls inside the voting window
    pub fn is_open_at(&self, at: DateTime<Utc>) -> bool {
        at >= self.start_date && at <= self.end_date
    }
}

/// Result line for a single candidate
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CandidateTally {
    pub name: String,
    pub votes: u64,
    /// Share of all votes, rounded to two decimals
    pub percentage: f64,
}

/// Aggregated election results, hashed for publication
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TallyRecord {
    pub election_id: Uuid,
    pub total_votes: u64,
    pub candidates: Vec<CandidateTally>,
    pub timestamp: DateTime<Utc>,
}

impl TallyRecord {
    /// Build a tally from `(candidate, votes)` pairs
    pub fn from_counts<I, S>(election_id: Uuid, counts: I, timestamp: DateTime<Utc>) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        let counts: Vec<(String, u64)> = counts
            .into_iter()
            .map(|(name, votes)| (name.into(), votes))
            .collect();
        let total_votes: u64 = counts.iter().map(|(_, votes)| votes).sum();

        let candidates = counts
            .into_iter()
            .map(|(name, votes)| CandidateTally {
                name,
                votes,
                percentage: percentage_of(votes, total_votes),
            })
            .collect();

        Self {
            election_id,
            total_votes,
            candidates,
            timestamp,
        }
    }
}

fn percentage_of(votes: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    ((votes as f64 / total as f64) * 10_000.0).round() / 100.0
}
