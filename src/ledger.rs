//! Ledger collaborator contracts and the ballot submission pipeline
//!
//! The ledger that anchors `(token hash, ballot hash)` pairs and the
//! registry of consumed tokens live outside this crate. This module fixes
//! their request/response contracts as traits:
//!
//! - [`LedgerAnchor`]: records a pair, returns an opaque transaction
//!   reference, and answers audit-trail lookups
//! - [`TokenRegistry`]: reports whether a token hash has been consumed
//!
//! [`MemoryLedger`] implements both in-process for tests and local runs.
//! [`BallotSubmission`] composes the pipeline: validate token → encrypt
//! ballot → derive both hashes → refuse consumed tokens → anchor.

use crate::crypto::{BallotCipher, ContentDigest, EncryptionResult, HashRegistry, VotingToken};
use crate::types::{BallotHash, TokenHash};
use crate::{Error, Result, ledger_error};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::future::Future;
use std::sync::{Arc, RwLock};

/// A pair of audit hashes to be recorded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorRequest {
    pub token_hash: TokenHash,
    pub ballot_hash: BallotHash,
}

/// Opaque reference to a ledger transaction
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionRef(String);

impl TransactionRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A recorded anchor as reported by the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorRecord {
    pub tx_ref: TransactionRef,
    pub token_hash: TokenHash,
    pub ballot_hash: BallotHash,
    pub anchored_at: DateTime<Utc>,
}

/// Ledger service that anchors audit hashes
pub trait LedgerAnchor: Send + Sync {
    /// Record a `(token hash, ballot hash)` pair
    fn anchor(
        &self,
        request: AnchorRequest,
    ) -> impl Future<Output = Result<TransactionRef>> + Send;

    /// Look up the anchor carrying `ballot_hash`
    fn find_ballot(
        &self,
        ballot_hash: &BallotHash,
    ) -> impl Future<Output = Result<Option<AnchorRecord>>> + Send;

    /// Look up an anchor by transaction reference
    fn find_transaction(
        &self,
        tx_ref: &TransactionRef,
    ) -> impl Future<Output = Result<Option<AnchorRecord>>> + Send;
}

/// Registry of consumed tokens
pub trait TokenRegistry: Send + Sync {
    /// True iff `token_hash` has already been consumed
    fn is_used(&self, token_hash: &TokenHash) -> impl Future<Output = Result<bool>> + Send;
}

#[derive(Default)]
struct LedgerState {
    records: HashMap<TransactionRef, AnchorRecord>,
    by_ballot: HashMap<BallotHash, TransactionRef>,
    used_tokens: HashSet<TokenHash>,
    sequence: u64,
}

/// In-process ledger implementing both collaborator contracts
///
/// Anchoring marks the token hash as used; a second anchor for the same
/// token fails with [`Error::TokenAlreadyUsed`].
#[derive(Default)]
pub struct MemoryLedger {
    state: RwLock<LedgerState>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of anchored pairs
    pub fn len(&self) -> Result<usize> {
        let state = self
            .state
            .read()
            .map_err(|_| ledger_error!("Ledger read error"))?;
        Ok(state.records.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

impl LedgerAnchor for MemoryLedger {
    async fn anchor(&self, request: AnchorRequest) -> Result<TransactionRef> {
        let mut state = self
            .state
            .write()
            .map_err(|_| ledger_error!("Ledger write error"))?;

        if state.used_tokens.contains(&request.token_hash) {
            tracing::warn!(
                "⚠️  Rejected anchor for consumed token hash {}",
                request.token_hash.content().short()
            );
            return Err(Error::TokenAlreadyUsed);
        }
        if state.by_ballot.contains_key(&request.ballot_hash) {
            return Err(ledger_error!(
                "Ballot hash {} already anchored",
                request.ballot_hash
            ));
        }

        state.sequence += 1;
        let mut preimage = Vec::with_capacity(72);
        preimage.extend_from_slice(request.token_hash.content().as_bytes());
        preimage.extend_from_slice(request.ballot_hash.content().as_bytes());
        preimage.extend_from_slice(&state.sequence.to_be_bytes());
        let tx_ref = TransactionRef::new(ContentDigest::sha256_hex(&preimage));

        let record = AnchorRecord {
            tx_ref: tx_ref.clone(),
            token_hash: request.token_hash,
            ballot_hash: request.ballot_hash,
            anchored_at: Utc::now(),
        };

        state.used_tokens.insert(request.token_hash);
        state.by_ballot.insert(request.ballot_hash, tx_ref.clone());
        state.records.insert(tx_ref.clone(), record);

        tracing::info!(
            "⛓️  Anchored ballot {} with token {} as {}",
            request.ballot_hash.content().short(),
            request.token_hash.content().short(),
            tx_ref
        );
        Ok(tx_ref)
    }

    async fn find_ballot(&self, ballot_hash: &BallotHash) -> Result<Option<AnchorRecord>> {
        let state = self
            .state
            .read()
            .map_err(|_| ledger_error!("Ledger read error"))?;

        Ok(state
            .by_ballot
            .get(ballot_hash)
            .and_then(|tx_ref| state.records.get(tx_ref))
            .cloned())
    }

    async fn find_transaction(&self, tx_ref: &TransactionRef) -> Result<Option<AnchorRecord>> {
        let state = self
            .state
            .read()
            .map_err(|_| ledger_error!("Ledger read error"))?;

        Ok(state.records.get(tx_ref).cloned())
    }
}

impl TokenRegistry for MemoryLedger {
    async fn is_used(&self, token_hash: &TokenHash) -> Result<bool> {
        let state = self
            .state
            .read()
            .map_err(|_| ledger_error!("Ledger read error"))?;

        Ok(state.used_tokens.contains(token_hash))
    }
}

/// An encrypted ballot with its audit hashes, ready to anchor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparedBallot {
    pub encryption: EncryptionResult,
    pub ballot_hash: BallotHash,
    pub token_hash: TokenHash,
}

/// Proof of a submitted ballot handed back to the voter
///
/// Carries the encryption key and nonce; custody is the caller's.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotReceipt {
    pub tx_ref: TransactionRef,
    pub ballot_hash: BallotHash,
    pub token_hash: TokenHash,
    pub encryption: EncryptionResult,
}

/// Composes token validation, ballot encryption, hashing and anchoring
pub struct BallotSubmission<L> {
    cipher: BallotCipher,
    ledger: Arc<L>,
}

impl<L> BallotSubmission<L>
where
    L: LedgerAnchor + TokenRegistry,
{
    pub fn new(cipher: BallotCipher, ledger: Arc<L>) -> Self {
        Self { cipher, ledger }
    }

    /// Validate the token, encrypt the ballot and derive both hashes
    pub fn prepare(&self, token_text: &str, ballot: &str) -> Result<PreparedBallot> {
        let token = VotingToken::parse(token_text.trim())?;
        if ballot.trim().is_empty() {
            return Err(Error::validation("ballot"));
        }

        let encryption = self.cipher.encrypt(ballot)?;
        let ballot_hash = HashRegistry::ballot_hash(&encryption.ciphertext)?;
        let token_hash = HashRegistry::token_hash(&token);

        Ok(PreparedBallot {
            encryption,
            ballot_hash,
            token_hash,
        })
    }

    /// Refuse consumed tokens, then anchor the prepared ballot
    pub async fn submit(&self, prepared: PreparedBallot) -> Result<BallotReceipt> {
        if self.ledger.is_used(&prepared.token_hash).await? {
            tracing::warn!(
                "⚠️  Submission refused: token {} already used",
                prepared.token_hash.content().short()
            );
            return Err(Error::TokenAlreadyUsed);
        }

        let tx_ref = self
            .ledger
            .anchor(AnchorRequest {
                token_hash: prepared.token_hash,
                ballot_hash: prepared.ballot_hash,
            })
            .await?;

        Ok(BallotReceipt {
            tx_ref,
            ballot_hash: prepared.ballot_hash,
            token_hash: prepared.token_hash,
            encryption: prepared.encryption,
        })
    }

    /// Prepare and submit in one step
    pub async fn cast(&self, token_text: &str, ballot: &str) -> Result<BallotReceipt> {
        let prepared = self.prepare(token_text, ballot)?;
        self.submit(prepared).await
    }

    /// Look up a ballot hash in the audit trail
    pub async fn verify_receipt(&self, ballot_hash: &BallotHash) -> Result<Option<AnchorRecord>> {
        self.ledger.find_ballot(ballot_hash).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::TokenService;

    fn submission() -> (BallotSubmission<MemoryLedger>, Arc<MemoryLedger>) {
        let ledger = Arc::new(MemoryLedger::new());
        (
            BallotSubmission::new(BallotCipher::with_os_random(), ledger.clone()),
            ledger,
        )
    }

    #[tokio::test]
    async fn test_cast_and_verify() {
        let (submission, ledger) = submission();
        let token = TokenService::for_testing().generate_token().unwrap();

        let receipt = submission.cast(&token.to_hex(), "Candidate A").await.unwrap();

        assert!(HashRegistry::is_valid_hash_format(receipt.tx_ref.as_str()));
        assert_eq!(receipt.token_hash, HashRegistry::token_hash(&token));
        assert_eq!(
            receipt.ballot_hash,
            HashRegistry::ballot_hash(&receipt.encryption.ciphertext).unwrap()
        );
        assert!(ledger.is_used(&receipt.token_hash).await.unwrap());
        assert_eq!(ledger.len().unwrap(), 1);

        let record = submission
            .verify_receipt(&receipt.ballot_hash)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.tx_ref, receipt.tx_ref);

        let by_tx = ledger.find_transaction(&receipt.tx_ref).await.unwrap();
        assert_eq!(by_tx, Some(record));
    }

    #[tokio::test]
    async fn test_token_used_once() {
        let (submission, _ledger) = submission();
        let token = TokenService::for_testing().generate_token().unwrap();

        submission.cast(&token.to_hex(), "Candidate A").await.unwrap();
        let second = submission.cast(&token.to_hex(), "Candidate B").await;

        assert!(matches!(second, Err(Error::TokenAlreadyUsed)));
    }

    #[tokio::test]
    async fn test_mixed_case_token_is_same_token() {
        let (submission, _ledger) = submission();
        let token = TokenService::for_testing().generate_token().unwrap();
        let upper = format!("0x{}", token.to_hex()[2..].to_uppercase());

        submission.cast(&upper, "Candidate A").await.unwrap();
        let second = submission.cast(&token.to_hex(), "Candidate A").await;

        assert!(matches!(second, Err(Error::TokenAlreadyUsed)));
    }

    #[test]
    fn test_prepare_rejects_bad_input() {
        let (submission, _ledger) = submission();

        assert!(matches!(
            submission.prepare("0x1234", "Candidate A"),
            Err(Error::InvalidFormat { .. })
        ));

        let token = format!("0x{}", "ab".repeat(32));
        assert!(matches!(
            submission.prepare(&token, "   "),
            Err(Error::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn test_anchor_rejects_duplicate_ballot_hash() {
        let ledger = MemoryLedger::new();
        let ballot_hash = HashRegistry::ballot_hash("0x00").unwrap();

        let first = AnchorRequest {
            token_hash: HashRegistry::token_hash(&VotingToken::from_bytes([1u8; 32])),
            ballot_hash,
        };
        let second = AnchorRequest {
            token_hash: HashRegistry::token_hash(&VotingToken::from_bytes([2u8; 32])),
            ballot_hash,
        };

        ledger.anchor(first).await.unwrap();
        assert!(matches!(
            ledger.anchor(second).await,
            Err(Error::Ledger { .. })
        ));
    }

    #[tokio::test]
    async fn test_unknown_ballot_not_found() {
        let (submission, ledger) = submission();
        let missing = HashRegistry::ballot_hash("0xdeadbeef").unwrap();

        assert!(submission.verify_receipt(&missing).await.unwrap().is_none());
        assert!(ledger.is_empty().unwrap());
    }
}
