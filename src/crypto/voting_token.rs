//! One-time voting token generation and validation
//!
//! Tokens are 256-bit values drawn straight from the [`RandomSource`] and
//! handed out at election-setup time. This module provides:
//! 1. Single and bulk token generation with a configurable batch ceiling
//! 2. Chunked async generation that yields between chunks for progress
//! 3. Parallel generation across blocking workers
//! 4. Format validation for externally supplied token text
//! 5. A coarse entropy diagnostic
//!
//! Consumption state ("used") is tracked by the ledger collaborator, not
//! here.

use crate::config::TokenConfig;
use crate::crypto::hex_codec::{HEX_PREFIX, HexCodec};
use crate::crypto::random::{OsRandom, RandomSource, fill_array};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use zeroize::Zeroize;

/// Length in bytes of a voting token
pub const TOKEN_LEN: usize = 32;

/// A one-time voting token
///
/// Canonical text is `0x` followed by 64 lowercase hex characters. The raw
/// bytes are wiped when the token is dropped, and `Debug` output only shows
/// a short prefix.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VotingToken([u8; TOKEN_LEN]);

impl VotingToken {
    /// Draw a fresh token from `source`
    pub fn generate(source: &dyn RandomSource) -> Result<Self> {
        fill_array(source).map(Self)
    }

    /// Wrap raw token bytes
    pub fn from_bytes(bytes: [u8; TOKEN_LEN]) -> Self {
        Self(bytes)
    }

    /// Parse token text, accepting mixed case
    pub fn parse(text: &str) -> Result<Self> {
        if !TokenService::is_valid_format(text) {
            return Err(Error::invalid_format("token"));
        }
        HexCodec::decode_array(text).map(Self)
    }

    /// Raw token bytes
    pub fn as_bytes(&self) -> &[u8; TOKEN_LEN] {
        &self.0
    }

    /// Canonical lowercase `0x`-hex text
    pub fn to_hex(&self) -> String {
        HexCodec::encode(&self.0)
    }

    /// First four bytes as hex, for log lines
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Ratio of distinct byte values to token length
    pub fn distinct_byte_ratio(&self) -> f64 {
        let distinct: HashSet<u8> = self.0.iter().copied().collect();
        distinct.len() as f64 / TOKEN_LEN as f64
    }
}

impl Drop for VotingToken {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl fmt::Debug for VotingToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VotingToken({HEX_PREFIX}{}…)", self.short())
    }
}

impl fmt::Display for VotingToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl TryFrom<String> for VotingToken {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<VotingToken> for String {
    fn from(token: VotingToken) -> Self {
        token.to_hex()
    }
}

/// A token row produced for distribution to voters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssuedToken {
    /// Batch-local identifier, `token-1` onwards
    pub id: String,
    pub token: VotingToken,
    pub used: bool,
}

/// Generates and validates one-time voting tokens
#[derive(Clone)]
pub struct TokenService {
    config: TokenConfig,
    source: Arc<dyn RandomSource>,
}

impl TokenService {
    /// Create a token service over an explicit random source
    pub fn new(config: TokenConfig, source: Arc<dyn RandomSource>) -> Self {
        Self { config, source }
    }

    /// Create token service with default configuration and the OS CSPRNG
    pub fn with_defaults() -> Self {
        Self::new(TokenConfig::default(), Arc::new(OsRandom))
    }

    /// Create token service for testing
    pub fn for_testing() -> Self {
        Self::new(TokenConfig::for_testing(), Arc::new(OsRandom))
    }

    /// Active configuration
    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    /// Generate a single token
    pub fn generate_token(&self) -> Result<VotingToken> {
        VotingToken::generate(self.source.as_ref())
    }

    /// Generate `count` independent tokens
    pub fn generate_tokens(&self, count: usize) -> Result<Vec<VotingToken>> {
        self.check_batch(count)?;
        let start = Instant::now();

        let tokens = (0..count)
            .map(|_| self.generate_token())
            .collect::<Result<Vec<_>>>()?;

        tracing::info!(
            "🎫 Generated {} tokens in {:?}",
            tokens.len(),
            start.elapsed()
        );
        Ok(tokens)
    }

    /// Generate `count` tokens in chunks, yielding to the runtime between
    /// chunks and reporting `(generated, total)` after each one
    ///
    /// Dropping the returned future discards any partial batch.
    pub async fn generate_tokens_chunked<F>(
        &self,
        count: usize,
        mut on_progress: F,
    ) -> Result<Vec<VotingToken>>
    where
        F: FnMut(usize, usize),
    {
        self.check_batch(count)?;
        if self.config.chunk_size == 0 {
            return Err(Error::validation("chunk_size"));
        }
        let start = Instant::now();
        let mut tokens = Vec::with_capacity(count);

        while tokens.len() < count {
            let chunk = self.config.chunk_size.min(count - tokens.len());
            for _ in 0..chunk {
                tokens.push(self.generate_token()?);
            }

            on_progress(tokens.len(), count);
            tracing::debug!("Token batch progress: {}/{}", tokens.len(), count);
            tokio::task::yield_now().await;
        }

        tracing::info!(
            "🎫 Generated {} tokens in chunks of {} in {:?}",
            tokens.len(),
            self.config.chunk_size,
            start.elapsed()
        );
        Ok(tokens)
    }

    /// Generate `count` tokens across the configured number of blocking
    /// workers
    ///
    /// Draws are independent, so the output order carries no meaning.
    pub async fn generate_tokens_parallel(&self, count: usize) -> Result<Vec<VotingToken>> {
        self.check_batch(count)?;
        let start = Instant::now();

        let workers = self.config.workers.min(count).max(1);
        let per_worker = count / workers;
        let remainder = count % workers;

        let mut handles = Vec::with_capacity(workers);
        for worker in 0..workers {
            let share = per_worker + usize::from(worker < remainder);
            let source = self.source.clone();

            handles.push(tokio::task::spawn_blocking(move || {
                (0..share)
                    .map(|_| VotingToken::generate(source.as_ref()))
                    .collect::<Result<Vec<_>>>()
            }));
        }

        let mut tokens = Vec::with_capacity(count);
        for handle in handles {
            let batch = handle
                .await
                .map_err(|e| Error::internal(format!("Token worker failed: {e}")))??;
            tokens.extend(batch);
        }

        tracing::info!(
            "🎫 Generated {} tokens on {} workers in {:?}",
            tokens.len(),
            workers,
            start.elapsed()
        );
        Ok(tokens)
    }

    /// Generate a batch of distributable token rows
    pub fn issue_batch(&self, count: usize) -> Result<Vec<IssuedToken>> {
        let tokens = self.generate_tokens(count)?;

        Ok(tokens
            .into_iter()
            .enumerate()
            .map(|(i, token)| IssuedToken {
                id: format!("token-{}", i + 1),
                token,
                used: false,
            })
            .collect())
    }

    /// True iff `text` is `0x` followed by exactly 64 hex characters
    /// (case-insensitive)
    pub fn is_valid_format(text: &str) -> bool {
        HexCodec::is_prefixed_hex(text, TOKEN_LEN * 2)
    }

    /// Coarse diversity check on a token's bytes
    ///
    /// Returns true iff `distinct_bytes / 32` reaches the configured ratio
    /// (0.7 by default). Malformed text returns false.
    ///
    /// This is a sanity diagnostic, not an entropy estimator. Uniformly
    /// random 32-byte tokens average about 30 distinct values, so nearly
    /// all pass, yet a genuinely random token can occasionally fail and a
    /// crafted token with only moderate diversity can pass. Never treat a
    /// passing result as proof of cryptographic strength.
    pub fn assess_entropy(&self, text: &str) -> bool {
        match VotingToken::parse(text) {
            Ok(token) => token.distinct_byte_ratio() >= self.config.min_entropy_ratio,
            Err(_) => false,
        }
    }

    fn check_batch(&self, count: usize) -> Result<()> {
        if count > self.config.max_batch {
            return Err(Error::validation(format!(
                "count: {} exceeds maximum batch of {}",
                count, self.config.max_batch
            )));
        }
        Ok(())
    }
}

impl Default for TokenService {
    fn default() -> Self {
        Self::with_defaults()
    }
}
