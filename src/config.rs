//! Configuration management for the ballot encryption core
//!
//! Loads tuning parameters from environment variables with validation.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Default upper bound on a single token batch
pub const DEFAULT_MAX_BATCH: usize = 10_000;

/// Default number of tokens generated between cooperative yields
pub const DEFAULT_CHUNK_SIZE: usize = 256;

/// Default minimum distinct-byte ratio for the entropy heuristic
pub const DEFAULT_MIN_ENTROPY_RATIO: f64 = 0.7;

/// Token generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Maximum tokens accepted by a single batch request
    pub max_batch: usize,

    /// Tokens generated between yields in chunked generation
    pub chunk_size: usize,

    /// Worker count for parallel generation
    pub workers: usize,

    /// Minimum `distinct_bytes / 32` ratio accepted by `assess_entropy`
    pub min_entropy_ratio: f64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            max_batch: DEFAULT_MAX_BATCH,
            chunk_size: DEFAULT_CHUNK_SIZE,
            workers: default_workers(),
            min_entropy_ratio: DEFAULT_MIN_ENTROPY_RATIO,
        }
    }
}

impl TokenConfig {
    /// Load token configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let max_batch = std::env::var("TOKEN_MAX_BATCH")
            .unwrap_or_else(|_| DEFAULT_MAX_BATCH.to_string())
            .parse()
            .map_err(|_| Error::config("Invalid TOKEN_MAX_BATCH"))?;

        let chunk_size = std::env::var("TOKEN_CHUNK_SIZE")
            .unwrap_or_else(|_| DEFAULT_CHUNK_SIZE.to_string())
            .parse()
            .map_err(|_| Error::config("Invalid TOKEN_CHUNK_SIZE"))?;

        let workers = match std::env::var("TOKEN_WORKERS") {
            Ok(value) => value
                .parse()
                .map_err(|_| Error::config("Invalid TOKEN_WORKERS"))?,
            Err(_) => default_workers(),
        };

        let min_entropy_ratio = std::env::var("TOKEN_MIN_ENTROPY_RATIO")
            .unwrap_or_else(|_| DEFAULT_MIN_ENTROPY_RATIO.to_string())
            .parse()
            .map_err(|_| Error::config("Invalid TOKEN_MIN_ENTROPY_RATIO"))?;

        let config = Self {
            max_batch,
            chunk_size,
            workers,
            min_entropy_ratio,
        };
        config.validate()?;
        Ok(config)
    }

    /// Configuration for testing with small batches
    pub fn for_testing() -> Self {
        Self {
            max_batch: DEFAULT_MAX_BATCH,
            chunk_size: 64,
            workers: 2,
            min_entropy_ratio: DEFAULT_MIN_ENTROPY_RATIO,
        }
    }

    /// Reject values that would make generation meaningless
    pub fn validate(&self) -> Result<()> {
        if self.max_batch == 0 {
            return Err(Error::config("TOKEN_MAX_BATCH must be at least 1"));
        }
        if self.chunk_size == 0 {
            return Err(Error::config("TOKEN_CHUNK_SIZE must be at least 1"));
        }
        if self.workers == 0 {
            return Err(Error::config("TOKEN_WORKERS must be at least 1"));
        }
        if !(self.min_entropy_ratio > 0.0 && self.min_entropy_ratio <= 1.0) {
            return Err(Error::config(
                "TOKEN_MIN_ENTROPY_RATIO must be in the range (0, 1]",
            ));
        }
        Ok(())
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub tokens: TokenConfig,
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "json".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Load logging configuration from environment
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        let level = std::env::var("LOG_LEVEL").unwrap_or(defaults.level);
        let format = std::env::var("LOG_FORMAT").unwrap_or(defaults.format);

        match format.as_str() {
            "json" | "pretty" => Ok(Self { level, format }),
            other => Err(Error::config(format!(
                "LOG_FORMAT must be 'json' or 'pretty', got '{other}'"
            ))),
        }
    }
}

impl Config {
    /// Load configuration from environment
    pub fn from_env() -> Result<Self> {
        let tokens = TokenConfig::from_env()?;
        let logging = LoggingConfig::from_env()?;

        Ok(Self { tokens, logging })
    }

    /// Create configuration for testing
    pub fn for_testing() -> Self {
        Self {
            tokens: TokenConfig::for_testing(),
            logging: LoggingConfig {
                level: "debug".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}
