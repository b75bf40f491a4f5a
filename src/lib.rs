//! Ballot Encryption & Token Integrity Core
//!
//! One-time voting tokens, per-vote AES-256-GCM ballot encryption and the
//! SHA-256 content hashes that anchor both into an external audit ledger.

pub mod config;
pub mod crypto;
pub mod errors;
pub mod ledger;
pub mod types;

// Re-export commonly used types
pub use errors::{Error, Result};

use config::LoggingConfig;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize logging from `LOG_LEVEL` / `LOG_FORMAT`
pub fn init() -> Result<()> {
    init_with(&LoggingConfig::from_env()?)
}

/// Initialize logging from a [`LoggingConfig`]
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_with(logging: &LoggingConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("securevote={}", logging.level).into());

    let installed = if logging.format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .try_init()
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).try_init()
    };

    installed.map_err(|e| Error::config(format!("Logging already initialized: {e}")))?;

    tracing::info!("🗳️  Ballot core v{} initialized", VERSION);
    Ok(())
}
