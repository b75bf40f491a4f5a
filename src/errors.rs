//! Error handling for the ballot encryption core

/// Result type alias for the ballot encryption core
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the ballot encryption core
///
/// Encryption and decryption failures intentionally carry no cause: the
/// caller learns only that the operation failed.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The operating system entropy source failed
    #[error("Entropy source unavailable")]
    EntropyUnavailable,

    /// Input text is not valid hex
    #[error("Malformed hex: {reason}")]
    MalformedHex { reason: String },

    /// Input does not match the required text format
    #[error("Invalid format: {field}")]
    InvalidFormat { field: String },

    /// Ballot encryption failed
    #[error("Failed to encrypt ballot data")]
    EncryptionFailure,

    /// Ballot decryption or authentication failed
    #[error("Failed to decrypt ballot data")]
    DecryptionFailure,

    /// Caller supplied an out-of-range argument
    #[error("Validation failed: {field}")]
    Validation { field: String },

    /// The token has already been consumed
    #[error("Token has already been used")]
    TokenAlreadyUsed,

    /// Ledger collaborator errors
    #[error("Ledger error: {message}")]
    Ledger { message: String },

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl Error {
    /// Create a new malformed hex error
    pub fn malformed_hex(reason: impl Into<String>) -> Self {
        Self::MalformedHex {
            reason: reason.into(),
        }
    }

    /// Create a new invalid format error
    pub fn invalid_format(field: impl Into<String>) -> Self {
        Self::InvalidFormat {
            field: field.into(),
        }
    }

    /// Create a new validation error
    pub fn validation(field: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
        }
    }

    /// Create a new ledger error
    pub fn ledger(message: impl Into<String>) -> Self {
        Self::Ledger {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// Convenience macros for creating specific error types
#[macro_export]
macro_rules! hex_error {
    ($msg:expr) => {
        $crate::Error::malformed_hex($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::Error::malformed_hex(format!($fmt, $($arg)*))
    };
}

#[macro_export]
macro_rules! ledger_error {
    ($msg:expr) => {
        $crate::Error::ledger($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::Error::ledger(format!($fmt, $($arg)*))
    };
}
