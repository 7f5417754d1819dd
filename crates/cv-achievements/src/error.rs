//! Error types for cv-achievements.
//!
//! All errors are strongly typed and propagated without panicking.
//! Key redemption never surfaces these to callers directly: the ledger
//! folds them into a failed `ProcessResult`.

/// Ledger error types covering storage, configuration and glue operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid stored value under '{key}': {reason}")]
    CorruptValue { key: String, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, LedgerError>;
