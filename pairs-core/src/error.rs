//! Error types for the pairs core library.

use thiserror::Error;

/// Top-level error type for all pairs operations.
///
/// None of these conditions is fatal to a running game: the persistence
/// service logs them and degrades to in-memory behaviour.
#[derive(Error, Debug)]
pub enum PairsError {
    /// Serialization or deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// SQLite persistence error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The key-value store refused a read or write.
    #[error("Storage unavailable for {key}: {reason}")]
    StorageUnavailable {
        /// Physical key that was being accessed.
        key: String,
        /// Backend-supplied reason.
        reason: String,
    },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for PairsError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, PairsError>;
