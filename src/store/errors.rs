//! Error types for the durable domain store

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Durable store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Snapshot file could not be read
    #[error("Failed to read state file {path}: {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Snapshot file failed integrity or format checks
    #[error("State file corrupted: {0}")]
    Corrupted(String),

    /// State could not be serialized or deserialized
    #[error("State serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error (poisoned lock)
    #[error("Internal store error: {0}")]
    Internal(String),
}
