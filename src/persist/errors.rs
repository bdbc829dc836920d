//! Error types for the persistence coordinator

use thiserror::Error;

/// Result type for persistence operations
pub type PersistResult<T> = Result<T, PersistError>;

/// Persistence errors
#[derive(Debug, Error)]
pub enum PersistError {
    /// State could not be serialized for flushing
    #[error("Failed to serialize state for flush: {0}")]
    Snapshot(String),

    /// Temporary file or rename write failed
    #[error("Flush write failed at {path}: {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Internal error (poisoned lock)
    #[error("Internal persistence error: {0}")]
    Internal(String),
}

impl PersistError {
    /// Convenience constructor for write failures
    pub fn write_failed(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::WriteFailed {
            path: path.display().to_string(),
            source,
        }
    }
}
