//! Error types for the CLI

use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// CLI errors
#[derive(Debug, Error)]
pub enum CliError {
    /// Filesystem or network I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be read or written
    #[error("Configuration error: {0}")]
    Config(String),

    /// Durable store could not be loaded
    #[error(transparent)]
    Store(#[from] crate::store::StoreError),

    /// Final flush failed on shutdown
    #[error(transparent)]
    Persist(#[from] crate::persist::PersistError),
}
