//! Error types for the notification hub

use thiserror::Error;

/// Result type for hub operations
pub type HubResult<T> = Result<T, HubError>;

/// Notification hub errors
#[derive(Debug, Clone, Error)]
pub enum HubError {
    /// Admission rejected: the live set is at capacity
    #[error("Connection rejected: hub at capacity ({0})")]
    AtCapacity(usize),

    /// The connection's channel is closed
    #[error("Connection closed")]
    ConnectionClosed,

    /// Event payload could not be serialized
    #[error("Failed to serialize event payload: {0}")]
    Serialization(String),

    /// Internal error (poisoned lock)
    #[error("Internal hub error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_at_capacity_display() {
        let err = HubError::AtCapacity(2000);
        assert_eq!(err.to_string(), "Connection rejected: hub at capacity (2000)");
    }
}
