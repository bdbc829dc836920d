//! Named events carried over the push channel

use serde::{Deserialize, Serialize};

/// Event name for domain-change notifications.
pub const UPDATE_EVENT: &str = "update";

/// Event name for the connect-time snapshot of every domain's version.
pub const VERSION_EVENT: &str = "version";

/// Payload of an `update` event: which domain changed and its new version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateEvent {
    /// The domain that changed
    #[serde(rename = "type")]
    pub domain: String,

    /// The domain's new version
    pub version: u64,
}

impl UpdateEvent {
    /// Create an update notification.
    pub fn new(domain: impl Into<String>, version: u64) -> Self {
        Self {
            domain: domain.into(),
            version,
        }
    }
}
