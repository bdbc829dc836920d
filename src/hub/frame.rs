//! Push-channel frame building
//!
//! The push channel is a persistent server-to-client one-way text stream
//! (SSE). Two frame shapes exist:
//!
//! - comment-only keepalive frames, carrying no event name
//! - named event frames: `event: <name>\ndata: <json>\n\n`

use serde::Serialize;

use super::errors::{HubError, HubResult};

/// A comment-only keepalive frame.
pub fn keepalive() -> String {
    ": keepalive\n\n".to_string()
}

/// A named event frame with a JSON data payload.
pub fn named_event<T: Serialize>(name: &str, data: &T) -> HubResult<String> {
    let json = serde_json::to_string(data).map_err(|e| HubError::Serialization(e.to_string()))?;
    Ok(format!("event: {}\ndata: {}\n\n", name, json))
}
