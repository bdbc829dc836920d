//! # Notification Hub
//!
//! Push fan-out for long-lived one-way text-stream connections:
//!
//! - Admission control against a fixed capacity ceiling, with an explicit
//!   rejection (never silently queued or dropped).
//! - Handshake on connect: one keepalive frame plus a `version` event
//!   carrying every known domain version.
//! - Fan-out broadcast with two-phase collect-then-remove failure handling:
//!   the live set is never mutated while being iterated, and one failing
//!   connection never aborts delivery to the rest.
//! - One centralized heartbeat timer for the whole hub, so per-connection
//!   overhead stays O(1) timers at thousands of connections.

pub mod errors;
pub mod event;
pub mod frame;
#[allow(clippy::module_inception)]
pub mod hub;

pub use errors::{HubError, HubResult};
pub use event::{UpdateEvent, UPDATE_EVENT, VERSION_EVENT};
pub use hub::{push_channel, BroadcastOutcome, HubStats, NotificationHub, PushReceiver, PushSender};
