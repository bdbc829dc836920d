//! tombola - event registration and raffle manager, real-time sync core
//!
//! Read-through versioned cache, push fan-out hub, debounced durable writes.

pub mod cache;
pub mod cli;
pub mod config;
pub mod http;
pub mod hub;
pub mod observability;
pub mod persist;
pub mod store;
pub mod sync;
pub mod version;
