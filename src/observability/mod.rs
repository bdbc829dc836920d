//! # Observability
//!
//! Structured logging for the sync core. Logs are synchronous, one line per
//! event, with deterministic field ordering.

pub mod logger;

pub use logger::{Logger, Severity};
