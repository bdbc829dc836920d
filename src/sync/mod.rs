//! # Sync Context
//!
//! The explicitly constructed context object owning the process-wide sync
//! components (store, cache, hub, coordinator). One instance per process,
//! passed into request handlers; no hidden global state.

pub mod context;

pub use context::{DomainRead, SyncContext};
