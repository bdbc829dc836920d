//! # Versioned Read-Through Cache
//!
//! In-process cache keyed by domain name, storing a payload, the version it
//! was computed at, and a TTL-based expiry. Invalidation is push-driven (via
//! the notification hub); the TTL is a safety net, not the primary freshness
//! mechanism, so per-domain TTLs are intentionally generous.
//!
//! Expired entries are removed lazily on read and in bulk by a periodic
//! sweep.

pub mod sweeper;
pub mod ttl;
pub mod versioned;

pub use sweeper::spawn_sweeper;
pub use ttl::TtlPolicy;
pub use versioned::{CacheStats, VersionedCache};
