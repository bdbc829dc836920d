//! # Durable Domain Store
//!
//! The single-writer durable store behind the sync core. Exposes the
//! collaborator contract consumed by the rest of the system:
//!
//! - `get(domain)` / `set(domain, payload)` for domain payloads
//! - `increment(domain)` for the monotonic version counters
//!
//! State lives in memory and is persisted by the `persist` coordinator as an
//! atomically replaced JSON snapshot with a CRC32 integrity field.

pub mod data;
pub mod errors;
pub mod snapshot;

pub use data::DataStore;
pub use errors::{StoreError, StoreResult};
pub use snapshot::{decode_snapshot, encode_snapshot, StoreState, SNAPSHOT_FORMAT_VERSION};
