//! # Persistence Coordinator
//!
//! Converts bursty in-memory mutations into infrequent, atomic durable
//! writes:
//!
//! - **Debounce**: a single re-armable timer fires one flush after a
//!   quiescence window measured from the most recent mutation.
//! - **Single-flight**: at most one physical write at a time; a flush
//!   requested mid-write runs exactly once more afterwards.
//! - **Atomic replacement**: write a temporary file, fsync, rename over the
//!   target. The on-disk file is always a complete old or new state.
//!
//! Background flush failures are logged and swallowed; durability is
//! eventual, bounded by the quiescence window.

pub mod coordinator;
pub mod debounce;
pub mod errors;

pub use coordinator::{FlushSource, PersistenceCoordinator};
pub use debounce::DebounceTimer;
pub use errors::{PersistError, PersistResult};
