//! # Version Counters
//!
//! Monotonic per-domain version counters and the conditional-read protocol
//! built on them. Counters are stored durably (in the domain store) and only
//! change via a single atomic increment; each confirmed mutation bumps the
//! counter by exactly 1.

pub mod conditional;
pub mod store;

pub use conditional::{parse_token, render_token, ConditionalRead};
pub use store::VersionStore;
