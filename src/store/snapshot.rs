//! On-disk snapshot format for the durable domain store
//!
//! The snapshot is a JSON document carrying a format version, a CRC32
//! checksum over the serialized state, and the state itself. Every load
//! re-serializes the state and validates the checksum; any mismatch aborts
//! the load rather than serving corrupt data.
//!
//! Maps use `BTreeMap` so serialization is deterministic and the checksum is
//! stable across encode/decode round trips.

use std::collections::BTreeMap;

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::{StoreError, StoreResult};

/// Current snapshot format version
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// The complete durable state: domain payloads plus version counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreState {
    /// Domain payloads keyed by domain name
    pub domains: BTreeMap<String, Value>,

    /// Monotonic version counters keyed by domain name
    pub versions: BTreeMap<String, u64>,
}

/// Snapshot file envelope
#[derive(Debug, Serialize, Deserialize)]
struct SnapshotFile {
    format_version: u32,
    checksum: u32,
    state: StoreState,
}

/// Computes a CRC32 checksum over the provided data.
fn compute_checksum(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// Encode the state into snapshot file bytes.
pub fn encode_snapshot(state: &StoreState) -> StoreResult<Vec<u8>> {
    let state_bytes = serde_json::to_vec(state)?;
    let file = SnapshotFile {
        format_version: SNAPSHOT_FORMAT_VERSION,
        checksum: compute_checksum(&state_bytes),
        state: state.clone(),
    };
    Ok(serde_json::to_vec_pretty(&file)?)
}

/// Decode snapshot file bytes, validating format version and checksum.
pub fn decode_snapshot(bytes: &[u8]) -> StoreResult<StoreState> {
    let file: SnapshotFile = serde_json::from_slice(bytes)
        .map_err(|e| StoreError::Corrupted(format!("invalid snapshot structure: {}", e)))?;

    if file.format_version != SNAPSHOT_FORMAT_VERSION {
        return Err(StoreError::Corrupted(format!(
            "unsupported format version {}",
            file.format_version
        )));
    }

    let state_bytes = serde_json::to_vec(&file.state)?;
    let actual = compute_checksum(&state_bytes);
    if actual != file.checksum {
        return Err(StoreError::Corrupted(format!(
            "checksum mismatch: expected {}, computed {}",
            file.checksum, actual
        )));
    }

    Ok(file.state)
}
