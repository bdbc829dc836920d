//! In-memory durable store with snapshot load/save
//!
//! The store is the single-writer source of truth for domain payloads and
//! version counters. Mutations apply in memory immediately; durability is
//! delegated to the persistence coordinator, which pulls `snapshot()` through
//! the `FlushSource` seam.
//!
//! Counter increments execute under the exclusive state lock as a single
//! read-modify-write, so two concurrent increments never observe the same
//! stale value.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::RwLock;

use serde_json::Value;

use super::errors::{StoreError, StoreResult};
use super::snapshot::{decode_snapshot, encode_snapshot, StoreState};
use crate::persist::{FlushSource, PersistError, PersistResult};

/// Durable domain store: payloads plus monotonic version counters.
#[derive(Debug, Default)]
pub struct DataStore {
    state: RwLock<StoreState>,
}

impl DataStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the store from a snapshot file.
    ///
    /// A missing file yields an empty store; a corrupt file is an error.
    pub fn load(path: &Path) -> StoreResult<Self> {
        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::new());
            }
            Err(e) => {
                return Err(StoreError::ReadFailed {
                    path: path.display().to_string(),
                    source: e,
                })
            }
        };

        let state = decode_snapshot(&bytes)?;
        Ok(Self {
            state: RwLock::new(state),
        })
    }

    /// Get a domain payload, if one has been set.
    pub fn get(&self, domain: &str) -> Option<Value> {
        self.state
            .read()
            .ok()
            .and_then(|s| s.domains.get(domain).cloned())
    }

    /// Set a domain payload, replacing any previous one.
    pub fn set(&self, domain: &str, payload: Value) -> StoreResult<()> {
        let mut state = self
            .state
            .write()
            .map_err(|_| StoreError::Internal("state lock poisoned".into()))?;
        state.domains.insert(domain.to_string(), payload);
        Ok(())
    }

    /// Atomically increment a domain's version counter, returning the new
    /// value. Unseen domains start at 0, so the first increment returns 1.
    pub fn increment(&self, domain: &str) -> StoreResult<u64> {
        let mut state = self
            .state
            .write()
            .map_err(|_| StoreError::Internal("state lock poisoned".into()))?;
        let counter = state.versions.entry(domain.to_string()).or_insert(0);
        *counter += 1;
        Ok(*counter)
    }

    /// Read a domain's version counter. 0 for unseen domains.
    pub fn read_version(&self, domain: &str) -> u64 {
        self.state
            .read()
            .ok()
            .and_then(|s| s.versions.get(domain).copied())
            .unwrap_or(0)
    }

    /// All known version counters, for the connect-time version event.
    pub fn versions(&self) -> BTreeMap<String, u64> {
        self.state
            .read()
            .map(|s| s.versions.clone())
            .unwrap_or_default()
    }

    /// Names of all domains with a stored payload.
    pub fn domains(&self) -> Vec<String> {
        self.state
            .read()
            .map(|s| s.domains.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Serialize the current state to snapshot bytes.
    pub fn snapshot_bytes(&self) -> StoreResult<Vec<u8>> {
        let state = self
            .state
            .read()
            .map_err(|_| StoreError::Internal("state lock poisoned".into()))?;
        encode_snapshot(&state)
    }
}

impl FlushSource for DataStore {
    fn snapshot(&self) -> PersistResult<Vec<u8>> {
        self.snapshot_bytes()
            .map_err(|e| PersistError::Snapshot(e.to_string()))
    }
}
