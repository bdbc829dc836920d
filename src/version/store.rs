//! Version counter glue over the durable store

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::store::{DataStore, StoreResult};

/// Monotonic version counters keyed by domain name.
///
/// Thin glue over the durable store's transactional increment: the store
/// serializes concurrent increments, this type owns the domain-level API.
#[derive(Debug, Clone)]
pub struct VersionStore {
    store: Arc<DataStore>,
}

impl VersionStore {
    /// Create version glue over the given store.
    pub fn new(store: Arc<DataStore>) -> Self {
        Self { store }
    }

    /// Increment a domain's counter, returning the new version.
    ///
    /// Atomic with respect to concurrent increments on the same domain.
    pub fn increment(&self, domain: &str) -> StoreResult<u64> {
        self.store.increment(domain)
    }

    /// Read a domain's current version. 0 for unseen domains.
    pub fn read(&self, domain: &str) -> u64 {
        self.store.read_version(domain)
    }

    /// All known counters, for the connect-time version snapshot event.
    pub fn all(&self) -> BTreeMap<String, u64> {
        self.store.versions()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_unseen_domain_is_zero() {
        let versions = VersionStore::new(Arc::new(DataStore::new()));
        assert_eq!(versions.read("raffles"), 0);
    }

    #[test]
    fn test_increment_monotonic() {
        let versions = VersionStore::new(Arc::new(DataStore::new()));
        let mut last = 0;
        for _ in 0..10 {
            let next = versions.increment("raffles").unwrap();
            assert_eq!(next, last + 1);
            last = next;
        }
    }

    #[test]
    fn test_all_reflects_every_domain() {
        let versions = VersionStore::new(Arc::new(DataStore::new()));
        versions.increment("raffles").unwrap();
        versions.increment("rules").unwrap();
        versions.increment("rules").unwrap();

        let all = versions.all();
        assert_eq!(all["raffles"], 1);
        assert_eq!(all["rules"], 2);
    }
}
