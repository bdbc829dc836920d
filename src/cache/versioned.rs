//! Version-tagged cache entries with lazy TTL expiry
//!
//! Entries are owned exclusively by the cache and mutated only by full
//! replacement. An entry is logically dead once `now > expires_at`, whether
//! or not it has been physically removed yet: reads check expiry lazily and
//! the periodic sweep bounds memory held by stale entries that are never
//! read again.
//!
//! Timestamps use `tokio::time::Instant` so tests drive expiry with the
//! paused clock.

use std::collections::HashMap;
use std::sync::RwLock;

use tokio::time::Instant;

use super::ttl::TtlPolicy;

/// A cached payload tagged with the version it was computed at.
#[derive(Debug, Clone)]
struct CacheEntry<T> {
    payload: T,
    version: u64,
    cached_at: Instant,
    expires_at: Instant,
}

/// Cache statistics, observability only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Entries still within their TTL
    pub valid_count: usize,
    /// Entries past their TTL but not yet removed
    pub expired_count: usize,
    /// All physically present entries
    pub total_count: usize,
    /// Keys of all physically present entries
    pub keys: Vec<String>,
}

/// Read-through cache keyed by domain name, generic over the payload type.
#[derive(Debug)]
pub struct VersionedCache<T> {
    entries: RwLock<HashMap<String, CacheEntry<T>>>,
    ttl: TtlPolicy,
}

impl<T: Clone> VersionedCache<T> {
    /// Create an empty cache with the given TTL policy.
    pub fn new(ttl: TtlPolicy) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Get a payload if present and not expired. An expired entry is removed
    /// and treated as absent.
    pub fn get(&self, key: &str) -> Option<T> {
        self.get_with_version(key).map(|(payload, _)| payload)
    }

    /// Like `get`, additionally returning the version the payload was tagged
    /// with when it was cached.
    pub fn get_with_version(&self, key: &str) -> Option<(T, u64)> {
        let mut entries = self.entries.write().ok()?;
        match entries.get(key) {
            Some(entry) if Instant::now() <= entry.expires_at => {
                Some((entry.payload.clone(), entry.version))
            }
            Some(_) => {
                // Lazy expiry on read
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Unconditionally overwrite the entry for `key`, tagged with `version`.
    /// Expiry is `now + ttl(key)`.
    pub fn set(&self, key: &str, payload: T, version: u64) {
        let now = Instant::now();
        let entry = CacheEntry {
            payload,
            version,
            cached_at: now,
            expires_at: now + self.ttl.ttl(key),
        };
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(key.to_string(), entry);
        }
    }

    /// Remove the entry for `key`, regardless of remaining TTL.
    pub fn invalidate(&self, key: &str) {
        if let Ok(mut entries) = self.entries.write() {
            entries.remove(key);
        }
    }

    /// Remove every entry.
    pub fn invalidate_all(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }

    /// Sweep all expired entries. Returns how many were removed.
    pub fn cleanup(&self) -> usize {
        let now = Instant::now();
        if let Ok(mut entries) = self.entries.write() {
            let before = entries.len();
            entries.retain(|_, entry| now <= entry.expires_at);
            before - entries.len()
        } else {
            0
        }
    }

    /// Current statistics. Does not mutate state: expired-but-present
    /// entries are counted, not removed.
    pub fn stats(&self) -> CacheStats {
        let now = Instant::now();
        let entries = match self.entries.read() {
            Ok(e) => e,
            Err(_) => {
                return CacheStats {
                    valid_count: 0,
                    expired_count: 0,
                    total_count: 0,
                    keys: Vec::new(),
                }
            }
        };

        let expired_count = entries.values().filter(|e| now > e.expires_at).count();
        let mut keys: Vec<String> = entries.keys().cloned().collect();
        keys.sort();

        CacheStats {
            valid_count: entries.len() - expired_count,
            expired_count,
            total_count: entries.len(),
            keys,
        }
    }

    /// Age of the entry for `key`, if present (expired or not).
    pub fn entry_age(&self, key: &str) -> Option<tokio::time::Duration> {
        self.entries
            .read()
            .ok()?
            .get(key)
            .map(|e| Instant::now() - e.cached_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn cache_with_ttl(ms: u64) -> VersionedCache<String> {
        VersionedCache::new(TtlPolicy::new(Duration::from_millis(ms)))
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_within_ttl() {
        let cache = cache_with_ttl(30_000);
        cache.set("raffles", "payload".to_string(), 1);

        tokio::time::sleep(Duration::from_millis(29_999)).await;
        assert_eq!(cache.get("raffles"), Some("payload".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_after_ttl_is_absent() {
        let cache = cache_with_ttl(30_000);
        cache.set("raffles", "payload".to_string(), 1);

        tokio::time::sleep(Duration::from_millis(30_001)).await;
        assert_eq!(cache.get("raffles"), None);

        // The lazy read physically removed it
        assert_eq!(cache.stats().total_count, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_with_version() {
        let cache = cache_with_ttl(30_000);
        cache.set("raffles", "payload".to_string(), 7);

        let (payload, version) = cache.get_with_version("raffles").unwrap();
        assert_eq!(payload, "payload");
        assert_eq!(version, 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_overwrites() {
        let cache = cache_with_ttl(30_000);
        cache.set("raffles", "old".to_string(), 1);
        cache.set("raffles", "new".to_string(), 2);

        assert_eq!(cache.get_with_version("raffles"), Some(("new".to_string(), 2)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_beats_ttl() {
        let cache = cache_with_ttl(30_000);
        cache.set("raffles", "payload".to_string(), 1);

        cache.invalidate("raffles");
        assert_eq!(cache.get("raffles"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_all() {
        let cache = cache_with_ttl(30_000);
        cache.set("raffles", "a".to_string(), 1);
        cache.set("rules", "b".to_string(), 1);

        cache.invalidate_all();
        assert_eq!(cache.stats().total_count, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_per_key_ttl_override() {
        let ttl = TtlPolicy::new(Duration::from_millis(30_000))
            .with_override("rules", Duration::from_millis(300_000));
        let cache = VersionedCache::new(ttl);
        cache.set("raffles", "a".to_string(), 1);
        cache.set("rules", "b".to_string(), 1);

        tokio::time::sleep(Duration::from_millis(60_000)).await;
        assert_eq!(cache.get("raffles"), None);
        assert_eq!(cache.get("rules"), Some("b".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_removes_only_expired() {
        let cache = cache_with_ttl(30_000);
        cache.set("old", "a".to_string(), 1);
        tokio::time::sleep(Duration::from_millis(20_000)).await;
        cache.set("fresh", "b".to_string(), 1);
        tokio::time::sleep(Duration::from_millis(15_000)).await;

        // "old" is 35s old, "fresh" is 15s old
        let removed = cache.cleanup();
        assert_eq!(removed, 1);
        assert_eq!(cache.get("fresh"), Some("b".to_string()));
        assert_eq!(cache.stats().total_count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stats_do_not_mutate() {
        let cache = cache_with_ttl(30_000);
        cache.set("raffles", "a".to_string(), 1);
        cache.set("rules", "b".to_string(), 1);
        tokio::time::sleep(Duration::from_millis(31_000)).await;
        cache.set("entries", "c".to_string(), 1);

        let stats = cache.stats();
        assert_eq!(stats.valid_count, 1);
        assert_eq!(stats.expired_count, 2);
        assert_eq!(stats.total_count, 3);
        assert_eq!(stats.keys, vec!["entries", "raffles", "rules"]);

        // Unchanged after the read
        assert_eq!(cache.stats().total_count, 3);
    }
}
