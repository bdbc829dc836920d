//! Mutation commit path and read-through reads
//!
//! For a mutation the caller-visible sequence is, in program order:
//!
//! 1. apply to the durable store (in memory)
//! 2. schedule/coalesce a durable flush
//! 3. bump the domain's version counter
//! 4. invalidate the cache entry for the domain
//! 5. broadcast an `update` event with the new version
//!
//! The steps are not wrapped in a cross-step transaction. A reader
//! interleaved between the version bump and the cache invalidation can
//! observe an already-bumped version paired with a stale cached payload;
//! push invalidation plus the TTL safety net self-heal it. Known, accepted.

use std::sync::Arc;

use serde_json::Value;
use tokio::task::JoinHandle;

use crate::cache::{spawn_sweeper, TtlPolicy, VersionedCache};
use crate::config::TombolaConfig;
use crate::hub::{NotificationHub, UpdateEvent, UPDATE_EVENT};
use crate::observability::Logger;
use crate::persist::{PersistenceCoordinator, PersistError};
use crate::store::{DataStore, StoreResult};
use crate::version::{ConditionalRead, VersionStore};

/// Outcome of a conditional domain read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainRead {
    /// No payload has ever been stored for this domain.
    Absent,
    /// The presented version token matches the current version.
    NotModified { version: u64 },
    /// Full payload, tagged with the current version.
    Fresh { payload: Value, version: u64 },
}

/// Process-wide sync components, explicitly initialized and shut down.
pub struct SyncContext {
    store: Arc<DataStore>,
    cache: Arc<VersionedCache<Value>>,
    hub: Arc<NotificationHub>,
    coordinator: Arc<PersistenceCoordinator>,
    versions: VersionStore,
    sweeper: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl SyncContext {
    /// Initialize the context: load durable state, build the cache, hub and
    /// coordinator, and start the background tasks (heartbeat, cache sweep).
    ///
    /// Must be called from within a tokio runtime.
    pub fn init(config: &TombolaConfig) -> StoreResult<Arc<Self>> {
        let store = Arc::new(DataStore::load(&config.state_path())?);
        let versions = VersionStore::new(Arc::clone(&store));

        let ttl = TtlPolicy::from_millis(config.cache_ttl_ms, &config.cache_ttl_overrides_ms);
        let cache = Arc::new(VersionedCache::new(ttl));

        let hub = Arc::new(NotificationHub::new(config.max_clients));
        hub.start_heartbeat(config.heartbeat_interval());

        let coordinator = Arc::new(PersistenceCoordinator::new(
            config.state_path(),
            Arc::clone(&store) as Arc<dyn crate::persist::FlushSource>,
            config.flush_quiescence(),
        ));

        let sweeper = spawn_sweeper(Arc::clone(&cache), config.cache_sweep_interval());

        Logger::info(
            "SYNC_INIT",
            &[
                ("domains", &store.domains().len().to_string()),
                ("state_path", &config.state_path().display().to_string()),
            ],
        );

        Ok(Arc::new(Self {
            store,
            cache,
            hub,
            coordinator,
            versions,
            sweeper: std::sync::Mutex::new(Some(sweeper)),
        }))
    }

    /// The notification hub (for the push-channel endpoint).
    pub fn hub(&self) -> &Arc<NotificationHub> {
        &self.hub
    }

    /// The versioned cache (for observability).
    pub fn cache(&self) -> &Arc<VersionedCache<Value>> {
        &self.cache
    }

    /// The version counters.
    pub fn versions(&self) -> &VersionStore {
        &self.versions
    }

    /// The flush coordinator (for observability and tests).
    pub fn coordinator(&self) -> &Arc<PersistenceCoordinator> {
        &self.coordinator
    }

    /// Commit a mutation to a domain and perform the explicit side effects:
    /// schedule flush, bump version, invalidate cache, notify clients.
    /// Returns the domain's new version.
    pub fn commit_mutation(&self, domain: &str, payload: Value) -> StoreResult<u64> {
        self.store.set(domain, payload)?;
        self.coordinator.schedule_flush();

        let version = self.versions.increment(domain)?;
        self.cache.invalidate(domain);

        if let Err(e) = self
            .hub
            .broadcast(UPDATE_EVENT, &UpdateEvent::new(domain, version))
        {
            // Notification is best-effort; the mutation already committed
            Logger::warn("BROADCAST_FAILED", &[("error", &e.to_string())]);
        }

        Ok(version)
    }

    /// Conditional read of a domain.
    ///
    /// Short-circuits to `NotModified` when the presented token matches the
    /// current version, otherwise serves through the cache: a hit returns
    /// the cached payload, a miss rebuilds from the durable store and
    /// repopulates the cache tagged with the current version.
    pub fn read_domain(&self, domain: &str, presented: Option<&str>) -> DomainRead {
        let current = self.versions.read(domain);

        if let ConditionalRead::NotModified { version } =
            ConditionalRead::evaluate(current, presented)
        {
            return DomainRead::NotModified { version };
        }

        if let Some((payload, version)) = self.cache.get_with_version(domain) {
            return DomainRead::Fresh { payload, version };
        }

        match self.store.get(domain) {
            Some(payload) => {
                self.cache.set(domain, payload.clone(), current);
                DomainRead::Fresh {
                    payload,
                    version: current,
                }
            }
            None => DomainRead::Absent,
        }
    }

    /// Graceful shutdown: stop the push hub and background tasks, cancel any
    /// pending debounce and run one final flush. After this returns, no
    /// mutation younger than the last flush has been dropped.
    pub async fn shutdown(&self) -> Result<(), PersistError> {
        self.hub.close_all();
        if let Ok(mut sweeper) = self.sweeper.lock() {
            if let Some(handle) = sweeper.take() {
                handle.abort();
            }
        }
        let result = self.coordinator.shutdown().await;
        Logger::info("SYNC_SHUTDOWN", &[]);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn test_config(dir: &TempDir) -> TombolaConfig {
        TombolaConfig {
            data_dir: dir.path().to_path_buf(),
            ..Default::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_commit_bumps_version_and_notifies() {
        let dir = TempDir::new().unwrap();
        let ctx = SyncContext::init(&test_config(&dir)).unwrap();

        let (tx, mut rx) = crate::hub::push_channel();
        ctx.hub().add_client(tx, &ctx.versions().all()).unwrap();

        let version = ctx.commit_mutation("raffles", json!({"open": true})).unwrap();
        assert_eq!(version, 1);
        assert_eq!(ctx.versions().read("raffles"), 1);

        // Handshake, then the update frame
        rx.recv().await.unwrap();
        rx.recv().await.unwrap();
        let frame = rx.recv().await.unwrap();
        assert_eq!(frame, "event: update\ndata: {\"type\":\"raffles\",\"version\":1}\n\n");

        ctx.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_miss_repopulates_cache() {
        let dir = TempDir::new().unwrap();
        let ctx = SyncContext::init(&test_config(&dir)).unwrap();

        ctx.commit_mutation("raffles", json!({"entries": 2})).unwrap();
        // The commit invalidated the cache
        assert!(ctx.cache().get("raffles").is_none());

        let read = ctx.read_domain("raffles", None);
        assert_eq!(
            read,
            DomainRead::Fresh {
                payload: json!({"entries": 2}),
                version: 1
            }
        );

        // The miss repopulated the cache, tagged with the current version
        assert_eq!(
            ctx.cache().get_with_version("raffles"),
            Some((json!({"entries": 2}), 1))
        );

        ctx.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_conditional_read_short_circuits() {
        let dir = TempDir::new().unwrap();
        let ctx = SyncContext::init(&test_config(&dir)).unwrap();

        ctx.commit_mutation("raffles", json!({"entries": 2})).unwrap();

        let read = ctx.read_domain("raffles", Some("\"v1\""));
        assert_eq!(read, DomainRead::NotModified { version: 1 });

        // A stale token gets the payload
        ctx.commit_mutation("raffles", json!({"entries": 3})).unwrap();
        let read = ctx.read_domain("raffles", Some("\"v1\""));
        assert_eq!(
            read,
            DomainRead::Fresh {
                payload: json!({"entries": 3}),
                version: 2
            }
        );

        ctx.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_domain_is_absent() {
        let dir = TempDir::new().unwrap();
        let ctx = SyncContext::init(&test_config(&dir)).unwrap();

        assert_eq!(ctx.read_domain("nonsense", None), DomainRead::Absent);

        ctx.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_flushes_unflushed_mutations() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);

        {
            let ctx = SyncContext::init(&config).unwrap();
            ctx.commit_mutation("raffles", json!({"entries": 9})).unwrap();
            // Shut down before the quiescence window elapses
            ctx.shutdown().await.unwrap();
        }

        let reopened = SyncContext::init(&config).unwrap();
        assert_eq!(
            reopened.read_domain("raffles", None),
            DomainRead::Fresh {
                payload: json!({"entries": 9}),
                version: 1
            }
        );
        reopened.shutdown().await.unwrap();
    }
}
