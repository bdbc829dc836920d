//! Periodic cache sweep task
//!
//! One background task per cache, removing expired entries on a fixed
//! interval so stale entries that are never read again do not accumulate.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use super::versioned::VersionedCache;
use crate::observability::Logger;

/// Spawn the periodic sweep for `cache`. Returns the task handle; abort it
/// on shutdown.
pub fn spawn_sweeper<T>(cache: Arc<VersionedCache<T>>, interval: Duration) -> JoinHandle<()>
where
    T: Clone + Send + Sync + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // interval fires immediately; skip the tick at t=0
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = cache.cleanup();
            if removed > 0 {
                Logger::trace("CACHE_SWEEP", &[("removed", &removed.to_string())]);
            }
        }
    })
}
