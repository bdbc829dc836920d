//! Flush coordination: debounce, single-flight, atomic replacement
//!
//! The flush path is:
//!
//! 1. Serialize current state to bytes (via `FlushSource`)
//! 2. Ensure the target directory exists
//! 3. Write `<target>.tmp`, fsync it
//! 4. Rename `<target>.tmp` over `<target>`
//!
//! A crash at any point leaves the target as a complete previous state or a
//! complete new state, never a partial file.
//!
//! Flush failures raised from the debounce timer are logged and swallowed;
//! the in-memory mutation already succeeded and the next mutation schedules
//! another attempt.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::AsyncWriteExt;

use super::debounce::DebounceTimer;
use super::errors::{PersistError, PersistResult};
use crate::observability::Logger;

/// Anything that can serialize its current state for a durable flush.
pub trait FlushSource: Send + Sync {
    /// Serialize the current state to the bytes that should land on disk.
    fn snapshot(&self) -> PersistResult<Vec<u8>>;
}

/// Single-flight bookkeeping: at most one physical write in flight, at most
/// one queued superseding request.
#[derive(Debug, Default)]
struct FlightState {
    in_flight: bool,
    pending: bool,
}

impl FlightState {
    /// Try to start a flush. Returns false if one is already in flight, in
    /// which case the request is recorded as pending.
    fn admit(&mut self) -> bool {
        if self.in_flight {
            self.pending = true;
            false
        } else {
            self.in_flight = true;
            true
        }
    }

    /// Record completion of a physical write. Returns true if a pending
    /// request was queued and exactly one more flush must run. The first
    /// write's outcome is irrelevant: a pending request represents state
    /// that arrived mid-flight and must reach disk either way.
    fn complete(&mut self) -> bool {
        if self.pending {
            self.pending = false;
            true
        } else {
            self.in_flight = false;
            false
        }
    }
}

/// Debounced, crash-safe durable-write coordinator.
pub struct PersistenceCoordinator {
    target: PathBuf,
    source: Arc<dyn FlushSource>,
    debounce: DebounceTimer,
    flight: Mutex<FlightState>,
    flush_count: AtomicU64,
}

impl PersistenceCoordinator {
    /// Create a coordinator flushing `source` to `target` after
    /// `quiescence_window` of inactivity.
    pub fn new(target: PathBuf, source: Arc<dyn FlushSource>, quiescence_window: Duration) -> Self {
        Self {
            target,
            source,
            debounce: DebounceTimer::new(quiescence_window),
            flight: Mutex::new(FlightState::default()),
            flush_count: AtomicU64::new(0),
        }
    }

    /// Target path of the durable state file.
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Number of completed physical flushes.
    pub fn flush_count(&self) -> u64 {
        self.flush_count.load(Ordering::SeqCst)
    }

    /// (Re)arm the flush timer. Called after every mutation; a burst of calls
    /// within one quiescence window results in exactly one flush, fired one
    /// window after the last call.
    pub fn schedule_flush(self: &Arc<Self>) {
        let coordinator = Arc::clone(self);
        self.debounce.arm(move || async move {
            if let Err(e) = coordinator.flush().await {
                // Swallowed: the request path already succeeded in memory
                Logger::error(
                    "FLUSH_FAILED",
                    &[
                        ("error", &e.to_string()),
                        ("path", &coordinator.target.display().to_string()),
                    ],
                );
            }
        });
    }

    /// Run a flush now, with single-flight discipline.
    ///
    /// If a physical write is already in progress this records a pending
    /// request and returns immediately; the in-flight flush runs exactly one
    /// more write when it finishes, capturing state changed mid-flush.
    pub async fn flush(&self) -> PersistResult<()> {
        {
            let mut flight = self
                .flight
                .lock()
                .map_err(|_| PersistError::Internal("flight lock poisoned".into()))?;
            if !flight.admit() {
                return Ok(());
            }
        }

        loop {
            let result = self.write_once().await;

            let run_again = {
                let mut flight = self
                    .flight
                    .lock()
                    .map_err(|_| PersistError::Internal("flight lock poisoned".into()))?;
                flight.complete()
            };

            if !run_again {
                return result;
            }
        }
    }

    /// Cancel any pending debounce and run one final flush. Call on graceful
    /// shutdown so no mutation younger than the last flush is dropped.
    pub async fn shutdown(&self) -> PersistResult<()> {
        self.debounce.cancel();
        self.flush().await
    }

    /// One physical serialize-and-replace write.
    async fn write_once(&self) -> PersistResult<()> {
        let bytes = self.source.snapshot()?;
        write_atomic(&self.target, &bytes).await?;
        self.flush_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Write `bytes` to `target` via a temporary file and atomic rename.
async fn write_atomic(target: &Path, bytes: &[u8]) -> PersistResult<()> {
    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| PersistError::write_failed(parent, e))?;
    }

    let tmp_path = {
        let mut os = target.as_os_str().to_owned();
        os.push(".tmp");
        PathBuf::from(os)
    };

    let mut file = tokio::fs::File::create(&tmp_path)
        .await
        .map_err(|e| PersistError::write_failed(&tmp_path, e))?;
    file.write_all(bytes)
        .await
        .map_err(|e| PersistError::write_failed(&tmp_path, e))?;
    // fsync before rename so the rename never publishes an unsynced file
    file.sync_all()
        .await
        .map_err(|e| PersistError::write_failed(&tmp_path, e))?;
    drop(file);

    tokio::fs::rename(&tmp_path, target)
        .await
        .map_err(|e| PersistError::write_failed(target, e))?;

    Ok(())
}
