//! Trailing-edge debounce timer
//!
//! A single logical timer that can be re-armed and cancelled. Arming while a
//! previous arm is still waiting supersedes it: only the most recent arm
//! fires, one quiescence window after it was requested.
//!
//! Superseding is implemented with a generation counter rather than task
//! aborts: every arm bumps the generation, and a sleeping task only fires if
//! its generation is still current when it wakes.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// A re-armable, cancellable delayed-fire handle.
#[derive(Debug)]
pub struct DebounceTimer {
    window: Duration,
    generation: Arc<AtomicU64>,
}

impl DebounceTimer {
    /// Create a timer with the given quiescence window.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// The quiescence window this timer fires after.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// (Re)arm the timer. `on_fire` runs once, `window` after this call,
    /// unless a later `arm` or `cancel` supersedes it first.
    ///
    /// Must be called from within a tokio runtime.
    pub fn arm<F, Fut>(&self, on_fire: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let armed = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let generation = Arc::clone(&self.generation);
        let window = self.window;

        tokio::spawn(async move {
            tokio::time::sleep(window).await;
            if generation.load(Ordering::SeqCst) == armed {
                on_fire().await;
            }
        });
    }

    /// Cancel any armed fire. A no-op if nothing is armed.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}
