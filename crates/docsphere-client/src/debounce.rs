//! Debounce-and-cancel timer primitive.
//!
//! One pending-timer slot per input stream: arming replaces and aborts
//! whatever was pending, so only the callback scheduled by the most
//! recent arm ever fires. Aborting also cancels an action that has
//! already started awaiting a request, which keeps a superseded
//! lookup from publishing stale results.
//!
//! The deadline is computed at arm time, before the task is first
//! polled, so the quiet period is measured from the triggering event
//! and not from scheduler latency.

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;

/// A single pending-timer handle. Dropping it cancels any armed
/// action, so a torn-down consumer can never be mutated by a late
/// callback.
#[derive(Default)]
pub struct Debouncer {
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `action` to run after `quiet` with no newer arm.
    /// Cancels the previously armed action, fired or not.
    pub fn arm<F>(&self, quiet: Duration, action: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let deadline = Instant::now() + quiet;
        let handle = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            action.await;
        });

        let previous = self
            .pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .replace(handle);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    /// Cancel the pending action, if any.
    pub fn cancel(&self) {
        if let Some(handle) = self
            .pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            handle.abort();
        }
    }

    /// Whether an action is armed and has not yet completed.
    pub fn is_armed(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

// ── tests ────────────────────────────────────────────────────────────
