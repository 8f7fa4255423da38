// ABOUTME: Registry of live runs keyed by distribution id.
// ABOUTME: Atomic check-and-register gives per-id single-flight without a global lock.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Notify;

use crate::types::DistributionId;

/// Cancellation capability of a live run.
///
/// The registry only needs to deliver a stop request; everything else about
/// a run stays private to the scheduler.
pub trait RunControl: Send + Sync {
    /// Request cooperative stop. Executors already mid-remote-call finish;
    /// not-yet-started executors are skipped.
    fn cancel(&self);
}

/// Shared cancellation flag for one run, checked by executors at dispatch
/// boundaries and awaited by the ordered loop's inter-step sleep.
#[derive(Default)]
pub struct RunHandle {
    cancelled: AtomicBool,
    notify: Notify,
}

impl RunHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once the run is cancelled. Used to cut the ordered loop's
    /// inter-step sleep short instead of sleeping out the full interval.
    pub async fn cancelled(&self) {
        loop {
            if self.is_cancelled() {
                return;
            }
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register with the Notify before re-checking the flag, so a
            // cancel landing between the check and the await still wakes us.
            notified.as_mut().enable();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

impl RunControl for RunHandle {
    fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }
}

/// Concurrent map from distribution id to the live run's control handle.
///
/// Entries are run-scoped: added when a run starts, removed when it
/// completes or is cancelled. Nothing survives a process restart; a crash
/// mid-run leaves targets in a non-terminal status that the next run resets
/// through `mark_all_prepared`.
#[derive(Default)]
pub struct RunRegistry {
    runs: Mutex<HashMap<DistributionId, Arc<dyn RunControl>>>,
}

impl RunRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a run handle for `id`. Fails (returning `false`) when the id
    /// already has a live run, so two runs never race for the same targets.
    pub fn try_register(&self, id: DistributionId, handle: Arc<dyn RunControl>) -> bool {
        let mut runs = self.runs.lock();
        if runs.contains_key(&id) {
            return false;
        }
        runs.insert(id, handle);
        true
    }

    /// Remove `id` only if it still maps to `handle`. A finished run must
    /// not evict a successor that re-registered the same id.
    pub fn remove_entry(&self, id: &DistributionId, handle: &Arc<dyn RunControl>) {
        let mut runs = self.runs.lock();
        if let Some(current) = runs.get(id)
            && Arc::ptr_eq(current, handle)
        {
            runs.remove(id);
        }
    }

    /// Cancel the run registered under `id`, removing its entry. Returns
    /// `false` when no run is registered (already finished or never started).
    pub fn cancel(&self, id: &DistributionId) -> bool {
        let handle = self.runs.lock().remove(id);
        match handle {
            Some(handle) => {
                tracing::debug!(%id, "cancelling distribution run");
                handle.cancel();
                true
            }
            None => false,
        }
    }

    pub fn is_registered(&self, id: &DistributionId) -> bool {
        self.runs.lock().contains_key(id)
    }
}
