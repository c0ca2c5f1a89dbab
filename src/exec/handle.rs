// src/exec/handle.rs

//! Cancellation handles for running processes.
//!
//! A [`ProcessHandle`] is the caller-facing side of one in-flight child. The
//! child itself is owned by the runner's exit supervisor; the handle only
//! carries the cancellation token that the supervisor and both line readers
//! watch. Calling [`ProcessHandle::destroy`] kills the child and stops the
//! readers.
//!
//! [`ProcessTracker`] replaces a process-wide shutdown hook: the application
//! owns a tracker, runners register every child they spawn with it, and the
//! application's own teardown path calls [`ProcessTracker::destroy_all`].
//! Entries are removed once a child has terminated and its output is drained.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct ProcessHandle {
    pid: Option<u32>,
    program: Arc<str>,
    cancel: CancellationToken,
}

impl ProcessHandle {
    pub(crate) fn new(pid: Option<u32>, program: impl Into<Arc<str>>) -> Self {
        Self {
            pid,
            program: program.into(),
            cancel: CancellationToken::new(),
        }
    }

    /// OS process id, if the OS reported one at spawn time.
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Request termination of the child. Idempotent.
    ///
    /// The exit listeners still fire exactly once, with the code the killed
    /// process reports.
    pub fn destroy(&self) {
        if !self.cancel.is_cancelled() {
            info!(program = %self.program, pid = ?self.pid, "destroying process");
        }
        self.cancel.cancel();
    }

    pub fn is_destroyed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub(crate) fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }
}

#[derive(Debug, Default)]
struct TrackerState {
    next_id: u64,
    active: HashMap<u64, ProcessHandle>,
}

/// Registry of still-running children, owned by the hosting application.
#[derive(Debug, Clone, Default)]
pub struct ProcessTracker {
    inner: Arc<Mutex<TrackerState>>,
}

impl ProcessTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handle. The entry lives until the returned guard is dropped.
    pub fn track(&self, handle: ProcessHandle) -> TrackingGuard {
        let mut state = self.lock();
        let id = state.next_id;
        state.next_id += 1;
        state.active.insert(id, handle);

        TrackingGuard {
            id,
            tracker: self.clone(),
        }
    }

    /// Number of children registered and not yet terminated.
    pub fn active(&self) -> usize {
        self.lock().active.len()
    }

    /// Destroy every registered child. Returns how many were signalled.
    pub fn destroy_all(&self) -> usize {
        // Collect first so `destroy` never runs under the lock.
        let handles: Vec<ProcessHandle> = self.lock().active.values().cloned().collect();
        for handle in &handles {
            handle.destroy();
        }
        if !handles.is_empty() {
            info!(count = handles.len(), "destroyed outstanding processes");
        }
        handles.len()
    }

    fn untrack(&self, id: u64) {
        if let Some(handle) = self.lock().active.remove(&id) {
            debug!(program = %handle.program(), pid = ?handle.pid(), "process no longer tracked");
        }
    }

    fn lock(&self) -> MutexGuard<'_, TrackerState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Removes its handle from the tracker when dropped.
#[derive(Debug)]
pub struct TrackingGuard {
    id: u64,
    tracker: ProcessTracker,
}

impl Drop for TrackingGuard {
    fn drop(&mut self) {
        self.tracker.untrack(self.id);
    }
}
