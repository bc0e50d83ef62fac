//! In-process backend: the same document tree and watch semantics as the
//! hosted database, held in a mutex. Used by tests and by local development
//! runs that have no database URL configured.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Mutex;
use tokio::sync::mpsc;
use tracing::debug;

use crate::backend::{merge_at, split_path, value_at, write_at, RealtimeBackend, WatchStream};
use crate::error::BackendError;

struct Watcher {
    segments: Vec<String>,
    tx: mpsc::UnboundedSender<Value>,
}

#[derive(Default)]
struct MemoryState {
    root: Value,
    watchers: Vec<Watcher>,
}

/// Document tree plus its registered watchers. Every operation locks,
/// mutates, notifies, and unlocks; nothing is held across an await.
#[derive(Default)]
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a path, bypassing watcher notification. Test setup
    /// helper for snapshots that should look like pre-existing remote data.
    #[cfg(test)]
    pub(crate) fn seed(&self, path: &str, value: Value) {
        let mut state = self.lock();
        let segments = split_path(path);
        write_at(&mut state.root, &segments, value);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        // A poisoned tree is still the tree; recover rather than cascade
        // the panic into every later call.
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Deliver the current value at each watcher whose subtree overlaps the
    /// changed path, dropping watchers whose stream has gone away.
    fn notify(state: &mut MemoryState, changed: &[&str]) {
        let root = state.root.clone();
        state.watchers.retain(|watcher| {
            let watched: Vec<&str> = watcher.segments.iter().map(String::as_str).collect();
            if !paths_overlap(&watched, changed) {
                return true;
            }
            let snapshot = value_at(&root, &watched).clone();
            watcher.tx.send(snapshot).is_ok()
        });
    }
}

/// Whether a change at `changed` is visible from a watch on `watched`:
/// either path is an ancestor of (or equal to) the other.
fn paths_overlap(watched: &[&str], changed: &[&str]) -> bool {
    watched
        .iter()
        .zip(changed.iter())
        .all(|(left, right)| left == right)
}

#[async_trait]
impl RealtimeBackend for MemoryBackend {
    async fn get(&self, path: &str) -> Result<Value, BackendError> {
        let state = self.lock();
        Ok(value_at(&state.root, &split_path(path)).clone())
    }

    async fn set(&self, path: &str, value: Value) -> Result<(), BackendError> {
        let mut state = self.lock();
        let segments = split_path(path);
        write_at(&mut state.root, &segments, value);
        Self::notify(&mut state, &segments);
        Ok(())
    }

    async fn update(&self, path: &str, patch: Value) -> Result<(), BackendError> {
        let mut state = self.lock();
        let segments = split_path(path);
        merge_at(&mut state.root, &segments, patch);
        Self::notify(&mut state, &segments);
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<(), BackendError> {
        let mut state = self.lock();
        let segments = split_path(path);
        write_at(&mut state.root, &segments, Value::Null);
        Self::notify(&mut state, &segments);
        Ok(())
    }

    async fn watch(&self, path: &str) -> Result<WatchStream, BackendError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.lock();
        let segments = split_path(path);

        // Initial snapshot is delivered before the watcher is registered so
        // it always arrives first.
        let snapshot = value_at(&state.root, &segments).clone();
        let _ = tx.send(snapshot);

        debug!(path, "memory backend watch registered");
        state.watchers.push(Watcher {
            segments: segments.into_iter().map(str::to_string).collect(),
            tx,
        });
        Ok(WatchStream::new(rx))
    }
}

// ===========================================================================
// Tests
// ===========================================================================
