//! Transport layer under the gateway: path-addressed JSON document
//! operations against the hosted realtime database.
//!
//! The [`RealtimeBackend`] trait is the pluggable seam. [`RestBackend`]
//! talks to the hosted database's REST dialect; [`MemoryBackend`] keeps the
//! same document tree in process for tests and local development. Paths are
//! slash-separated (`orders/abc123`); a document is any JSON value, and an
//! absent document reads as `null`.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::BackendError;

mod memory;
mod rest;

pub use memory::MemoryBackend;
pub use rest::RestBackend;

/// Path-addressed JSON document operations.
///
/// `set` replaces the document at a path, `update` shallow-merges the keys
/// of an object patch (a `null` patch value deletes that key), `remove`
/// deletes the document. `watch` delivers the full current value at the
/// path once immediately and again after every change, for as long as the
/// returned stream is held open.
#[async_trait]
pub trait RealtimeBackend: Send + Sync {
    async fn get(&self, path: &str) -> Result<Value, BackendError>;

    async fn set(&self, path: &str, value: Value) -> Result<(), BackendError>;

    async fn update(&self, path: &str, patch: Value) -> Result<(), BackendError>;

    async fn remove(&self, path: &str) -> Result<(), BackendError>;

    async fn watch(&self, path: &str) -> Result<WatchStream, BackendError>;

    /// New push-style document key: millisecond timestamp prefix plus a
    /// random tail, so keys generated later sort lexicographically after
    /// earlier ones. Purely client-side, no I/O.
    fn generate_key(&self) -> String {
        push_id(chrono::Utc::now().timestamp_millis())
    }
}

/// Live snapshot stream for one watched path. Dropping the stream ends the
/// subscription; the producing task notices on its next delivery attempt.
pub struct WatchStream {
    rx: mpsc::UnboundedReceiver<Value>,
}

impl WatchStream {
    pub(crate) fn new(rx: mpsc::UnboundedReceiver<Value>) -> Self {
        Self { rx }
    }

    /// Next snapshot, or `None` once the backend has stopped delivering.
    pub async fn next(&mut self) -> Option<Value> {
        self.rx.recv().await
    }
}

// ---------------------------------------------------------------------------
// Push-style keys
// ---------------------------------------------------------------------------

/// 64-character alphabet in ASCII order, so encoded timestamps sort the
/// same way the raw integers do.
const PUSH_ALPHABET: &[u8; 64] =
    b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";

const PUSH_TIMESTAMP_CHARS: usize = 8;
const PUSH_RANDOM_CHARS: usize = 12;

/// 20-character push id: 8 characters of encoded millisecond timestamp
/// followed by 12 random characters drawn from a fresh UUID.
pub(crate) fn push_id(now_ms: i64) -> String {
    let mut head = [0u8; PUSH_TIMESTAMP_CHARS];
    let mut ts = now_ms.max(0);
    for slot in head.iter_mut().rev() {
        *slot = PUSH_ALPHABET[(ts % 64) as usize];
        ts /= 64;
    }

    let mut id = String::with_capacity(PUSH_TIMESTAMP_CHARS + PUSH_RANDOM_CHARS);
    id.extend(head.iter().map(|&b| b as char));

    let random = uuid::Uuid::new_v4();
    for byte in &random.as_bytes()[..PUSH_RANDOM_CHARS] {
        id.push(PUSH_ALPHABET[(byte % 64) as usize] as char);
    }
    id
}

// ---------------------------------------------------------------------------
// Document tree helpers (shared by both backends)
// ---------------------------------------------------------------------------

static NULL: Value = Value::Null;

/// Split a slash path into segments, ignoring empty segments so `""`, `"/"`
/// and `"orders/"` all normalize cleanly.
pub(crate) fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// The value at `segments` under `root`, or `null` when the path does not
/// exist.
pub(crate) fn value_at<'v>(root: &'v Value, segments: &[&str]) -> &'v Value {
    let mut node = root;
    for segment in segments {
        match node.get(*segment) {
            Some(child) => node = child,
            None => return &NULL,
        }
    }
    node
}

/// Write `value` at `segments`, creating intermediate objects as needed.
/// Writing `null` deletes the entry, mirroring the remote database's
/// treatment of null as absence.
pub(crate) fn write_at(root: &mut Value, segments: &[&str], value: Value) {
    let Some((head, rest)) = segments.split_first() else {
        *root = value;
        return;
    };

    if value.is_null() && value_at(root, segments).is_null() {
        // Deleting something that is not there: no tree surgery needed.
        return;
    }

    if !root.is_object() {
        *root = Value::Object(serde_json::Map::new());
    }
    if let Value::Object(map) = root {
        if rest.is_empty() && value.is_null() {
            map.remove(*head);
            return;
        }
        let child = map.entry((*head).to_string()).or_insert(Value::Null);
        write_at(child, rest, value);
    }
}

/// Shallow-merge an object patch at `segments`: each top-level key of the
/// patch is written as a child of the target, null values deleting their
/// key. A non-object patch degrades to a plain write.
pub(crate) fn merge_at(root: &mut Value, segments: &[&str], patch: Value) {
    match patch {
        Value::Object(entries) => {
            for (key, value) in entries {
                let mut child: Vec<&str> = segments.to_vec();
                child.push(&key);
                write_at(root, &child, value);
            }
        }
        other => write_at(root, segments, other),
    }
}

// ===========================================================================
// Tests
// ===========================================================================
