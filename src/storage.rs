//! Key-value persistence seam.
//!
//! [`KeyValueStorage`] is the raw string store the consumer provides
//! (browser local storage, a config file, a kv table). [`ScopedStorage`]
//! layers key prefixing and JSON encoding on top; storage failures are
//! logged and swallowed; persistence is best-effort and never fails an
//! operation.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

/// Raw string-keyed storage. Synchronous; implementations should not block.
pub trait KeyValueStorage: Send + Sync {
    fn put(&self, key: &str, value: String);
    fn get(&self, key: &str) -> Option<String>;
}

/// JSON codec plus key prefixing over a [`KeyValueStorage`].
///
/// Keys are written as `{prefix}.{key}` so multiple scopes can share one
/// backend without colliding.
#[derive(Clone)]
pub struct ScopedStorage {
    backend: Arc<dyn KeyValueStorage>,
    prefix: String,
}

impl ScopedStorage {
    pub fn new(backend: Arc<dyn KeyValueStorage>, prefix: impl Into<String>) -> Self {
        Self {
            backend,
            prefix: prefix.into(),
        }
    }

    fn scoped(&self, key: &str) -> String {
        format!("{}.{}", self.prefix, key)
    }

    /// Serialize and store a value. Encoding failures are swallowed.
    pub fn save<T: Serialize>(&self, key: &str, value: &T) {
        match serde_json::to_string(value) {
            Ok(json) => self.backend.put(&self.scoped(key), json),
            Err(error) => debug!(key, %error, "failed to encode stored value"),
        }
    }

    /// Load and deserialize a value. Missing or undecodable entries
    /// read as `None`.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.backend.get(&self.scoped(key))?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(error) => {
                debug!(key, %error, "discarding undecodable stored value");
                None
            }
        }
    }
}

/// In-memory [`KeyValueStorage`]. Default backend for tests and for
/// workspaces built without an explicit one.
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn put(&self, key: &str, value: String) {
        self.entries.lock().insert(key.to_owned(), value);
    }

    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }
}
