//! Key-value storage backends for the durable cache.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use serde_json::Value;
use tracing::{debug, warn};

/// Durable key-value store the cache layer persists through.
///
/// Keys are plain strings, values arbitrary JSON. Writes are
/// fire-and-forget: implementations log failures instead of surfacing
/// them, so a broken disk degrades to a cold cache rather than an error.
pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&self, key: &str, value: Value);
}

/// File-backed store: one pretty-printed JSON file per key.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl Storage for FileStore {
    fn get(&self, key: &str) -> Option<Value> {
        let path = self.path_for(key);
        if !path.exists() {
            return None;
        }

        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) => {
                debug!(key, error = %e, "Failed to read cache file");
                return None;
            }
        };

        match serde_json::from_str(&contents) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!(key, error = %e, "Failed to parse cache file");
                None
            }
        }
    }

    fn set(&self, key: &str, value: Value) {
        let path = self.path_for(key);
        let contents = match serde_json::to_string_pretty(&value) {
            Ok(contents) => contents,
            Err(e) => {
                warn!(key, error = %e, "Failed to serialize cache value");
                return;
            }
        };
        if let Err(e) = std::fs::write(&path, contents) {
            warn!(key, error = %e, "Failed to write cache file");
        }
    }
}

/// In-memory store for tests and ephemeral sessions.
/// Clones share the same underlying map.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value);
        }
    }
}
