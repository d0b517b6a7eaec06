//! Local key-value persistence.
//!
//! The lifecycle store saves the whole request collection as one JSON string
//! under a fixed key, and the TTL cache writes its entries through to a
//! second store so they survive between runs. `FileStore` keeps one file per
//! key in a directory; `MemoryStore` keeps everything in process.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use tracing::debug;

/// Application name used for data and cache directory paths
const APP_NAME: &str = "leavedesk";

pub trait KeyValueStore {
    fn load(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value under `key` as a whole
    fn save(&mut self, key: &str, value: &str) -> Result<()>;

    /// Delete `key`. A missing key is not an error.
    fn remove(&mut self, key: &str) -> Result<()>;

    fn clear(&mut self) -> Result<()>;
}

pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create data directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    /// Store under the platform data directory (`~/.local/share/leavedesk` on Linux)
    pub fn default_location() -> Result<Self> {
        let data_dir =
            dirs::data_dir().ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Self::new(data_dir.join(APP_NAME))
    }

    /// Store under the platform cache directory (`~/.cache/leavedesk` on Linux)
    pub fn cache_location() -> Result<Self> {
        let cache_dir =
            dirs::cache_dir().ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Self::new(cache_dir.join(APP_NAME))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let path = self.path(key);
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read storage file: {}", key))?;
        Ok(Some(contents))
    }

    fn save(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.path(key);
        // Write beside the target, then rename over it
        let tmp = self.dir.join(format!("{}.json.tmp", key));
        std::fs::write(&tmp, value)
            .with_context(|| format!("Failed to write storage file: {}", key))?;
        std::fs::rename(&tmp, &path)
            .with_context(|| format!("Failed to replace storage file: {}", key))?;
        debug!(key = key, bytes = value.len(), "Saved storage file");
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let path = self.path(key);
        if path.exists() {
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to remove storage file: {}", key))?;
            debug!(key = key, "Removed storage file");
        }
        Ok(())
    }

    /// Removes every `*.json` file in the directory; anything else is left alone.
    fn clear(&mut self) -> Result<()> {
        let entries = std::fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to list {}", self.dir.display()))?;
        for entry in entries {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                std::fs::remove_file(&path)
                    .with_context(|| format!("Failed to remove {}", path.display()))?;
            }
        }
        Ok(())
    }
}

/// In-process store. Clones share the same map.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| anyhow::anyhow!("Memory store lock poisoned"))
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &str) -> Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.lock()?.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path().join("nested")).unwrap();

        assert_eq!(store.load("requests").unwrap(), None);

        store.save("requests", "[1]").unwrap();
        store.save("requests", "[1,2]").unwrap();
        assert_eq!(store.load("requests").unwrap().as_deref(), Some("[1,2]"));
        assert!(!store.dir().join("requests.json.tmp").exists());
    }

    #[test]
    fn test_file_store_remove_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path().to_path_buf()).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "keep").unwrap();

        store.save("requests", "[]").unwrap();
        store.save("notifications", "[]").unwrap();
        store.remove("requests").unwrap();
        store.remove("requests").unwrap();
        assert_eq!(store.load("requests").unwrap(), None);
        assert!(store.load("notifications").unwrap().is_some());

        store.clear().unwrap();
        assert_eq!(store.load("notifications").unwrap(), None);
        assert!(dir.path().join("notes.txt").exists());
    }

    #[test]
    fn test_memory_store_clones_share_state() {
        let mut store = MemoryStore::new();
        let observer = store.clone();

        store.save("k", "v").unwrap();
        assert_eq!(observer.load("k").unwrap().as_deref(), Some("v"));
        assert_eq!(observer.load("missing").unwrap(), None);

        store.remove("k").unwrap();
        assert_eq!(observer.load("k").unwrap(), None);
    }
}
