use std::collections::HashMap;

use anyhow::{Context, Result};

use chrono::{DateTime, Duration, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::storage::KeyValueStore;

/// Cached data is fresh for 30 seconds by default.
pub const DEFAULT_TTL_SECS: i64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self::at(data, Utc::now())
    }

    pub fn at(data: T, cached_at: DateTime<Utc>) -> Self {
        Self { data, cached_at }
    }

    /// Age in whole seconds at `now`. Clock skew never yields a negative age.
    pub fn age_seconds(&self, now: DateTime<Utc>) -> i64 {
        (now - self.cached_at).num_seconds().max(0)
    }

    pub fn is_fresh(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        now - self.cached_at < ttl
    }

    pub fn age_display(&self, now: DateTime<Utc>) -> String {
        let seconds = self.age_seconds(now);
        if seconds < 5 {
            "just now".to_string()
        } else if seconds < 60 {
            format!("{}s ago", seconds)
        } else if seconds < 3600 {
            format!("{}m ago", seconds / 60)
        } else if seconds < 86_400 {
            format!("{}h ago", seconds / 3600)
        } else {
            format!("{}d ago", seconds / 86_400)
        }
    }
}

/// Result of a cache lookup
#[derive(Debug, Clone, PartialEq)]
pub struct CacheHit<T> {
    pub data: T,
    pub age_seconds: i64,
    pub is_fresh: bool,
}

/// String-keyed cache of `(value, timestamp)` pairs.
///
/// With a backing store every entry is also written through as a serialized
/// `CachedData`, so a later process sees the same `cached_at` and freshness
/// carries across runs.
pub struct TtlCache {
    ttl: Duration,
    entries: HashMap<String, CachedData<Value>>,
    backing: Option<Box<dyn KeyValueStore>>,
}

impl Default for TtlCache {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_TTL_SECS))
    }
}

impl TtlCache {
    /// A cache that lives only as long as this value
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
            backing: None,
        }
    }

    pub fn with_backing(ttl: Duration, backing: Box<dyn KeyValueStore>) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
            backing: Some(backing),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// In-memory entry, else whatever the backing store holds for `key`.
    fn entry(&self, key: &str) -> Option<CachedData<Value>> {
        if let Some(entry) = self.entries.get(key) {
            return Some(entry.clone());
        }
        let contents = match self.backing.as_ref()?.load(key) {
            Ok(contents) => contents?,
            Err(e) => {
                warn!(cache = key, error = %e, "Failed to read cache entry");
                return None;
            }
        };
        match serde_json::from_str(&contents) {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!(
                    cache = key,
                    error = %e,
                    "Stored cache entry is unreadable, treating as absent"
                );
                None
            }
        }
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<CacheHit<T>> {
        self.get_at(key, Utc::now())
    }

    /// Look up `key` as seen at `now`.
    /// An entry that no longer decodes as `T` is reported as absent.
    pub fn get_at<T: DeserializeOwned>(
        &self,
        key: &str,
        now: DateTime<Utc>,
    ) -> Option<CacheHit<T>> {
        let entry = self.entry(key)?;
        let age_seconds = entry.age_seconds(now);
        let is_fresh = entry.is_fresh(self.ttl, now);
        match serde_json::from_value::<T>(entry.data) {
            Ok(data) => Some(CacheHit {
                data,
                age_seconds,
                is_fresh,
            }),
            Err(e) => {
                debug!(cache = key, error = %e, "Cached value does not decode, treating as absent");
                None
            }
        }
    }

    pub fn set<T: Serialize>(&mut self, key: &str, data: &T) -> Result<()> {
        self.set_at(key, data, Utc::now())
    }

    /// Store `data` under `key` stamped with `timestamp`, replacing any prior entry.
    /// The in-memory entry is kept even when writing through fails.
    pub fn set_at<T: Serialize>(
        &mut self,
        key: &str,
        data: &T,
        timestamp: DateTime<Utc>,
    ) -> Result<()> {
        let entry = CachedData::at(serde_json::to_value(data)?, timestamp);
        let contents = match self.backing {
            Some(_) => Some(serde_json::to_string(&entry)?),
            None => None,
        };
        self.entries.insert(key.to_string(), entry);
        if let (Some(backing), Some(contents)) = (self.backing.as_mut(), contents) {
            backing
                .save(key, &contents)
                .with_context(|| format!("Failed to write cache entry {}", key))?;
        }
        Ok(())
    }

    /// Remove the given keys, or everything when `keys` is `None`.
    pub fn invalidate(&mut self, keys: Option<&[&str]>) {
        match keys {
            Some(keys) => {
                for key in keys {
                    if self.entries.remove(*key).is_some() {
                        debug!(cache = *key, "Invalidated cache entry");
                    }
                    if let Some(backing) = self.backing.as_mut() {
                        if let Err(e) = backing.remove(key) {
                            warn!(cache = *key, error = %e, "Failed to remove cache entry");
                        }
                    }
                }
            }
            None => {
                debug!(entries = self.entries.len(), "Cleared cache");
                self.entries.clear();
                if let Some(backing) = self.backing.as_mut() {
                    if let Err(e) = backing.clear() {
                        warn!(error = %e, "Failed to clear cache store");
                    }
                }
            }
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entry(key).is_some()
    }

    /// Human-readable age of an entry, if present
    pub fn age_display(&self, key: &str) -> Option<String> {
        self.entry(key).map(|e| e.age_display(Utc::now()))
    }
}

// ============================================================================
// Tests
// ============================================================================
