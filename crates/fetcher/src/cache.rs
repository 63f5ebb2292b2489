//! TTL-bounded response cache.
//!
//! Entries live for the lifetime of the owning [`FetchClient`]; there is
//! no eviction beyond TTL expiry because the key space (endpoint x
//! parameter set) is small for a collector run.

use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::time::{Duration, Instant};

struct CacheEntry {
    fetched_at: Instant,
    payload: Value,
}

/// In-process response cache keyed by canonical request URL
pub struct ResponseCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl ResponseCache {
    /// Create a cache with the given TTL. A zero TTL disables caching.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    /// Return the cached payload if present and still fresh
    pub fn get(&self, key: &str) -> Option<Value> {
        if !self.enabled() {
            return None;
        }
        let entries = self.entries.read();
        let entry = entries.get(key)?;
        if entry.fetched_at.elapsed() < self.ttl {
            Some(entry.payload.clone())
        } else {
            None
        }
    }

    pub fn insert(&self, key: String, payload: Value) {
        if !self.enabled() {
            return;
        }
        self.entries.write().insert(
            key,
            CacheEntry {
                fetched_at: Instant::now(),
                payload,
            },
        );
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fresh_entry_is_returned() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        cache.insert("k".to_string(), json!({"a": 1}));
        assert_eq!(cache.get("k"), Some(json!({"a": 1})));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_zero_ttl_disables_cache() {
        let cache = ResponseCache::new(Duration::ZERO);
        assert!(!cache.enabled());
        cache.insert("k".to_string(), json!(1));
        assert_eq!(cache.get("k"), None);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_expired_entry_is_ignored() {
        let cache = ResponseCache::new(Duration::from_nanos(1));
        cache.insert("k".to_string(), json!(1));
        std::thread::sleep(Duration::from_millis(1));
        assert_eq!(cache.get("k"), None);
    }
}
