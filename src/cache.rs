//! TTL-bounded response cache with FIFO eviction.
//!
//! Expiry is lazy: an entry past its deadline is dropped when it is next
//! looked up. When full, the earliest-inserted key is evicted regardless of
//! how recently it was read.

use alloc::collections::VecDeque;
use alloc::sync::Arc;
use core::time::Duration;
use std::collections::HashMap;

use serde_json::Value;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Default time-to-live for cached responses.
pub(crate) const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Default maximum number of cached responses.
pub(crate) const DEFAULT_CAPACITY: usize = 1000;

/// Cache shared between tool invocations.
///
/// The lock is held only for a single lookup or insert, so two callers
/// missing on the same key may both go upstream.
pub(crate) type SharedCache = Arc<Mutex<ResponseCache>>;

/// A cached value and the instant it stops being valid.
#[derive(Debug, Clone)]
struct Entry {
    /// Cached JSON value.
    value: Value,
    /// Deadline after which the entry is treated as absent. `None` when the
    /// TTL runs past the clock's range.
    expires_at: Option<Instant>,
}

/// Fixed-capacity key/value store with per-entry expiry.
#[derive(Debug)]
pub(crate) struct ResponseCache {
    /// TTL applied by [`ResponseCache::set`].
    default_ttl: Duration,
    /// Maximum number of entries.
    capacity: usize,
    /// Live entries.
    entries: HashMap<String, Entry>,
    /// Keys in insertion order, oldest first.
    order: VecDeque<String>,
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl ResponseCache {
    /// Creates an empty cache with the default capacity.
    #[must_use]
    pub(crate) fn new(default_ttl: Duration) -> Self {
        Self::with_capacity(default_ttl, DEFAULT_CAPACITY)
    }

    /// Creates an empty cache holding at most `capacity` entries.
    #[must_use]
    pub(crate) fn with_capacity(default_ttl: Duration, capacity: usize) -> Self {
        Self {
            default_ttl,
            capacity: capacity.max(1),
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
        }
    }

    /// Wraps a new default cache for sharing across tasks.
    #[must_use]
    pub(crate) fn shared() -> SharedCache {
        Arc::new(Mutex::new(Self::default()))
    }

    /// Returns the cached value for `key`, or `None` if absent or expired.
    pub(crate) fn get(&mut self, key: &str) -> Option<Value> {
        let expired = match self.entries.get(key) {
            None => return None,
            Some(entry) => entry
                .expires_at
                .is_some_and(|deadline| Instant::now() >= deadline),
        };
        if expired {
            tracing::debug!(key, "cache entry expired");
            self.remove(key);
            return None;
        }
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    /// Stores `value` under `key` with the default TTL.
    pub(crate) fn set(&mut self, key: &str, value: Value) {
        self.set_with_ttl(key, value, self.default_ttl);
    }

    /// Stores `value` under `key`, valid for `ttl`.
    ///
    /// Overwriting an existing key keeps its place in the eviction order.
    pub(crate) fn set_with_ttl(&mut self, key: &str, value: Value, ttl: Duration) {
        let entry = Entry {
            value,
            expires_at: Instant::now().checked_add(ttl),
        };
        if let Some(existing) = self.entries.get_mut(key) {
            *existing = entry;
            return;
        }
        while self.entries.len() >= self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            tracing::debug!(key = %oldest, "evicting oldest cache entry");
            let _evicted = self.entries.remove(&oldest);
        }
        let _previous = self.entries.insert(key.to_owned(), entry);
        self.order.push_back(key.to_owned());
    }

    /// Removes every entry and returns how many were stored.
    pub(crate) fn clear(&mut self) -> usize {
        let removed = self.len();
        self.entries.clear();
        self.order.clear();
        removed
    }

    /// Number of stored entries, including expired ones not yet looked up.
    #[must_use]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Drops `key` from both the map and the insertion order.
    fn remove(&mut self, key: &str) {
        let _removed = self.entries.remove(key);
        self.order.retain(|queued| queued != key);
    }
}

#[cfg(test)]
#[allow(
    clippy::missing_docs_in_private_items,
    clippy::default_numeric_fallback,
    reason = "test code"
)]
mod tests {
    use core::time::Duration;

    use serde_json::json;

    use super::{DEFAULT_TTL, ResponseCache};

    #[tokio::test(start_paused = true)]
    async fn returns_value_before_expiry() {
        let mut cache = ResponseCache::new(Duration::from_secs(60));
        cache.set("/api/v1/currencies", json!({"data": []}));
        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(cache.get("/api/v1/currencies"), Some(json!({"data": []})));
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entry_is_absent_and_removed() {
        let mut cache = ResponseCache::new(Duration::from_secs(60));
        cache.set("key", json!(1));
        tokio::time::advance(Duration::from_secs(60)).await;
        assert_eq!(cache.get("key"), None);
        assert_eq!(cache.len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn per_entry_ttl_overrides_default() {
        let mut cache = ResponseCache::new(DEFAULT_TTL);
        cache.set_with_ttl("short", json!("a"), Duration::from_secs(5));
        cache.set("long", json!("b"));
        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(cache.get("short"), None);
        assert_eq!(cache.get("long"), Some(json!("b")));
    }

    #[tokio::test(start_paused = true)]
    async fn unbounded_ttl_never_expires() {
        let mut cache = ResponseCache::new(DEFAULT_TTL);
        cache.set_with_ttl("forever", json!("kept"), Duration::MAX);
        tokio::time::advance(Duration::from_secs(365 * 24 * 3600)).await;
        assert_eq!(cache.get("forever"), Some(json!("kept")));
    }

    #[tokio::test]
    async fn evicts_earliest_inserted_when_full() {
        let mut cache = ResponseCache::with_capacity(DEFAULT_TTL, 3);
        cache.set("a", json!(1));
        cache.set("b", json!(2));
        cache.set("c", json!(3));
        // Reads do not refresh position: eviction is FIFO, not LRU.
        assert_eq!(cache.get("a"), Some(json!(1)));
        cache.set("d", json!(4));
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), Some(json!(2)));
        assert_eq!(cache.get("c"), Some(json!(3)));
        assert_eq!(cache.get("d"), Some(json!(4)));
    }

    #[tokio::test]
    async fn overwrite_keeps_insertion_position() {
        let mut cache = ResponseCache::with_capacity(DEFAULT_TTL, 2);
        cache.set("a", json!(1));
        cache.set("b", json!(2));
        cache.set("a", json!(10));
        assert_eq!(cache.len(), 2);
        cache.set("c", json!(3));
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), Some(json!(2)));
    }

    #[tokio::test(start_paused = true)]
    async fn overwrite_refreshes_expiry() {
        let mut cache = ResponseCache::new(Duration::from_secs(10));
        cache.set("a", json!(1));
        tokio::time::advance(Duration::from_secs(8)).await;
        cache.set("a", json!(2));
        tokio::time::advance(Duration::from_secs(8)).await;
        assert_eq!(cache.get("a"), Some(json!(2)));
    }

    #[tokio::test]
    async fn clear_empties_cache() {
        let mut cache = ResponseCache::default();
        cache.set("a", json!(1));
        cache.set("b", json!(2));
        assert_eq!(cache.clear(), 2);
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.get("a"), None);
    }
}
