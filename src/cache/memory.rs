//! Memory tier: bounded LRU caches keyed by file path
//!
//! Each cache sits behind its own mutex so the three tiers never contend
//! with each other. `LruCache::get` updates recency, which needs `&mut`,
//! so a plain mutex is used rather than a read/write lock.

use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::Mutex;

use super::types::{CacheEntry, FileMetadataEntry, OutlineEntry};
use crate::config::CacheConfig;

/// Thread-safe LRU cache keyed by path
pub struct BoundedCache<V> {
    inner: Mutex<LruCache<String, V>>,
}

impl<V: Clone> BoundedCache<V> {
    /// Create a cache holding at most `capacity` entries (minimum one)
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruCache::new(cap)),
        }
    }

    /// Get a copy of the value and mark it most recently used
    pub fn get(&self, key: &str) -> Option<V> {
        self.inner.lock().get(key).cloned()
    }

    /// Get a copy of the value without touching recency
    pub fn peek(&self, key: &str) -> Option<V> {
        self.inner.lock().peek(key).cloned()
    }

    /// Insert a value, evicting the least recently used entry when full.
    ///
    /// Returns the evicted `(key, value)` pair, if any. Replacing an
    /// existing key is not an eviction.
    pub fn put(&self, key: String, value: V) -> Option<(String, V)> {
        self.inner.lock().push(key.clone(), value).filter(|(old, _)| *old != key)
    }

    pub fn remove(&self, key: &str) -> Option<V> {
        self.inner.lock().pop(key)
    }

    /// Remove the entry only if `predicate` holds for its current value
    pub fn remove_if(&self, key: &str, predicate: impl FnOnce(&V) -> bool) -> Option<V> {
        let mut cache = self.inner.lock();
        match cache.peek(key) {
            Some(value) if predicate(value) => cache.pop(key),
            _ => None,
        }
    }

    pub fn evict_all(&self) {
        self.inner.lock().clear();
    }

    /// Copy of all entries, most recently used first
    pub fn snapshot(&self) -> Vec<(String, V)> {
        self.inner
            .lock()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.lock().contains(key)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().cap().get()
    }
}

/// The three independent memory caches
pub struct MemoryTier {
    pub content: BoundedCache<CacheEntry>,
    pub metadata: BoundedCache<FileMetadataEntry>,
    pub outline: BoundedCache<OutlineEntry>,
}

impl MemoryTier {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            content: BoundedCache::new(config.max_content_entries),
            metadata: BoundedCache::new(config.max_metadata_entries),
            outline: BoundedCache::new(config.max_outline_entries),
        }
    }

    /// Evict every entry from all three caches
    pub fn evict_all(&self) {
        self.content.evict_all();
        self.metadata.evict_all();
        self.outline.evict_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::types::HeadingItem;

    fn metadata(path: &str) -> FileMetadataEntry {
        FileMetadataEntry {
            path: path.to_string(),
            name: path.trim_start_matches('/').to_string(),
            size: 1,
            last_modified: 0,
            is_markdown: true,
            content_preview: None,
        }
    }

    #[test]
    fn test_evicts_least_recently_used() {
        let cache = BoundedCache::new(2);
        cache.put("/a".to_string(), 1);
        cache.put("/b".to_string(), 2);

        // Touch /a so /b becomes least recently used
        assert_eq!(cache.get("/a"), Some(1));

        let evicted = cache.put("/c".to_string(), 3);
        assert_eq!(evicted, Some(("/b".to_string(), 2)));
        assert!(cache.contains("/a"));
        assert!(!cache.contains("/b"));
        assert!(cache.contains("/c"));
    }

    #[test]
    fn test_replace_is_not_eviction() {
        let cache = BoundedCache::new(1);
        assert_eq!(cache.put("/a".to_string(), 1), None);
        assert_eq!(cache.put("/a".to_string(), 2), None);
        assert_eq!(cache.get("/a"), Some(2));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_zero_capacity_becomes_one() {
        let cache: BoundedCache<u8> = BoundedCache::new(0);
        assert_eq!(cache.capacity(), 1);
    }

    #[test]
    fn test_remove_if() {
        let cache = BoundedCache::new(4);
        cache.put("/a".to_string(), 10);

        assert_eq!(cache.remove_if("/a", |v| *v > 10), None);
        assert!(cache.contains("/a"));
        assert_eq!(cache.remove_if("/a", |v| *v == 10), Some(10));
        assert!(cache.is_empty());
        assert_eq!(cache.remove_if("/missing", |_| true), None);
    }

    #[test]
    fn test_snapshot_does_not_touch_recency() {
        let cache = BoundedCache::new(2);
        cache.put("/a".to_string(), 1);
        cache.put("/b".to_string(), 2);

        let snapshot = cache.snapshot();
        assert_eq!(snapshot, vec![("/b".to_string(), 2), ("/a".to_string(), 1)]);

        // /a is still the eviction candidate
        cache.put("/c".to_string(), 3);
        assert!(!cache.contains("/a"));
    }

    #[test]
    fn test_tiers_are_independent() {
        let config = CacheConfig {
            max_content_entries: 1,
            max_metadata_entries: 2,
            max_outline_entries: 1,
            ..CacheConfig::default()
        };
        let tier = MemoryTier::new(&config);

        tier.outline.put(
            "/a".to_string(),
            vec![HeadingItem { level: 1, text: "A".to_string(), position: 0 }],
        );
        for path in ["/a", "/b", "/c"] {
            tier.metadata.put(path.to_string(), metadata(path));
        }

        assert_eq!(tier.metadata.len(), 2);
        assert!(tier.outline.contains("/a"));
        assert_eq!(tier.metadata.capacity(), 2);

        tier.evict_all();
        assert!(tier.content.is_empty());
        assert!(tier.metadata.is_empty());
        assert!(tier.outline.is_empty());
    }
}
