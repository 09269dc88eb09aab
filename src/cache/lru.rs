//! LRU cache of caption outcomes keyed by URL.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};

use lru::LruCache;
use reqwest::Url;
use tokio::sync::Mutex;

use crate::types::responses::{CacheInfo, CaptionOutcome};

/// Cache statistics.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Current number of entries.
    pub size: usize,

    /// Maximum capacity.
    pub capacity: usize,

    /// Number of cache hits.
    pub hits: u64,

    /// Number of cache misses.
    pub misses: u64,
}

impl CacheStats {
    /// Calculates the hit rate.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

impl From<CacheStats> for CacheInfo {
    fn from(stats: CacheStats) -> Self {
        Self {
            current_items: stats.size,
            max_items: stats.capacity,
            hits: stats.hits,
            misses: stats.misses,
            hit_rate: stats.hit_rate(),
        }
    }
}

/// Process-local LRU cache from URL to [`CaptionOutcome`].
///
/// Failed outcomes are stored exactly like successful ones, so a broken URL
/// is not fetched again until it is evicted or the cache is cleared. Entries
/// never expire by time.
///
/// All access goes through one mutex; nothing inside it awaits or does I/O.
pub struct ResultCache {
    entries: Mutex<LruCache<String, CaptionOutcome>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResultCache {
    /// Creates a cache holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(cap)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Cache key for a URL: its normalized serialization.
    pub fn cache_key(url: &Url) -> String {
        url.as_str().to_string()
    }

    /// Looks up an outcome, refreshing its recency on a hit.
    pub async fn get(&self, url: &str) -> Option<CaptionOutcome> {
        let found = self.entries.lock().await.get(url).cloned();

        match found {
            Some(outcome) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(outcome)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Reads an entry without touching recency or counters.
    pub async fn peek(&self, url: &str) -> Option<CaptionOutcome> {
        self.entries.lock().await.peek(url).cloned()
    }

    /// Inserts or replaces an outcome, marking it most recently used.
    ///
    /// Returns the URL evicted to make room, if any.
    pub async fn put(&self, url: impl Into<String>, outcome: CaptionOutcome) -> Option<String> {
        let url = url.into();
        let mut entries = self.entries.lock().await;

        match entries.push(url.clone(), outcome) {
            Some((evicted, _)) if evicted != url => {
                tracing::debug!(evicted = %evicted, "Evicted least recently used entry");
                Some(evicted)
            }
            _ => None,
        }
    }

    /// Removes every entry and returns how many were removed.
    pub async fn clear(&self) -> usize {
        let mut entries = self.entries.lock().await;
        let removed = entries.len();
        entries.clear();
        removed
    }

    /// Current number of entries.
    pub async fn size(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Maximum number of entries.
    pub async fn capacity(&self) -> usize {
        self.entries.lock().await.cap().get()
    }

    /// Returns cache statistics.
    pub async fn stats(&self) -> CacheStats {
        let (size, capacity) = {
            let entries = self.entries.lock().await;
            (entries.len(), entries.cap().get())
        };

        CacheStats {
            size,
            capacity,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(caption: &str) -> CaptionOutcome {
        CaptionOutcome::new(Some(caption.to_string()), 0.5)
    }

    #[tokio::test]
    async fn test_cache_hit() {
        let cache = ResultCache::new(10);
        cache.put("https://a.example/1.jpg", ok("a cat")).await;

        let cached = cache.get("https://a.example/1.jpg").await;
        assert_eq!(cached.unwrap().caption.as_deref(), Some("a cat"));

        let stats = cache.stats().await;
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 0);
    }

    #[tokio::test]
    async fn test_cache_miss() {
        let cache = ResultCache::new(10);

        assert!(cache.get("https://nowhere.example/").await.is_none());

        let stats = cache.stats().await;
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test]
    async fn test_failures_are_cached() {
        let cache = ResultCache::new(10);
        cache
            .put("https://bad.example/x.jpg", CaptionOutcome::failure(0.2))
            .await;

        let cached = cache.get("https://bad.example/x.jpg").await.unwrap();
        assert!(!cached.success);
        assert!(cached.caption.is_none());
        assert_eq!(cached.elapsed_seconds, 0.2);
    }

    #[tokio::test]
    async fn test_lru_eviction_respects_access() {
        let cache = ResultCache::new(2);

        cache.put("key1", ok("one")).await;
        cache.put("key2", ok("two")).await;
        // key1 becomes most recently used; key2 is now the eviction candidate
        assert!(cache.get("key1").await.is_some());

        let evicted = cache.put("key3", ok("three")).await;
        assert_eq!(evicted.as_deref(), Some("key2"));

        assert!(cache.peek("key1").await.is_some());
        assert!(cache.peek("key2").await.is_none());
        assert!(cache.peek("key3").await.is_some());
        assert_eq!(cache.size().await, 2);
    }

    #[tokio::test]
    async fn test_put_replaces_without_eviction() {
        let cache = ResultCache::new(1);

        cache.put("key", ok("first")).await;
        let evicted = cache.put("key", ok("second")).await;

        assert!(evicted.is_none());
        assert_eq!(
            cache.peek("key").await.unwrap().caption.as_deref(),
            Some("second")
        );
    }

    #[tokio::test]
    async fn test_clear_reports_removed() {
        let cache = ResultCache::new(10);
        cache.put("key1", ok("one")).await;
        cache.put("key2", ok("two")).await;

        assert_eq!(cache.clear().await, 2);
        assert_eq!(cache.size().await, 0);
        assert_eq!(cache.clear().await, 0);
    }

    #[tokio::test]
    async fn test_zero_capacity_falls_back_to_one() {
        let cache = ResultCache::new(0);
        assert_eq!(cache.capacity().await, 1);
    }

    #[tokio::test]
    async fn test_stats_into_cache_info() {
        let cache = ResultCache::new(10);
        cache.put("key1", ok("one")).await;

        cache.get("key1").await;
        cache.get("key2").await;
        cache.get("key1").await;

        let info: CacheInfo = cache.stats().await.into();
        assert_eq!(info.current_items, 1);
        assert_eq!(info.max_items, 10);
        assert_eq!(info.hits, 2);
        assert_eq!(info.misses, 1);
        assert!((info.hit_rate - 0.666).abs() < 0.01);
    }

    #[test]
    fn test_cache_key_is_normalized_url() {
        let url = Url::parse("HTTPS://Images.Example.com/a.jpg").unwrap();
        assert_eq!(ResultCache::cache_key(&url), "https://images.example.com/a.jpg");
    }
}
