//! Semantic Cache
//!
//! Remembers the last answer for a normalized prompt. Never authoritative:
//! a miss or an expired entry always falls through to a live model call.

use std::fmt;
use std::time::Duration;

use moka::sync::Cache;

/// Default time-to-live for cached answers
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

/// Upper bound on remembered prompts
pub const DEFAULT_CAPACITY: u64 = 1_024;

/// In-memory prompt to answer cache with a fixed TTL
pub struct SemanticCache {
    ttl: Duration,
    entries: Cache<String, String>,
}

impl Default for SemanticCache {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SemanticCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SemanticCache")
            .field("ttl", &self.ttl)
            .field("entries", &self.entries.entry_count())
            .finish()
    }
}

impl SemanticCache {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self::with_limits(ttl, DEFAULT_CAPACITY)
    }

    pub fn with_limits(ttl: Duration, max_capacity: u64) -> Self {
        Self {
            ttl,
            entries: Cache::builder()
                .time_to_live(ttl)
                .max_capacity(max_capacity)
                .build(),
        }
    }

    /// Lower-cased, trimmed cache key
    pub fn normalize(query: &str) -> String {
        query.trim().to_lowercase()
    }

    /// Cached answer for `query` if present and younger than the TTL
    pub fn lookup(&self, query: &str) -> Option<String> {
        self.entries.get(&Self::normalize(query))
    }

    pub fn store(&self, query: &str, response: impl Into<String>) {
        self.entries.insert(Self::normalize(query), response.into());
    }

    /// Live entries after pending evictions have been applied
    pub fn len(&self) -> u64 {
        self.entries.run_pending_tasks();
        self.entries.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_lookup() {
        let cache = SemanticCache::new();
        cache.store("  Explain the Caching Layer ", "It is an LRU.");
        assert_eq!(
            cache.lookup("explain the caching layer").as_deref(),
            Some("It is an LRU.")
        );
        assert!(cache.lookup("explain the cache").is_none());
    }

    #[test]
    fn test_expired_entries_miss() {
        let cache = SemanticCache::with_ttl(Duration::from_millis(1));
        cache.store("q", "a");
        std::thread::sleep(Duration::from_millis(20));
        assert!(cache.lookup("q").is_none());
    }

    #[test]
    fn test_expired_entries_are_evicted() {
        let cache = SemanticCache::with_ttl(Duration::from_millis(1));
        for i in 0..200 {
            cache.store(&format!("prompt {i}"), "answer");
        }
        std::thread::sleep(Duration::from_millis(20));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_capacity_is_bounded() {
        let cache = SemanticCache::with_limits(DEFAULT_TTL, 16);
        for i in 0..500 {
            cache.store(&format!("prompt {i}"), "answer");
        }
        assert!(cache.len() <= 16);
    }

    #[test]
    fn test_store_overwrites() {
        let cache = SemanticCache::new();
        cache.store("q", "first");
        cache.store("Q", "second");
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.lookup("q").as_deref(), Some("second"));
    }
}
