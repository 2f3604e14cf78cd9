//! LRU cache for dictionary token lookups.
//!
//! Keyed by the normalized input key (e.g. "ho2"), holding the tokens the
//! store returned for it. The cache is owned by the dictionary and only ever
//! invalidated explicitly, on reload or through `clear`.
use std::num::NonZeroUsize;

use lru::LruCache;

use crate::lexicon::TaiToken;

const DEFAULT_CAPACITY: NonZeroUsize = match NonZeroUsize::new(1000) {
    Some(n) => n,
    None => unreachable!(),
};

#[derive(Debug)]
pub struct TokenCache {
    cache: LruCache<String, Vec<TaiToken>>,
    hits: usize,
    misses: usize,
}

impl TokenCache {
    /// Create a cache holding at most `capacity` keys. A zero capacity falls
    /// back to the default of 1000.
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: LruCache::new(NonZeroUsize::new(capacity).unwrap_or(DEFAULT_CAPACITY)),
            hits: 0,
            misses: 0,
        }
    }

    /// Return the cached tokens for `key`, computing and storing them on a
    /// miss.
    pub fn get_or_insert_with<F>(&mut self, key: &str, compute: F) -> Vec<TaiToken>
    where
        F: FnOnce() -> Vec<TaiToken>,
    {
        if let Some(tokens) = self.cache.get(key) {
            self.hits += 1;
            return tokens.clone();
        }

        self.misses += 1;
        let tokens = compute();
        self.cache.put(key.to_string(), tokens.clone());
        tokens
    }

    /// Get cache statistics for monitoring.
    ///
    /// Returns (hits, misses) tuple.
    pub fn stats(&self) -> (usize, usize) {
        (self.hits, self.misses)
    }

    /// Get cache hit rate as a percentage (0.0 to 100.0).
    ///
    /// Returns None if no cache accesses have been made yet.
    pub fn hit_rate(&self) -> Option<f32> {
        let total = self.hits + self.misses;
        if total == 0 {
            None
        } else {
            Some((self.hits as f32 / total as f32) * 100.0)
        }
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.cache.cap().get()
    }

    /// Drop every entry and reset the counters.
    pub fn clear(&mut self) {
        self.cache.clear();
        self.hits = 0;
        self.misses = 0;
    }
}

impl Default for TokenCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY.get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(output: &str) -> TaiToken {
        TaiToken {
            output: output.to_string(),
            ..TaiToken::default()
        }
    }

    #[test]
    fn test_hits_and_misses() {
        let mut cache = TokenCache::new(4);
        assert_eq!(cache.hit_rate(), None);

        let first = cache.get_or_insert_with("ho", || vec![token("好")]);
        let second = cache.get_or_insert_with("ho", || panic!("should be cached"));
        assert_eq!(first, second);
        assert_eq!(cache.stats(), (1, 1));
        assert_eq!(cache.hit_rate(), Some(50.0));
    }

    #[test]
    fn test_evicts_least_recently_used() {
        let mut cache = TokenCache::new(2);
        cache.get_or_insert_with("a", Vec::new);
        cache.get_or_insert_with("b", Vec::new);
        cache.get_or_insert_with("a", Vec::new);
        cache.get_or_insert_with("c", Vec::new);
        assert_eq!(cache.len(), 2);

        // "b" was evicted, so this is a miss
        cache.get_or_insert_with("b", Vec::new);
        assert_eq!(cache.stats(), (1, 4));
    }

    #[test]
    fn test_clear_and_zero_capacity() {
        let mut cache = TokenCache::new(0);
        assert_eq!(cache.capacity(), 1000);
        cache.get_or_insert_with("a", Vec::new);
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.stats(), (0, 0));
    }
}
