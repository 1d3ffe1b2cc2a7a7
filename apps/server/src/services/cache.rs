//! Read-through cache keyed by snapshot generation.
//!
//! Entries from an older generation are never returned, so no invalidation is
//! needed on writes; stale entries age out of the LRU.

use lru::LruCache;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

pub struct GenerationCache<K, V> {
    inner: Mutex<LruCache<(u64, K), Arc<V>>>,
}

impl<K: Hash + Eq, V> GenerationCache<K, V> {
    /// A capacity of zero is treated as one
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn get(&self, generation: u64, key: K) -> Option<Arc<V>> {
        let mut cache = self.inner.lock().ok()?;
        cache.get(&(generation, key)).cloned()
    }

    pub fn insert(&self, generation: u64, key: K, value: V) -> Arc<V> {
        let value = Arc::new(value);
        if let Ok(mut cache) = self.inner.lock() {
            cache.put((generation, key), value.clone());
        }
        value
    }

    /// Return the cached value or compute, store and return it
    pub fn get_or_try_insert<E>(
        &self,
        generation: u64,
        key: K,
        compute: impl FnOnce() -> Result<V, E>,
    ) -> Result<Arc<V>, E>
    where
        K: Clone,
    {
        if let Some(hit) = self.get(generation, key.clone()) {
            return Ok(hit);
        }
        let value = compute()?;
        Ok(self.insert(generation, key, value))
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newer_generation_misses() {
        let cache: GenerationCache<&str, u32> = GenerationCache::new(4);
        cache.insert(1, "a", 10);
        assert_eq!(cache.get(1, "a").as_deref(), Some(&10));
        assert!(cache.get(2, "a").is_none());
    }

    #[test]
    fn computes_once_per_generation() {
        let cache: GenerationCache<u8, u8> = GenerationCache::new(4);
        let mut calls = 0;
        for _ in 0..3 {
            let v = cache
                .get_or_try_insert(7, 1, || {
                    calls += 1;
                    Ok::<_, ()>(42)
                })
                .unwrap();
            assert_eq!(*v, 42);
        }
        assert_eq!(calls, 1);
    }
}
