//! Per-key write serialization for mappings

use crate::models::MappingKey;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One async mutex per mapping key, created on demand and dropped when idle
#[derive(Debug, Default)]
pub struct KeyLocks {
    inner: Arc<DashMap<MappingKey, Arc<Mutex<()>>>>,
}

/// Holds a key lock; the map entry is released once no one else waits on it
pub struct KeyGuard {
    key: MappingKey,
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<DashMap<MappingKey, Arc<Mutex<()>>>>,
}

impl KeyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, key: &MappingKey) -> KeyGuard {
        // Clone the mutex out so no shard lock is held across the await
        let mutex = self
            .inner
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = mutex.lock_owned().await;
        KeyGuard {
            key: key.clone(),
            guard: Some(guard),
            locks: self.inner.clone(),
        }
    }

    /// Acquire several keys in sorted order so concurrent multi-key writers cannot deadlock
    pub async fn acquire_many(&self, keys: &[MappingKey]) -> Vec<KeyGuard> {
        let mut sorted: Vec<&MappingKey> = keys.iter().collect();
        sorted.sort();
        sorted.dedup();
        let mut guards = Vec::with_capacity(sorted.len());
        for key in sorted {
            guards.push(self.acquire(key).await);
        }
        guards
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Drop for KeyGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.locks
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}
