use crate::{Store, StoreError, StoreResult};
use hashbrown::HashMap;
use lru::LruCache;
use mpt_config::DEFAULT_CACHE_CAPACITY;
use parking_lot::Mutex;
use std::num::NonZeroUsize;

/// Cache statistics for monitoring performance
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Writes and removals not yet flushed to the delegate
    pub pending: usize,
    pub cached: usize,
    pub capacity: usize,
}

impl CacheStats {
    /// Calculate hit ratio
    pub fn hit_ratio(&self) -> f64 {
        if self.hits + self.misses == 0 {
            0.0
        } else {
            self.hits as f64 / (self.hits + self.misses) as f64
        }
    }
}

struct CacheState {
    /// `None` marks a pending removal
    pending: HashMap<Vec<u8>, Option<Vec<u8>>>,
    clean: LruCache<Vec<u8>, Vec<u8>>,
    hits: u64,
    misses: u64,
}

/// Write-back store over a delegate.
///
/// Writes and removals are buffered until [`Store::flush`]; reads observe the
/// buffered state first, then a bounded LRU cache of clean entries, then the
/// delegate.
pub struct CachedStore<S> {
    delegate: S,
    state: Mutex<CacheState>,
}

impl<S: Store> CachedStore<S> {
    /// Creates a cached store with the default read cache capacity.
    pub fn new(delegate: S) -> Self {
        let capacity = NonZeroUsize::new(DEFAULT_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN);
        Self::build(delegate, capacity)
    }

    /// Creates a cached store holding at most `capacity` clean entries.
    pub fn with_capacity(delegate: S, capacity: usize) -> StoreResult<Self> {
        let capacity = NonZeroUsize::new(capacity).ok_or_else(|| {
            StoreError::InvalidConfig("cache capacity must be positive".to_string())
        })?;
        Ok(Self::build(delegate, capacity))
    }

    fn build(delegate: S, capacity: NonZeroUsize) -> Self {
        Self {
            delegate,
            state: Mutex::new(CacheState {
                pending: HashMap::new(),
                clean: LruCache::new(capacity),
                hits: 0,
                misses: 0,
            }),
        }
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        CacheStats {
            hits: state.hits,
            misses: state.misses,
            pending: state.pending.len(),
            cached: state.clean.len(),
            capacity: state.clean.cap().get(),
        }
    }

    /// Drops buffered writes without applying them.
    pub fn discard(&self) {
        self.state.lock().pending.clear();
    }

    pub fn delegate(&self) -> &S {
        &self.delegate
    }
}

impl<S: Store> Store for CachedStore<S> {
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        if let Some(entry) = state.pending.get(key) {
            let entry = entry.clone();
            state.hits += 1;
            return Ok(entry);
        }
        if let Some(value) = state.clean.get(key) {
            let value = value.clone();
            state.hits += 1;
            return Ok(Some(value));
        }
        state.misses += 1;
        let value = self.delegate.get(key)?;
        if let Some(value) = &value {
            state.clean.put(key.to_vec(), value.clone());
        }
        Ok(value)
    }

    fn set(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        let mut state = self.state.lock();
        state.clean.pop(key);
        state.pending.insert(key.to_vec(), Some(value.to_vec()));
        Ok(())
    }

    fn remove(&self, key: &[u8]) -> StoreResult<()> {
        let mut state = self.state.lock();
        state.clean.pop(key);
        state.pending.insert(key.to_vec(), None);
        Ok(())
    }

    fn flush(&self) -> StoreResult<()> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let count = state.pending.len();
        let mut pending = std::mem::take(&mut state.pending).into_iter();
        while let Some((key, entry)) = pending.next() {
            let applied = match &entry {
                Some(value) => self.delegate.set(&key, value),
                None => self.delegate.remove(&key),
            };
            if let Err(err) = applied {
                // Keep everything not yet applied for the next flush
                state.pending.insert(key, entry);
                state.pending.extend(pending);
                return Err(err);
            }
            if let Some(value) = entry {
                state.clean.put(key, value);
            }
        }
        drop(guard);
        log::trace!("flushed {} buffered entries", count);
        self.delegate.flush()
    }
}

impl<S> std::fmt::Debug for CachedStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("CachedStore")
            .field("pending", &state.pending.len())
            .field("cached", &state.clean.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use std::sync::Arc;

    #[test]
    fn test_writes_buffered_until_flush() {
        let memory = Arc::new(MemoryStore::new());
        let store = CachedStore::new(memory.clone());

        store.set(b"a", b"1").unwrap();
        assert_eq!(store.get(b"a").unwrap(), Some(b"1".to_vec()));
        assert_eq!(memory.get(b"a").unwrap(), None);
        assert_eq!(store.stats().pending, 1);

        store.flush().unwrap();
        assert_eq!(memory.get(b"a").unwrap(), Some(b"1".to_vec()));
        assert_eq!(store.stats().pending, 0);
    }

    #[test]
    fn test_tombstone_hides_delegate_value() {
        let memory = Arc::new(MemoryStore::new());
        memory.set(b"a", b"1").unwrap();
        let store = CachedStore::new(memory.clone());

        store.remove(b"a").unwrap();
        assert_eq!(store.get(b"a").unwrap(), None);
        assert!(!store.contains_key(b"a").unwrap());
        assert!(memory.contains_key(b"a").unwrap());

        store.flush().unwrap();
        assert!(!memory.contains_key(b"a").unwrap());
    }

    #[test]
    fn test_discard_drops_pending() {
        let memory = Arc::new(MemoryStore::new());
        let store = CachedStore::new(memory.clone());
        store.set(b"a", b"1").unwrap();
        store.discard();
        store.flush().unwrap();
        assert!(memory.is_empty());
    }

    #[test]
    fn test_read_cache_stats() {
        let memory = Arc::new(MemoryStore::new());
        memory.set(b"a", b"1").unwrap();
        let store = CachedStore::with_capacity(memory, 2).unwrap();

        assert_eq!(store.get(b"a").unwrap(), Some(b"1".to_vec()));
        assert_eq!(store.get(b"a").unwrap(), Some(b"1".to_vec()));
        assert_eq!(store.get(b"zzz").unwrap(), None);

        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.cached, 1);
        assert_eq!(stats.capacity, 2);
        assert!((stats.hit_ratio() - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let result = CachedStore::with_capacity(MemoryStore::new(), 0);
        assert!(matches!(result, Err(StoreError::InvalidConfig(_))));
    }
}
