use crate::{Store, StoreResult};
use hashbrown::HashSet;
use parking_lot::Mutex;

/// A store whose `remove` only records the key.
///
/// Trie disposal removes the hash entry of every superseded node. Layering
/// this store underneath keeps those entries readable, so every root committed
/// through it can still be reverted to. Recorded keys are physically removed by
/// [`NoDeleteStore::compact`].
#[derive(Debug)]
pub struct NoDeleteStore<S> {
    delegate: S,
    removed: Mutex<HashSet<Vec<u8>>>,
}

impl<S: Store> NoDeleteStore<S> {
    pub fn new(delegate: S) -> Self {
        Self {
            delegate,
            removed: Mutex::new(HashSet::new()),
        }
    }

    /// Number of keys awaiting compaction
    pub fn removed_count(&self) -> usize {
        self.removed.lock().len()
    }

    pub fn is_removed(&self, key: &[u8]) -> bool {
        self.removed.lock().contains(key)
    }

    /// Deletes every recorded key from the delegate and returns how many were
    /// deleted.
    pub fn compact(&self) -> StoreResult<usize> {
        let keys: Vec<Vec<u8>> = self.removed.lock().drain().collect();
        for key in &keys {
            self.delegate.remove(key)?;
        }
        log::debug!("compacted {} removed entries", keys.len());
        Ok(keys.len())
    }

    pub fn delegate(&self) -> &S {
        &self.delegate
    }
}

impl<S: Store> Store for NoDeleteStore<S> {
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        self.delegate.get(key)
    }

    fn set(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        self.removed.lock().remove(key);
        self.delegate.set(key, value)
    }

    fn remove(&self, key: &[u8]) -> StoreResult<()> {
        if self.delegate.contains_key(key)? {
            self.removed.lock().insert(key.to_vec());
        }
        Ok(())
    }

    fn contains_key(&self, key: &[u8]) -> StoreResult<bool> {
        self.delegate.contains_key(key)
    }

    fn flush(&self) -> StoreResult<()> {
        self.delegate.flush()
    }
}
