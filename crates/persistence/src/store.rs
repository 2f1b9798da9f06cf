//! The store contract consumed by the trie.

use crate::StoreResult;
use std::sync::Arc;

/// A byte-keyed, byte-valued map.
///
/// The trie relies on point lookups and overwrite-on-set only; no ordering,
/// iteration or transactional semantics are assumed. Methods take `&self` so a
/// single store can be shared between a writer and any number of readers.
pub trait Store: Send + Sync {
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>>;

    fn set(&self, key: &[u8], value: &[u8]) -> StoreResult<()>;

    /// Removes `key`. Removing an absent key is not an error.
    fn remove(&self, key: &[u8]) -> StoreResult<()>;

    fn contains_key(&self, key: &[u8]) -> StoreResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Durability barrier.
    fn flush(&self) -> StoreResult<()>;
}

impl<T: Store + ?Sized> Store for Arc<T> {
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn set(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &[u8]) -> StoreResult<()> {
        (**self).remove(key)
    }

    fn contains_key(&self, key: &[u8]) -> StoreResult<bool> {
        (**self).contains_key(key)
    }

    fn flush(&self) -> StoreResult<()> {
        (**self).flush()
    }
}

impl<T: Store + ?Sized> Store for Box<T> {
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn set(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &[u8]) -> StoreResult<()> {
        (**self).remove(key)
    }

    fn contains_key(&self, key: &[u8]) -> StoreResult<bool> {
        (**self).contains_key(key)
    }

    fn flush(&self) -> StoreResult<()> {
        (**self).flush()
    }
}
