use crate::{Store, StoreResult};
use hashbrown::HashMap;
use parking_lot::RwLock;

/// In-memory storage implementation.
///
/// Removals are applied immediately. A trie over this store that holds two
/// identical subtrees keeps them under one shared entry, so rewriting either
/// one deletes the entry the other still resolves through. Layer a
/// [`NoDeleteStore`](crate::NoDeleteStore) on top when that matters.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<HashMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    pub fn clear(&self) {
        self.data.write().clear();
    }

    /// Copies every entry out of the store.
    pub fn snapshot(&self) -> HashMap<Vec<u8>, Vec<u8>> {
        self.data.read().clone()
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.data.read().get(key).cloned())
    }

    fn set(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        self.data.write().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn remove(&self, key: &[u8]) -> StoreResult<()> {
        self.data.write().remove(key);
        Ok(())
    }

    fn contains_key(&self, key: &[u8]) -> StoreResult<bool> {
        Ok(self.data.read().contains_key(key))
    }

    fn flush(&self) -> StoreResult<()> {
        // Memory storage doesn't need flushing
        Ok(())
    }
}

impl FromIterator<(Vec<u8>, Vec<u8>)> for MemoryStore {
    fn from_iter<I: IntoIterator<Item = (Vec<u8>, Vec<u8>)>>(iter: I) -> Self {
        Self {
            data: RwLock::new(iter.into_iter().collect()),
        }
    }
}
