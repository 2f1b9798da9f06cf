use crate::{Store, StoreError, StoreResult};

/// Wraps a store and rejects every write.
#[derive(Debug, Clone)]
pub struct ReadOnlyStore<S> {
    delegate: S,
}

impl<S: Store> ReadOnlyStore<S> {
    pub fn new(delegate: S) -> Self {
        Self { delegate }
    }

    pub fn into_inner(self) -> S {
        self.delegate
    }
}

impl<S: Store> Store for ReadOnlyStore<S> {
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        self.delegate.get(key)
    }

    fn set(&self, _key: &[u8], _value: &[u8]) -> StoreResult<()> {
        Err(StoreError::ReadOnly)
    }

    fn remove(&self, _key: &[u8]) -> StoreResult<()> {
        Err(StoreError::ReadOnly)
    }

    fn contains_key(&self, key: &[u8]) -> StoreResult<bool> {
        self.delegate.contains_key(key)
    }

    fn flush(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;

    #[test]
    fn test_reads_pass_writes_fail() {
        let memory = MemoryStore::new();
        memory.set(b"k", b"v").unwrap();
        let store = ReadOnlyStore::new(memory);

        assert_eq!(store.get(b"k").unwrap(), Some(b"v".to_vec()));
        assert!(matches!(store.set(b"k", b"x"), Err(StoreError::ReadOnly)));
        assert!(matches!(store.remove(b"k"), Err(StoreError::ReadOnly)));
        assert!(store.flush().is_ok());
        assert_eq!(store.into_inner().get(b"k").unwrap(), Some(b"v".to_vec()));
    }
}
