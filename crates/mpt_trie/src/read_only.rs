use crate::node::NodeVisit;
use crate::secure::SecureTrie;
use crate::traits::TrieReader;
use crate::trie::Trie;
use crate::MptResult;
use hashbrown::HashMap;

/// A view that only offers reads.
///
/// Mutating operations are simply not part of the type, so a view can be
/// handed to many readers while a writer advances a different trie over the
/// same store.
#[derive(Debug)]
pub struct ReadOnlyTrie<T> {
    inner: T,
}

impl<T> ReadOnlyTrie<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<K, V, T> TrieReader<K, V> for ReadOnlyTrie<T>
where
    T: TrieReader<K, V>,
{
    fn get(&self, key: &K) -> MptResult<Option<V>> {
        self.inner.get(key)
    }

    fn contains_key(&self, key: &K) -> MptResult<bool> {
        self.inner.contains_key(key)
    }

    fn root_hash(&self) -> MptResult<Vec<u8>> {
        self.inner.root_hash()
    }

    fn null_hash(&self) -> &[u8] {
        self.inner.null_hash()
    }

    fn is_dirty(&self) -> bool {
        self.inner.is_dirty()
    }

    fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    fn get_proof(&self, key: &K) -> MptResult<Vec<Vec<u8>>> {
        self.inner.get_proof(key)
    }
}

impl<K, V> ReadOnlyTrie<Trie<K, V>> {
    pub fn get_bytes(&self, key: &[u8]) -> MptResult<Option<Vec<u8>>> {
        self.inner.get_bytes(key)
    }

    pub fn get_proof_bytes(&self, key: &[u8]) -> MptResult<Vec<Vec<u8>>> {
        self.inner.get_proof_bytes(key)
    }

    /// Walks every node depth-first until `visitor` returns `false`.
    pub fn traverse<F>(&self, mut visitor: F) -> MptResult<()>
    where
        F: FnMut(&NodeVisit<'_>) -> bool,
    {
        self.inner.walk(&mut visitor)
    }

    pub fn entries(&self) -> MptResult<Vec<(K, V)>> {
        self.inner.scan_entries()
    }

    pub fn dump(&self) -> MptResult<HashMap<Vec<u8>, Vec<u8>>> {
        self.inner.dump()
    }
}

impl<K, V> ReadOnlyTrie<SecureTrie<K, V>> {
    pub fn get_bytes(&self, key: &[u8]) -> MptResult<Option<Vec<u8>>> {
        self.inner.get_bytes(key)
    }

    pub fn get_proof_bytes(&self, key: &[u8]) -> MptResult<Vec<Vec<u8>>> {
        self.inner.get_proof_bytes(key)
    }

    pub fn values(&self) -> MptResult<Vec<V>> {
        self.inner.scan_values()
    }

    pub fn len(&self) -> MptResult<usize> {
        let mut count = 0;
        self.inner.walk(&mut |visit: &NodeVisit<'_>| {
            if visit.value.is_some() {
                count += 1;
            }
            true
        })?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mpt_persistence::MemoryStore;
    use std::sync::Arc;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_views_are_thread_safe() {
        assert_send_sync::<ReadOnlyTrie<Trie>>();
        assert_send_sync::<ReadOnlyTrie<SecureTrie>>();
    }

    #[test]
    fn test_concurrent_reads() {
        let mut trie = Trie::new(Arc::new(MemoryStore::new()));
        for i in 0u8..64 {
            trie.put_bytes(&[i, i], &[i; 40]).unwrap();
        }
        let root = trie.commit().unwrap();
        let view = trie.read_only_at(&root).unwrap();

        std::thread::scope(|scope| {
            for offset in 0u8..4 {
                let view = &view;
                scope.spawn(move || {
                    for i in (offset..64).step_by(4) {
                        assert_eq!(view.get_bytes(&[i, i]).unwrap(), Some(vec![i; 40]));
                    }
                });
            }
        });
        assert_eq!(view.entries().unwrap().len(), 64);
        assert_eq!(TrieReader::<Vec<u8>, Vec<u8>>::root_hash(&view).unwrap(), root);
    }
}
