use crate::MptResult;

/// Read access to a trie, shared by mutable tries and read-only views.
pub trait TrieReader<K, V> {
    fn get(&self, key: &K) -> MptResult<Option<V>>;

    fn contains_key(&self, key: &K) -> MptResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Root hash of the committed state. Fails with `MptError::Dirty` while
    /// changes are pending.
    fn root_hash(&self) -> MptResult<Vec<u8>>;

    /// Root hash of the empty trie.
    fn null_hash(&self) -> &[u8];

    fn is_dirty(&self) -> bool;

    fn is_empty(&self) -> bool;

    /// Store-backed node encodings on the lookup path of `key`, root first.
    fn get_proof(&self, key: &K) -> MptResult<Vec<Vec<u8>>>;
}

/// Mutation and lifecycle operations.
pub trait TrieWriter<K, V>: TrieReader<K, V> {
    /// Inserts or overwrites `key`. An empty encoded value deletes the key.
    fn put(&mut self, key: &K, value: &V) -> MptResult<()>;

    /// Returns whether the key was present.
    fn remove(&mut self, key: &K) -> MptResult<bool>;

    fn commit(&mut self) -> MptResult<Vec<u8>>;

    fn flush(&self) -> MptResult<()>;

    /// Discards the current state and opens the trie at `root`.
    fn revert(&mut self, root: &[u8]) -> MptResult<()>;

    /// Discards the current state and starts from the empty trie.
    fn reset(&mut self);
}
