use crate::node::NodeVisit;
use crate::read_only::ReadOnlyTrie;
use crate::traits::{TrieReader, TrieWriter};
use crate::trie::{check_key, Trie};
use crate::MptResult;
use mpt_persistence::Store;
use std::sync::Arc;

/// A trie whose keys are hashed before they reach the node graph.
///
/// Hashed keys are uniformly distributed, so callers choosing keys cannot
/// force deep or lopsided paths. The original keys are not recoverable, so
/// key-yielding traversal is not offered.
#[derive(Debug)]
pub struct SecureTrie<K = Vec<u8>, V = Vec<u8>> {
    inner: Trie<K, V>,
}

impl SecureTrie {
    /// Creates an empty byte-keyed secure trie over `store` using Keccak-256.
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self::from_trie(Trie::new(store))
    }
}

impl<K, V> SecureTrie<K, V> {
    pub(crate) fn from_trie(inner: Trie<K, V>) -> Self {
        Self { inner }
    }

    /// The underlying trie, addressed by hashed keys.
    pub fn inner(&self) -> &Trie<K, V> {
        &self.inner
    }

    /// Path under which raw `key` bytes are stored.
    pub fn hash_key_bytes(&self, key: &[u8]) -> MptResult<Vec<u8>> {
        check_key(key)?;
        Ok(self.inner.hash_function().digest(key))
    }

    pub fn hashed_key(&self, key: &K) -> MptResult<Vec<u8>> {
        self.hash_key_bytes(&self.inner.key_codec().encode(key)?)
    }

    pub fn put_bytes(&mut self, key: &[u8], value: &[u8]) -> MptResult<()> {
        let hashed = self.hash_key_bytes(key)?;
        self.inner.put_bytes(&hashed, value)
    }

    pub fn get_bytes(&self, key: &[u8]) -> MptResult<Option<Vec<u8>>> {
        self.inner.get_bytes(&self.hash_key_bytes(key)?)
    }

    pub fn remove_bytes(&mut self, key: &[u8]) -> MptResult<bool> {
        let hashed = self.hash_key_bytes(key)?;
        self.inner.remove_bytes(&hashed)
    }

    pub fn put(&mut self, key: &K, value: &V) -> MptResult<()> {
        let hashed = self.hashed_key(key)?;
        let value = self.inner.value_codec().encode(value)?;
        self.inner.put_bytes(&hashed, &value)
    }

    pub fn get(&self, key: &K) -> MptResult<Option<V>> {
        self.inner
            .get_bytes(&self.hashed_key(key)?)?
            .map(|value| self.inner.value_codec().decode(&value))
            .transpose()
    }

    pub fn remove(&mut self, key: &K) -> MptResult<bool> {
        let hashed = self.hashed_key(key)?;
        self.inner.remove_bytes(&hashed)
    }

    pub fn contains_key(&self, key: &K) -> MptResult<bool> {
        Ok(self.inner.get_bytes(&self.hashed_key(key)?)?.is_some())
    }

    pub fn commit(&mut self) -> MptResult<Vec<u8>> {
        self.inner.commit()
    }

    pub fn root_hash(&self) -> MptResult<Vec<u8>> {
        self.inner.root_hash()
    }

    pub fn null_hash(&self) -> &[u8] {
        self.inner.null_hash()
    }

    pub fn is_dirty(&self) -> bool {
        self.inner.is_dirty()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn revert(&mut self, root: &[u8]) -> MptResult<()> {
        self.inner.revert(root)
    }

    pub fn revert_with_store(&mut self, root: &[u8], store: Arc<dyn Store>) -> MptResult<()> {
        self.inner.revert_with_store(root, store)
    }

    pub fn reset(&mut self) {
        self.inner.reset()
    }

    pub fn flush(&self) -> MptResult<()> {
        self.inner.flush()
    }

    /// Every stored value, in hashed-key order.
    pub fn values(&mut self) -> MptResult<Vec<V>> {
        self.inner.values()
    }

    pub fn len(&mut self) -> MptResult<usize> {
        self.inner.len()
    }

    pub fn get_proof_bytes(&self, key: &[u8]) -> MptResult<Vec<Vec<u8>>> {
        self.inner.get_proof_bytes(&self.hash_key_bytes(key)?)
    }

    pub fn get_proof(&self, key: &K) -> MptResult<Vec<Vec<u8>>> {
        self.inner.get_proof_bytes(&self.hashed_key(key)?)
    }

    pub fn get_proof_batch(&self, keys: &[K]) -> MptResult<Vec<Vec<u8>>> {
        let hashed = keys
            .iter()
            .map(|key| self.hashed_key(key))
            .collect::<MptResult<Vec<_>>>()?;
        self.inner.proof_batch_bytes(hashed)
    }

    pub fn revert_to_proof(&self, root: &[u8], proof: &[Vec<u8>]) -> MptResult<ReadOnlyTrie<Self>> {
        let rebuilt = self.inner.revert_to_proof(root, proof)?.into_inner();
        Ok(ReadOnlyTrie::new(Self::from_trie(rebuilt)))
    }

    pub fn read_only_at(&self, root: &[u8]) -> MptResult<ReadOnlyTrie<Self>> {
        let view = self.inner.read_only_at(root)?.into_inner();
        Ok(ReadOnlyTrie::new(Self::from_trie(view)))
    }

    pub fn into_read_only(mut self) -> MptResult<ReadOnlyTrie<Self>> {
        self.commit()?;
        Ok(ReadOnlyTrie::new(self))
    }

    pub(crate) fn scan_values(&self) -> MptResult<Vec<V>> {
        self.inner.scan_values()
    }

    /// Walks the node graph without exposing paths as keys. Only used to
    /// count nodes from read-only views.
    pub(crate) fn walk<F>(&self, visitor: &mut F) -> MptResult<()>
    where
        F: FnMut(&NodeVisit<'_>) -> bool,
    {
        self.inner.walk(visitor)
    }
}

impl<K, V> TrieReader<K, V> for SecureTrie<K, V> {
    fn get(&self, key: &K) -> MptResult<Option<V>> {
        SecureTrie::get(self, key)
    }

    fn contains_key(&self, key: &K) -> MptResult<bool> {
        SecureTrie::contains_key(self, key)
    }

    fn root_hash(&self) -> MptResult<Vec<u8>> {
        SecureTrie::root_hash(self)
    }

    fn null_hash(&self) -> &[u8] {
        SecureTrie::null_hash(self)
    }

    fn is_dirty(&self) -> bool {
        SecureTrie::is_dirty(self)
    }

    fn is_empty(&self) -> bool {
        SecureTrie::is_empty(self)
    }

    fn get_proof(&self, key: &K) -> MptResult<Vec<Vec<u8>>> {
        SecureTrie::get_proof(self, key)
    }
}

impl<K, V> TrieWriter<K, V> for SecureTrie<K, V> {
    fn put(&mut self, key: &K, value: &V) -> MptResult<()> {
        SecureTrie::put(self, key, value)
    }

    fn remove(&mut self, key: &K) -> MptResult<bool> {
        SecureTrie::remove(self, key)
    }

    fn commit(&mut self) -> MptResult<Vec<u8>> {
        SecureTrie::commit(self)
    }

    fn flush(&self) -> MptResult<()> {
        SecureTrie::flush(self)
    }

    fn revert(&mut self, root: &[u8]) -> MptResult<()> {
        SecureTrie::revert(self, root)
    }

    fn reset(&mut self) {
        SecureTrie::reset(self)
    }
}
