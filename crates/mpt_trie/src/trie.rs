use crate::codec::{Codec, IdentityCodec};
use crate::nibbles::NibblePath;
use crate::node::{Node, NodeContext, NodeVisit, Removal};
use crate::read_only::ReadOnlyTrie;
use crate::rlp::NULL_ITEM;
use crate::traits::{TrieReader, TrieWriter};
use crate::{MptError, MptResult};
use hashbrown::{HashMap, HashSet};
use mpt_cryptography::HashFunction;
use mpt_persistence::{MemoryStore, Store};
use std::fmt;
use std::sync::Arc;

/// MPT Trie implementation
///
/// Keys and values pass through the configured codecs; the node graph only
/// ever sees bytes. The trie is either empty, dirty (uncommitted changes) or
/// committed, in which case [`Trie::root_hash`] is available.
///
/// Nodes are stored by content hash, so two identical subtrees share a
/// single store entry. Rewriting one of them disposes that entry, and the
/// other becomes unresolvable (`NodeNotFound`) until it is rewritten too.
/// Over a plain [`MemoryStore`] this can happen inside one live trie. Wrap
/// the store in a `NoDeleteStore` (or set `keep_history`) when values repeat.
pub struct Trie<K = Vec<u8>, V = Vec<u8>> {
    store: Arc<dyn Store>,
    hasher: HashFunction,
    null_hash: Vec<u8>,
    key_codec: Arc<dyn Codec<K>>,
    value_codec: Arc<dyn Codec<V>>,
    root: Option<Node>,
}

pub(crate) fn check_key(key: &[u8]) -> MptResult<()> {
    if key.is_empty() {
        return Err(MptError::InvalidKey("key must not be empty".to_string()));
    }
    Ok(())
}

impl Trie {
    /// Creates an empty byte-keyed trie over `store` using Keccak-256.
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self::from_parts(
            store,
            HashFunction::default(),
            Arc::new(IdentityCodec),
            Arc::new(IdentityCodec),
        )
    }
}

impl<K, V> Trie<K, V> {
    pub(crate) fn from_parts(
        store: Arc<dyn Store>,
        hasher: HashFunction,
        key_codec: Arc<dyn Codec<K>>,
        value_codec: Arc<dyn Codec<V>>,
    ) -> Self {
        let null_hash = hasher.digest(&NULL_ITEM);
        Self {
            store,
            hasher,
            null_hash,
            key_codec,
            value_codec,
            root: None,
        }
    }

    /// An empty trie sharing this trie's hash function and codecs.
    pub(crate) fn with_store(&self, store: Arc<dyn Store>) -> Self {
        Self {
            store,
            hasher: self.hasher.clone(),
            null_hash: self.null_hash.clone(),
            key_codec: Arc::clone(&self.key_codec),
            value_codec: Arc::clone(&self.value_codec),
            root: None,
        }
    }

    fn ctx(&self) -> NodeContext<'_> {
        NodeContext::new(self.store.as_ref(), &self.hasher)
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub fn hash_function(&self) -> &HashFunction {
        &self.hasher
    }

    pub(crate) fn key_codec(&self) -> &dyn Codec<K> {
        self.key_codec.as_ref()
    }

    pub(crate) fn value_codec(&self) -> &dyn Codec<V> {
        self.value_codec.as_ref()
    }

    pub fn null_hash(&self) -> &[u8] {
        &self.null_hash
    }

    /// True when the trie holds no keys.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn is_dirty(&self) -> bool {
        self.root.as_ref().map_or(false, Node::is_dirty)
    }

    pub fn get_bytes(&self, key: &[u8]) -> MptResult<Option<Vec<u8>>> {
        check_key(key)?;
        let Some(root) = &self.root else {
            return Ok(None);
        };
        Ok(root
            .get(&NibblePath::from_normal(key), self.ctx())?
            .map(<[u8]>::to_vec))
    }

    /// Inserts or overwrites `key`; an empty `value` removes it. A store
    /// error leaves the stored contents unchanged.
    pub fn put_bytes(&mut self, key: &[u8], value: &[u8]) -> MptResult<()> {
        check_key(key)?;
        if value.is_empty() {
            self.remove_bytes(key)?;
            return Ok(());
        }
        let path = NibblePath::from_normal(key);
        let ctx = NodeContext::new(self.store.as_ref(), &self.hasher);
        match &mut self.root {
            Some(root) => {
                root.insert(path, value.to_vec(), ctx)?;
            }
            empty => *empty = Some(Node::new_leaf(path, value.to_vec())),
        }
        Ok(())
    }

    /// Removes `key`, returning whether it was present.
    pub fn remove_bytes(&mut self, key: &[u8]) -> MptResult<bool> {
        check_key(key)?;
        let ctx = NodeContext::new(self.store.as_ref(), &self.hasher);
        let Some(root) = self.root.as_mut() else {
            return Ok(false);
        };
        match root.delete(&NibblePath::from_normal(key), ctx)? {
            Removal::NotFound => Ok(false),
            Removal::Updated => Ok(true),
            Removal::Emptied => {
                self.root = None;
                Ok(true)
            }
        }
    }

    pub fn put(&mut self, key: &K, value: &V) -> MptResult<()> {
        let key = self.key_codec.encode(key)?;
        let value = self.value_codec.encode(value)?;
        self.put_bytes(&key, &value)
    }

    pub fn get(&self, key: &K) -> MptResult<Option<V>> {
        self.get_bytes(&self.key_codec.encode(key)?)?
            .map(|value| self.value_codec.decode(&value))
            .transpose()
    }

    pub fn remove(&mut self, key: &K) -> MptResult<bool> {
        let key = self.key_codec.encode(key)?;
        self.remove_bytes(&key)
    }

    pub fn contains_key(&self, key: &K) -> MptResult<bool> {
        Ok(self.get_bytes(&self.key_codec.encode(key)?)?.is_some())
    }

    /// Persists every dirty node and returns the new root hash. Committing a
    /// clean trie returns the cached hash without touching the store.
    pub fn commit(&mut self) -> MptResult<Vec<u8>> {
        let ctx = NodeContext::new(self.store.as_ref(), &self.hasher);
        let Some(root) = self.root.as_mut() else {
            return Ok(self.null_hash.clone());
        };
        if let (false, Some(hash)) = (root.is_dirty(), root.hash()) {
            return Ok(hash.to_vec());
        }

        root.commit(ctx, true)?;
        let hash = match root.hash() {
            Some(hash) if !root.is_dirty() => hash.to_vec(),
            _ => {
                return Err(MptError::Internal(
                    "root is not hashed after commit".to_string(),
                ))
            }
        };
        log::debug!("committed trie root {}", hex::encode(&hash));
        Ok(hash)
    }

    pub fn root_hash(&self) -> MptResult<Vec<u8>> {
        let Some(root) = &self.root else {
            return Ok(self.null_hash.clone());
        };
        if root.is_dirty() {
            return Err(MptError::Dirty);
        }
        root.hash()
            .map(<[u8]>::to_vec)
            .ok_or_else(|| MptError::Internal("committed root has no hash".to_string()))
    }

    fn open_root(&self, store: &dyn Store, root: &[u8]) -> MptResult<Option<Node>> {
        if root == self.null_hash.as_slice() {
            return Ok(None);
        }
        if !store.contains_key(root)? {
            return Err(MptError::UnknownRoot(hex::encode(root)));
        }
        Ok(Some(Node::from_hash(root.to_vec())))
    }

    /// Discards the current state and opens the trie at `root`. Nothing is
    /// read beyond an existence check until the trie is navigated.
    pub fn revert(&mut self, root: &[u8]) -> MptResult<()> {
        self.root = self.open_root(self.store.as_ref(), root)?;
        log::debug!("reverted trie to {}", hex::encode(root));
        Ok(())
    }

    /// Like [`Trie::revert`], switching to `store` first.
    pub fn revert_with_store(&mut self, root: &[u8], store: Arc<dyn Store>) -> MptResult<()> {
        self.root = self.open_root(store.as_ref(), root)?;
        self.store = store;
        log::debug!("reverted trie to {} on a new store", hex::encode(root));
        Ok(())
    }

    pub fn reset(&mut self) {
        self.root = None;
    }

    pub fn flush(&self) -> MptResult<()> {
        self.store.flush()?;
        Ok(())
    }

    pub(crate) fn walk<F>(&self, visitor: &mut F) -> MptResult<()>
    where
        F: FnMut(&NodeVisit<'_>) -> bool,
    {
        if let Some(root) = &self.root {
            root.traverse(&NibblePath::EMPTY, self.ctx(), visitor)?;
        }
        Ok(())
    }

    /// Commits, then walks every node depth-first until `visitor` returns
    /// `false`.
    pub fn traverse<F>(&mut self, mut visitor: F) -> MptResult<()>
    where
        F: FnMut(&NodeVisit<'_>) -> bool,
    {
        self.commit()?;
        self.walk(&mut visitor)
    }

    pub(crate) fn scan_entries(&self) -> MptResult<Vec<(K, V)>> {
        let mut raw = Vec::new();
        self.walk(&mut |visit: &NodeVisit<'_>| {
            if let (Some(value), Ok(key)) = (visit.value, visit.path.to_normal()) {
                raw.push((key, value.to_vec()));
            }
            true
        })?;
        raw.into_iter()
            .map(|(key, value)| -> MptResult<(K, V)> {
                Ok((self.key_codec.decode(&key)?, self.value_codec.decode(&value)?))
            })
            .collect()
    }

    pub(crate) fn scan_values(&self) -> MptResult<Vec<V>> {
        let mut raw = Vec::new();
        self.walk(&mut |visit: &NodeVisit<'_>| {
            if let Some(value) = visit.value {
                raw.push(value.to_vec());
            }
            true
        })?;
        raw.iter().map(|value| self.value_codec.decode(value)).collect()
    }

    /// Every key-value pair, in nibble order.
    pub fn entries(&mut self) -> MptResult<Vec<(K, V)>> {
        self.commit()?;
        self.scan_entries()
    }

    pub fn keys(&mut self) -> MptResult<Vec<K>> {
        Ok(self.entries()?.into_iter().map(|(key, _)| key).collect())
    }

    pub fn values(&mut self) -> MptResult<Vec<V>> {
        self.commit()?;
        self.scan_values()
    }

    pub fn len(&mut self) -> MptResult<usize> {
        self.commit()?;
        let mut count = 0;
        self.walk(&mut |visit: &NodeVisit<'_>| {
            if visit.value.is_some() {
                count += 1;
            }
            true
        })?;
        Ok(count)
    }

    /// Hash to encoding for every store-backed node reachable from the root.
    pub fn dump(&self) -> MptResult<HashMap<Vec<u8>, Vec<u8>>> {
        if self.is_dirty() {
            return Err(MptError::Dirty);
        }
        let mut nodes = HashMap::new();
        self.walk(&mut |visit: &NodeVisit<'_>| {
            if let (Some(hash), Some(encoded)) = (visit.hash, visit.encoded) {
                nodes.insert(hash.to_vec(), encoded.to_vec());
            }
            true
        })?;
        Ok(nodes)
    }

    pub fn dump_keys(&self) -> MptResult<HashSet<Vec<u8>>> {
        Ok(self.dump()?.into_keys().collect())
    }

    pub fn get_proof_bytes(&self, key: &[u8]) -> MptResult<Vec<Vec<u8>>> {
        check_key(key)?;
        let mut proof = Vec::new();
        if let Some(root) = &self.root {
            root.collect_proof(&NibblePath::from_normal(key), self.ctx(), &mut proof)?;
        }
        Ok(proof)
    }

    pub fn get_proof(&self, key: &K) -> MptResult<Vec<Vec<u8>>> {
        self.get_proof_bytes(&self.key_codec.encode(key)?)
    }

    pub(crate) fn proof_batch_bytes<I>(&self, keys: I) -> MptResult<Vec<Vec<u8>>>
    where
        I: IntoIterator<Item = Vec<u8>>,
    {
        let mut seen = HashSet::new();
        let mut merged = Vec::new();
        for key in keys {
            for entry in self.get_proof_bytes(&key)? {
                if seen.insert(entry.clone()) {
                    merged.push(entry);
                }
            }
        }
        Ok(merged)
    }

    /// Union of the proofs for `keys`, without duplicates, in first-seen order.
    pub fn get_proof_batch(&self, keys: &[K]) -> MptResult<Vec<Vec<u8>>> {
        let encoded = keys
            .iter()
            .map(|key| self.key_codec.encode(key))
            .collect::<MptResult<Vec<_>>>()?;
        self.proof_batch_bytes(encoded)
    }

    /// Rebuilds the part of a trie covered by `proof` as a read-only view.
    /// Lookups that leave the proven paths fail with `NodeNotFound`.
    pub fn revert_to_proof(&self, root: &[u8], proof: &[Vec<u8>]) -> MptResult<ReadOnlyTrie<Self>> {
        let store: MemoryStore = proof
            .iter()
            .map(|entry| (self.hasher.digest(entry), entry.clone()))
            .collect();
        let mut trie = self.with_store(Arc::new(store));
        trie.revert(root)?;
        log::debug!(
            "rebuilt trie {} from {} proof entries",
            hex::encode(root),
            proof.len()
        );
        Ok(ReadOnlyTrie::new(trie))
    }

    /// A read-only view of a historical root in the same store.
    pub fn read_only_at(&self, root: &[u8]) -> MptResult<ReadOnlyTrie<Self>> {
        let mut trie = self.with_store(Arc::clone(&self.store));
        trie.revert(root)?;
        Ok(ReadOnlyTrie::new(trie))
    }

    /// Commits and freezes this trie.
    pub fn into_read_only(mut self) -> MptResult<ReadOnlyTrie<Self>> {
        self.commit()?;
        Ok(ReadOnlyTrie::new(self))
    }
}

impl<K, V> TrieReader<K, V> for Trie<K, V> {
    fn get(&self, key: &K) -> MptResult<Option<V>> {
        Trie::get(self, key)
    }

    fn contains_key(&self, key: &K) -> MptResult<bool> {
        Trie::contains_key(self, key)
    }

    fn root_hash(&self) -> MptResult<Vec<u8>> {
        Trie::root_hash(self)
    }

    fn null_hash(&self) -> &[u8] {
        Trie::null_hash(self)
    }

    fn is_dirty(&self) -> bool {
        Trie::is_dirty(self)
    }

    fn is_empty(&self) -> bool {
        Trie::is_empty(self)
    }

    fn get_proof(&self, key: &K) -> MptResult<Vec<Vec<u8>>> {
        Trie::get_proof(self, key)
    }
}

impl<K, V> TrieWriter<K, V> for Trie<K, V> {
    fn put(&mut self, key: &K, value: &V) -> MptResult<()> {
        Trie::put(self, key, value)
    }

    fn remove(&mut self, key: &K) -> MptResult<bool> {
        Trie::remove(self, key)
    }

    fn commit(&mut self) -> MptResult<Vec<u8>> {
        Trie::commit(self)
    }

    fn flush(&self) -> MptResult<()> {
        Trie::flush(self)
    }

    fn revert(&mut self, root: &[u8]) -> MptResult<()> {
        Trie::revert(self, root)
    }

    fn reset(&mut self) {
        Trie::reset(self)
    }
}

impl<K, V> fmt::Debug for Trie<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let root = match &self.root {
            None => "empty".to_string(),
            Some(root) => match root.hash() {
                Some(hash) if !root.is_dirty() => hex::encode(hash),
                _ => "dirty".to_string(),
            },
        };
        f.debug_struct("Trie")
            .field("hash", &self.hasher.name())
            .field("root", &root)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mpt_persistence::{ReadOnlyStore, StoreError};

    fn trie() -> Trie {
        Trie::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn test_trie_creation() {
        let trie = trie();
        assert!(trie.is_empty());
        assert!(!trie.is_dirty());
        assert_eq!(
            hex::encode(trie.root_hash().unwrap()),
            "56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421"
        );
    }

    #[test]
    fn test_trie_put_get() {
        let mut trie = trie();
        trie.put_bytes(b"key", b"value").unwrap();
        assert!(!trie.is_empty());
        assert!(trie.is_dirty());
        assert_eq!(trie.get_bytes(b"key").unwrap(), Some(b"value".to_vec()));
        assert_eq!(trie.get_bytes(b"ke").unwrap(), None);
        assert!(matches!(trie.root_hash(), Err(MptError::Dirty)));

        let root = trie.commit().unwrap();
        assert_eq!(trie.root_hash().unwrap(), root);
        assert_eq!(trie.commit().unwrap(), root);
    }

    #[test]
    fn test_empty_key_rejected() {
        let mut trie = trie();
        assert!(matches!(trie.put_bytes(b"", b"v"), Err(MptError::InvalidKey(_))));
        assert!(matches!(trie.get_bytes(b""), Err(MptError::InvalidKey(_))));
        assert!(matches!(trie.remove_bytes(b""), Err(MptError::InvalidKey(_))));
        assert!(trie.is_empty());
    }

    #[test]
    fn test_empty_value_deletes() {
        let mut trie = trie();
        trie.put_bytes(b"a", b"1").unwrap();
        trie.put_bytes(b"a", b"").unwrap();
        assert_eq!(trie.get_bytes(b"a").unwrap(), None);
        assert!(trie.is_empty());
        assert_eq!(trie.commit().unwrap(), trie.null_hash());
    }

    #[test]
    fn test_trie_delete() {
        let mut trie = trie();
        trie.put_bytes(b"a", b"1").unwrap();
        trie.put_bytes(b"ab", b"2").unwrap();
        let before = trie.commit().unwrap();

        assert!(!trie.remove_bytes(b"abc").unwrap());
        assert!(!trie.is_dirty());
        assert!(trie.remove_bytes(b"ab").unwrap());
        assert!(trie.is_dirty());
        assert_ne!(trie.commit().unwrap(), before);
        assert!(trie.remove_bytes(b"a").unwrap());
        assert!(trie.is_empty());
    }

    #[test]
    fn test_identical_put_keeps_trie_clean() {
        let mut trie = trie();
        trie.put_bytes(b"key", &[9; 40]).unwrap();
        trie.commit().unwrap();
        trie.put_bytes(b"key", &[9; 40]).unwrap();
        assert!(!trie.is_dirty());
    }

    #[test]
    fn test_revert_unknown_root() {
        let mut trie = trie();
        let result = trie.revert(&[0xab; 32]);
        assert!(matches!(result, Err(MptError::UnknownRoot(_))));

        let null = trie.null_hash().to_vec();
        trie.put_bytes(b"a", b"1").unwrap();
        trie.revert(&null).unwrap();
        assert!(trie.is_empty());
    }

    #[test]
    fn test_entries_and_len() {
        let mut trie = trie();
        trie.put_bytes(b"do", b"verb").unwrap();
        trie.put_bytes(b"dog", b"puppy").unwrap();
        trie.put_bytes(b"horse", b"stallion").unwrap();

        assert_eq!(trie.len().unwrap(), 3);
        assert!(!trie.is_dirty());
        assert_eq!(
            trie.entries().unwrap(),
            vec![
                (b"do".to_vec(), b"verb".to_vec()),
                (b"dog".to_vec(), b"puppy".to_vec()),
                (b"horse".to_vec(), b"stallion".to_vec()),
            ]
        );
        assert_eq!(trie.keys().unwrap().len(), 3);
        assert_eq!(trie.values().unwrap()[2], b"stallion".to_vec());
    }

    #[test]
    fn test_dump_requires_clean_trie() {
        let mut trie = trie();
        trie.put_bytes(b"key", &[1; 64]).unwrap();
        assert!(matches!(trie.dump(), Err(MptError::Dirty)));

        let root = trie.commit().unwrap();
        let dump = trie.dump().unwrap();
        assert!(dump.contains_key(&root));
        assert_eq!(trie.dump_keys().unwrap().len(), dump.len());
        for (hash, encoded) in &dump {
            assert_eq!(&trie.hash_function().digest(encoded), hash);
        }
    }

    #[test]
    fn test_traverse_commits_first() {
        let mut trie = trie();
        trie.put_bytes(b"key", b"value").unwrap();
        let mut nodes = 0;
        trie.traverse(|visit| {
            assert!(visit.hash.is_some());
            nodes += 1;
            true
        })
        .unwrap();
        assert_eq!(nodes, 1);
        assert!(!trie.is_dirty());
    }

    #[test]
    fn test_failed_disposal_leaves_trie_unchanged() {
        let memory = Arc::new(MemoryStore::new());
        let mut trie = Trie::new(memory.clone());
        trie.put_bytes(b"alpha", &[1; 40]).unwrap();
        trie.put_bytes(b"beta", &[2; 40]).unwrap();
        let root = trie.commit().unwrap();

        let frozen: MemoryStore = memory.snapshot().into_iter().collect();
        let mut trie = Trie::new(Arc::new(ReadOnlyStore::new(frozen)));
        trie.revert(&root).unwrap();

        let result = trie.put_bytes(b"alpha", &[9; 40]);
        assert!(matches!(result, Err(MptError::Storage(StoreError::ReadOnly))));
        assert_eq!(trie.get_bytes(b"alpha").unwrap(), Some(vec![1; 40]));
        assert!(!trie.is_dirty());
        assert_eq!(trie.commit().unwrap(), root);

        assert!(trie.remove_bytes(b"beta").is_err());
        assert!(trie.put_bytes(b"gamma", &[3; 40]).is_err());
        assert_eq!(trie.get_bytes(b"beta").unwrap(), Some(vec![2; 40]));
        assert_eq!(trie.get_bytes(b"gamma").unwrap(), None);
        assert_eq!(trie.root_hash().unwrap(), root);

        // No-op writes never reach the store
        trie.put_bytes(b"alpha", &[1; 40]).unwrap();
        assert!(!trie.remove_bytes(b"delta").unwrap());
        assert_eq!(trie.root_hash().unwrap(), root);
    }
}
