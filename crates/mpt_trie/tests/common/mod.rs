//! Shared fixtures for the trie integration tests.

#![allow(dead_code)]

use mpt_persistence::{MemoryStore, Store, StoreError, StoreResult};
use mpt_trie::{StringCodec, Trie, TrieBuilder};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const LONG_STRING: &str = "1234567890abcdefghijklmnopqrstuvwxxzABCEFGHIJKLMNOPQRSTUVWXYZ";

pub const EMPTY_ROOT: &str = "56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421";

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn string_trie() -> Trie<String, String> {
    string_trie_over(Arc::new(MemoryStore::new()))
}

pub fn string_trie_over(store: Arc<dyn Store>) -> Trie<String, String> {
    TrieBuilder::new()
        .store(store)
        .key_codec(StringCodec)
        .value_codec(StringCodec)
        .build()
}

pub fn s(text: &str) -> String {
    text.to_string()
}

pub fn commit_hex<K, V>(trie: &mut Trie<K, V>) -> String {
    hex::encode(trie.commit().unwrap())
}

/// Memory store that refuses to remove a key twice, so every disposal is
/// checked to hit a live entry.
#[derive(Debug, Default)]
pub struct StrictStore {
    inner: MemoryStore,
}

impl StrictStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> HashSet<Vec<u8>> {
        self.inner.snapshot().into_keys().collect()
    }
}

impl Store for StrictStore {
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        self.inner.get(key)
    }

    fn set(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        self.inner.set(key, value)
    }

    fn remove(&self, key: &[u8]) -> StoreResult<()> {
        if !self.inner.contains_key(key)? {
            return Err(StoreError::Backend(format!(
                "double delete of {}",
                hex::encode(key)
            )));
        }
        self.inner.remove(key)
    }

    fn flush(&self) -> StoreResult<()> {
        Ok(())
    }
}

/// Asserts the store holds exactly the nodes reachable from the committed root.
pub fn assert_no_orphans<K, V>(trie: &Trie<K, V>, store: &StrictStore) {
    let reachable: HashSet<Vec<u8>> = trie.dump_keys().unwrap().into_iter().collect();
    assert_eq!(store.keys(), reachable);
}

/// Memory store whose removals start failing once an allowance runs out.
#[derive(Debug)]
pub struct FlakyStore {
    inner: MemoryStore,
    removals_left: AtomicUsize,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            removals_left: AtomicUsize::new(usize::MAX),
        }
    }

    pub fn allow_removals(&self, count: usize) {
        self.removals_left.store(count, Ordering::SeqCst);
    }
}

impl Store for FlakyStore {
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        self.inner.get(key)
    }

    fn set(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        self.inner.set(key, value)
    }

    fn remove(&self, key: &[u8]) -> StoreResult<()> {
        let granted = self
            .removals_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1));
        if granted.is_err() {
            return Err(StoreError::Backend(format!(
                "remove of {} refused",
                hex::encode(key)
            )));
        }
        self.inner.remove(key)
    }

    fn flush(&self) -> StoreResult<()> {
        Ok(())
    }
}
