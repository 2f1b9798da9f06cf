//! History and store-layering tests
//!
//! Disposal deletes superseded nodes, so reverting to an older root only works
//! over a store that keeps them around.

mod common;

use common::*;
use mpt_persistence::{CachedStore, MemoryStore, NoDeleteStore, ReadOnlyStore, Store};
use mpt_trie::*;
use std::sync::Arc;

#[cfg(test)]
mod revert_tests {
    use super::*;

    #[test]
    fn test_revert_to_older_root() {
        init_logger();
        let store = Arc::new(NoDeleteStore::new(MemoryStore::new()));
        let mut trie = string_trie_over(store.clone());

        trie.put(&s("first"), &s(LONG_STRING)).unwrap();
        trie.put(&s("second"), &s("value")).unwrap();
        let h1 = trie.commit().unwrap();

        trie.put(&s("first"), &s("replaced")).unwrap();
        trie.remove(&s("second")).unwrap();
        trie.put(&s("third"), &s(LONG_STRING)).unwrap();
        let h2 = trie.commit().unwrap();
        assert_ne!(h1, h2);
        assert!(store.removed_count() > 0);

        trie.revert(&h1).unwrap();
        assert_eq!(trie.root_hash().unwrap(), h1);
        assert_eq!(trie.get(&s("first")).unwrap(), Some(s(LONG_STRING)));
        assert_eq!(trie.get(&s("second")).unwrap(), Some(s("value")));
        assert_eq!(trie.get(&s("third")).unwrap(), None);

        // Mutating the reverted trie and undoing it lands on the same root
        trie.put(&s("fourth"), &s("temporary")).unwrap();
        trie.remove(&s("fourth")).unwrap();
        assert_eq!(trie.commit().unwrap(), h1);

        trie.revert(&h2).unwrap();
        assert_eq!(trie.get(&s("first")).unwrap(), Some(s("replaced")));
    }

    #[test]
    fn test_revert_discards_uncommitted_changes() {
        let store = Arc::new(NoDeleteStore::new(MemoryStore::new()));
        let mut trie = string_trie_over(store);
        trie.put(&s("key"), &s("value")).unwrap();
        let root = trie.commit().unwrap();

        trie.put(&s("key"), &s("changed")).unwrap();
        assert!(trie.is_dirty());
        trie.revert(&root).unwrap();
        assert!(!trie.is_dirty());
        assert_eq!(trie.get(&s("key")).unwrap(), Some(s("value")));
    }

    #[test]
    fn test_revert_to_unknown_root() {
        let mut trie = string_trie();
        trie.put(&s("key"), &s("value")).unwrap();
        let result = trie.revert(&[0xab; 32]);
        assert!(matches!(result, Err(MptError::UnknownRoot(_))));
    }

    #[test]
    fn test_revert_to_null_hash_empties() {
        let mut trie = string_trie();
        trie.put(&s("key"), &s("value")).unwrap();
        trie.commit().unwrap();

        let null = trie.null_hash().to_vec();
        trie.revert(&null).unwrap();
        assert!(trie.is_empty());
        assert_eq!(hex::encode(trie.commit().unwrap()), EMPTY_ROOT);
    }

    #[test]
    fn test_without_history_old_root_is_gone() {
        let mut trie = string_trie();
        trie.put(&s("key"), &s(LONG_STRING)).unwrap();
        let h1 = trie.commit().unwrap();
        trie.put(&s("key"), &s("other")).unwrap();
        trie.commit().unwrap();

        assert!(matches!(trie.revert(&h1), Err(MptError::UnknownRoot(_))));
    }

    #[test]
    fn test_compaction_drops_history() {
        let store = Arc::new(NoDeleteStore::new(MemoryStore::new()));
        let mut trie = string_trie_over(store.clone());
        trie.put(&s("key"), &s(LONG_STRING)).unwrap();
        let h1 = trie.commit().unwrap();
        trie.put(&s("key"), &s("other")).unwrap();
        let h2 = trie.commit().unwrap();

        assert_eq!(store.compact().unwrap(), 1);
        assert!(matches!(trie.revert(&h1), Err(MptError::UnknownRoot(_))));
        trie.revert(&h2).unwrap();
        assert_eq!(trie.get(&s("key")).unwrap(), Some(s("other")));
    }

    #[test]
    fn test_read_only_at_historical_root() {
        let store = Arc::new(NoDeleteStore::new(MemoryStore::new()));
        let mut trie = string_trie_over(store);
        trie.put(&s("alpha"), &s("1")).unwrap();
        trie.put(&s("beta"), &s("2")).unwrap();
        let h1 = trie.commit().unwrap();
        trie.put(&s("gamma"), &s("3")).unwrap();
        trie.commit().unwrap();

        let old = trie.read_only_at(&h1).unwrap();
        assert_eq!(old.get(&s("gamma")).unwrap(), None);
        let mut entries = old.entries().unwrap();
        entries.sort();
        assert_eq!(entries, vec![(s("alpha"), s("1")), (s("beta"), s("2"))]);

        // The live trie is unaffected by the view
        assert_eq!(trie.get(&s("gamma")).unwrap(), Some(s("3")));
    }

    #[test]
    fn test_revert_with_store() {
        let mut source = string_trie();
        source.put(&s("shared"), &s(LONG_STRING)).unwrap();
        source.put(&s("other"), &s("value")).unwrap();
        let root = source.commit().unwrap();

        let copy: MemoryStore = source.dump().unwrap().into_iter().collect();
        let mut trie = string_trie();
        trie.revert_with_store(&root, Arc::new(copy)).unwrap();

        assert_eq!(trie.get(&s("shared")).unwrap(), Some(s(LONG_STRING)));
        assert_eq!(trie.get(&s("other")).unwrap(), Some(s("value")));
        assert_eq!(trie.root_hash().unwrap(), root);
    }

    #[test]
    fn test_read_only_store_rejects_writes() {
        let mut writer = string_trie();
        writer.put(&s("key"), &s(LONG_STRING)).unwrap();
        let root = writer.commit().unwrap();
        let snapshot: MemoryStore = writer.dump().unwrap().into_iter().collect();

        let mut trie = string_trie_over(Arc::new(ReadOnlyStore::new(snapshot)));
        trie.revert(&root).unwrap();
        assert_eq!(trie.get(&s("key")).unwrap(), Some(s(LONG_STRING)));

        trie.put(&s("key"), &s("changed")).unwrap_err();
    }

    #[test]
    fn test_cached_store_flush() {
        let backing = Arc::new(MemoryStore::new());
        let cached = Arc::new(CachedStore::new(backing.clone()));
        let mut trie = string_trie_over(cached.clone());

        trie.put(&s("cat"), &s(LONG_STRING)).unwrap();
        trie.put(&s("dog"), &s(LONG_STRING)).unwrap();
        let root = trie.commit().unwrap();
        assert!(backing.is_empty());
        assert!(cached.stats().pending > 0);

        trie.flush().unwrap();
        assert_eq!(cached.stats().pending, 0);
        assert!(backing.contains_key(&root).unwrap());

        let mut reopened = string_trie_over(backing);
        reopened.revert(&root).unwrap();
        assert_eq!(reopened.get(&s("dog")).unwrap(), Some(s(LONG_STRING)));
    }

    #[test]
    fn test_configured_history_store() {
        let config = mpt_config::TrieConfig {
            keep_history: true,
            write_cache: true,
            ..Default::default()
        };
        let mut trie = TrieBuilder::from_config(&config)
            .unwrap()
            .key_codec(StringCodec)
            .value_codec(StringCodec)
            .build();

        trie.put(&s("key"), &s(LONG_STRING)).unwrap();
        let h1 = trie.commit().unwrap();
        trie.put(&s("key"), &s("other")).unwrap();
        trie.commit().unwrap();
        trie.flush().unwrap();

        trie.revert(&h1).unwrap();
        assert_eq!(trie.get(&s("key")).unwrap(), Some(s(LONG_STRING)));
    }

    #[cfg(feature = "sled")]
    #[test]
    fn test_sled_reopen() {
        use mpt_persistence::SledStore;

        let dir = tempfile::tempdir().unwrap();
        let root = {
            let store = Arc::new(SledStore::open(dir.path()).unwrap());
            let mut trie = string_trie_over(store);
            trie.put(&s("persisted"), &s(LONG_STRING)).unwrap();
            let root = trie.commit().unwrap();
            trie.flush().unwrap();
            root
        };

        let store = Arc::new(SledStore::open(dir.path()).unwrap());
        let mut trie = string_trie_over(store);
        trie.revert(&root).unwrap();
        assert_eq!(trie.get(&s("persisted")).unwrap(), Some(s(LONG_STRING)));
    }
}
