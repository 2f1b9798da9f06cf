//! End-to-end tests through the facade crate

use mpt_rs::prelude::*;
use std::io::Write;
use std::sync::Arc;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn config_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_open_trie_from_config_file() {
    init_logger();
    let file = config_file(
        r#"
        hash_algorithm = "keccak256"
        keep_history = true
        "#,
    );

    let mut trie = mpt_rs::open_trie(file.path()).unwrap();
    trie.put_bytes(b"doe", b"reindeer").unwrap();
    trie.put_bytes(b"dog", b"puppy").unwrap();
    trie.put_bytes(b"dogglesworth", b"cat").unwrap();
    let root = trie.commit().unwrap();
    log::debug!("facade trie root {}", hex::encode(&root));

    assert_eq!(
        hex::encode(&root),
        "8aad789dff2f538bca5d8ea56e8abe10f4c7ba3a5dea95fea4cd6e7c3a1168d3"
    );
}

#[test]
fn test_open_secure_trie_with_other_hash() {
    let file = config_file("hash_algorithm = \"blake3\"\n");
    let mut trie = mpt_rs::open_secure_trie(file.path()).unwrap();
    assert_eq!(trie.inner().hash_function().name(), "BLAKE3");

    trie.put_bytes(b"key", b"value").unwrap();
    let root = trie.commit().unwrap();
    let proof = trie.get_proof_bytes(b"key").unwrap();

    let verifier = ProofVerifier::new(HashAlgorithm::Blake3.into());
    let hashed = trie.hash_key_bytes(b"key").unwrap();
    assert!(verifier.verify_inclusion(&root, &hashed, b"value", &proof).unwrap());
}

#[test]
fn test_open_trie_reports_context() {
    let file = config_file("hash_algorithm = \"md5\"\n");
    let err = mpt_rs::open_trie(file.path()).unwrap_err();
    assert!(err.to_string().contains("invalid trie config"));
    assert!(err.downcast_ref::<MptError>().is_some());

    let missing = mpt_rs::open_trie("/nonexistent/trie.toml").unwrap_err();
    assert!(missing.to_string().contains("failed to load trie config"));
}

#[test]
fn test_prelude_covers_layered_stores() {
    let memory = Arc::new(MemoryStore::new());
    let store: Arc<dyn Store> = Arc::new(CachedStore::new(NoDeleteStore::new(memory.clone())));
    let mut trie = TrieBuilder::new()
        .store(store)
        .key_codec(StringCodec)
        .value_codec(StringCodec)
        .build();

    trie.put(&"alpha".to_string(), &"one".to_string()).unwrap();
    let root = trie.commit().unwrap();
    assert!(memory.is_empty());
    trie.flush().unwrap();
    assert!(!memory.is_empty());

    let reader: &dyn TrieReader<String, String> = &trie;
    assert_eq!(reader.root_hash().unwrap(), root);
    assert_eq!(reader.get(&"alpha".to_string()).unwrap(), Some("one".to_string()));
}

#[test]
fn test_version_is_set() {
    assert!(!mpt_rs::VERSION.is_empty());
}
