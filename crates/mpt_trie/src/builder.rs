use crate::codec::{Codec, IdentityCodec};
use crate::secure::SecureTrie;
use crate::trie::Trie;
use crate::MptResult;
use mpt_config::{ConfigError, TrieConfig};
use mpt_cryptography::{HashAlgorithm, HashFunction};
use mpt_persistence::{MemoryStore, Store};
use std::fmt;
use std::sync::Arc;

/// Assembles a [`Trie`] or [`SecureTrie`] from its collaborators.
///
/// Defaults: Keccak-256, a fresh [`MemoryStore`] and byte codecs.
///
/// ```rust
/// use mpt_trie::{StringCodec, TrieBuilder};
///
/// let mut trie = TrieBuilder::new()
///     .key_codec(StringCodec)
///     .value_codec(StringCodec)
///     .build();
/// trie.put(&"cat".to_string(), &"dog".to_string()).unwrap();
/// assert_eq!(trie.get(&"cat".to_string()).unwrap(), Some("dog".to_string()));
/// ```
pub struct TrieBuilder<K = Vec<u8>, V = Vec<u8>> {
    store: Option<Arc<dyn Store>>,
    hasher: HashFunction,
    key_codec: Arc<dyn Codec<K>>,
    value_codec: Arc<dyn Codec<V>>,
}

impl TrieBuilder {
    pub fn new() -> Self {
        Self {
            store: None,
            hasher: HashFunction::default(),
            key_codec: Arc::new(IdentityCodec),
            value_codec: Arc::new(IdentityCodec),
        }
    }

    /// Starts from a configuration: its hash algorithm and its store stack.
    pub fn from_config(config: &TrieConfig) -> MptResult<Self> {
        config.validate()?;
        let algorithm: HashAlgorithm = config
            .hash_algorithm
            .parse()
            .map_err(|e| ConfigError::Invalid(format!("{}", e)))?;
        let store = mpt_persistence::open_configured(config)?;
        log::debug!(
            "building trie from config: hash={}, store={}",
            algorithm,
            config.store
        );
        Ok(Self::new().hash_algorithm(algorithm).store(store))
    }
}

impl Default for TrieBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> TrieBuilder<K, V> {
    pub fn hash_function(mut self, hasher: HashFunction) -> Self {
        self.hasher = hasher;
        self
    }

    pub fn hash_algorithm(self, algorithm: HashAlgorithm) -> Self {
        self.hash_function(algorithm.into())
    }

    pub fn store(mut self, store: Arc<dyn Store>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn key_codec<K2, C>(self, codec: C) -> TrieBuilder<K2, V>
    where
        C: Codec<K2> + 'static,
    {
        TrieBuilder {
            store: self.store,
            hasher: self.hasher,
            key_codec: Arc::new(codec),
            value_codec: self.value_codec,
        }
    }

    pub fn value_codec<V2, C>(self, codec: C) -> TrieBuilder<K, V2>
    where
        C: Codec<V2> + 'static,
    {
        TrieBuilder {
            store: self.store,
            hasher: self.hasher,
            key_codec: self.key_codec,
            value_codec: Arc::new(codec),
        }
    }

    pub fn build(self) -> Trie<K, V> {
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::new()) as Arc<dyn Store>);
        Trie::from_parts(store, self.hasher, self.key_codec, self.value_codec)
    }

    pub fn build_secure(self) -> SecureTrie<K, V> {
        SecureTrie::from_trie(self.build())
    }
}

impl<K, V> fmt::Debug for TrieBuilder<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrieBuilder")
            .field("hasher", &self.hasher)
            .field("store", &self.store.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MptError, U64Codec};

    #[test]
    fn test_builder_defaults() {
        let trie = TrieBuilder::new().build();
        assert_eq!(trie.hash_function().name(), "KECCAK256");
        assert!(trie.is_empty());
    }

    #[test]
    fn test_builder_hash_algorithm_changes_null_hash() {
        let keccak = TrieBuilder::new().build();
        let sha = TrieBuilder::new().hash_algorithm(HashAlgorithm::Sha256).build();
        assert_ne!(keccak.null_hash(), sha.null_hash());
        assert_eq!(sha.null_hash(), mpt_cryptography::sha256(&[0x80]).as_slice());
    }

    #[test]
    fn test_builder_typed_codecs() {
        let mut trie = TrieBuilder::new().key_codec(U64Codec).value_codec(U64Codec).build();
        trie.put(&7, &700).unwrap();
        assert_eq!(trie.get(&7).unwrap(), Some(700));
        assert_eq!(trie.get(&8).unwrap(), None);
    }

    #[test]
    fn test_from_config() {
        let config = TrieConfig::from_toml_str(
            r#"
            hash_algorithm = "sha3-256"
            keep_history = true
            write_cache = true
            "#,
        )
        .unwrap();
        let mut trie = TrieBuilder::from_config(&config).unwrap().build();
        assert_eq!(trie.hash_function().name(), "SHA3-256");
        trie.put_bytes(b"key", b"value").unwrap();
        trie.commit().unwrap();
        trie.flush().unwrap();
        assert_eq!(trie.get_bytes(b"key").unwrap(), Some(b"value".to_vec()));
    }

    #[test]
    fn test_from_config_rejects_unknown_algorithm() {
        let config = TrieConfig {
            hash_algorithm: "md5".to_string(),
            ..TrieConfig::default()
        };
        let result = TrieBuilder::from_config(&config);
        assert!(matches!(result, Err(MptError::Config(ConfigError::Invalid(_)))));
    }
}
