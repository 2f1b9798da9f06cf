//! # MPT-RS: Merkle Patricia Trie in Rust
//!
//! An authenticated key-value map whose root hash commits to its entire
//! contents, stored content-addressed in a pluggable byte store.
//!
//! ## Quick Start
//!
//! ```rust
//! use mpt_rs::prelude::*;
//! use std::sync::Arc;
//!
//! let mut trie = Trie::new(Arc::new(MemoryStore::new()));
//! trie.put_bytes(b"do", b"verb").unwrap();
//! trie.put_bytes(b"dog", b"puppy").unwrap();
//! let root = trie.commit().unwrap();
//!
//! let proof = trie.get_proof_bytes(b"dog").unwrap();
//! let verifier = ProofVerifier::default();
//! assert_eq!(verifier.verify(&root, b"dog", &proof).unwrap(), Some(b"puppy".to_vec()));
//! ```
//!
//! ## Architecture
//!
//! - [`config`] - constants and the TOML-loadable [`config::TrieConfig`]
//! - [`crypto`] - hash algorithms and the pluggable [`crypto::HashFunction`]
//! - [`persistence`] - the [`persistence::Store`] contract and its layers
//! - [`trie`] - nodes, tries, secure tries and proofs

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

use anyhow::Context;
use std::path::Path;

pub use mpt_config as config;
pub use mpt_cryptography as crypto;
pub use mpt_persistence as persistence;
pub use mpt_trie as trie;

/// Common imports for trie users
pub mod prelude {
    pub use crate::config::{StoreConfig, TrieConfig};
    pub use crate::crypto::{HashAlgorithm, HashFunction};
    pub use crate::persistence::{CachedStore, MemoryStore, NoDeleteStore, ReadOnlyStore, Store};
    pub use crate::trie::{
        Codec, MptError, MptResult, ProofVerifier, ReadOnlyTrie, SecureTrie, StringCodec, Trie,
        TrieBuilder, TrieReader, TrieWriter,
    };
}

fn load_builder(path: &Path) -> anyhow::Result<trie::TrieBuilder> {
    let config = config::TrieConfig::load(path)
        .with_context(|| format!("failed to load trie config from {}", path.display()))?;
    trie::TrieBuilder::from_config(&config)
        .with_context(|| format!("invalid trie config in {}", path.display()))
}

/// Loads a TOML configuration file and builds a byte-keyed trie from it.
pub fn open_trie(config_path: impl AsRef<Path>) -> anyhow::Result<trie::Trie> {
    Ok(load_builder(config_path.as_ref())?.build())
}

/// Like [`open_trie`], producing a [`trie::SecureTrie`].
pub fn open_secure_trie(config_path: impl AsRef<Path>) -> anyhow::Result<trie::SecureTrie> {
    Ok(load_builder(config_path.as_ref())?.build_secure())
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
