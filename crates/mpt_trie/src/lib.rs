//! # MPT Trie
//!
//! Merkle Patricia Trie over a pluggable byte store and hash function.
//!
//! Nodes are encoded as RLP lists (leaf and extension: `[hex-prefix key, value
//! or child]`, branch: 16 child slots plus a value). Encodings shorter than
//! 32 bytes are embedded in their parent, everything else is stored under its
//! hash. The root is always stored, so a root hash fully identifies a version.
//!
//! ```rust
//! use mpt_persistence::MemoryStore;
//! use mpt_trie::{ProofVerifier, Trie};
//! use std::sync::Arc;
//!
//! let mut trie = Trie::new(Arc::new(MemoryStore::new()));
//! trie.put_bytes(b"cat", b"dog").unwrap();
//! let root = trie.commit().unwrap();
//!
//! let proof = trie.get_proof_bytes(b"cat").unwrap();
//! let verifier = ProofVerifier::default();
//! assert!(verifier.verify_inclusion(&root, b"cat", b"dog", &proof).unwrap());
//! ```

pub mod builder;
pub mod codec;
pub mod error;
pub mod nibbles;
pub mod node;
pub mod node_type;
pub mod proof;
pub mod read_only;
pub(crate) mod rlp;
pub mod secure;
pub mod traits;
pub mod trie;

pub use builder::TrieBuilder;
pub use codec::{BincodeCodec, Codec, FnCodec, IdentityCodec, StringCodec, U64Codec};
pub use error::{MptError, MptResult};
pub use nibbles::NibblePath;
pub use node::NodeVisit;
pub use node_type::NodeType;
pub use proof::ProofVerifier;
pub use read_only::ReadOnlyTrie;
pub use secure::SecureTrie;
pub use traits::{TrieReader, TrieWriter};
pub use trie::Trie;
