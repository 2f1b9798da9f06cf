//! Hash primitives for the Merkle Patricia Trie.
//!
//! The trie never hard-codes a digest: it consumes a [`HashFunction`], which is
//! either built from one of the named [`HashAlgorithm`]s or from a closure.

pub mod hash;
pub mod hash_algorithm;
pub mod hash_function;

pub use hash::{blake3, keccak256, sha256, sha3_256};
pub use hash_algorithm::{HashAlgorithm, UnknownHashAlgorithm};
pub use hash_function::HashFunction;
