//! Merkle proof verification.
//!
//! A proof is the list of store-backed node encodings met while looking a key
//! up, root first. Inline nodes need no entry of their own because their
//! bytes are already part of the parent that references them.

use crate::nibbles::NibblePath;
use crate::node::{ChildRef, DetachedNode, Node};
use crate::rlp::NULL_ITEM;
use crate::trie::check_key;
use crate::{MptError, MptResult};
use mpt_cryptography::HashFunction;

/// Checks proofs against a trusted root hash without any store.
#[derive(Debug, Clone, Default)]
pub struct ProofVerifier {
    hasher: HashFunction,
}

/// Consumes proof entries in order, checking each against the hash that
/// references it.
struct ProofCursor<'a> {
    hasher: &'a HashFunction,
    entries: &'a [Vec<u8>],
    next: usize,
}

impl<'a> ProofCursor<'a> {
    fn take(&mut self, hash: &[u8]) -> MptResult<&'a [u8]> {
        let entry = self.entries.get(self.next).ok_or_else(|| {
            MptError::InvalidProof(format!(
                "proof ends before node {} is reached",
                hex::encode(hash)
            ))
        })?;
        if self.hasher.digest(entry) != hash {
            return Err(MptError::InvalidProof(format!(
                "entry {} does not hash to {}",
                self.next,
                hex::encode(hash)
            )));
        }
        self.next += 1;
        Ok(entry)
    }

    fn finish(&self) -> MptResult<()> {
        if self.next != self.entries.len() {
            return Err(MptError::InvalidProof(format!(
                "{} unused proof entries",
                self.entries.len() - self.next
            )));
        }
        Ok(())
    }
}

impl ProofVerifier {
    pub fn new(hasher: HashFunction) -> Self {
        Self { hasher }
    }

    /// Looks `key` up through `proof`. Returns the proven value, or `None`
    /// when the proof shows the key is absent.
    pub fn verify(&self, root: &[u8], key: &[u8], proof: &[Vec<u8>]) -> MptResult<Option<Vec<u8>>> {
        check_key(key)?;
        if proof.is_empty() && self.hasher.digest(&NULL_ITEM) == root {
            return Ok(None);
        }

        let mut cursor = ProofCursor {
            hasher: &self.hasher,
            entries: proof,
            next: 0,
        };
        let mut path = NibblePath::from_normal(key);
        let mut encoded = cursor.take(root)?.to_vec();

        let value = loop {
            let node = Node::decode_detached(&encoded)
                .map_err(|e| MptError::InvalidProof(format!("malformed node: {}", e)))?;
            let child = match node {
                DetachedNode::Leaf { key: stored, value } => {
                    break (path == stored).then_some(value);
                }
                DetachedNode::Extension { key: stored, child } => match path.match_and_shift(&stored) {
                    Some(rest) => {
                        path = rest;
                        child
                    }
                    None => break None,
                },
                DetachedNode::Branch { mut children, value } => {
                    if path.is_empty() {
                        break value;
                    }
                    match children[path.get(0) as usize].take() {
                        Some(child) => {
                            path = path.shift(1);
                            child
                        }
                        None => break None,
                    }
                }
            };
            encoded = match child {
                ChildRef::Inline(inline) => inline,
                ChildRef::Hash(hash) => cursor.take(&hash)?.to_vec(),
            };
        };

        cursor.finish()?;
        Ok(value)
    }

    /// True when `proof` shows `key` maps to exactly `value`.
    pub fn verify_inclusion(
        &self,
        root: &[u8],
        key: &[u8],
        value: &[u8],
        proof: &[Vec<u8>],
    ) -> MptResult<bool> {
        Ok(self.verify(root, key, proof)?.as_deref() == Some(value))
    }

    /// True when `proof` shows `key` is absent.
    pub fn verify_exclusion(&self, root: &[u8], key: &[u8], proof: &[Vec<u8>]) -> MptResult<bool> {
        Ok(self.verify(root, key, proof)?.is_none())
    }
}
