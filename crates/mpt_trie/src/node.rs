use crate::nibbles::NibblePath;
use crate::node_type::NodeType;
use crate::rlp::{self, Item, NULL_ITEM};
use crate::{MptError, MptResult};
use mpt_config::{BRANCH_ITEM_COUNT, BRANCH_WIDTH, INLINE_THRESHOLD};
use mpt_cryptography::HashFunction;
use mpt_persistence::Store;
use once_cell::sync::OnceCell;
use std::mem;

/// Store and hash function a node graph resolves against and persists into.
#[derive(Clone, Copy)]
pub(crate) struct NodeContext<'a> {
    pub(crate) store: &'a dyn Store,
    pub(crate) hasher: &'a HashFunction,
}

impl<'a> NodeContext<'a> {
    pub(crate) fn new(store: &'a dyn Store, hasher: &'a HashFunction) -> Self {
        Self { store, hasher }
    }
}

/// How a clean node is referenced from its parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum NodeRef {
    /// Encoding is persisted under this digest
    Hash(Vec<u8>),
    /// Encoding is below the threshold and embedded in the parent
    Inline,
}

pub(crate) type Children = Box<[Option<Node>; BRANCH_WIDTH]>;

#[derive(Debug)]
pub(crate) enum NodeKind {
    Leaf {
        key: NibblePath,
        value: Vec<u8>,
    },
    Extension {
        key: NibblePath,
        child: Box<Node>,
    },
    Branch {
        children: Children,
        value: Option<Vec<u8>>,
    },
}

/// What a short (leaf or extension) node points at.
enum Tail {
    Value(Vec<u8>),
    Child(Box<Node>),
}

/// Outcome of [`Node::delete`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Removal {
    NotFound,
    Updated,
    /// The subtree is empty and must be unlinked from its parent
    Emptied,
}

/// A node as seen by a traversal callback.
#[derive(Debug, Clone, Copy)]
pub struct NodeVisit<'a> {
    /// Nibble path from the root through this node's own key
    pub path: &'a NibblePath,
    pub node_type: NodeType,
    /// Leaf value or branch value slot
    pub value: Option<&'a [u8]>,
    /// Present for store-backed nodes
    pub hash: Option<&'a [u8]>,
    pub encoded: Option<&'a [u8]>,
}

/// MPT Trie Node
///
/// `reference` is `None` while the node has uncommitted changes. A clean node
/// is either persisted under its hash or small enough to live inline in its
/// parent. Both the raw encoding and the decoded shape are filled lazily, so a
/// node loaded by hash costs nothing until it is navigated.
#[derive(Debug)]
pub(crate) struct Node {
    reference: Option<NodeRef>,
    encoded: OnceCell<Vec<u8>>,
    kind: OnceCell<NodeKind>,
}

fn empty_children() -> Children {
    Box::new(std::array::from_fn(|_| None))
}

impl Node {
    fn dirty(kind: NodeKind) -> Self {
        Self {
            reference: None,
            encoded: OnceCell::new(),
            kind: OnceCell::with_value(kind),
        }
    }

    /// Creates a new leaf node
    pub(crate) fn new_leaf(key: NibblePath, value: Vec<u8>) -> Self {
        Self::dirty(NodeKind::Leaf { key, value })
    }

    /// Creates a stub that is resolved from the store on first use.
    pub(crate) fn from_hash(hash: Vec<u8>) -> Self {
        Self {
            reference: Some(NodeRef::Hash(hash)),
            encoded: OnceCell::new(),
            kind: OnceCell::new(),
        }
    }

    /// Creates a clean node from its own encoding.
    pub(crate) fn from_encoded(encoded: Vec<u8>) -> Self {
        Self {
            reference: Some(NodeRef::Inline),
            encoded: OnceCell::with_value(encoded),
            kind: OnceCell::new(),
        }
    }

    /// Wraps `tail` under `key`; an empty key over a child is the child itself.
    fn short(key: NibblePath, tail: Tail) -> Node {
        match tail {
            Tail::Child(child) if key.is_empty() => *child,
            tail => Self::dirty(Self::short_kind(key, tail)),
        }
    }

    fn short_kind(key: NibblePath, tail: Tail) -> NodeKind {
        match tail {
            Tail::Value(value) => NodeKind::Leaf { key, value },
            Tail::Child(child) => NodeKind::Extension { key, child },
        }
    }

    pub(crate) fn is_dirty(&self) -> bool {
        self.reference.is_none()
    }

    pub(crate) fn hash(&self) -> Option<&[u8]> {
        match &self.reference {
            Some(NodeRef::Hash(hash)) => Some(hash),
            _ => None,
        }
    }

    /// Returns the raw encoding, fetching and verifying it if needed.
    pub(crate) fn encoded(&self, ctx: NodeContext<'_>) -> MptResult<&[u8]> {
        self.encoded
            .get_or_try_init(|| match &self.reference {
                Some(NodeRef::Hash(hash)) => Self::resolve(hash, ctx),
                Some(NodeRef::Inline) => Err(MptError::Internal(
                    "inline node lost its encoding".to_string(),
                )),
                None => Err(MptError::Internal(
                    "dirty node has no encoding".to_string(),
                )),
            })
            .map(Vec::as_slice)
    }

    fn resolve(hash: &[u8], ctx: NodeContext<'_>) -> MptResult<Vec<u8>> {
        let encoded = ctx
            .store
            .get(hash)?
            .ok_or_else(|| MptError::NodeNotFound(hex::encode(hash)))?;
        let actual = ctx.hasher.digest(&encoded);
        if actual != hash {
            log::warn!(
                "store entry {} hashes to {}",
                hex::encode(hash),
                hex::encode(&actual)
            );
            return Err(MptError::CorruptedNode {
                hash: hex::encode(hash),
                actual: hex::encode(actual),
            });
        }
        log::trace!("resolved node {}", hex::encode(hash));
        Ok(encoded)
    }

    /// Returns the decoded shape, parsing it on first use.
    fn kind(&self, ctx: NodeContext<'_>) -> MptResult<&NodeKind> {
        self.kind
            .get_or_try_init(|| Self::decode(self.encoded(ctx)?))
    }

    fn kind_mut(&mut self, ctx: NodeContext<'_>) -> MptResult<&mut NodeKind> {
        self.kind(ctx)?;
        self.kind
            .get_mut()
            .ok_or_else(|| MptError::Internal("node is not materialized".to_string()))
    }

    pub(crate) fn node_type(&self, ctx: NodeContext<'_>) -> MptResult<NodeType> {
        Ok(match self.kind(ctx)? {
            NodeKind::Leaf { .. } => NodeType::Leaf,
            NodeKind::Extension { .. } => NodeType::Extension,
            NodeKind::Branch { .. } => NodeType::Branch,
        })
    }

    fn decode(encoded: &[u8]) -> MptResult<NodeKind> {
        let items = rlp::decode_list(encoded)?;
        if items.len() == NodeType::Leaf.item_count() {
            let (key, terminal) = NibblePath::from_packed(items[0].bytes()?)?;
            if terminal {
                return Ok(NodeKind::Leaf {
                    key,
                    value: items[1].bytes()?.to_vec(),
                });
            }
            if key.is_empty() {
                return Err(MptError::InvalidFormat(
                    "extension with empty key".to_string(),
                ));
            }
            let child = Self::from_item(items[1])?.ok_or_else(|| {
                MptError::InvalidFormat("extension without child".to_string())
            })?;
            return Ok(NodeKind::Extension {
                key,
                child: Box::new(child),
            });
        }

        if items.len() == NodeType::Branch.item_count() {
            let mut children = empty_children();
            for (slot, item) in children.iter_mut().zip(&items[..BRANCH_WIDTH]) {
                *slot = Self::from_item(*item)?;
            }
            let value = items[BRANCH_WIDTH].bytes()?;
            return Ok(NodeKind::Branch {
                children,
                value: (!value.is_empty()).then(|| value.to_vec()),
            });
        }

        Err(MptError::InvalidFormat(format!(
            "node encoding has {} items",
            items.len()
        )))
    }

    /// Turns a child slot of a parent encoding into a lazy node.
    fn from_item(item: Item<'_>) -> MptResult<Option<Node>> {
        Ok(match item {
            Item::Bytes([]) => None,
            Item::Bytes(hash) => Some(Self::from_hash(hash.to_vec())),
            Item::List(encoded) => Some(Self::from_encoded(encoded.to_vec())),
        })
    }

    /// Marks this node dirty and removes its superseded store entry. The node
    /// is materialized first and stays untouched if the removal fails.
    fn mark_dirty(&mut self, ctx: NodeContext<'_>) -> MptResult<()> {
        self.kind(ctx)?;
        if let Some(NodeRef::Hash(hash)) = &self.reference {
            log::trace!("disposing node {}", hex::encode(hash));
            ctx.store.remove(hash)?;
        }
        self.reference = None;
        self.encoded.take();
        Ok(())
    }

    /// Removes the store entry of a node that is being discarded.
    fn dispose(&self, store: &dyn Store) -> MptResult<()> {
        if let Some(hash) = self.hash() {
            log::trace!("disposing node {}", hex::encode(hash));
            store.remove(hash)?;
        }
        Ok(())
    }

    pub(crate) fn get<'a>(
        &'a self,
        key: &NibblePath,
        ctx: NodeContext<'_>,
    ) -> MptResult<Option<&'a [u8]>> {
        match self.kind(ctx)? {
            NodeKind::Branch { children, value } => {
                if key.is_empty() {
                    return Ok(value.as_deref());
                }
                match &children[key.get(0) as usize] {
                    Some(child) => child.get(&key.shift(1), ctx),
                    None => Ok(None),
                }
            }
            NodeKind::Extension { key: stored, child } => match key.match_and_shift(stored) {
                Some(rest) => child.get(&rest, ctx),
                None => Ok(None),
            },
            NodeKind::Leaf { key: stored, value } => Ok(match key.match_and_shift(stored) {
                Some(rest) if rest.is_empty() => Some(value.as_slice()),
                _ => None,
            }),
        }
    }

    /// Inserts `value` at `key` below this node. Returns whether anything
    /// changed; an identical overwrite leaves the node clean.
    ///
    /// Every node on the path is disposed before any of them is rewritten, so
    /// a failing store leaves the contents as they were.
    pub(crate) fn insert(
        &mut self,
        key: NibblePath,
        value: Vec<u8>,
        ctx: NodeContext<'_>,
    ) -> MptResult<bool> {
        if self.get(&key, ctx)? == Some(value.as_slice()) {
            return Ok(false);
        }
        self.upsert(key, value, ctx)?;
        Ok(true)
    }

    fn upsert(&mut self, key: NibblePath, value: Vec<u8>, ctx: NodeContext<'_>) -> MptResult<()> {
        self.mark_dirty(ctx)?;
        match self.kind_mut(ctx)? {
            NodeKind::Branch { children, value: slot } => {
                Self::branch_insert(children, slot, key, value, ctx)
            }
            kind => Self::short_insert(kind, key, value, ctx),
        }
    }

    fn branch_insert(
        children: &mut Children,
        slot: &mut Option<Vec<u8>>,
        key: NibblePath,
        value: Vec<u8>,
        ctx: NodeContext<'_>,
    ) -> MptResult<()> {
        if key.is_empty() {
            *slot = Some(value);
            return Ok(());
        }
        let rest = key.shift(1);
        match &mut children[key.get(0) as usize] {
            Some(child) => child.upsert(rest, value, ctx),
            empty => {
                *empty = Some(Node::new_leaf(rest, value));
                Ok(())
            }
        }
    }

    fn short_insert(
        kind: &mut NodeKind,
        key: NibblePath,
        value: Vec<u8>,
        ctx: NodeContext<'_>,
    ) -> MptResult<()> {
        let stored = match kind {
            NodeKind::Leaf { key, .. } | NodeKind::Extension { key, .. } => key.clone(),
            NodeKind::Branch { .. } => {
                return Err(MptError::Internal("branch is not a short node".to_string()))
            }
        };
        let common = stored.common_prefix(&key);

        if let NodeKind::Leaf { value: current, .. } = kind {
            if common.len() == stored.len() && common.len() == key.len() {
                *current = value;
                return Ok(());
            }
        }

        if common.is_empty() {
            let (stored, tail) = Self::take_short(kind)?;
            let (mut children, mut slot) = Self::to_branch(stored, tail)?;
            Self::branch_insert(&mut children, &mut slot, key, value, ctx)?;
            *kind = NodeKind::Branch {
                children,
                value: slot,
            };
            return Ok(());
        }

        if common.len() == stored.len() {
            let rest = key.shift(common.len());
            return match kind {
                NodeKind::Leaf { value: current, .. } => {
                    // The new key strictly extends this leaf's key
                    let mut children = empty_children();
                    let mut slot = Some(mem::take(current));
                    Self::branch_insert(&mut children, &mut slot, rest, value, ctx)?;
                    *kind = NodeKind::Extension {
                        key: stored,
                        child: Box::new(Self::dirty(NodeKind::Branch {
                            children,
                            value: slot,
                        })),
                    };
                    Ok(())
                }
                NodeKind::Extension { child, .. } => {
                    if child.node_type(ctx)? != NodeType::Branch {
                        return Err(MptError::Internal(
                            "extension does not point to a branch".to_string(),
                        ));
                    }
                    child.upsert(rest, value, ctx)
                }
                NodeKind::Branch { .. } => {
                    Err(MptError::Internal("branch is not a short node".to_string()))
                }
            };
        }

        // Split at the common prefix
        let (stored, tail) = Self::take_short(kind)?;
        let mut children = empty_children();
        let remainder = stored.shift(common.len());
        children[remainder.get(0) as usize] = Some(Self::short(remainder.shift(1), tail));

        let rest = key.shift(common.len());
        let mut slot = None;
        if rest.is_empty() {
            slot = Some(value);
        } else {
            children[rest.get(0) as usize] = Some(Node::new_leaf(rest.shift(1), value));
        }
        *kind = NodeKind::Extension {
            key: common,
            child: Box::new(Self::dirty(NodeKind::Branch {
                children,
                value: slot,
            })),
        };
        Ok(())
    }

    /// Moves the key and tail out of a short node, leaving a placeholder.
    fn take_short(kind: &mut NodeKind) -> MptResult<(NibblePath, Tail)> {
        let placeholder = NodeKind::Leaf {
            key: NibblePath::EMPTY,
            value: Vec::new(),
        };
        match mem::replace(kind, placeholder) {
            NodeKind::Leaf { key, value } => Ok((key, Tail::Value(value))),
            NodeKind::Extension { key, child } => Ok((key, Tail::Child(child))),
            branch => {
                *kind = branch;
                Err(MptError::Internal("branch is not a short node".to_string()))
            }
        }
    }

    /// Distributes a short node's tail into a fresh branch by its first nibble.
    fn to_branch(stored: NibblePath, tail: Tail) -> MptResult<(Children, Option<Vec<u8>>)> {
        let mut children = empty_children();
        if stored.is_empty() {
            return match tail {
                Tail::Value(value) => Ok((children, Some(value))),
                Tail::Child(_) => Err(MptError::Internal(
                    "extension with empty key".to_string(),
                )),
            };
        }
        children[stored.get(0) as usize] = Some(Self::short(stored.shift(1), tail));
        Ok((children, None))
    }

    /// Deletes `key` below this node, compacting on the way back up.
    ///
    /// Disposal runs top-down ahead of the structural change, including the
    /// sibling a collapsing branch will absorb.
    pub(crate) fn delete(&mut self, key: &NibblePath, ctx: NodeContext<'_>) -> MptResult<Removal> {
        if self.get(key, ctx)?.is_none() {
            return Ok(Removal::NotFound);
        }
        self.delete_present(key, ctx)
    }

    fn delete_present(&mut self, key: &NibblePath, ctx: NodeContext<'_>) -> MptResult<Removal> {
        self.mark_dirty(ctx)?;
        let removal = match self.kind_mut(ctx)? {
            NodeKind::Leaf { .. } => Removal::Emptied,
            NodeKind::Extension { key: stored, child } => {
                let rest = key.match_and_shift(stored).ok_or_else(|| {
                    MptError::Internal("deleted key left the extension path".to_string())
                })?;
                child.delete_present(&rest, ctx)?
            }
            NodeKind::Branch { children, value } => {
                Self::branch_delete(children, value, key, ctx)?
            }
        };
        if removal == Removal::Updated {
            self.try_compact(ctx)?;
        }
        Ok(removal)
    }

    fn branch_delete(
        children: &mut Children,
        value: &mut Option<Vec<u8>>,
        key: &NibblePath,
        ctx: NodeContext<'_>,
    ) -> MptResult<Removal> {
        let occupied = children.iter().filter(|c| c.is_some()).count() + usize::from(value.is_some());
        if key.is_empty() {
            if occupied == 2 {
                Self::release_survivor(children, None, ctx)?;
            }
            *value = None;
        } else {
            let index = key.get(0) as usize;
            let emptied_below = match &children[index] {
                Some(child) => child.node_type(ctx)? == NodeType::Leaf,
                None => {
                    return Err(MptError::Internal(
                        "deleted key left the branch path".to_string(),
                    ))
                }
            };
            if occupied == 2 && emptied_below {
                Self::release_survivor(children, Some(index), ctx)?;
            }
            let Some(child) = children[index].as_mut() else {
                return Err(MptError::Internal("occupied slot vanished".to_string()));
            };
            if child.delete_present(&key.shift(1), ctx)? == Removal::Emptied {
                children[index] = None;
            }
        }

        if value.is_none() && children.iter().all(Option::is_none) {
            return Ok(Removal::Emptied);
        }
        Ok(Removal::Updated)
    }

    /// Disposes the child left over once slot `removed` (or the value slot)
    /// empties, unless it is a branch that survives under an extension.
    fn release_survivor(
        children: &mut Children,
        removed: Option<usize>,
        ctx: NodeContext<'_>,
    ) -> MptResult<()> {
        for (index, slot) in children.iter_mut().enumerate() {
            if Some(index) == removed {
                continue;
            }
            if let Some(survivor) = slot {
                if survivor.node_type(ctx)? != NodeType::Branch {
                    survivor.mark_dirty(ctx)?;
                }
            }
        }
        Ok(())
    }

    /// Restores the minimal-node invariant after a deletion below this node.
    fn try_compact(&mut self, ctx: NodeContext<'_>) -> MptResult<()> {
        let replacement = match self.kind_mut(ctx)? {
            NodeKind::Leaf { .. } => None,
            NodeKind::Extension { key, child } => {
                if child.node_type(ctx)? == NodeType::Branch {
                    None
                } else {
                    // Folds the non-branch child into this extension
                    child.dispose(ctx.store)?;
                    let (child_key, tail) = child.detach_short()?;
                    Some(Self::short_kind(key.concat(&child_key), tail))
                }
            }
            NodeKind::Branch { children, value } => Self::branch_compact(children, value, ctx)?,
        };
        if let Some(kind) = replacement {
            *self.kind_mut(ctx)? = kind;
        }
        Ok(())
    }

    /// Collapses a branch with a single occupied slot.
    fn branch_compact(
        children: &mut Children,
        value: &mut Option<Vec<u8>>,
        ctx: NodeContext<'_>,
    ) -> MptResult<Option<NodeKind>> {
        let occupied = children.iter().filter(|c| c.is_some()).count() + usize::from(value.is_some());
        if occupied != 1 {
            return Ok(None);
        }
        if let Some(value) = value.take() {
            return Ok(Some(NodeKind::Leaf {
                key: NibblePath::EMPTY,
                value,
            }));
        }

        let Some(index) = children.iter().position(Option::is_some) else {
            return Err(MptError::Internal("occupied slot vanished".to_string()));
        };
        let prefix = NibblePath::single(index as u8);
        let Some(child) = children[index].as_mut() else {
            return Err(MptError::Internal("occupied slot vanished".to_string()));
        };
        if child.node_type(ctx)? == NodeType::Branch {
            return Ok(children[index].take().map(|child| NodeKind::Extension {
                key: prefix,
                child: Box::new(child),
            }));
        }
        child.dispose(ctx.store)?;
        let (child_key, tail) = child.detach_short()?;
        Ok(Some(Self::short_kind(prefix.concat(&child_key), tail)))
    }

    /// Moves the key and tail out of a materialized leaf or extension being
    /// absorbed by its parent.
    fn detach_short(&mut self) -> MptResult<(NibblePath, Tail)> {
        let kind = self
            .kind
            .get_mut()
            .ok_or_else(|| MptError::Internal("node is not materialized".to_string()))?;
        Self::take_short(kind)
    }

    /// Serializes dirty nodes bottom-up and returns the reference to embed in
    /// the parent: the inline encoding or the encoded hash.
    pub(crate) fn commit(&mut self, ctx: NodeContext<'_>, force_hash: bool) -> MptResult<Vec<u8>> {
        if let Some(NodeRef::Hash(hash)) = &self.reference {
            return Ok(rlp::encode_bytes(hash));
        }
        if self.reference.is_some() {
            let encoded = self.encoded(ctx)?.to_vec();
            return if force_hash {
                self.store_hashed(encoded, ctx)
            } else {
                Ok(encoded)
            };
        }

        let kind = self
            .kind
            .get_mut()
            .ok_or_else(|| MptError::Internal("dirty node is not materialized".to_string()))?;
        let encoded = match kind {
            NodeKind::Leaf { key, value } => rlp::encode_list(&[
                rlp::encode_bytes(&key.to_packed(true)),
                rlp::encode_bytes(value),
            ]),
            NodeKind::Extension { key, child } => {
                let child_ref = child.commit(ctx, false)?;
                rlp::encode_list(&[rlp::encode_bytes(&key.to_packed(false)), child_ref])
            }
            NodeKind::Branch { children, value } => {
                let mut items = Vec::with_capacity(BRANCH_ITEM_COUNT);
                for child in children.iter_mut() {
                    items.push(match child {
                        Some(child) => child.commit(ctx, false)?,
                        None => NULL_ITEM.to_vec(),
                    });
                }
                items.push(rlp::encode_bytes(value.as_deref().unwrap_or_default()));
                rlp::encode_list(&items)
            }
        };

        if encoded.len() >= INLINE_THRESHOLD || force_hash {
            self.store_hashed(encoded, ctx)
        } else {
            self.reference = Some(NodeRef::Inline);
            self.encoded = OnceCell::with_value(encoded.clone());
            Ok(encoded)
        }
    }

    fn store_hashed(&mut self, encoded: Vec<u8>, ctx: NodeContext<'_>) -> MptResult<Vec<u8>> {
        let hash = ctx.hasher.digest(&encoded);
        ctx.store.set(&hash, &encoded)?;
        let reference = rlp::encode_bytes(&hash);
        self.reference = Some(NodeRef::Hash(hash));
        self.encoded = OnceCell::with_value(encoded);
        Ok(reference)
    }

    /// Depth-first walk. Returns `false` once the visitor asked to stop.
    pub(crate) fn traverse<F>(
        &self,
        path: &NibblePath,
        ctx: NodeContext<'_>,
        visitor: &mut F,
    ) -> MptResult<bool>
    where
        F: FnMut(&NodeVisit<'_>) -> bool,
    {
        let kind = self.kind(ctx)?;
        let (full, node_type, value) = match kind {
            NodeKind::Leaf { key, value } => (path.concat(key), NodeType::Leaf, Some(value.as_slice())),
            NodeKind::Extension { key, .. } => (path.concat(key), NodeType::Extension, None),
            NodeKind::Branch { value, .. } => (path.clone(), NodeType::Branch, value.as_deref()),
        };
        let visit = NodeVisit {
            path: &full,
            node_type,
            value,
            hash: self.hash(),
            encoded: self.encoded.get().map(Vec::as_slice),
        };
        if !visitor(&visit) {
            return Ok(false);
        }

        match kind {
            NodeKind::Leaf { .. } => Ok(true),
            NodeKind::Extension { child, .. } => child.traverse(&full, ctx, visitor),
            NodeKind::Branch { children, .. } => {
                for (index, child) in children.iter().enumerate() {
                    if let Some(child) = child {
                        let child_path = full.concat(&NibblePath::single(index as u8));
                        if !child.traverse(&child_path, ctx, visitor)? {
                            return Ok(false);
                        }
                    }
                }
                Ok(true)
            }
        }
    }

    /// Appends the encodings of the store-backed nodes on the path to `key`.
    pub(crate) fn collect_proof(
        &self,
        key: &NibblePath,
        ctx: NodeContext<'_>,
        proof: &mut Vec<Vec<u8>>,
    ) -> MptResult<()> {
        if self.is_dirty() {
            return Err(MptError::Dirty);
        }
        if self.hash().is_some() {
            proof.push(self.encoded(ctx)?.to_vec());
        }
        match self.kind(ctx)? {
            NodeKind::Branch { children, .. } => {
                if key.is_empty() {
                    return Ok(());
                }
                match &children[key.get(0) as usize] {
                    Some(child) => child.collect_proof(&key.shift(1), ctx, proof),
                    None => Ok(()),
                }
            }
            NodeKind::Extension { key: stored, child } => match key.match_and_shift(stored) {
                Some(rest) => child.collect_proof(&rest, ctx, proof),
                None => Ok(()),
            },
            NodeKind::Leaf { .. } => Ok(()),
        }
    }

    /// Decodes a single encoding without touching any store. Child
    /// references are returned as they appear in the encoding.
    pub(crate) fn decode_detached(encoded: &[u8]) -> MptResult<DetachedNode> {
        Ok(match Self::decode(encoded)? {
            NodeKind::Leaf { key, value } => DetachedNode::Leaf { key, value },
            NodeKind::Extension { key, child } => DetachedNode::Extension {
                key,
                child: child.detached_ref()?,
            },
            NodeKind::Branch { children, value } => {
                let mut refs: Vec<Option<ChildRef>> = Vec::with_capacity(BRANCH_WIDTH);
                for child in children.iter() {
                    refs.push(child.as_ref().map(Node::detached_ref).transpose()?);
                }
                DetachedNode::Branch {
                    children: refs,
                    value,
                }
            }
        })
    }

    fn detached_ref(&self) -> MptResult<ChildRef> {
        match (&self.reference, self.encoded.get()) {
            (Some(NodeRef::Hash(hash)), _) => Ok(ChildRef::Hash(hash.clone())),
            (Some(NodeRef::Inline), Some(encoded)) => Ok(ChildRef::Inline(encoded.clone())),
            _ => Err(MptError::Internal("child reference is not clean".to_string())),
        }
    }
}

/// A child slot as it appears inside a parent encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ChildRef {
    Hash(Vec<u8>),
    Inline(Vec<u8>),
}

/// A decoded node whose children are left as references.
#[derive(Debug)]
pub(crate) enum DetachedNode {
    Leaf {
        key: NibblePath,
        value: Vec<u8>,
    },
    Extension {
        key: NibblePath,
        child: ChildRef,
    },
    Branch {
        children: Vec<Option<ChildRef>>,
        value: Option<Vec<u8>>,
    },
}
