//! Rooted trees of identified nodes.
//!
//! The [`Tree`] is the arena: it owns every [`Node`], addresses them by [`NodeId`],
//! and is the only place where topology changes. Nodes refer to their parent and
//! children by id, navigation always goes through the tree.
//!
//! Every mutation validates before it touches anything, so a failed call leaves
//! the tree exactly as it was. The invariants kept are:
//!
//! *   at most one node without a parent (the root),
//! *   every parent id refers to a member of the tree,
//! *   no id appears twice,
//! *   following parent links from any node reaches the root without revisiting a node,
//! *   parent and child links agree, and sibling indices are contiguous.
//!
//! Whether sibling order is caller-controlled is a property of the child store
//! `C` (see [`children`]); the default [`OrderedChildren`] honors requested
//! indices and enables [`Tree::set_index`].

use std::fmt;
use std::rc::Rc;

use ahash::{AHashMap, RandomState};
use bitvec::vec::BitVec;
use derive_more::{Display, From, Into};
use indexmap::IndexMap;
use itertools::Itertools;
use log::debug;
use thiserror::Error;

use crate::collection::CollectionError;

pub mod children;
mod draw;
pub mod iter;
mod node;
pub mod record;


pub use self::children::{ChildStore, OrderedChildStore, OrderedChildren, UnorderedChildren};
pub use self::iter::{AncestorsIter, PostorderIter, PreorderIter};
pub use self::node::Node;
pub use self::record::NodeRecord;

/// Identifier of a node, unique within a tree.
#[derive(Clone, Debug, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, From, Into, Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "bincode", derive(bincode::Encode, bincode::Decode))]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Converts a signed id, rejecting negative values.
    pub fn try_from_signed(raw: i64) -> Result<Self, TreeError> {
        usize::try_from(raw)
            .map(NodeId)
            .map_err(|_| TreeError::InvalidIdentity(raw))
    }
}

/// Identifier of a tree.
#[derive(Clone, Debug, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, From, Into, Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "bincode", derive(bincode::Encode, bincode::Decode))]
pub struct TreeId(pub(crate) usize);

impl TreeId {
    /// Converts a signed id, rejecting negative values.
    pub fn try_from_signed(raw: i64) -> Result<Self, TreeError> {
        usize::try_from(raw)
            .map(TreeId)
            .map_err(|_| TreeError::InvalidIdentity(raw))
    }
}

/// Errors that can occur during tree operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TreeError {
    // Identity.
    #[error("invalid identity {0}: ids must be non-negative")]
    InvalidIdentity(i64),
    #[error("invalid index {0}: indices must be non-negative")]
    InvalidIndex(i64),
    #[error("identity is already bound to {0}")]
    IdentityAlreadyBound(usize),
    #[error("node has no identity")]
    IdentityUnset,
    #[error("a node with id {0} is already in the tree")]
    DuplicateIdentity(NodeId),
    #[error("{0} does not fit a signed record field")]
    RecordOverflow(usize),

    // Topology.
    #[error("parent {0} is not in the tree")]
    ParentNotFound(NodeId),
    #[error("node {node} refers to parent {parent}, which is neither loaded nor in the tree")]
    OrphanParent { node: NodeId, parent: NodeId },
    #[error("the tree already has root {0}")]
    RootAlreadySet(NodeId),
    #[error("a tree needs exactly one root, found {0}")]
    RootCountViolation(usize),
    #[error("node {0} would become its own ancestor")]
    CircularGraph(NodeId),
    #[error("node {0} is not in the tree")]
    NotInTree(NodeId),
    #[error("node belongs to tree {found}, not tree {expected}")]
    WrongTree { expected: TreeId, found: TreeId },
    #[error("parent and child links of node {0} disagree")]
    ChildMismatch(NodeId),
    #[error("children of node {0} are not indexed contiguously")]
    IndexGap(NodeId),

    // Deletion.
    #[error("node {0} has children, deleting it requires subtree deletion")]
    InteriorNodeDeletion(NodeId),

    // Payload.
    #[error("payload rejected by the validator (node {0:?})")]
    InvalidPayload(Option<NodeId>),

    #[error(transparent)]
    Collection(#[from] CollectionError),
}

/// Decides whether a payload may be stored in a node.
pub trait PayloadValidator<P> {
    fn validate(&self, payload: &P) -> bool;
}

impl<P, F: Fn(&P) -> bool> PayloadValidator<P> for F {
    fn validate(&self, payload: &P) -> bool {
        self(payload)
    }
}

/// Validator accepting every payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAnyPayload;

impl<P> PayloadValidator<P> for AcceptAnyPayload {
    fn validate(&self, _: &P) -> bool {
        true
    }
}

/// A rooted tree.
///
/// `P` is the payload type, `C` the child store deciding whether sibling order
/// is caller-controlled.
pub struct Tree<P, C = OrderedChildren> {
    id: TreeId,
    root: Option<NodeId>,
    nodes: AHashMap<NodeId, Node<P, C>>,
    validator: Rc<dyn PayloadValidator<P>>,
}

impl<P: Clone, C: Clone> Clone for Tree<P, C> {
    fn clone(&self) -> Self {
        Tree {
            id: self.id,
            root: self.root,
            nodes: self.nodes.clone(),
            validator: Rc::clone(&self.validator),
        }
    }
}

impl<P: fmt::Debug, C: fmt::Debug> fmt::Debug for Tree<P, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tree")
            .field("id", &self.id)
            .field("root", &self.root)
            .field("nodes", &self.nodes)
            .finish_non_exhaustive()
    }
}

impl<P, C: ChildStore> Default for Tree<P, C> {
    fn default() -> Self {
        Self::new(TreeId::default())
    }
}

/// Queries.
impl<P, C: ChildStore> Tree<P, C> {
    pub fn new(id: TreeId) -> Self {
        Tree {
            id,
            root: None,
            nodes: AHashMap::default(),
            validator: Rc::new(AcceptAnyPayload),
        }
    }

    /// Installs the validator consulted whenever a payload enters the tree.
    #[must_use]
    pub fn with_validator(mut self, validator: impl PayloadValidator<P> + 'static) -> Self {
        self.validator = Rc::new(validator);
        self
    }

    pub fn id(&self) -> TreeId {
        self.id
    }

    /// Changes the tree id. Only allowed while the tree is empty.
    pub fn set_id(&mut self, id: TreeId) -> Result<(), TreeError> {
        if !self.is_empty() && id != self.id {
            return Err(TreeError::IdentityAlreadyBound(self.id.0));
        }
        self.id = id;
        Ok(())
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node<P, C>> {
        self.nodes.get(&id)
    }

    pub fn payload(&self, id: NodeId) -> Option<&P> {
        self.nodes.get(&id).map(Node::payload)
    }

    /// Iterates all nodes, in no particular order.
    pub fn iter_nodes(&self) -> impl Iterator<Item = (NodeId, &Node<P, C>)> {
        self.nodes.iter().map(|(id, node)| (*id, node))
    }

    pub fn iter_node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Children of `id`, in index order.
    pub fn children_of(
        &self,
        id: NodeId,
    ) -> Result<impl DoubleEndedIterator<Item = NodeId> + '_, TreeError> {
        self.nodes
            .get(&id)
            .map(Node::child_ids)
            .ok_or(TreeError::NotInTree(id))
    }

    pub fn parent_of(&self, id: NodeId) -> Result<Option<NodeId>, TreeError> {
        self.nodes
            .get(&id)
            .map(Node::parent_id)
            .ok_or(TreeError::NotInTree(id))
    }

    /// True if `id` is in the tree and has no children.
    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.nodes.get(&id).is_some_and(Node::is_leaf)
    }

    /// True if `id` is in the tree and has children.
    pub fn is_interior(&self, id: NodeId) -> bool {
        self.nodes.get(&id).is_some_and(|n| !n.is_leaf())
    }

    pub fn leaves(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .filter(|(_, n)| n.is_leaf())
            .map(|(id, _)| *id)
    }

    pub fn interior_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .filter(|(_, n)| !n.is_leaf())
            .map(|(id, _)| *id)
    }

    /// `id` followed by each of its ancestors up to the root.
    pub fn ancestors(&self, id: NodeId) -> AncestorsIter<'_, P, C> {
        AncestorsIter::new(self, id)
    }

    /// Pre-order walk of the subtree rooted at `id`.
    pub fn descendants(&self, id: NodeId) -> PreorderIter<'_, P, C> {
        PreorderIter::new(self, id)
    }

    /// Post-order walk of the subtree rooted at `id`.
    pub fn descendants_postorder(&self, id: NodeId) -> PostorderIter<'_, P, C> {
        PostorderIter::new(self, id)
    }

    /// Number of parent hops from `id` to the root.
    pub fn depth(&self, id: NodeId) -> Option<usize> {
        self.contains(id).then(|| self.ancestors(id).count() - 1)
    }

    /// Re-checks every structural invariant, reporting the first violation.
    pub fn validate(&self) -> Result<(), TreeError> {
        let roots = self.nodes.values().filter(|n| n.is_root()).count();
        if !self.is_empty() && (roots != 1 || self.root.is_none()) {
            return Err(TreeError::RootCountViolation(roots));
        }

        for (&id, node) in &self.nodes {
            if let Some(tree) = node.tree_id() {
                if tree != self.id {
                    return Err(TreeError::WrongTree {
                        expected: self.id,
                        found: tree,
                    });
                }
            }

            match node.parent_id() {
                None => {
                    if self.root != Some(id) || node.index() != 0 {
                        return Err(TreeError::ChildMismatch(id));
                    }
                }
                Some(parent) => {
                    let parent_node = self
                        .nodes
                        .get(&parent)
                        .ok_or(TreeError::ParentNotFound(parent))?;
                    if parent_node.children().index_of(id) != Some(node.index()) {
                        return Err(TreeError::ChildMismatch(id));
                    }
                }
            }

            for child in node.child_ids() {
                if self.nodes.get(&child).and_then(Node::parent_id) != Some(id) {
                    return Err(TreeError::ChildMismatch(child));
                }
            }
            if !node.children().is_contiguous() {
                return Err(TreeError::IndexGap(id));
            }

            if self.ancestors(id).last() != self.root {
                return Err(TreeError::CircularGraph(id));
            }
        }

        Ok(())
    }

    /// Walks the ancestors of `parent` looking for `id`.
    fn check_cycle(&self, id: NodeId, parent: NodeId) -> Result<(), TreeError> {
        if self.ancestors(parent).contains(&id) {
            return Err(TreeError::CircularGraph(id));
        }
        Ok(())
    }

    fn check_payload(&self, node: &Node<P, C>) -> Result<(), TreeError> {
        if !self.validator.validate(node.payload()) {
            return Err(TreeError::InvalidPayload(node.id()));
        }
        Ok(())
    }

    fn check_tree_id(&self, node: &Node<P, C>) -> Result<(), TreeError> {
        match node.tree_id() {
            Some(found) if found != self.id => Err(TreeError::WrongTree {
                expected: self.id,
                found,
            }),
            _ => Ok(()),
        }
    }
}

/// Mutations.
impl<P, C: ChildStore> Tree<P, C> {
    /// Attaches a detached node under `parent`, or as the root when `parent` is `None`.
    ///
    /// The node's requested [`index`](Node::index) decides where it lands among
    /// its siblings (for ordered child stores).
    ///
    /// # Errors
    ///
    /// * [`TreeError::IdentityUnset`] if the node has no id.
    /// * [`TreeError::DuplicateIdentity`] if the id is already taken.
    /// * [`TreeError::WrongTree`] if the node is bound to another tree.
    /// * [`TreeError::RootAlreadySet`] when attaching a second root.
    /// * [`TreeError::CircularGraph`] if `parent` is the node itself, or the
    ///   parent chain leads back to it.
    /// * [`TreeError::ParentNotFound`] if `parent` is not a member.
    /// * [`TreeError::InvalidPayload`] if the validator rejects the payload.
    pub fn attach(
        &mut self,
        node: Node<P, C>,
        parent: Option<NodeId>,
    ) -> Result<NodeId, TreeError> {
        let id = node.id().ok_or(TreeError::IdentityUnset)?;
        if self.contains(id) {
            return Err(TreeError::DuplicateIdentity(id));
        }
        self.check_tree_id(&node)?;
        match parent {
            None => {
                if let Some(root) = self.root {
                    return Err(TreeError::RootAlreadySet(root));
                }
            }
            Some(parent) => {
                if parent == id {
                    return Err(TreeError::CircularGraph(id));
                }
                if !self.contains(parent) {
                    return Err(TreeError::ParentNotFound(parent));
                }
                self.check_cycle(id, parent)?;
            }
        }
        self.check_payload(&node)?;

        self.link(node, parent);
        debug!("tree {}: attached {id} under {parent:?}", self.id);

        Ok(id)
    }

    /// Loads a batch of nodes supplied in any order.
    ///
    /// The whole batch is validated before anything is committed: either every
    /// node ends up in the tree or none does. Parents may be other nodes of the
    /// batch or existing members. Siblings are placed by their requested index,
    /// ties keeping batch order.
    ///
    /// # Errors
    ///
    /// * [`TreeError::IdentityUnset`], [`TreeError::DuplicateIdentity`],
    ///   [`TreeError::WrongTree`] and [`TreeError::InvalidPayload`] per node.
    /// * [`TreeError::RootCountViolation`] unless the tree ends up with exactly one root.
    /// * [`TreeError::OrphanParent`] if a parent is neither in the batch nor in the tree.
    /// * [`TreeError::CircularGraph`] if parent links inside the batch form a cycle.
    pub fn bulk_load(
        &mut self,
        nodes: impl IntoIterator<Item = Node<P, C>>,
    ) -> Result<(), TreeError> {
        let mut batch: IndexMap<NodeId, Node<P, C>, RandomState> = IndexMap::default();
        for node in nodes {
            let id = node.id().ok_or(TreeError::IdentityUnset)?;
            if self.contains(id) || batch.contains_key(&id) {
                return Err(TreeError::DuplicateIdentity(id));
            }
            self.check_tree_id(&node)?;
            self.check_payload(&node)?;
            batch.insert(id, node);
        }
        if batch.is_empty() {
            return Ok(());
        }

        let roots = batch.values().filter(|n| n.is_root()).count() + self.root.iter().count();
        if roots != 1 {
            return Err(TreeError::RootCountViolation(roots));
        }

        for (&id, node) in &batch {
            if let Some(parent) = node.parent_id() {
                if parent == id {
                    return Err(TreeError::CircularGraph(id));
                }
                if !batch.contains_key(&parent) && !self.contains(parent) {
                    return Err(TreeError::OrphanParent { node: id, parent });
                }
            }
        }

        Self::check_batch_cycles(&batch)?;
        self.commit_batch(batch);

        Ok(())
    }

    /// Cycle check over a batch whose parents are known to exist.
    ///
    /// Chains leaving the batch end in the (acyclic) tree. Nodes whose chain
    /// was already verified are skipped, so the whole check is linear.
    fn check_batch_cycles(
        batch: &IndexMap<NodeId, Node<P, C>, RandomState>,
    ) -> Result<(), TreeError> {
        let mut verified: BitVec = BitVec::repeat(false, batch.len());
        let mut on_path: BitVec = BitVec::repeat(false, batch.len());
        let mut path = Vec::new();

        for start in 0..batch.len() {
            let mut current = Some(start);
            while let Some(position) = current {
                if verified[position] {
                    break;
                }
                if on_path[position] {
                    let (id, _) = batch
                        .get_index(position)
                        .expect("[consistency] position comes from the batch");
                    return Err(TreeError::CircularGraph(*id));
                }
                on_path.set(position, true);
                path.push(position);
                current = batch[position]
                    .parent_id()
                    .and_then(|parent| batch.get_index_of(&parent));
            }
            for position in path.drain(..) {
                on_path.set(position, false);
                verified.set(position, true);
            }
        }

        Ok(())
    }

    /// Links a validated batch, parents before children.
    fn commit_batch(&mut self, batch: IndexMap<NodeId, Node<P, C>, RandomState>) {
        let count = batch.len();
        let mut by_parent: AHashMap<Option<NodeId>, Vec<Node<P, C>>> = AHashMap::default();
        for node in batch.into_values() {
            by_parent.entry(node.parent_id()).or_default().push(node);
        }
        for siblings in by_parent.values_mut() {
            siblings.sort_by_key(Node::index);
        }

        // Start from the batch root, or from existing members adopting batch nodes.
        let mut frontier: Vec<Option<NodeId>> = by_parent
            .keys()
            .filter(|parent| parent.map_or(true, |p| self.contains(p)))
            .copied()
            .collect();
        while let Some(parent) = frontier.pop() {
            // Never ask for a slot before the previous sibling, so ties keep batch order.
            let mut floor = 0;
            for mut node in by_parent.remove(&parent).unwrap_or_default() {
                let id = node.bound_id();
                node.index = node.index.max(floor);
                self.link(node, parent);
                floor = self.node_mut(id).index + 1;
                frontier.push(Some(id));
            }
        }
        debug_assert!(by_parent.is_empty(), "[consistency] every batch node is reachable");
        debug!("tree {}: bulk loaded {count} nodes", self.id);
    }

    /// Detaches `id` from the tree, returning the removed nodes.
    ///
    /// Leaves can always be detached. Interior nodes require `allow_subtree`,
    /// in which case descendants are detached first, children before parents,
    /// and returned in that order (the node itself last).
    ///
    /// # Errors
    ///
    /// * [`TreeError::NotInTree`] if `id` is not a member.
    /// * [`TreeError::InteriorNodeDeletion`] if `id` has children and
    ///   `allow_subtree` is false.
    pub fn detach(
        &mut self,
        id: NodeId,
        allow_subtree: bool,
    ) -> Result<Vec<Node<P, C>>, TreeError> {
        let node = self.nodes.get(&id).ok_or(TreeError::NotInTree(id))?;
        if !node.is_leaf() && !allow_subtree {
            return Err(TreeError::InteriorNodeDeletion(id));
        }

        let order = self.descendants_postorder(id).collect_vec();
        let removed = order.into_iter().map(|n| self.unlink(n)).collect_vec();
        debug!("tree {}: detached {} nodes at {id}", self.id, removed.len());

        Ok(removed)
    }

    /// Moves `id` together with its subtree under `new_parent`, asking for
    /// position `index` among the new siblings.
    ///
    /// # Errors
    ///
    /// * [`TreeError::NotInTree`] if `id` is not a member.
    /// * [`TreeError::ParentNotFound`] if `new_parent` is not a member.
    /// * [`TreeError::RootAlreadySet`] if `id` is the root.
    /// * [`TreeError::CircularGraph`] if `new_parent` is `id` or one of its
    ///   descendants.
    pub fn reparent(
        &mut self,
        id: NodeId,
        new_parent: NodeId,
        index: usize,
    ) -> Result<(), TreeError> {
        let old_parent = self.parent_of(id)?.ok_or(TreeError::RootAlreadySet(id))?;
        if !self.contains(new_parent) {
            return Err(TreeError::ParentNotFound(new_parent));
        }
        if new_parent == id {
            return Err(TreeError::CircularGraph(id));
        }
        self.check_cycle(id, new_parent)?;

        self.children_mut(old_parent).remove(id)?;
        self.sync_indices(old_parent);
        self.children_mut(new_parent).insert(id, index)?;
        self.sync_indices(new_parent);
        self.node_mut(id).parent = Some(new_parent);
        debug!("tree {}: moved {id} from {old_parent} to {new_parent}", self.id);

        Ok(())
    }

    /// Replaces the payload of `id`, returning the old one.
    ///
    /// The payload is left unchanged when the validator rejects the new one.
    pub fn set_payload(&mut self, id: NodeId, payload: P) -> Result<P, TreeError> {
        self.nodes
            .get_mut(&id)
            .ok_or(TreeError::NotInTree(id))?
            .set_payload(payload, &*self.validator)
    }

    /// Registers a validated node and links it to its parent.
    fn link(&mut self, mut node: Node<P, C>, parent: Option<NodeId>) {
        let id = node.bound_id();
        let requested = node.index;
        node.unlink();
        node.parent = parent;
        node.tree = Some(self.id);
        node.index = 0;
        self.nodes.insert(id, node);

        match parent {
            Some(parent) => {
                self.children_mut(parent)
                    .insert(id, requested)
                    .expect("[consistency] a fresh id cannot already be a child");
                self.sync_indices(parent);
            }
            None => self.root = Some(id),
        }
    }

    /// Removes a leaf from the tree and its parent's children.
    fn unlink(&mut self, id: NodeId) -> Node<P, C> {
        let mut node = self
            .nodes
            .remove(&id)
            .expect("[precondition] only members can be unlinked");
        debug_assert!(node.is_leaf(), "[precondition] children are unlinked first");

        match node.parent_id() {
            Some(parent) => {
                self.children_mut(parent)
                    .remove(id)
                    .expect("[consistency] a member is listed by its parent");
                self.sync_indices(parent);
            }
            None => self.root = None,
        }
        node.unlink();
        node
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node<P, C> {
        self.nodes
            .get_mut(&id)
            .expect("[consistency] the node must be in the tree")
    }

    fn children_mut(&mut self, id: NodeId) -> &mut C {
        &mut self.node_mut(id).children
    }

    /// Copies the store's positions into the children's `index` fields.
    fn sync_indices(&mut self, parent: NodeId) {
        let positions = self.node_mut(parent).child_ids().collect_vec();
        for (index, child) in positions.into_iter().enumerate() {
            self.node_mut(child).index = index;
        }
    }
}

/// Operations only available when sibling order is caller-controlled.
impl<P, C: OrderedChildStore> Tree<P, C> {
    /// Moves `id` to position `index` among its siblings, clamped to the last
    /// position. The root has no siblings and stays at 0.
    pub fn set_index(&mut self, id: NodeId, index: usize) -> Result<(), TreeError> {
        let Some(parent) = self.parent_of(id)? else {
            return Ok(());
        };
        self.children_mut(parent).move_to(id, index)?;
        self.sync_indices(parent);
        Ok(())
    }
}
