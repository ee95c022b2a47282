use std::fmt;

use ahash::AHashMap;

use crate::tree::{Node, NodeId};

/// Records, for every node a traversal discovered below its start node, the
/// parent it was reached from.
pub struct NodeMap<'a, P, C> {
    entries: AHashMap<NodeId, (NodeId, &'a Node<P, C>)>,
}

impl<P, C> Default for NodeMap<'_, P, C> {
    fn default() -> Self {
        NodeMap {
            entries: AHashMap::default(),
        }
    }
}

impl<P: fmt::Debug, C: fmt::Debug> fmt::Debug for NodeMap<'_, P, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(child, (parent, _))| (child, parent)))
            .finish()
    }
}

impl<'a, P, C> NodeMap<'a, P, C> {
    pub(super) fn record(&mut self, child: NodeId, parent: NodeId, node: &'a Node<P, C>) {
        self.entries.insert(child, (parent, node));
    }

    pub(super) fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, child: NodeId) -> bool {
        self.entries.contains_key(&child)
    }

    /// The parent `child` was discovered from. `None` for the start node and
    /// for nodes not discovered yet.
    pub fn parent_of(&self, child: NodeId) -> Option<NodeId> {
        self.entries.get(&child).map(|(parent, _)| *parent)
    }

    pub fn node(&self, child: NodeId) -> Option<&'a Node<P, C>> {
        self.entries.get(&child).map(|(_, node)| *node)
    }

    /// `child`, then each recorded parent up to the start node.
    pub fn ancestors(&self, child: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(child), |id| self.parent_of(*id))
    }

    /// `(child, parent)` pairs, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.entries.iter().map(|(child, (parent, _))| (*child, *parent))
    }
}

/// Depth of every node a traversal reached, relative to its start node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DepthMap {
    depths: AHashMap<NodeId, usize>,
}

impl DepthMap {
    pub(super) fn record(&mut self, id: NodeId, depth: usize) {
        self.depths.insert(id, depth);
    }

    pub(super) fn clear(&mut self) {
        self.depths.clear();
    }

    pub fn depth(&self, id: NodeId) -> Option<usize> {
        self.depths.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.depths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.depths.is_empty()
    }

    /// Deepest level reached so far.
    pub fn max_depth(&self) -> Option<usize> {
        self.depths.values().copied().max()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, usize)> + '_ {
        self.depths.iter().map(|(id, depth)| (*id, *depth))
    }
}
