//! Helper iterators walking the topology of a [`Tree`].
//!
//! These are the plain structural walks the tree itself relies on (cycle
//! checks, subtree deletion, validation). The configurable, restartable
//! traversals live in [`crate::search`].

use super::children::ChildStore;
use super::{NodeId, Tree};

/// Walks from a node up to the root, yielding the starting node first.
pub struct AncestorsIter<'a, P, C> {
    tree: &'a Tree<P, C>,
    /// The next node to yield. `None` once the root has been yielded.
    current: Option<NodeId>,
    /// Upper bound on the number of steps, guarding against corrupted links.
    remaining: usize,
}

impl<'a, P, C: ChildStore> AncestorsIter<'a, P, C> {
    pub(super) fn new(tree: &'a Tree<P, C>, start: NodeId) -> Self {
        AncestorsIter {
            tree,
            current: tree.contains(start).then_some(start),
            remaining: tree.len(),
        }
    }
}

impl<P, C: ChildStore> Iterator for AncestorsIter<'_, P, C> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.current?;
        if self.remaining == 0 {
            self.current = None;
            return None;
        }
        self.remaining -= 1;
        self.current = self.tree.node(node).and_then(|n| n.parent_id());
        Some(node)
    }
}

/// Pre-order walk of a subtree, children in index order.
pub struct PreorderIter<'a, P, C> {
    tree: &'a Tree<P, C>,
    stack: Vec<NodeId>,
}

impl<'a, P, C: ChildStore> PreorderIter<'a, P, C> {
    pub(super) fn new(tree: &'a Tree<P, C>, start: NodeId) -> Self {
        let stack = if tree.contains(start) {
            vec![start]
        } else {
            vec![]
        };
        PreorderIter { tree, stack }
    }
}

impl<P, C: ChildStore> Iterator for PreorderIter<'_, P, C> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        if let Some(n) = self.tree.node(node) {
            // Reversed so that the first child is popped next.
            self.stack.extend(n.child_ids().rev());
        }
        Some(node)
    }
}

/// Post-order walk of a subtree: every node comes after all its children.
pub struct PostorderIter<'a, P, C> {
    tree: &'a Tree<P, C>,
    /// Nodes paired with whether their children were already pushed.
    stack: Vec<(NodeId, bool)>,
}

impl<'a, P, C: ChildStore> PostorderIter<'a, P, C> {
    pub(super) fn new(tree: &'a Tree<P, C>, start: NodeId) -> Self {
        let stack = if tree.contains(start) {
            vec![(start, false)]
        } else {
            vec![]
        };
        PostorderIter { tree, stack }
    }
}

impl<P, C: ChildStore> Iterator for PostorderIter<'_, P, C> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (node, expanded) = self.stack.pop()?;
            if expanded {
                return Some(node);
            }
            self.stack.push((node, true));
            if let Some(n) = self.tree.node(node) {
                self.stack
                    .extend(n.child_ids().rev().map(|child| (child, false)));
            }
        }
    }
}
