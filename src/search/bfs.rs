use log::trace;

use crate::tree::{ChildStore, Node, NodeId, OrderedChildren, Tree};

use super::{AcceptAll, DepthBound, NodeFilter, Search, SearchCore, SearchError, SearchOptions};

/// Level-order traversal.
///
/// Keeps the current level and a cursor into it. When the level is exhausted
/// the next one is built from the children of every node of the level, in
/// index order, unless the depth bound was reached.
pub struct BreadthFirstSearch<'a, P, C = OrderedChildren, F = AcceptAll> {
    core: SearchCore<'a, P, C>,
    filter: F,
    level: Vec<NodeId>,
    cursor: usize,
    depth: usize,
}

impl<'a, P, C: ChildStore> BreadthFirstSearch<'a, P, C> {
    /// A search starting at the root of `tree`.
    pub fn new(tree: &'a Tree<P, C>) -> Self {
        BreadthFirstSearch {
            core: SearchCore::new(tree),
            filter: AcceptAll,
            level: Vec::new(),
            cursor: 0,
            depth: 0,
        }
    }
}

impl<'a, P, C: ChildStore, F> BreadthFirstSearch<'a, P, C, F> {
    pub fn with_start(mut self, start: NodeId) -> Result<Self, SearchError> {
        self.core.set_start(start)?;
        Ok(self)
    }

    pub fn with_max_depth(mut self, max_depth: i64) -> Result<Self, SearchError> {
        self.core.set_bound(DepthBound::new(Some(max_depth))?);
        Ok(self)
    }

    pub fn with_options(mut self, options: &SearchOptions) -> Result<Self, SearchError> {
        self.core.set_bound(options.depth_bound()?);
        Ok(self)
    }

    pub fn with_filter<G: NodeFilter<P, C>>(self, filter: G) -> BreadthFirstSearch<'a, P, C, G> {
        BreadthFirstSearch {
            core: self.core,
            filter,
            level: self.level,
            cursor: self.cursor,
            depth: self.depth,
        }
    }

    /// Builds the next level from the children of the current one.
    fn descend(&mut self) {
        let tree = self.core.tree();
        let mut next = Vec::new();
        for &parent in &self.level {
            let Some(node) = tree.node(parent) else {
                continue;
            };
            for child in node.child_ids() {
                self.core.discover(child, parent, self.depth + 1);
                next.push(child);
            }
        }
        trace!("bfs: level {} holds {} nodes", self.depth + 1, next.len());
        self.level = next;
        self.cursor = 0;
        self.depth += 1;
    }
}

impl<'a, P: 'a, C: ChildStore + 'a, F: NodeFilter<P, C>> Search<'a, P, C>
    for BreadthFirstSearch<'a, P, C, F>
{
    fn core(&self) -> &SearchCore<'a, P, C> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SearchCore<'a, P, C> {
        &mut self.core
    }

    fn restart(&mut self, start: NodeId) {
        self.level = vec![start];
        self.cursor = 0;
        self.depth = 0;
    }

    fn raw_next(&mut self) -> Option<NodeId> {
        loop {
            if let Some(&id) = self.level.get(self.cursor) {
                self.cursor += 1;
                return Some(id);
            }
            if self.level.is_empty() || !self.core.bound().admits_children_at(self.depth) {
                self.level.clear();
                return None;
            }
            self.descend();
        }
    }

    fn accepts(&self, node: &Node<P, C>) -> bool {
        self.filter.accept(node)
    }
}
