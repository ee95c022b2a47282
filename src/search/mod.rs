//! Restartable traversals over a [`Tree`].
//!
//! Three engines are provided, all implementing [`Search`]:
//!
//! *   [`BreadthFirstSearch`]: level by level, children in index order.
//! *   [`DepthFirstPreorder`]: a node before its subtree.
//! *   [`DepthFirstPostorder`]: a node after its subtree.
//!
//! Every engine starts at a node of the tree (the root unless told otherwise),
//! can be bounded in depth (`0` yields the start node only) and filtered with a
//! [`NodeFilter`]. Filtering only hides nodes from the output; the walk itself
//! and the [`NodeMap`]/[`DepthMap`] bookkeeping are unaffected.
//!
//! Engines borrow the tree, so it cannot change while a traversal is alive.
//!
//! ```
//! use idtree::search::{DepthFirstPreorder, Search};
//! use idtree::tree::{Node, NodeId, Tree};
//!
//! let mut tree: Tree<&str> = Tree::default();
//! tree.attach(Node::with_id(NodeId::from(0), "root"), None)?;
//! tree.attach(Node::with_id(NodeId::from(1), "leaf"), Some(NodeId::from(0)))?;
//!
//! let mut search = DepthFirstPreorder::new(&tree);
//! let payloads: Vec<_> = search.iter()?.map(|n| *n.payload()).collect();
//! assert_eq!(payloads, ["root", "leaf"]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::marker::PhantomData;

use log::trace;
use thiserror::Error;

use crate::tree::{ChildStore, Node, NodeId, Tree};

mod bfs;
mod dfs;
mod maps;
pub mod visit;


pub use self::bfs::BreadthFirstSearch;
pub use self::dfs::{DepthFirstPostorder, DepthFirstPreorder, DepthFirstSearch};
pub use self::maps::{DepthMap, NodeMap};
pub use self::visit::{Postorder, Preorder, TraversalOrder, VisitState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SearchError {
    #[error("no start node was set")]
    StartNodeUnset,
    #[error("start node {0} is not in the tree")]
    NodeNotInTree(NodeId),
    #[error("invalid depth bound {0}: must be non-negative")]
    InvalidDepthBound(i64),
}

/// Validated maximum depth, relative to the start node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DepthBound(Option<usize>);

impl DepthBound {
    pub const UNBOUNDED: DepthBound = DepthBound(None);

    pub fn new(max_depth: Option<i64>) -> Result<Self, SearchError> {
        max_depth
            .map(|max| usize::try_from(max).map_err(|_| SearchError::InvalidDepthBound(max)))
            .transpose()
            .map(DepthBound)
    }

    pub fn max_depth(self) -> Option<usize> {
        self.0
    }

    /// Whether nodes at `depth` may be descended into.
    pub fn admits_children_at(self, depth: usize) -> bool {
        self.0.map_or(true, |max| depth < max)
    }
}

/// Serializable traversal settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchOptions {
    /// `None` walks the whole subtree, `Some(0)` only the start node.
    pub max_depth: Option<i64>,
}

impl SearchOptions {
    pub fn depth_bound(&self) -> Result<DepthBound, SearchError> {
        DepthBound::new(self.max_depth)
    }
}

/// Decides which traversed nodes are yielded.
pub trait NodeFilter<P, C> {
    fn accept(&self, node: &Node<P, C>) -> bool;
}

impl<P, C, F: Fn(&Node<P, C>) -> bool> NodeFilter<P, C> for F {
    fn accept(&self, node: &Node<P, C>) -> bool {
        self(node)
    }
}

/// Filter yielding every node.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl<P, C> NodeFilter<P, C> for AcceptAll {
    fn accept(&self, _: &Node<P, C>) -> bool {
        true
    }
}

/// State shared by every engine.
pub struct SearchCore<'a, P, C> {
    tree: &'a Tree<P, C>,
    start: Option<NodeId>,
    bound: DepthBound,
    node_map: NodeMap<'a, P, C>,
    depth_map: DepthMap,
    /// Lookahead filled by [`Search::has_next`].
    peeked: Option<Option<NodeId>>,
    /// The engine state matches `start`.
    primed: bool,
}

impl<'a, P, C: ChildStore> SearchCore<'a, P, C> {
    pub(crate) fn new(tree: &'a Tree<P, C>) -> Self {
        SearchCore {
            tree,
            start: tree.root(),
            bound: DepthBound::UNBOUNDED,
            node_map: NodeMap::default(),
            depth_map: DepthMap::default(),
            peeked: None,
            primed: false,
        }
    }

    pub fn tree(&self) -> &'a Tree<P, C> {
        self.tree
    }

    pub fn bound(&self) -> DepthBound {
        self.bound
    }

    fn checked_start(&self) -> Result<NodeId, SearchError> {
        let start = self.start.ok_or(SearchError::StartNodeUnset)?;
        if !self.tree.contains(start) {
            return Err(SearchError::NodeNotInTree(start));
        }
        Ok(start)
    }

    pub(crate) fn set_start(&mut self, start: NodeId) -> Result<(), SearchError> {
        if !self.tree.contains(start) {
            return Err(SearchError::NodeNotInTree(start));
        }
        self.start = Some(start);
        self.primed = false;
        Ok(())
    }

    pub(crate) fn set_bound(&mut self, bound: DepthBound) {
        self.bound = bound;
        self.primed = false;
    }

    /// Records that `child` was reached from `parent`, at `depth` below the start.
    pub(crate) fn discover(&mut self, child: NodeId, parent: NodeId, depth: usize) {
        if let Some(node) = self.tree.node(child) {
            self.node_map.record(child, parent, node);
        }
        self.depth_map.record(child, depth);
    }
}

/// A restartable traversal.
///
/// Implementors provide the raw walk ([`restart`](Search::restart),
/// [`raw_next`](Search::raw_next)) and the filter; lookahead, filtering and
/// resetting are shared.
pub trait Search<'a, P: 'a, C: ChildStore + 'a> {
    fn core(&self) -> &SearchCore<'a, P, C>;

    fn core_mut(&mut self) -> &mut SearchCore<'a, P, C>;

    /// Rewinds the engine-specific state to a fresh walk from `start`.
    fn restart(&mut self, start: NodeId);

    /// The next node of the unfiltered walk.
    fn raw_next(&mut self) -> Option<NodeId>;

    fn accepts(&self, node: &Node<P, C>) -> bool;

    fn start(&self) -> Option<NodeId> {
        self.core().start
    }

    /// Moves the start node and resets the traversal.
    fn set_start(&mut self, start: NodeId) -> Result<(), SearchError> {
        self.core_mut().set_start(start)?;
        self.reset()
    }

    /// Rewinds to the start node, clearing the maps.
    fn reset(&mut self) -> Result<(), SearchError> {
        let core = self.core_mut();
        let start = core.checked_start()?;
        core.node_map.clear();
        core.depth_map.clear();
        core.depth_map.record(start, 0);
        core.peeked = None;
        core.primed = true;
        self.restart(start);
        Ok(())
    }

    /// Whether another node will be yielded. Does not advance.
    fn has_next(&mut self) -> Result<bool, SearchError> {
        Ok(self.peek()?.is_some())
    }

    /// The id [`next_id`](Search::next_id) would return. Does not advance.
    fn peek(&mut self) -> Result<Option<NodeId>, SearchError> {
        prime(self)?;
        if let Some(peeked) = self.core().peeked {
            return Ok(peeked);
        }
        let next = advance(self);
        self.core_mut().peeked = Some(next);
        Ok(next)
    }

    fn next_id(&mut self) -> Result<Option<NodeId>, SearchError> {
        prime(self)?;
        match self.core_mut().peeked.take() {
            Some(peeked) => Ok(peeked),
            None => Ok(advance(self)),
        }
    }

    fn next_node(&mut self) -> Result<Option<&'a Node<P, C>>, SearchError> {
        let tree = self.core().tree;
        Ok(self.next_id()?.and_then(|id| tree.node(id)))
    }

    fn node_map(&self) -> &NodeMap<'a, P, C> {
        &self.core().node_map
    }

    fn depth_map<'s>(&'s self) -> &'s DepthMap
    where
        'a: 's,
    {
        &self.core().depth_map
    }

    /// Iterates the remaining nodes. Validates the start node up front so
    /// that iteration itself cannot fail.
    fn iter(&mut self) -> Result<SearchIter<'_, 'a, P, C, Self>, SearchError>
    where
        Self: Sized,
    {
        prime(self)?;
        Ok(SearchIter {
            search: self,
            tree: PhantomData,
        })
    }

    /// Resets, then drains the traversal.
    fn collect_ids(&mut self) -> Result<Vec<NodeId>, SearchError>
    where
        Self: Sized,
    {
        self.reset()?;
        let mut ids = Vec::new();
        while let Some(id) = self.next_id()? {
            ids.push(id);
        }
        Ok(ids)
    }
}

fn prime<'a, P: 'a, C: ChildStore + 'a, S: Search<'a, P, C> + ?Sized>(
    search: &mut S,
) -> Result<(), SearchError> {
    if search.core().primed {
        return Ok(());
    }
    search.reset()
}

/// Pulls raw nodes until one passes the filter.
fn advance<'a, P: 'a, C: ChildStore + 'a, S: Search<'a, P, C> + ?Sized>(
    search: &mut S,
) -> Option<NodeId> {
    let tree = search.core().tree;
    while let Some(id) = search.raw_next() {
        let node = tree.node(id)?;
        if search.accepts(node) {
            return Some(id);
        }
        trace!("search: filtered out {id}");
    }
    None
}

/// Iterator over the nodes of a primed [`Search`].
pub struct SearchIter<'s, 'a, P, C, S> {
    search: &'s mut S,
    tree: PhantomData<&'a Tree<P, C>>,
}

impl<'a, P: 'a, C: ChildStore + 'a, S: Search<'a, P, C>> Iterator for SearchIter<'_, 'a, P, C, S> {
    type Item = &'a Node<P, C>;

    fn next(&mut self) -> Option<Self::Item> {
        // `iter` primed the search and holds it mutably, so the start cannot change.
        match self.search.next_node() {
            Ok(node) => node,
            Err(e) => {
                debug_assert!(false, "[consistency] primed search failed: {e}");
                None
            }
        }
    }
}
