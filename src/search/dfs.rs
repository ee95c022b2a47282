use std::marker::PhantomData;

use ahash::AHashMap;
use log::trace;

use crate::tree::{ChildStore, Node, NodeId, OrderedChildren, Tree};

use super::visit::{Movement, NodeContext, Postorder, Preorder, TraversalOrder, VisitState};
use super::{AcceptAll, DepthBound, NodeFilter, Search, SearchCore, SearchError, SearchOptions};

/// Depth-first traversal driven by per-node [`VisitState`]s.
///
/// The cursor starts on the start node. At each step the order `O` looks at
/// the current node's state and decides whether to emit it, descend into its
/// first child that is not fully visited, or climb back to its parent.
/// Climbing above the start node ends the traversal.
pub struct DepthFirstSearch<'a, P, C = OrderedChildren, F = AcceptAll, O = Preorder> {
    core: SearchCore<'a, P, C>,
    filter: F,
    visits: AHashMap<NodeId, VisitState>,
    current: Option<NodeId>,
    depth: usize,
    order: PhantomData<O>,
}

pub type DepthFirstPreorder<'a, P, C = OrderedChildren, F = AcceptAll> =
    DepthFirstSearch<'a, P, C, F, Preorder>;

pub type DepthFirstPostorder<'a, P, C = OrderedChildren, F = AcceptAll> =
    DepthFirstSearch<'a, P, C, F, Postorder>;

impl<'a, P, C: ChildStore, O: TraversalOrder> DepthFirstSearch<'a, P, C, AcceptAll, O> {
    /// A search starting at the root of `tree`.
    pub fn new(tree: &'a Tree<P, C>) -> Self {
        DepthFirstSearch {
            core: SearchCore::new(tree),
            filter: AcceptAll,
            visits: AHashMap::default(),
            current: None,
            depth: 0,
            order: PhantomData,
        }
    }
}

impl<'a, P, C: ChildStore, F, O: TraversalOrder> DepthFirstSearch<'a, P, C, F, O> {
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

    pub fn with_filter<G: NodeFilter<P, C>>(self, filter: G) -> DepthFirstSearch<'a, P, C, G, O> {
        DepthFirstSearch {
            core: self.core,
            filter,
            visits: self.visits,
            current: self.current,
            depth: self.depth,
            order: PhantomData,
        }
    }

    /// Visit state of `id` in the running traversal.
    pub fn visit_state(&self, id: NodeId) -> Option<VisitState> {
        self.visits.get(&id).copied()
    }

    fn is_fully_visited(&self, id: NodeId) -> bool {
        self.visits.get(&id) == Some(&VisitState::FullyVisited)
    }
}

impl<'a, P: 'a, C: ChildStore + 'a, F: NodeFilter<P, C>, O: TraversalOrder> Search<'a, P, C>
    for DepthFirstSearch<'a, P, C, F, O>
{
    fn core(&self) -> &SearchCore<'a, P, C> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SearchCore<'a, P, C> {
        &mut self.core
    }

    fn restart(&mut self, start: NodeId) {
        self.visits.clear();
        self.visits.extend(
            self.core
                .tree()
                .descendants(start)
                .map(|id| (id, VisitState::NeverVisited)),
        );
        self.current = Some(start);
        self.depth = 0;
    }

    fn raw_next(&mut self) -> Option<NodeId> {
        let tree = self.core.tree();
        loop {
            let current = self.current?;
            let node = tree.node(current)?;
            let context = NodeContext {
                state: self.visit_state(current).unwrap_or_default(),
                has_children: !node.is_leaf(),
                all_children_visited: node.child_ids().all(|c| self.is_fully_visited(c)),
                at_max_depth: !self.core.bound().admits_children_at(self.depth),
            };
            let step = O::step(context);
            trace!("dfs: {current} {context:?} -> {step:?}");
            if let Some(mark) = step.mark {
                self.visits.insert(current, mark);
            }

            match step.movement {
                Movement::DontMove => return Some(current),
                Movement::MoveDown => {
                    let child = node
                        .child_ids()
                        .find(|c| !self.is_fully_visited(*c))
                        .expect("[consistency] descending requires an unfinished child");
                    self.depth += 1;
                    self.core.discover(child, current, self.depth);
                    self.current = Some(child);
                }
                Movement::MoveUp => {
                    if Some(current) == self.core.start {
                        self.current = None;
                        return None;
                    }
                    self.depth = self.depth.saturating_sub(1);
                    self.current = node.parent_id();
                }
            }
        }
    }

    fn accepts(&self, node: &Node<P, C>) -> bool {
        self.filter.accept(node)
    }
}
