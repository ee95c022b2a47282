//! The per-node state machine driving depth-first traversals.
//!
//! A depth-first engine keeps a [`VisitState`] for every node of the subtree
//! it walks and, at each step, asks its [`TraversalOrder`] which way to move
//! from the current node. Pre- and post-order only differ in that decision.

/// How far a depth-first traversal got with a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VisitState {
    #[default]
    NeverVisited,
    PartiallyVisited,
    FullyVisited,
}

/// Where the cursor goes next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Movement {
    /// To the first child that is not fully visited.
    MoveDown,
    /// To the parent. Moving up from the start node ends the traversal.
    MoveUp,
    /// Stay, and emit the current node.
    DontMove,
}

/// What the engine knows about the current node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeContext {
    pub state: VisitState,
    pub has_children: bool,
    /// Vacuously true for leaves.
    pub all_children_visited: bool,
    /// The depth bound forbids descending any further.
    pub at_max_depth: bool,
}

impl NodeContext {
    fn can_descend(&self) -> bool {
        self.has_children && !self.all_children_visited && !self.at_max_depth
    }
}

/// The decision for one step: a movement, and the state the current node
/// takes before the cursor leaves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub movement: Movement,
    pub mark: Option<VisitState>,
}

impl Step {
    const fn new(movement: Movement, mark: Option<VisitState>) -> Self {
        Step { movement, mark }
    }
}

/// Decides the movement of a depth-first traversal.
pub trait TraversalOrder {
    fn step(context: NodeContext) -> Step;
}

/// Parents are emitted before their children.
#[derive(Debug, Clone, Copy, Default)]
pub struct Preorder;

impl TraversalOrder for Preorder {
    fn step(context: NodeContext) -> Step {
        use Movement::*;
        use VisitState::*;

        match context.state {
            NeverVisited => Step::new(DontMove, Some(PartiallyVisited)),
            PartiallyVisited if context.can_descend() => Step::new(MoveDown, None),
            PartiallyVisited => Step::new(MoveUp, Some(FullyVisited)),
            FullyVisited => Step::new(MoveUp, None),
        }
    }
}

/// Children are emitted before their parents.
#[derive(Debug, Clone, Copy, Default)]
pub struct Postorder;

impl TraversalOrder for Postorder {
    fn step(context: NodeContext) -> Step {
        use Movement::*;
        use VisitState::*;

        match context.state {
            NeverVisited if context.can_descend() => Step::new(MoveDown, Some(PartiallyVisited)),
            NeverVisited => Step::new(DontMove, Some(FullyVisited)),
            PartiallyVisited if context.can_descend() => Step::new(MoveDown, None),
            PartiallyVisited => Step::new(DontMove, Some(FullyVisited)),
            FullyVisited => Step::new(MoveUp, None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(
        state: VisitState,
        has_children: bool,
        all_visited: bool,
        at_max: bool,
    ) -> NodeContext {
        NodeContext {
            state,
            has_children,
            all_children_visited: all_visited,
            at_max_depth: at_max,
        }
    }

    #[test]
    fn preorder_transitions() {
        use Movement::*;
        use VisitState::*;

        assert_eq!(
            Preorder::step(context(NeverVisited, true, false, false)),
            Step::new(DontMove, Some(PartiallyVisited))
        );
        assert_eq!(
            Preorder::step(context(PartiallyVisited, true, false, false)).movement,
            MoveDown
        );
        assert_eq!(
            Preorder::step(context(PartiallyVisited, true, false, true)),
            Step::new(MoveUp, Some(FullyVisited))
        );
        assert_eq!(
            Preorder::step(context(PartiallyVisited, false, true, false)),
            Step::new(MoveUp, Some(FullyVisited))
        );
        assert_eq!(Preorder::step(context(FullyVisited, true, true, false)).movement, MoveUp);
    }

    #[test]
    fn postorder_transitions() {
        use Movement::*;
        use VisitState::*;

        assert_eq!(
            Postorder::step(context(NeverVisited, true, false, false)),
            Step::new(MoveDown, Some(PartiallyVisited))
        );
        assert_eq!(
            Postorder::step(context(NeverVisited, false, true, false)),
            Step::new(DontMove, Some(FullyVisited))
        );
        assert_eq!(
            Postorder::step(context(NeverVisited, true, false, true)),
            Step::new(DontMove, Some(FullyVisited))
        );
        assert_eq!(
            Postorder::step(context(PartiallyVisited, true, true, false)),
            Step::new(DontMove, Some(FullyVisited))
        );
        assert_eq!(Postorder::step(context(FullyVisited, false, true, false)).movement, MoveUp);
    }
}
