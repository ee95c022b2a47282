//! Trees shared by the test suites.

use std::fmt;

use proptest::prelude::*;

use crate::tree::{ChildStore, Node, NodeId, Tree, TreeId};

pub(crate) fn id(raw: usize) -> NodeId {
    NodeId::from(raw)
}

pub(crate) fn ids(raw: impl IntoIterator<Item = usize>) -> Vec<NodeId> {
    raw.into_iter().map(NodeId::from).collect()
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum TestTree {
    /// ```text
    /// 0 ── 1 ── 3 ── 8
    /// │    ├─ 4
    /// │    └─ 5 ── 9, 10, 11, 12
    /// └─ 2 ── 6, 7
    /// ```
    Sample,
    /// `n` nodes, each the only child of the previous one.
    Chain(usize),
    /// A root with `n` leaf children.
    Star(usize),
}

impl fmt::Display for TestTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestTree::Sample => write!(f, "sample"),
            TestTree::Chain(n) => write!(f, "chain {n}"),
            TestTree::Star(n) => write!(f, "star {n}"),
        }
    }
}

impl TestTree {
    /// `(child, parent)` pairs in attachment order. Payloads are `"n<id>"`.
    pub(crate) fn edges(&self) -> Vec<(usize, Option<usize>)> {
        match *self {
            TestTree::Sample => vec![
                (0, None),
                (1, Some(0)),
                (2, Some(0)),
                (3, Some(1)),
                (4, Some(1)),
                (5, Some(1)),
                (6, Some(2)),
                (7, Some(2)),
                (8, Some(3)),
                (9, Some(5)),
                (10, Some(5)),
                (11, Some(5)),
                (12, Some(5)),
            ],
            TestTree::Chain(n) => (0..n).map(|i| (i, i.checked_sub(1))).collect(),
            TestTree::Star(n) => (0..=n).map(|i| (i, (i > 0).then_some(0))).collect(),
        }
    }

    pub(crate) fn build<C: ChildStore>(&self) -> Tree<String, C> {
        let mut tree = Tree::new(TreeId::from(0));
        for (child, parent) in self.edges() {
            tree.attach(
                Node::with_id(id(child), format!("n{child}")).at_index(usize::MAX),
                parent.map(id),
            )
            .unwrap_or_else(|e| panic!("building {self}: {e}"));
        }
        tree
    }
}

/// Random trees given as `(child, parent)` pairs, parents always attached first.
///
/// Entry `i` describes node `i`; its parent is drawn among the nodes before it.
pub(crate) fn arbitrary_edges(
    max_nodes: usize,
) -> impl Strategy<Value = Vec<(usize, Option<usize>)>> {
    prop::collection::vec(any::<prop::sample::Index>(), 0..max_nodes).prop_map(|picks| {
        std::iter::once((0, None))
            .chain(
                picks
                    .into_iter()
                    .enumerate()
                    .map(|(i, pick)| (i + 1, Some(pick.index(i + 1)))),
            )
            .collect()
    })
}

pub(crate) fn from_edges<C: ChildStore>(edges: &[(usize, Option<usize>)]) -> Tree<String, C> {
    let mut tree = Tree::new(TreeId::from(0));
    for &(child, parent) in edges {
        tree.attach(
            Node::with_id(id(child), format!("n{child}")).at_index(usize::MAX),
            parent.map(id),
        )
        .expect("edges describe a valid tree");
    }
    tree
}
