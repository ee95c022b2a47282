//! Flat records for moving nodes across a storage or wire boundary.
//!
//! Records carry signed integers, as most external formats do. Converting a
//! record into a [`Node`] rejects negative values.

use std::collections::VecDeque;

use itertools::Itertools;

use super::children::ChildStore;
use super::{Node, NodeId, Tree, TreeError, TreeId};

/// The dehydrated form of a [`Node`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "bincode", derive(bincode::Encode, bincode::Decode))]
pub struct NodeRecord<P> {
    pub id: i64,
    pub parent_id: Option<i64>,
    pub tree_id: i64,
    pub payload: P,
    /// Requested position among the siblings, appended when absent.
    pub index: Option<i64>,
}

fn signed(raw: usize) -> Result<i64, TreeError> {
    i64::try_from(raw).map_err(|_| TreeError::RecordOverflow(raw))
}

impl<P, C: ChildStore> Node<P, C> {
    /// Hydrates a detached node.
    ///
    /// # Errors
    ///
    /// [`TreeError::InvalidIdentity`] for negative ids, [`TreeError::InvalidIndex`]
    /// for a negative index and [`TreeError::CircularGraph`] for a node naming
    /// itself as parent.
    pub fn from_record(record: NodeRecord<P>) -> Result<Self, TreeError> {
        let id = NodeId::try_from_signed(record.id)?;
        let parent = record.parent_id.map(NodeId::try_from_signed).transpose()?;
        let tree = TreeId::try_from_signed(record.tree_id)?;
        let index = match record.index {
            Some(index) => usize::try_from(index).map_err(|_| TreeError::InvalidIndex(index))?,
            None => usize::MAX,
        };

        let mut node = Node::with_id(id, record.payload).at_index(index);
        node.set_parent_id(parent)?;
        node.bind_tree(tree)?;
        Ok(node)
    }

    /// Consumes the node into a record. An unbound node is recorded in tree 0,
    /// an index asking to be appended is recorded as absent.
    ///
    /// # Errors
    ///
    /// [`TreeError::IdentityUnset`] if the node has no id and
    /// [`TreeError::RecordOverflow`] if an id does not fit in an `i64`.
    pub fn into_record(self) -> Result<NodeRecord<P>, TreeError> {
        let id = self.id.ok_or(TreeError::IdentityUnset)?;
        Ok(NodeRecord {
            id: signed(id.0)?,
            parent_id: self.parent.map(|p| signed(p.0)).transpose()?,
            tree_id: signed(self.tree.unwrap_or_default().0)?,
            index: i64::try_from(self.index).ok(),
            payload: self.payload,
        })
    }
}

impl<P: Clone, C: ChildStore + Clone> Node<P, C> {
    pub fn to_record(&self) -> Result<NodeRecord<P>, TreeError> {
        self.clone().into_record()
    }
}

impl<P, C: ChildStore> Tree<P, C> {
    /// Builds a tree from records supplied in any order.
    pub fn from_records(
        id: TreeId,
        records: impl IntoIterator<Item = NodeRecord<P>>,
    ) -> Result<Self, TreeError> {
        let nodes: Vec<Node<P, C>> = records.into_iter().map(Node::from_record).try_collect()?;
        let mut tree = Tree::new(id);
        tree.bulk_load(nodes)?;
        Ok(tree)
    }
}

impl<P: Clone, C: ChildStore> Tree<P, C> {
    /// Dehydrates the tree, parents before children and siblings in index order.
    ///
    /// Feeding the result back to [`Tree::from_records`] rebuilds the same tree.
    ///
    /// # Errors
    ///
    /// [`TreeError::RecordOverflow`] if an id does not fit in an `i64`.
    pub fn to_records(&self) -> Result<Vec<NodeRecord<P>>, TreeError> {
        let tree_id = signed(self.id().0)?;
        let mut records = Vec::with_capacity(self.len());
        let mut queue: VecDeque<NodeId> = self.root().into_iter().collect();

        while let Some(id) = queue.pop_front() {
            let Some(node) = self.node(id) else {
                continue;
            };
            queue.extend(node.child_ids());
            records.push(NodeRecord {
                id: signed(id.0)?,
                parent_id: node.parent_id().map(|p| signed(p.0)).transpose()?,
                tree_id,
                payload: node.payload().clone(),
                index: Some(signed(node.index())?),
            });
        }

        Ok(records)
    }
}
