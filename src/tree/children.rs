//! Child storage policies.
//!
//! A [`Node`](super::Node) keeps its children in a [`ChildStore`]. Two policies are provided:
//!
//! *   [`OrderedChildren`]: children sit at the index they ask for, backed by an
//!     [`OrderedIndexCollection`]. Implements [`OrderedChildStore`], which enables
//!     [`Tree::set_index`](super::Tree::set_index).
//! *   [`UnorderedChildren`]: requested indices are ignored and children are kept
//!     in attachment order.
//!
//! Both keep the sibling indices contiguous, so traversal order is always the
//! index order of the store.

use ahash::RandomState;
use indexmap::IndexSet;

use crate::collection::{CollectionError, CollectionKey, OrderedIndexCollection, Slot};

use super::NodeId;

/// Storage for the children of one node.
pub trait ChildStore: Default {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn contains(&self, id: NodeId) -> bool;

    /// Adds a child, asking for position `index`. Returns the position it got.
    fn insert(&mut self, id: NodeId, index: usize) -> Result<usize, CollectionError>;

    /// Removes a child, returning the position it had.
    fn remove(&mut self, id: NodeId) -> Result<usize, CollectionError>;

    fn index_of(&self, id: NodeId) -> Option<usize>;

    /// Child ids in index order.
    fn ids(&self) -> impl DoubleEndedIterator<Item = NodeId> + '_;

    fn is_contiguous(&self) -> bool;
}

/// Child stores that honor requested positions and can move children.
pub trait OrderedChildStore: ChildStore {
    /// Moves `id` to `index`, clamped to the last position.
    fn move_to(&mut self, id: NodeId, index: usize) -> Result<(), CollectionError>;
}

impl CollectionKey for NodeId {
    fn from_raw(raw: usize) -> Self {
        NodeId(raw)
    }

    fn raw(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Default)]
pub struct OrderedChildren {
    slots: OrderedIndexCollection<NodeId, Slot>,
}

impl ChildStore for OrderedChildren {
    fn len(&self) -> usize {
        self.slots.len()
    }

    fn contains(&self, id: NodeId) -> bool {
        self.slots.contains(id)
    }

    fn insert(&mut self, id: NodeId, index: usize) -> Result<usize, CollectionError> {
        self.slots.add(id, Slot::at(index))?;
        Ok(self
            .slots
            .position_of(id)
            .expect("[consistency] the slot was just added"))
    }

    fn remove(&mut self, id: NodeId) -> Result<usize, CollectionError> {
        self.slots.delete(id).map(|slot| slot.index)
    }

    fn index_of(&self, id: NodeId) -> Option<usize> {
        self.slots.position_of(id)
    }

    fn ids(&self) -> impl DoubleEndedIterator<Item = NodeId> + '_ {
        self.slots.keys()
    }

    fn is_contiguous(&self) -> bool {
        self.slots.is_contiguous()
    }
}

impl OrderedChildStore for OrderedChildren {
    fn move_to(&mut self, id: NodeId, index: usize) -> Result<(), CollectionError> {
        self.slots.set_index(id, index)
    }
}

#[derive(Debug, Clone, Default)]
pub struct UnorderedChildren {
    ids: IndexSet<NodeId, RandomState>,
}

impl ChildStore for UnorderedChildren {
    fn len(&self) -> usize {
        self.ids.len()
    }

    fn contains(&self, id: NodeId) -> bool {
        self.ids.contains(&id)
    }

    fn insert(&mut self, id: NodeId, _index: usize) -> Result<usize, CollectionError> {
        let (position, fresh) = self.ids.insert_full(id);
        if !fresh {
            return Err(CollectionError::DuplicateKey(id.0));
        }
        Ok(position)
    }

    fn remove(&mut self, id: NodeId) -> Result<usize, CollectionError> {
        self.ids
            .shift_remove_full(&id)
            .map(|(position, _)| position)
            .ok_or(CollectionError::KeyNotFound(id.0))
    }

    fn index_of(&self, id: NodeId) -> Option<usize> {
        self.ids.get_index_of(&id)
    }

    fn ids(&self) -> impl DoubleEndedIterator<Item = NodeId> + '_ {
        self.ids.iter().copied()
    }

    fn is_contiguous(&self) -> bool {
        // Positions in an `IndexSet` are dense by construction.
        true
    }
}
