use super::children::{ChildStore, OrderedChildren};
use super::{NodeId, PayloadValidator, TreeError, TreeId};

/// A tree vertex.
///
/// Nodes are created detached. Once attached, the owning [`Tree`](super::Tree)
/// is the only one allowed to change the parent, the index and the children,
/// so those setters only exist for detached nodes (`&mut Node` is never handed
/// out by a tree).
#[derive(Debug, Clone)]
pub struct Node<P, C = OrderedChildren> {
    pub(super) id: Option<NodeId>,
    pub(super) parent: Option<NodeId>,
    pub(super) tree: Option<TreeId>,
    /// Position among the siblings. For detached nodes this is the requested
    /// position used when attaching.
    pub(super) index: usize,
    pub(super) payload: P,
    pub(super) children: C,
}

impl<P, C: ChildStore> Node<P, C> {
    /// Creates a detached node without an id.
    pub fn new(payload: P) -> Self {
        Node {
            id: None,
            parent: None,
            tree: None,
            index: 0,
            payload,
            children: C::default(),
        }
    }

    /// Creates a detached node with the given id.
    pub fn with_id(id: NodeId, payload: P) -> Self {
        Node {
            id: Some(id),
            ..Node::new(payload)
        }
    }

    /// Sets the requested position among the future siblings.
    #[must_use]
    pub fn at_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    /// Sets the parent id the node will be attached under.
    pub fn under(mut self, parent: NodeId) -> Result<Self, TreeError> {
        self.set_parent_id(Some(parent))?;
        Ok(self)
    }

    /// Binds the node to a tree id ahead of attaching.
    pub fn in_tree(mut self, tree: TreeId) -> Result<Self, TreeError> {
        self.bind_tree(tree)?;
        Ok(self)
    }

    pub fn id(&self) -> Option<NodeId> {
        self.id
    }

    /// Sets the id. Ids are immutable once set.
    pub fn set_id(&mut self, id: NodeId) -> Result<(), TreeError> {
        match self.id {
            Some(bound) => Err(TreeError::IdentityAlreadyBound(bound.0)),
            None if self.parent == Some(id) => Err(TreeError::CircularGraph(id)),
            None => {
                self.id = Some(id);
                Ok(())
            }
        }
    }

    /// Sets the id from a signed value, rejecting negative ones.
    pub fn set_id_signed(&mut self, id: i64) -> Result<(), TreeError> {
        self.set_id(NodeId::try_from_signed(id)?)
    }

    pub fn parent_id(&self) -> Option<NodeId> {
        self.parent
    }

    /// Sets the parent id of a detached node.
    pub fn set_parent_id(&mut self, parent: Option<NodeId>) -> Result<(), TreeError> {
        if let (Some(id), Some(parent)) = (self.id, parent) {
            if id == parent {
                return Err(TreeError::CircularGraph(id));
            }
        }
        self.parent = parent;
        Ok(())
    }

    pub fn tree_id(&self) -> Option<TreeId> {
        self.tree
    }

    /// Binds the node to a tree. The tree id can only be set once.
    pub fn bind_tree(&mut self, tree: TreeId) -> Result<(), TreeError> {
        match self.tree {
            Some(bound) if bound != tree => Err(TreeError::IdentityAlreadyBound(bound.0)),
            _ => {
                self.tree = Some(tree);
                Ok(())
            }
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }

    pub fn into_payload(self) -> P {
        self.payload
    }

    /// Replaces the payload if `validator` accepts it, returning the old one.
    ///
    /// On rejection the current payload is left untouched.
    pub fn set_payload<V>(&mut self, payload: P, validator: &V) -> Result<P, TreeError>
    where
        V: PayloadValidator<P> + ?Sized,
    {
        if !validator.validate(&payload) {
            return Err(TreeError::InvalidPayload(self.id));
        }
        Ok(std::mem::replace(&mut self.payload, payload))
    }

    pub fn children(&self) -> &C {
        &self.children
    }

    /// Child ids in index order.
    pub fn child_ids(&self) -> impl DoubleEndedIterator<Item = NodeId> + '_ {
        self.children.ids()
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// The id of a node that lives inside a tree.
    pub(super) fn bound_id(&self) -> NodeId {
        self.id
            .expect("[consistency] nodes inside a tree always carry an id")
    }

    /// Resets the tree-managed links after removal from a tree.
    pub(super) fn unlink(&mut self) {
        self.parent = None;
        self.children = C::default();
    }
}
