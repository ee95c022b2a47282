//! Keyed containers whose elements carry their own ordinal position.
//!
//! [`OrderedIndexCollection`] stores elements by key, but its semantic order is
//! given by the `index` each element exposes through [`HasIndex`]. After every
//! structural operation the indices form exactly `{0, …, n-1}`:
//!
//! *   [`add`](OrderedIndexCollection::add) opens a gap at the requested index by
//!     shuffling every element at or after it up by one.
//! *   [`delete`](OrderedIndexCollection::delete) closes the gap by shuffling every
//!     later element down by one.
//! *   [`set_index`](OrderedIndexCollection::set_index) is a delete followed by an
//!     add at the clamped target.
//!
//! The same collection backs the child list of every node in an ordered
//! [`Tree`](crate::tree::Tree), and is usable on its own as a sequenced container.

use std::fmt;
use std::hash::Hash;

use ahash::RandomState;
use indexmap::IndexMap;
use log::trace;
use thiserror::Error;

#[cfg(test)]
mod test;

/// Keys accepted by an [`OrderedIndexCollection`].
///
/// Keys are non-negative integers at heart; the signed entry points of the
/// collection go through [`CollectionKey::try_from_signed`].
pub trait CollectionKey: Copy + Eq + Hash + fmt::Debug {
    fn from_raw(raw: usize) -> Self;

    fn raw(self) -> usize;

    /// Converts a signed raw key, rejecting negative values.
    fn try_from_signed(raw: i64) -> Result<Self, CollectionError> {
        usize::try_from(raw)
            .map(Self::from_raw)
            .map_err(|_| CollectionError::InvalidKey(raw))
    }
}

impl CollectionKey for usize {
    fn from_raw(raw: usize) -> Self {
        raw
    }

    fn raw(self) -> usize {
        self
    }
}

/// Elements that expose a mutable ordinal position.
pub trait HasIndex {
    fn index(&self) -> usize;

    fn set_index(&mut self, index: usize);
}

/// Errors raised by collection operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CollectionError {
    #[error("no element with key {0}")]
    KeyNotFound(usize),
    #[error("an element with key {0} already exists")]
    DuplicateKey(usize),
    #[error("invalid key {0}: keys must be non-negative")]
    InvalidKey(i64),
}

/// A keyed collection kept sorted by element index.
#[derive(Clone)]
pub struct OrderedIndexCollection<K, T> {
    /// Backing map, always sorted by `T::index`, so that the position of an
    /// entry equals its index.
    elements: IndexMap<K, T, RandomState>,
}

impl<K, T> Default for OrderedIndexCollection<K, T> {
    fn default() -> Self {
        OrderedIndexCollection {
            elements: IndexMap::with_hasher(RandomState::new()),
        }
    }
}

impl<K: fmt::Debug, T: fmt::Debug> fmt::Debug for OrderedIndexCollection<K, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.elements.iter()).finish()
    }
}

impl<K: CollectionKey, T: HasIndex> OrderedIndexCollection<K, T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn contains(&self, key: K) -> bool {
        self.elements.contains_key(&key)
    }

    pub fn get(&self, key: K) -> Option<&T> {
        self.elements.get(&key)
    }

    /// Returns the key of the element sitting at `index`.
    pub fn key_at(&self, index: usize) -> Option<K> {
        self.elements.get_index(index).map(|(k, _)| *k)
    }

    /// Returns the current index of the element stored under `key`.
    pub fn position_of(&self, key: K) -> Option<usize> {
        self.elements.get(&key).map(HasIndex::index)
    }

    /// Iterates `(key, element)` pairs in index order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (K, &T)> + ExactSizeIterator + '_ {
        self.elements.iter().map(|(k, v)| (*k, v))
    }

    /// Iterates keys in index order.
    pub fn keys(&self) -> impl DoubleEndedIterator<Item = K> + ExactSizeIterator + '_ {
        self.elements.keys().copied()
    }

    /// Inserts `element` under `key` at the position given by its index.
    ///
    /// An index past the end is clamped to the current length (append).
    /// Otherwise every element whose index is at least the target is moved
    /// up by one to make room.
    pub fn add(&mut self, key: K, mut element: T) -> Result<(), CollectionError> {
        if self.elements.contains_key(&key) {
            return Err(CollectionError::DuplicateKey(key.raw()));
        }

        let target = element.index().min(self.elements.len());
        self.shuffle_up(target);
        element.set_index(target);
        trace!("collection: add {key:?} at index {target}");
        self.elements.insert(key, element);
        self.sort();

        Ok(())
    }

    /// Removes and returns the element stored under `key`, moving every later
    /// element down by one.
    pub fn delete(&mut self, key: K) -> Result<T, CollectionError> {
        let element = self
            .elements
            .shift_remove(&key)
            .ok_or(CollectionError::KeyNotFound(key.raw()))?;
        let removed = element.index();
        self.shuffle_down(removed);
        trace!("collection: delete {key:?} from index {removed}");

        Ok(element)
    }

    /// Moves the element under `key` to `index`, clamped to `[0, len - 1]`.
    pub fn set_index(&mut self, key: K, index: usize) -> Result<(), CollectionError> {
        let max_index = self
            .elements
            .len()
            .checked_sub(1)
            .filter(|_| self.elements.contains_key(&key))
            .ok_or(CollectionError::KeyNotFound(key.raw()))?;
        let index = trim_index(index, max_index);

        let mut element = self.delete(key)?;
        element.set_index(index);
        self.add(key, element)
    }

    /// Replaces the element under `key`, returning the previous one.
    ///
    /// When the replacement asks for a different index the element is
    /// re-inserted at that index.
    pub fn update(&mut self, key: K, element: T) -> Result<T, CollectionError> {
        let old_index = self
            .position_of(key)
            .ok_or(CollectionError::KeyNotFound(key.raw()))?;

        if element.index() == old_index {
            let slot = self
                .elements
                .get_mut(&key)
                .expect("[consistency] the key was just looked up");
            return Ok(std::mem::replace(slot, element));
        }

        let old = self.delete(key)?;
        self.add(key, element)?;
        Ok(old)
    }

    /// Runs `f` on the element under `key`.
    ///
    /// Whatever `f` does to the index is undone, use
    /// [`set_index`](Self::set_index) to move elements.
    pub fn modify<R>(&mut self, key: K, f: impl FnOnce(&mut T) -> R) -> Result<R, CollectionError> {
        let element = self
            .elements
            .get_mut(&key)
            .ok_or(CollectionError::KeyNotFound(key.raw()))?;
        let index = element.index();
        let out = f(&mut *element);
        element.set_index(index);
        Ok(out)
    }

    /// Signed-key variant of [`add`](Self::add).
    pub fn add_signed(&mut self, key: i64, element: T) -> Result<(), CollectionError> {
        self.add(K::try_from_signed(key)?, element)
    }

    /// Signed-key variant of [`delete`](Self::delete).
    pub fn delete_signed(&mut self, key: i64) -> Result<T, CollectionError> {
        self.delete(K::try_from_signed(key)?)
    }

    /// Signed-key variant of [`get`](Self::get).
    pub fn get_signed(&self, key: i64) -> Result<Option<&T>, CollectionError> {
        Ok(self.get(K::try_from_signed(key)?))
    }

    /// Returns true if the indices are exactly `{0, …, n-1}` in storage order.
    pub fn is_contiguous(&self) -> bool {
        self.elements
            .values()
            .enumerate()
            .all(|(position, element)| element.index() == position)
    }

    fn shuffle_up(&mut self, from: usize) {
        for element in self.elements.values_mut() {
            let index = element.index();
            if index >= from {
                element.set_index(index + 1);
            }
        }
    }

    fn shuffle_down(&mut self, removed: usize) {
        for element in self.elements.values_mut() {
            let index = element.index();
            if index > removed {
                element.set_index(index - 1);
            }
        }
    }

    fn sort(&mut self) {
        // `sort_by` is stable: equal indices keep their insertion order.
        self.elements
            .sort_by(|_, a, _, b| a.index().cmp(&b.index()));
    }
}

/// Clamps a proposed index into `[0, max_index]`.
fn trim_index(proposed: usize, max_index: usize) -> usize {
    proposed.min(max_index)
}

impl<K: CollectionKey, T: HasIndex> FromIterator<(K, T)> for OrderedIndexCollection<K, T> {
    /// Collects elements, adding them one by one.
    ///
    /// # Panics
    ///
    /// Panics on duplicate keys.
    fn from_iter<I: IntoIterator<Item = (K, T)>>(iter: I) -> Self {
        let mut collection = OrderedIndexCollection::new();
        for (key, element) in iter {
            collection
                .add(key, element)
                .expect("[precondition] keys must be unique");
        }
        collection
    }
}

/// A plain element carrying only its index.
///
/// Useful when the collection is used purely to order a set of keys, which is
/// how tree nodes order their children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Slot {
    pub index: usize,
}

impl Slot {
    pub fn at(index: usize) -> Self {
        Slot { index }
    }
}

impl HasIndex for Slot {
    fn index(&self) -> usize {
        self.index
    }

    fn set_index(&mut self, index: usize) {
        self.index = index;
    }
}
