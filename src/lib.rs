//! # Idtree
//!
//! Idtree is a Rust library for rooted trees of identified nodes.
//! A [`Tree`](tree::Tree) owns its nodes, addresses them by id and refuses
//! every mutation that would break its shape: duplicate ids, cycles, a second
//! root or parents that are not members.
//!
//! On top of the tree sit restartable [searches](search) (breadth-first and
//! depth-first pre/post-order, bounded in depth and filtered), and the
//! [`OrderedIndexCollection`](collection::OrderedIndexCollection) used to keep
//! siblings in a caller-chosen order.

pub mod collection;
pub mod search;
pub mod tree;

#[cfg(test)]
mod test_trees;
