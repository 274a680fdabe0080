//! Read-only tree snapshot of a store subtree.

mod tree;

pub use tree::*;
