/// Identifier for a branch in a [`crate::tree::Tree`].
///
/// This is an index into the tree's branch storage, and is only meaningful
/// within the lifetime of a given `Tree` instance. Branches are stored in
/// depth-first pre-order, so a parent always has a smaller id than its
/// children.
pub type NodeId = usize;
