/// Identifier for a growth node stored in a [`crate::tree::Tree`].
///
/// Index into `Tree::nodes`; valid only for the `Tree` that issued it.
pub type NodeId = usize;
