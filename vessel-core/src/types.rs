use serde::{Deserialize, Serialize};

/// Identifier for a node in a [`crate::tree::Tree`].
///
/// This is an index into `Tree::nodes`, and is only meaningful within
/// the lifetime of a given `Tree` instance.
pub type NodeId = usize;

/// Identifier for a tree in a [`crate::tree::Forest`].
///
/// This is an index into `Forest::trees`. Trees are never removed from a
/// forest, so the id stays valid for the forest's lifetime.
pub type TreeId = usize;

/// Stable handle to one node of one tree in a forest.
///
/// Spatial indices and the influence map refer to nodes through this pair
/// instead of through references: nodes are never deleted, so a handle
/// remains valid as long as the owning forest does. The derived ordering
/// (tree first, then node) is what makes per-step growth iteration and
/// closest-node tie-breaking reproducible.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeRef {
    pub tree: TreeId,
    pub node: NodeId,
}

impl NodeRef {
    pub fn new(tree: TreeId, node: NodeId) -> Self {
        Self { tree, node }
    }
}

/// The two coupled vessel systems.
///
/// Arterial trees grow toward freshly sampled attraction points; attraction
/// points satisfied by the arterial system are handed to the venous system
/// as its attraction sources.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum System {
    Arterial,
    Venous,
}

impl System {
    pub const COUNT: usize = 2;
    pub const ALL: [System; Self::COUNT] = [System::Arterial, System::Venous];

    /// Index of this system into per-system storage arrays.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            System::Arterial => 0,
            System::Venous => 1,
        }
    }
}
