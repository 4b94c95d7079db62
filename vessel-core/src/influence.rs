use crate::attractor::Attractor;
use crate::types::NodeRef;
use std::collections::BTreeMap;

/// Per-step association between tree nodes and the attraction points that
/// influence them.
///
/// The association phase fills this map, the growth phase consumes it, and
/// the kill phase sweeps the attractions it mentions. Growth needs each
/// node's full attraction list (for the bifurcation-spread test and the
/// best-line fit), so the map stores the attractions themselves rather
/// than accumulated directions.
///
/// Entries are keyed by [`NodeRef`] in a `BTreeMap`, so iteration runs in
/// (tree, node) order and a run is reproducible for a fixed seed.
#[derive(Debug, Default)]
pub struct InfluenceMap {
    entries: BTreeMap<NodeRef, Vec<Attractor>>,
}

impl InfluenceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `attr` influences `node` this step.
    pub fn add(&mut self, node: NodeRef, attr: Attractor) {
        self.entries.entry(node).or_default().push(attr);
    }

    /// Attractions associated with `node`, if any.
    pub fn attractors(&self, node: NodeRef) -> Option<&[Attractor]> {
        self.entries.get(&node).map(Vec::as_slice)
    }

    /// Iterates all associations in (tree, node) order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeRef, &[Attractor])> {
        self.entries.iter().map(|(nref, attrs)| (*nref, attrs.as_slice()))
    }

    /// Number of influenced nodes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
