use crate::types::{NodeId, NodeRef, TreeId};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// A single node of a vessel tree.
///
/// Each node stores its position, vessel radius, an optional parent
/// reference, and its children. The tree as a whole is stored in a
/// contiguous `Vec<TreeNode>`, and [`NodeId`] is used as the index.
///
/// The topological kind of a node is always derived from its references,
/// never tagged, so it cannot drift from the data:
///
/// - *root*: no parent,
/// - *leaf*: no children,
/// - *inter*: exactly one child (mid-segment),
/// - *joint*: exactly two children (bifurcation).
///
/// Root/leaf and root/inter can hold simultaneously; the growth rules rely
/// on the conjunctions.
///
/// ### Fields
/// - `pos` - World-space position of this node.
/// - `radius` - Vessel radius at this node.
/// - `parent` - Optional parent node ID; `None` for the root.
/// - `children` - IDs of this node's direct children (at most two).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TreeNode {
    pub pos: Vec3,
    pub radius: f32,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl TreeNode {
    fn new_root(pos: Vec3, radius: f32) -> Self {
        Self {
            pos,
            radius,
            parent: None,
            children: Vec::with_capacity(2),
        }
    }

    fn new_child(pos: Vec3, radius: f32, parent: NodeId) -> Self {
        Self {
            pos,
            radius,
            parent: Some(parent),
            children: Vec::with_capacity(2),
        }
    }

    /// `true` if this node has no parent.
    #[inline]
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// `true` if this node has no children.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// `true` if this node has exactly one child.
    #[inline]
    pub fn is_inter(&self) -> bool {
        self.children.len() == 1
    }

    /// `true` if this node is a bifurcation (exactly two children).
    #[inline]
    pub fn is_joint(&self) -> bool {
        self.children.len() == 2
    }
}

/// A rooted vessel tree stored in a flat arena.
///
/// The root is created by [`Tree::new`] and always lives at index `0`;
/// every other node is appended through [`Tree::add_child`]. Nodes are
/// never removed, so a [`NodeId`] stays valid for the tree's lifetime.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<TreeNode>,
}

impl Tree {
    /// Creates a new tree with a single root node.
    ///
    /// ### Parameters
    /// - `pos` - Position of the root node.
    /// - `radius` - Vessel radius of the root node.
    ///
    /// ### Returns
    /// A [`Tree`] containing exactly one node at index `0`.
    pub fn new(pos: Vec3, radius: f32) -> Self {
        Self {
            nodes: vec![TreeNode::new_root(pos, radius)],
        }
    }

    /// Number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Adds a new child node under the given parent.
    ///
    /// This appends a new [`TreeNode`] with `parent = Some(parent)` and
    /// pushes its id into the parent's `children` list.
    ///
    /// ### Parameters
    /// - `parent` - ID of the parent node.
    /// - `pos` - Position of the new child node.
    /// - `radius` - Vessel radius at the new node.
    ///
    /// ### Returns
    /// The [`NodeId`] (index) of the newly added child node.
    ///
    /// ### Panics
    /// Panics if `parent` already has two children. The growth rules keep
    /// this from happening: joints never attract, and roots are held to a
    /// single child.
    pub fn add_child(&mut self, parent: NodeId, pos: Vec3, radius: f32) -> NodeId {
        assert!(
            self.nodes[parent].children.len() < 2,
            "node {parent} already has two children"
        );
        let id = self.nodes.len();
        self.nodes.push(TreeNode::new_child(pos, radius, parent));
        self.nodes[parent].children.push(id);
        id
    }

    /// Visits `start`, then its parent, and so on up to and including the
    /// root.
    ///
    /// The visitor receives the tree so it can read and write node data
    /// (the radius recalculation rule reads the children of each visited
    /// node). It must not change the topology of the walked path.
    pub fn to_root(&mut self, start: NodeId, mut visit: impl FnMut(&mut Tree, NodeId)) {
        let mut current = Some(start);
        while let Some(id) = current {
            current = self.nodes[id].parent;
            visit(self, id);
        }
    }
}

/// An ordered collection of vessel trees belonging to one system.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Forest {
    pub trees: Vec<Tree>,
}

impl Forest {
    pub fn new() -> Self {
        Self { trees: Vec::new() }
    }

    /// `true` if the forest holds no trees at all.
    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    /// Total number of nodes across all trees.
    pub fn node_count(&self) -> usize {
        self.trees.iter().map(Tree::len).sum()
    }

    /// Creates a new tree with a single root and returns a handle to it.
    pub fn create_tree(&mut self, pos: Vec3, radius: f32) -> NodeRef {
        let tree = self.trees.len();
        self.trees.push(Tree::new(pos, radius));
        NodeRef { tree, node: 0 }
    }

    pub fn tree(&self, id: TreeId) -> &Tree {
        &self.trees[id]
    }

    pub fn tree_mut(&mut self, id: TreeId) -> &mut Tree {
        &mut self.trees[id]
    }

    /// Random access to a node through its stable handle.
    pub fn node(&self, nref: NodeRef) -> &TreeNode {
        &self.trees[nref.tree].nodes[nref.node]
    }

    pub fn node_mut(&mut self, nref: NodeRef) -> &mut TreeNode {
        &mut self.trees[nref.tree].nodes[nref.node]
    }

    /// Visits every node of every tree in breadth-first order.
    ///
    /// Trees are visited in id order; within a tree the walk starts at the
    /// root and proceeds level by level. Used to rebuild the node spatial
    /// index after a forest is imported wholesale.
    pub fn breadth_first(&self, mut visit: impl FnMut(NodeRef, &TreeNode)) {
        let mut queue = VecDeque::new();
        for (tree_id, tree) in self.trees.iter().enumerate() {
            if tree.is_empty() {
                continue;
            }
            queue.clear();
            queue.push_back(0);
            while let Some(id) = queue.pop_front() {
                let node = &tree.nodes[id];
                visit(NodeRef { tree: tree_id, node: id }, node);
                queue.extend(node.children.iter().copied());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn new_tree_creates_single_root() {
        let pos = Vec3::new(0.0, 1.0, 2.0);
        let tree = Tree::new(pos, 2.0);

        assert_eq!(tree.len(), 1);
        let root = &tree.nodes[0];
        assert_eq!(root.pos, pos);
        assert_eq!(root.radius, 2.0);
        assert!(root.is_root());
        assert!(root.is_leaf());
        assert!(!root.is_inter());
        assert!(!root.is_joint());
    }

    #[test]
    fn add_child_links_parent_and_child() {
        let mut tree = Tree::new(Vec3::ZERO, 1.0);
        let child_pos = Vec3::new(1.0, 0.0, 0.0);

        let child_id = tree.add_child(0, child_pos, 0.5);

        assert_eq!(child_id, 1);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.nodes[0].children, vec![child_id]);

        let child = &tree.nodes[child_id];
        assert_eq!(child.pos, child_pos);
        assert_eq!(child.radius, 0.5);
        assert_eq!(child.parent, Some(0));
        assert!(child.is_leaf());
    }

    #[test]
    fn kind_predicates_follow_topology() {
        let mut tree = Tree::new(Vec3::ZERO, 1.0);
        let a = tree.add_child(0, Vec3::new(0.0, 0.0, 1.0), 1.0);

        // Root with one child is both root and inter.
        assert!(tree.nodes[0].is_root());
        assert!(tree.nodes[0].is_inter());

        let _b = tree.add_child(a, Vec3::new(0.0, 0.5, 2.0), 1.0);
        let _c = tree.add_child(a, Vec3::new(0.0, -0.5, 2.0), 1.0);

        assert!(tree.nodes[a].is_joint());
        assert!(!tree.nodes[a].is_inter());
        assert!(!tree.nodes[a].is_leaf());
    }

    #[test]
    #[should_panic(expected = "two children")]
    fn third_child_is_rejected() {
        let mut tree = Tree::new(Vec3::ZERO, 1.0);
        tree.add_child(0, Vec3::X, 1.0);
        tree.add_child(0, Vec3::Y, 1.0);
        tree.add_child(0, Vec3::Z, 1.0);
    }

    #[test]
    fn to_root_walks_start_to_root_inclusive() {
        let mut tree = Tree::new(Vec3::ZERO, 1.0);
        let a = tree.add_child(0, Vec3::X, 1.0);
        let b = tree.add_child(a, Vec3::X * 2.0, 1.0);
        let c = tree.add_child(b, Vec3::X * 3.0, 1.0);

        let mut visited = Vec::new();
        tree.to_root(c, |_, id| visited.push(id));
        assert_eq!(visited, vec![c, b, a, 0]);

        // Starting at the root visits only the root.
        let mut visited = Vec::new();
        tree.to_root(0, |_, id| visited.push(id));
        assert_eq!(visited, vec![0]);
    }

    #[test]
    fn to_root_visitor_may_mutate_node_data() {
        let mut tree = Tree::new(Vec3::ZERO, 1.0);
        let a = tree.add_child(0, Vec3::X, 2.0);
        let b = tree.add_child(a, Vec3::X * 2.0, 3.0);

        tree.to_root(b, |tree, id| tree.nodes[id].radius *= 10.0);

        assert_eq!(tree.nodes[0].radius, 10.0);
        assert_eq!(tree.nodes[a].radius, 20.0);
        assert_eq!(tree.nodes[b].radius, 30.0);
    }

    #[test]
    fn forest_create_tree_hands_out_sequential_handles() {
        let mut forest = Forest::new();
        assert!(forest.is_empty());

        let a = forest.create_tree(Vec3::ZERO, 1.0);
        let b = forest.create_tree(Vec3::X, 2.0);

        assert_eq!(a, NodeRef { tree: 0, node: 0 });
        assert_eq!(b, NodeRef { tree: 1, node: 0 });
        assert_eq!(forest.node_count(), 2);
        assert_eq!(forest.node(b).radius, 2.0);
    }

    #[test]
    fn breadth_first_visits_level_by_level() {
        let mut forest = Forest::new();
        forest.create_tree(Vec3::ZERO, 1.0);
        {
            let tree = forest.tree_mut(0);
            let a = tree.add_child(0, Vec3::X, 1.0);
            let b = tree.add_child(a, Vec3::X * 2.0, 1.0);
            let c = tree.add_child(a, Vec3::Y, 1.0);
            let _d = tree.add_child(b, Vec3::X * 3.0, 1.0);
            let _ = c;
        }
        forest.create_tree(Vec3::Z, 1.0);

        let mut order = Vec::new();
        forest.breadth_first(|nref, _| order.push(nref));

        let expected: Vec<NodeRef> = [(0, 0), (0, 1), (0, 2), (0, 3), (0, 4), (1, 0)]
            .iter()
            .map(|&(tree, node)| NodeRef { tree, node })
            .collect();
        assert_eq!(order, expected);
    }
}
