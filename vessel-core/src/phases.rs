use crate::{
    attractor::Attractor,
    config::{RuntimeParams, SystemSettings},
    influence::InfluenceMap,
    law,
    octree::{Octree, OutOfBounds},
    tree::{Forest, Tree},
    types::{NodeId, NodeRef},
};
use glam::Vec3;

fn angle_deg(a: Vec3, b: Vec3) -> f32 {
    a.dot(b).clamp(-1.0, 1.0).acos().to_degrees()
}

/// Murray continuation angle for sprouting a terminal branch off a
/// mid-segment node whose single child has the given radius.
fn perfect_angle(child_radius: f32, sett: &SystemSettings) -> f32 {
    let parent_radius = law::murray_radius(child_radius, sett.term_radius, sett.bif_index);
    law::murray_angles(parent_radius, child_radius, sett.term_radius)
        .1
        .abs()
}

pub(crate) fn association_phase(
    forest: &Forest,
    node_index: &Octree<NodeRef>,
    attr_index: &Octree<Attractor>,
    params: &RuntimeParams,
    sett: &SystemSettings,
    map: &mut InfluenceMap,
) {
    let mut nodes: Vec<NodeRef> = Vec::new();

    attr_index.traverse(|attr| {
        nodes.clear();
        node_index.euclidean_range(attr.pos, params.influence_attr, &mut nodes);
        if nodes.is_empty() {
            return;
        }

        // Closest non-joint node; ties go to the smallest handle so the
        // choice does not depend on query order.
        let mut best: Option<(f32, NodeRef)> = None;
        for &nref in &nodes {
            if forest.node(nref).is_joint() {
                continue;
            }
            let distance = attr.pos.distance(forest.node(nref).pos);
            let closer = match best {
                None => true,
                Some((best_dist, best_ref)) => {
                    distance < best_dist || (distance == best_dist && nref < best_ref)
                }
            };
            if closer {
                best = Some((distance, nref));
            }
        }
        let Some((_, nref)) = best else {
            return;
        };

        let node = forest.node(nref);
        if let Some(parent_id) = node.parent {
            let parent = &forest.tree(nref.tree).nodes[parent_id];
            let d_parent = (node.pos - parent.pos).normalize_or_zero();
            let d_attr = (attr.pos - node.pos).normalize_or_zero();
            let angle = angle_deg(d_parent, d_attr);

            if !node.is_inter() {
                // Perception cone around the incoming direction.
                if angle > sett.percept_angle * 0.5 {
                    return;
                }
            } else {
                // Mid-segment nodes only perceive attractions near the
                // Murray-ideal branching angle off the existing child.
                let child_radius = forest.tree(nref.tree).nodes[node.children[0]].radius;
                let perfect = perfect_angle(child_radius, sett);
                if (angle - perfect).abs() > sett.percept_angle * 0.5 {
                    return;
                }
            }
        }

        map.add(nref, *attr);
    });
}

pub(crate) fn growth_phase(
    forest: &mut Forest,
    node_index: &mut Octree<NodeRef>,
    params: &RuntimeParams,
    sett: &SystemSettings,
    map: &InfluenceMap,
) -> Result<Vec<NodeRef>, OutOfBounds> {
    let mut new_refs = Vec::with_capacity(16);

    for (nref, attrs) in map.iter() {
        let tree = forest.tree_mut(nref.tree);
        let node_pos = tree.nodes[nref.node].pos;

        // Average unit direction toward the associated attractions.
        let mut dir = Vec3::ZERO;
        for attr in attrs {
            dir += (attr.pos - node_pos).normalize_or_zero();
        }
        dir = dir.normalize_or_zero();
        if dir == Vec3::ZERO {
            // Attraction directions cancelled out; nothing sensible to grow.
            continue;
        }

        let d_parent = tree.nodes[nref.node]
            .parent
            .map(|pid| (node_pos - tree.nodes[pid].pos).normalize_or_zero());

        // Bias the direction toward the parent and decide whether a leaf
        // prefers to bifurcate over elongating.
        let mut bifurcation = false;
        if let Some(d_parent) = d_parent {
            let node = &tree.nodes[nref.node];

            if node.is_leaf() && attrs.len() > 1 && sett.bif_thresh >= 0.0 {
                let angles: Vec<f32> = attrs
                    .iter()
                    .map(|attr| angle_deg(d_parent, (attr.pos - node_pos).normalize_or_zero()))
                    .collect();
                let mean = angles.iter().sum::<f32>() / angles.len() as f32;
                let spread = angles
                    .iter()
                    .map(|angle| (angle - mean) * (angle - mean))
                    .sum::<f32>()
                    .sqrt();
                bifurcation = spread >= sett.bif_thresh;
            }

            let bias = if node.is_leaf() {
                d_parent
            } else if node.is_inter() {
                let child_radius = tree.nodes[node.children[0]].radius;
                let perfect = perfect_angle(child_radius, sett);
                let normal = d_parent.cross(dir).normalize_or_zero();
                if normal == Vec3::ZERO {
                    d_parent
                } else {
                    law::rotate_deg(d_parent, perfect, normal).normalize_or_zero()
                }
            } else {
                dir
            };

            dir = ((1.0 - sett.parent_inertia) * dir + sett.parent_inertia * bias)
                .normalize_or_zero();
            if dir == Vec3::ZERO {
                continue;
            }
        }

        let node = &tree.nodes[nref.node];
        let (is_root, is_leaf, is_inter) = (node.is_root(), node.is_leaf(), node.is_inter());

        if bifurcation {
            let Some(d_parent) = d_parent else { continue };

            let radius_l = sett.term_radius;
            let radius_r = sett.term_radius;
            let parent_radius = law::murray_radius(radius_l, radius_r, sett.bif_index);
            let (angle_l, angle_r) = law::murray_angles(parent_radius, radius_l, radius_r);

            let positions: Vec<Vec3> = attrs.iter().map(|attr| attr.pos).collect();
            let (centroid, axis) = law::best_line_fit(&positions);
            let up = (centroid - node_pos)
                .normalize_or_zero()
                .cross(axis)
                .normalize_or_zero();
            if up == Vec3::ZERO {
                continue;
            }

            let left = law::rotate_deg(d_parent, angle_l, up).normalize_or_zero();
            let right = law::rotate_deg(d_parent, angle_r, up).normalize_or_zero();

            let end_l = tree.add_child(nref.node, node_pos + params.growth_distance * left, radius_l);
            let end_r = tree.add_child(nref.node, node_pos + params.growth_distance * right, radius_r);
            recalc_radii_to_root(tree, nref.node, sett.bif_index);

            for end in [end_l, end_r] {
                let end_ref = NodeRef::new(nref.tree, end);
                node_index.insert(tree.nodes[end].pos, end_ref)?;
                new_refs.push(end_ref);
            }
        } else if !sett.only_leaf_development || is_leaf || is_inter {
            if is_root && is_inter {
                continue; // TODO: lift the single-child restriction on roots
            }

            let end = tree.add_child(nref.node, node_pos + params.growth_distance * dir, sett.term_radius);
            recalc_radii_to_root(tree, nref.node, sett.bif_index);

            let end_ref = NodeRef::new(nref.tree, end);
            node_index.insert(tree.nodes[end].pos, end_ref)?;
            new_refs.push(end_ref);
        }
    }

    Ok(new_refs)
}

pub(crate) fn kill_phase(
    node_index: &Octree<NodeRef>,
    attr_index: &mut Octree<Attractor>,
    killed: &mut Vec<Vec3>,
    params: &RuntimeParams,
    map: &InfluenceMap,
) {
    let mut nodes: Vec<NodeRef> = Vec::new();

    for (_, attrs) in map.iter() {
        for attr in attrs {
            nodes.clear();
            node_index.euclidean_range(attr.pos, params.kill_attr, &mut nodes);
            if nodes.is_empty() {
                continue;
            }
            attr_index.remove(attr.pos, attr);
            killed.push(attr.pos);
        }
    }
}

/// Re-propagates Murray's law from `start` up to the root: a mid-segment
/// node takes its sole child's radius, a joint combines its two children.
pub(crate) fn recalc_radii_to_root(tree: &mut Tree, start: NodeId, gamma: f32) {
    tree.to_root(start, |tree, id| {
        if tree.nodes[id].is_inter() {
            let child = tree.nodes[id].children[0];
            tree.nodes[id].radius = tree.nodes[child].radius;
        } else if tree.nodes[id].is_joint() {
            let left = tree.nodes[id].children[0];
            let right = tree.nodes[id].children[1];
            tree.nodes[id].radius =
                law::murray_radius(tree.nodes[left].radius, tree.nodes[right].radius, gamma);
        }
    });
}
