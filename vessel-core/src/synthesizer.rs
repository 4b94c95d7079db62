use crate::{
    attractor::Attractor,
    config::{RuntimeParams, Settings, SystemSettings},
    domain::Domain,
    influence::InfluenceMap,
    octree::{DEFAULT_LEAF_CAPACITY, Octree, OutOfBounds},
    phases,
    tree::Forest,
    types::{NodeRef, System},
};
use glam::Vec3;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, trace};

/// Everything one vessel system owns: its forest, the two spatial indices
/// serving the growth phases, and the attractions satisfied this frame.
#[derive(Debug)]
pub(crate) struct SystemData {
    pub forest: Forest,
    pub node_index: Octree<NodeRef>,
    pub attr_index: Octree<Attractor>,
    pub killed: Vec<Vec3>,
}

impl SystemData {
    fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            forest: Forest::new(),
            node_index: Octree::new(min, max, DEFAULT_LEAF_CAPACITY),
            attr_index: Octree::new(min, max, DEFAULT_LEAF_CAPACITY),
            killed: Vec::new(),
        }
    }

    fn clear(&mut self) {
        self.forest = Forest::new();
        self.node_index.clear();
        self.attr_index.clear();
        self.killed.clear();
    }
}

/// Cloneable handle that lets another thread request termination of a
/// running synthesis and observe quiescence.
#[derive(Clone, Debug)]
pub struct StopHandle {
    running: Arc<AtomicBool>,
}

impl StopHandle {
    /// Requests cooperative termination; observed at step granularity.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// `true` while a `run` is in progress.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Two-system vascular growth driver.
///
/// Owns the arterial and venous system data and the settings; borrows a
/// [`Domain`] for the duration of [`Synthesizer::run`]. Each step samples
/// arterial attractions from the domain, develops the arterial system,
/// hands satisfied attractions to the venous system as sources, develops
/// the venous system, and finally applies the per-system domain-growth
/// scaling.
pub struct Synthesizer {
    settings: Settings,
    params: [RuntimeParams; System::COUNT],
    current_step: usize,
    systems: [SystemData; System::COUNT],
    running: Arc<AtomicBool>,
}

impl Synthesizer {
    /// Creates a synthesizer whose spatial indices cover the domain's
    /// extents. Positions outside those extents are rejected everywhere.
    pub fn new(domain: &dyn Domain) -> Self {
        let (min, max) = (domain.min_extents(), domain.max_extents());
        let settings = Settings::default();
        Self {
            params: Self::derive_params(&settings),
            settings,
            current_step: 0,
            systems: [SystemData::new(min, max), SystemData::new(min, max)],
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    fn derive_params(settings: &Settings) -> [RuntimeParams; System::COUNT] {
        [
            RuntimeParams::from_settings(settings.system(System::Arterial)),
            RuntimeParams::from_settings(settings.system(System::Venous)),
        ]
    }

    /// Replaces the settings and re-derives the runtime parameters.
    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = settings;
        self.params = Self::derive_params(&self.settings);
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn system_settings(&self, sys: System) -> &SystemSettings {
        self.settings.system(sys)
    }

    /// Read-only view of a system's forest.
    pub fn forest(&self, sys: System) -> &Forest {
        &self.systems[sys.index()].forest
    }

    /// Number of vessel nodes in a system.
    pub fn node_count(&self, sys: System) -> usize {
        self.systems[sys.index()].node_index.len()
    }

    /// Number of pending attraction points in a system.
    pub fn attraction_count(&self, sys: System) -> usize {
        self.systems[sys.index()].attr_index.len()
    }

    /// Visits the position of every pending attraction of a system.
    pub fn for_each_attraction(&self, sys: System, mut visit: impl FnMut(Vec3)) {
        self.systems[sys.index()]
            .attr_index
            .traverse(|attr| visit(attr.pos));
    }

    /// Replaces a system's forest wholesale, clearing its indices and
    /// killed buffer, then re-indexing every node breadth-first.
    pub fn set_forest(&mut self, sys: System, forest: Forest) -> Result<(), OutOfBounds> {
        let data = &mut self.systems[sys.index()];
        data.clear();
        data.forest = forest;

        let mut entries = Vec::with_capacity(data.forest.node_count());
        data.forest
            .breadth_first(|nref, node| entries.push((node.pos, nref)));
        for (pos, nref) in entries {
            data.node_index.insert(pos, nref)?;
        }
        Ok(())
    }

    /// Starts a new tree with a single root at `pos`, radius equal to the
    /// system's terminal radius.
    pub fn create_root(&mut self, sys: System, pos: Vec3) -> Result<NodeRef, OutOfBounds> {
        let radius = self.settings.system(sys).term_radius;
        let data = &mut self.systems[sys.index()];
        let nref = data.forest.create_tree(pos, radius);
        data.node_index.insert(pos, nref)?;
        Ok(nref)
    }

    /// Unconditionally inserts an attraction point.
    pub fn create_attr(&mut self, sys: System, pos: Vec3) -> Result<(), OutOfBounds> {
        self.systems[sys.index()]
            .attr_index
            .insert(pos, Attractor::new(pos))
    }

    /// Inserts an attraction point unless it falls within `birth_node` of
    /// an existing node or within `birth_attr` of an existing attraction.
    ///
    /// ### Returns
    /// Whether the attraction was accepted.
    pub fn try_attr(&mut self, sys: System, pos: Vec3) -> Result<bool, OutOfBounds> {
        let params = &self.params[sys.index()];
        let data = &mut self.systems[sys.index()];

        let mut nodes: Vec<NodeRef> = Vec::new();
        data.node_index
            .euclidean_range(pos, params.birth_node, &mut nodes);
        if !nodes.is_empty() {
            return Ok(false);
        }

        let mut attrs: Vec<Attractor> = Vec::new();
        data.attr_index
            .euclidean_range(pos, params.birth_attr, &mut attrs);
        if !attrs.is_empty() {
            return Ok(false);
        }

        data.attr_index.insert(pos, Attractor::new(pos))?;
        Ok(true)
    }

    /// Handle for requesting termination from another thread.
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            running: Arc::clone(&self.running),
        }
    }

    /// Requests cooperative termination of a running synthesis.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Resets the step counter and re-derives the runtime parameters from
    /// the settings. Called automatically on [`Synthesizer::run`] entry;
    /// call it manually before driving the simulation through
    /// [`Synthesizer::advance`].
    pub fn begin(&mut self) {
        self.current_step = 0;
        self.params = Self::derive_params(&self.settings);
    }

    /// Runs the simulation until the step budget is exhausted or a stop is
    /// requested.
    ///
    /// A run with an empty arterial forest is a silent no-op. On exit the
    /// running flag is cleared, whether the run completed, was stopped, or
    /// failed because growth escaped the index bounds.
    pub fn run(&mut self, domain: &mut dyn Domain) -> Result<(), OutOfBounds> {
        if self.systems[System::Arterial.index()].forest.is_empty() {
            return Ok(());
        }

        self.begin();
        self.running.store(true, Ordering::SeqCst);
        info!(steps = self.settings.steps, "starting vessel synthesis");

        let mut result = Ok(());
        while self.current_step < self.settings.steps && self.running.load(Ordering::SeqCst) {
            result = self.advance(domain);
            if result.is_err() {
                break;
            }
        }

        self.running.store(false, Ordering::SeqCst);
        info!(
            steps = self.current_step,
            arterial_nodes = self.node_count(System::Arterial),
            venous_nodes = self.node_count(System::Venous),
            "vessel synthesis finished"
        );
        result
    }

    /// Advances the coupled simulation by one step:
    ///
    /// 1. Sample new arterial attractions from the domain.
    /// 2. Develop the arterial system (associate, grow, kill).
    /// 3. Hand satisfied arterial attractions to the venous system.
    /// 4. Develop the venous system.
    /// 5. Apply each system's domain-growth scaling.
    ///
    /// No-op when the arterial forest is empty.
    pub fn advance(&mut self, domain: &mut dyn Domain) -> Result<(), OutOfBounds> {
        if self.systems[System::Arterial.index()].forest.is_empty() {
            return Ok(());
        }
        self.current_step += 1;

        self.sample_attractions(domain);
        self.step(System::Arterial)?;
        self.combine_systems()?;
        self.step(System::Venous)?;

        self.domain_growth(System::Arterial);
        self.domain_growth(System::Venous);

        debug!(
            step = self.current_step,
            arterial_nodes = self.node_count(System::Arterial),
            arterial_attrs = self.attraction_count(System::Arterial),
            venous_nodes = self.node_count(System::Venous),
            venous_attrs = self.attraction_count(System::Venous),
            "growth step complete"
        );
        Ok(())
    }

    /// Pulls `sample_count` points from the domain into arterial
    /// attractions through the birth filters. Samples the domain produces
    /// outside its own extents are skipped: the extents are authoritative,
    /// the sampler is not required to respect them.
    fn sample_attractions(&mut self, domain: &mut dyn Domain) {
        let mut points = Vec::new();
        domain.samples(self.settings.sample_count, &mut points);
        for pos in points {
            if self.try_attr(System::Arterial, pos).is_err() {
                trace!(%pos, "sample outside domain extents, skipped");
            }
        }
    }

    /// One growth step of a single system; skipped while its forest is
    /// empty.
    fn step(&mut self, sys: System) -> Result<(), OutOfBounds> {
        let index = sys.index();
        if self.systems[index].forest.is_empty() {
            return Ok(());
        }

        let params = self.params[index];
        let sett = &self.settings.systems[index];
        let data = &mut self.systems[index];

        let mut map = InfluenceMap::new();
        phases::association_phase(
            &data.forest,
            &data.node_index,
            &data.attr_index,
            &params,
            sett,
            &mut map,
        );
        phases::growth_phase(&mut data.forest, &mut data.node_index, &params, sett, &map)?;
        phases::kill_phase(
            &data.node_index,
            &mut data.attr_index,
            &mut data.killed,
            &params,
            &map,
        );
        Ok(())
    }

    /// Drains the arterial killed-attraction buffer, re-creating each
    /// position as a venous attraction when a venous forest exists. The
    /// buffer is drained either way.
    fn combine_systems(&mut self) -> Result<(), OutOfBounds> {
        let venous_exists = !self.systems[System::Venous.index()].forest.is_empty();
        let killed = std::mem::take(&mut self.systems[System::Arterial.index()].killed);
        if venous_exists {
            for pos in killed {
                self.create_attr(System::Venous, pos)?;
            }
        }
        Ok(())
    }

    /// Advances a system's scaling by its growth rule and rescales its
    /// working distance parameters.
    fn domain_growth(&mut self, sys: System) {
        let index = sys.index();
        self.params[index].rescale(&self.settings.systems[index]);
    }

    #[cfg(test)]
    pub(crate) fn runtime_params(&self, sys: System) -> &RuntimeParams {
        &self.params[sys.index()]
    }

    #[cfg(test)]
    pub(crate) fn system_data(&self, sys: System) -> &SystemData {
        &self.systems[sys.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GrowFunc;
    use crate::domain::SphereDomain;
    use crate::law;
    use crate::tree::Tree;

    const TOL: f32 = 1e-4;

    fn test_domain() -> SphereDomain {
        let mut domain = SphereDomain::new(Vec3::ZERO, 10.0);
        domain.seed(42);
        domain
    }

    fn test_settings() -> Settings {
        let system = SystemSettings {
            birth_attr: 0.1,
            birth_node: 0.1,
            influence_attr: 10.0,
            kill_attr: 0.5,
            growth_distance: 1.0,
            term_radius: 0.1,
            bif_index: 3.0,
            percept_angle: 90.0,
            parent_inertia: 0.5,
            bif_thresh: -1.0,
            only_leaf_development: false,
            grow_func: GrowFunc::None,
        };
        Settings {
            steps: 1,
            sample_count: 0,
            systems: [system; System::COUNT],
        }
    }

    fn synthesizer_with(settings: Settings) -> (Synthesizer, SphereDomain) {
        let domain = test_domain();
        let mut synth = Synthesizer::new(&domain);
        synth.set_settings(settings);
        (synth, domain)
    }

    #[test]
    fn run_without_arterial_forest_is_a_noop() {
        let (mut synth, mut domain) = synthesizer_with(test_settings());
        synth.run(&mut domain).unwrap();
        assert_eq!(synth.node_count(System::Arterial), 0);
        assert!(!synth.is_running());
    }

    #[test]
    fn run_with_no_samples_leaves_a_lone_root_untouched() {
        let (mut synth, mut domain) = synthesizer_with(test_settings());
        synth.create_root(System::Arterial, Vec3::ZERO).unwrap();

        synth.run(&mut domain).unwrap();

        let forest = synth.forest(System::Arterial);
        assert_eq!(forest.trees.len(), 1);
        assert_eq!(forest.node_count(), 1);
        assert!(!synth.is_running());
    }

    #[test]
    fn single_attraction_elongates_the_root_without_killing() {
        let (mut synth, mut domain) = synthesizer_with(test_settings());
        synth.create_root(System::Arterial, Vec3::ZERO).unwrap();
        synth.create_attr(System::Arterial, Vec3::new(0.0, 0.0, 5.0)).unwrap();

        synth.run(&mut domain).unwrap();

        let forest = synth.forest(System::Arterial);
        assert_eq!(forest.node_count(), 2);
        let root = forest.node(NodeRef::new(0, 0));
        assert_eq!(root.children.len(), 1);

        let child = &forest.tree(0).nodes[root.children[0]];
        assert!(child.pos.distance(Vec3::new(0.0, 0.0, 1.0)) < TOL);
        assert_eq!(child.radius, 0.1);

        // Kill radius 0.5: the new node at z=1 is still 4 away.
        assert_eq!(synth.attraction_count(System::Arterial), 1);
    }

    #[test]
    fn wide_kill_radius_consumes_the_attraction() {
        let mut settings = test_settings();
        settings.systems[System::Arterial.index()].kill_attr = 5.0;
        let (mut synth, _domain) = synthesizer_with(settings);
        synth.create_root(System::Arterial, Vec3::ZERO).unwrap();
        let target = Vec3::new(0.0, 0.0, 5.0);
        synth.create_attr(System::Arterial, target).unwrap();

        // Drive the phases manually to observe the killed buffer before the
        // systems are combined.
        synth.begin();
        synth.step(System::Arterial).unwrap();
        assert_eq!(synth.system_data(System::Arterial).killed, vec![target]);
        assert_eq!(synth.attraction_count(System::Arterial), 0);

        synth.combine_systems().unwrap();
        assert!(synth.system_data(System::Arterial).killed.is_empty());
        // No venous forest: the killed attraction is dropped, not
        // transferred.
        assert_eq!(synth.attraction_count(System::Venous), 0);
    }

    #[test]
    fn spread_attractions_bifurcate_and_propagate_murray_radii() {
        let mut settings = test_settings();
        settings.systems[System::Arterial.index()].bif_thresh = 0.0;
        let (mut synth, mut domain) = synthesizer_with(settings);

        let mut tree = Tree::new(Vec3::ZERO, 0.1);
        tree.add_child(0, Vec3::new(0.0, 0.0, 1.0), 0.1);
        synth
            .set_forest(System::Arterial, Forest { trees: vec![tree] })
            .unwrap();

        synth.create_attr(System::Arterial, Vec3::new(1.0, 0.0, 2.0)).unwrap();
        synth.create_attr(System::Arterial, Vec3::new(-1.0, 0.0, 2.0)).unwrap();
        synth.create_attr(System::Arterial, Vec3::new(0.0, 1.0, 2.0)).unwrap();

        synth.run(&mut domain).unwrap();

        let forest = synth.forest(System::Arterial);
        assert_eq!(forest.node_count(), 4);

        let grown = forest.node(NodeRef::new(0, 1));
        assert!(grown.is_joint());
        let expected = law::murray_radius(0.1, 0.1, 3.0);
        assert!((grown.radius - expected).abs() < TOL);

        for &arm in &grown.children {
            let arm_node = &forest.tree(0).nodes[arm];
            assert_eq!(arm_node.radius, 0.1);
            assert!((arm_node.pos.distance(grown.pos) - 1.0).abs() < TOL);
        }

        // The root is a mid-segment node on the path: it inherited the
        // joint's radius.
        assert!((forest.node(NodeRef::new(0, 0)).radius - expected).abs() < TOL);
    }

    #[test]
    fn killed_arterial_attractions_feed_the_venous_system() {
        let mut settings = test_settings();
        settings.systems[System::Arterial.index()].kill_attr = 2.5;
        let (mut synth, mut domain) = synthesizer_with(settings);

        synth.create_root(System::Arterial, Vec3::ZERO).unwrap();
        synth.create_root(System::Venous, Vec3::new(0.0, 1.0, 2.0)).unwrap();
        let target = Vec3::new(0.0, 0.0, 2.0);
        synth.create_attr(System::Arterial, target).unwrap();

        synth.run(&mut domain).unwrap();

        // Arterial grew toward the target and satisfied it.
        assert_eq!(synth.attraction_count(System::Arterial), 0);
        assert!(synth.system_data(System::Arterial).killed.is_empty());

        // The venous system received it in the same step and elongated
        // toward it.
        let venous = synth.forest(System::Venous);
        assert_eq!(venous.node_count(), 2);
        let root = venous.node(NodeRef::new(0, 0));
        let child = &venous.tree(0).nodes[root.children[0]];
        assert!(child.pos.distance(target) < TOL);
    }

    #[test]
    fn linear_domain_growth_rescales_runtime_parameters() {
        let mut settings = test_settings();
        settings.steps = 2;
        for sys in &mut settings.systems {
            sys.grow_func = GrowFunc::Linear(0.1);
        }
        let (mut synth, mut domain) = synthesizer_with(settings);
        synth.create_root(System::Arterial, Vec3::ZERO).unwrap();

        synth.begin();
        synth.advance(&mut domain).unwrap();

        let params = synth.runtime_params(System::Arterial);
        assert!((params.scaling - 1.1).abs() < 1e-5);
        let expected = synth.system_settings(System::Arterial).birth_attr / 1.1;
        assert!((params.birth_attr - expected).abs() < 1e-5);

        synth.advance(&mut domain).unwrap();
        let params = synth.runtime_params(System::Arterial);
        assert!((params.scaling - 1.2).abs() < 1e-5);
    }

    #[test]
    fn try_attr_enforces_birth_filters() {
        let mut settings = test_settings();
        settings.systems[System::Arterial.index()].birth_node = 1.0;
        settings.systems[System::Arterial.index()].birth_attr = 1.0;
        let (mut synth, _domain) = synthesizer_with(settings);
        synth.create_root(System::Arterial, Vec3::ZERO).unwrap();

        // Too close to the root node.
        assert!(!synth.try_attr(System::Arterial, Vec3::new(0.0, 0.0, 0.5)).unwrap());
        assert_eq!(synth.attraction_count(System::Arterial), 0);

        // Far enough from the node: accepted.
        let first = Vec3::new(0.0, 0.0, 3.0);
        assert!(synth.try_attr(System::Arterial, first).unwrap());

        // Too close to the first attraction.
        assert!(!synth.try_attr(System::Arterial, Vec3::new(0.0, 0.5, 3.0)).unwrap());

        // Clear of both filters.
        assert!(synth.try_attr(System::Arterial, Vec3::new(0.0, 0.0, 5.0)).unwrap());
        assert_eq!(synth.attraction_count(System::Arterial), 2);

        // The unconditional insert ignores the filters.
        synth.create_attr(System::Arterial, Vec3::new(0.0, 0.0, 3.01)).unwrap();
        assert_eq!(synth.attraction_count(System::Arterial), 3);
    }

    #[test]
    fn out_of_bounds_positions_are_rejected() {
        let (mut synth, _domain) = synthesizer_with(test_settings());
        let outside = Vec3::new(0.0, 0.0, 11.0);

        assert!(synth.create_root(System::Arterial, outside).is_err());
        assert!(synth.create_attr(System::Arterial, outside).is_err());
        assert!(synth.try_attr(System::Arterial, outside).is_err());
    }

    #[test]
    fn set_forest_reindexes_every_node() {
        let (mut synth, _domain) = synthesizer_with(test_settings());

        let mut tree = Tree::new(Vec3::ZERO, 0.1);
        let a = tree.add_child(0, Vec3::new(0.0, 0.0, 1.0), 0.1);
        tree.add_child(a, Vec3::new(0.5, 0.0, 2.0), 0.1);
        tree.add_child(a, Vec3::new(-0.5, 0.0, 2.0), 0.1);
        let mut forest = Forest { trees: vec![tree] };
        forest.create_tree(Vec3::new(3.0, 0.0, 0.0), 0.1);

        synth.set_forest(System::Arterial, forest).unwrap();

        assert_eq!(synth.node_count(System::Arterial), 5);
        let data = synth.system_data(System::Arterial);
        let mut found = Vec::new();
        data.node_index
            .euclidean_range(Vec3::new(0.0, 0.0, 1.0), 1e-5, &mut found);
        assert_eq!(found, vec![NodeRef::new(0, 1)]);
    }

    #[test]
    fn running_flag_is_cleared_after_a_run() {
        let mut settings = test_settings();
        settings.steps = 30;
        settings.sample_count = 10;
        settings.systems[System::Arterial.index()].kill_attr = 1.5;
        let (mut synth, _) = synthesizer_with(settings);
        synth.create_root(System::Arterial, Vec3::ZERO).unwrap();

        // Sample from a ball strictly inside the indexed extents so growth
        // overshoot near the boundary stays in bounds.
        let mut inner = SphereDomain::new(Vec3::ZERO, 8.0);
        inner.seed(42);

        let handle = synth.stop_handle();
        assert!(!handle.is_running());
        synth.run(&mut inner).unwrap();
        assert!(!handle.is_running());
        assert!(synth.node_count(System::Arterial) > 1);
    }

    /// Structural invariants that must hold after any number of steps.
    #[test]
    fn invariants_hold_after_a_seeded_run() {
        let mut settings = test_settings();
        settings.steps = 25;
        settings.sample_count = 40;
        for sys in &mut settings.systems {
            sys.bif_thresh = 5.0;
            sys.kill_attr = 1.0;
            sys.birth_attr = 0.5;
            sys.birth_node = 0.5;
            sys.growth_distance = 0.5;
        }
        let (mut synth, _) = synthesizer_with(settings);
        synth.create_root(System::Arterial, Vec3::ZERO).unwrap();
        synth.create_root(System::Venous, Vec3::new(1.0, 0.0, 0.0)).unwrap();

        // Sample from a ball strictly inside the indexed extents so growth
        // overshoot near the boundary stays in bounds.
        let mut inner = SphereDomain::new(Vec3::ZERO, 8.0);
        inner.seed(42);
        synth.run(&mut inner).unwrap();
        assert!(synth.node_count(System::Arterial) > 1, "nothing grew");

        for sys in System::ALL {
            let data = synth.system_data(sys);
            let gamma = synth.system_settings(sys).bif_index;
            let term = synth.system_settings(sys).term_radius;

            // Every node is indexed exactly once at its own position.
            assert_eq!(data.node_index.len(), data.forest.node_count());
            data.forest.breadth_first(|nref, node| {
                let mut found = Vec::new();
                data.node_index.euclidean_range(node.pos, 1e-6, &mut found);
                assert_eq!(
                    found.iter().filter(|&&r| r == nref).count(),
                    1,
                    "node {nref:?} not indexed exactly once"
                );
            });

            // Topology and Murray's law.
            data.forest.breadth_first(|nref, node| {
                assert!(node.children.len() <= 2);
                let tree = data.forest.tree(nref.tree);
                for &child in &node.children {
                    assert_eq!(tree.nodes[child].parent, Some(nref.node));
                }
                if node.is_inter() {
                    assert_eq!(node.radius, tree.nodes[node.children[0]].radius);
                } else if node.is_joint() {
                    let expected = law::murray_radius(
                        tree.nodes[node.children[0]].radius,
                        tree.nodes[node.children[1]].radius,
                        gamma,
                    );
                    assert!((node.radius - expected).abs() < 1e-4);
                } else if node.is_leaf() && !node.is_root() {
                    assert_eq!(node.radius, term);
                }
            });

        }

        // The arterial killed buffer is drained every step by the transfer.
        assert!(synth.system_data(System::Arterial).killed.is_empty());
    }
}
