use crate::types::System;
use serde::{Deserialize, Serialize};

/// Per-step isotropic rescaling rule for a system's distance parameters.
///
/// Growing the scaling factor shrinks the working distances, which lets an
/// already-built network keep up with tissue that is conceptually expanding
/// around it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum GrowFunc {
    /// Scaling stays constant.
    None,
    /// `scaling += value` per step.
    Linear(f32),
    /// `scaling += scaling * value` per step.
    Exponential(f32),
}

impl GrowFunc {
    /// Applies one step of this rule to a scaling factor.
    pub fn advance(self, scaling: f32) -> f32 {
        match self {
            GrowFunc::None => scaling,
            GrowFunc::Linear(value) => scaling + value,
            GrowFunc::Exponential(value) => scaling + scaling * value,
        }
    }
}

/// Static configuration for one vessel system.
///
/// Distances are in world units, angles in degrees.
///
/// ### Fields
/// - `birth_attr` - Minimum distance of a new attraction to every existing
///   attraction for it to be accepted by the conditional insert.
/// - `birth_node` - Minimum distance of a new attraction to every existing
///   vessel node.
/// - `influence_attr` - Maximum distance at which an attraction can pull a
///   node.
/// - `kill_attr` - Distance under which an attraction is satisfied and
///   removed.
/// - `growth_distance` - Segment length of each elongation or bifurcation
///   arm.
/// - `term_radius` - Radius of freshly created (terminal) nodes.
/// - `bif_index` - Murray's-law exponent γ relating parent and child radii.
/// - `percept_angle` - Full opening angle of the perception cone that
///   limits which attractions a non-root node may respond to.
/// - `parent_inertia` - Blend weight in `[0, 1]` biasing new growth toward
///   the parent direction (or the Murray continuation for mid-segment
///   sprouts).
/// - `bif_thresh` - Angular-spread threshold (degrees) above which a leaf
///   bifurcates instead of elongating; a negative value disables
///   bifurcation entirely.
/// - `only_leaf_development` - When set, only leaves and mid-segment nodes
///   may grow; joints never grow regardless.
/// - `grow_func` - Per-step domain growth rule for this system.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SystemSettings {
    pub birth_attr: f32,
    pub birth_node: f32,
    pub influence_attr: f32,
    pub kill_attr: f32,
    pub growth_distance: f32,
    pub term_radius: f32,
    pub bif_index: f32,
    pub percept_angle: f32,
    pub parent_inertia: f32,
    pub bif_thresh: f32,
    pub only_leaf_development: bool,
    pub grow_func: GrowFunc,
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            birth_attr: 1.0,
            birth_node: 1.0,
            influence_attr: 10.0,
            kill_attr: 0.75,
            growth_distance: 0.25,
            term_radius: 0.05,
            // Murray's original cube law.
            bif_index: 3.0,
            percept_angle: 90.0,
            parent_inertia: 0.5,
            bif_thresh: 20.0,
            only_leaf_development: false,
            grow_func: GrowFunc::None,
        }
    }
}

/// Global configuration for a synthesis run.
///
/// ### Fields
/// - `steps` - Step budget of a [`crate::synthesizer::Synthesizer::run`].
/// - `sample_count` - Domain points sampled into arterial attractions per
///   step.
/// - `systems` - Per-system settings, indexed by [`System::index`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub steps: usize,
    pub sample_count: usize,
    pub systems: [SystemSettings; System::COUNT],
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            steps: 100,
            sample_count: 100,
            systems: [SystemSettings::default(); System::COUNT],
        }
    }
}

impl Settings {
    pub fn system(&self, sys: System) -> &SystemSettings {
        &self.systems[sys.index()]
    }

    pub fn system_mut(&mut self, sys: System) -> &mut SystemSettings {
        &mut self.systems[sys.index()]
    }

    /// Uniformly rescales all distance and radius settings of both systems.
    ///
    /// Useful to adapt a parameter set tuned for one domain size to a
    /// larger or smaller one.
    pub fn scale(&mut self, factor: f32) {
        for sys in &mut self.systems {
            sys.birth_attr *= factor;
            sys.birth_node *= factor;
            sys.term_radius *= factor;
            sys.growth_distance *= factor;
            sys.influence_attr *= factor;
            sys.kill_attr *= factor;
        }
    }
}

/// Working copy of one system's distance parameters for the current step.
///
/// Derived from [`SystemSettings`] on run entry and rescaled by the
/// system's [`GrowFunc`] after every step; the settings themselves are
/// never modified by a run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct RuntimeParams {
    pub scaling: f32,
    pub birth_attr: f32,
    pub birth_node: f32,
    pub influence_attr: f32,
    pub kill_attr: f32,
    pub growth_distance: f32,
}

impl RuntimeParams {
    pub fn from_settings(sett: &SystemSettings) -> Self {
        Self {
            scaling: 1.0,
            birth_attr: sett.birth_attr,
            birth_node: sett.birth_node,
            influence_attr: sett.influence_attr,
            kill_attr: sett.kill_attr,
            growth_distance: sett.growth_distance,
        }
    }

    /// Advances the scaling factor by the system's growth rule and resets
    /// the five distances to `settings / scaling`.
    pub fn rescale(&mut self, sett: &SystemSettings) {
        self.scaling = sett.grow_func.advance(self.scaling);
        let inverse = 1.0 / self.scaling;

        self.birth_attr = sett.birth_attr * inverse;
        self.birth_node = sett.birth_node * inverse;
        self.influence_attr = sett.influence_attr * inverse;
        self.kill_attr = sett.kill_attr * inverse;
        self.growth_distance = sett.growth_distance * inverse;
    }
}
