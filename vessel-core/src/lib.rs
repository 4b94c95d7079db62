//! Core 3-D vascular network synthesis library.
//!
//! Grows coupled arterial and venous vessel trees that fill a tissue
//! domain, using space colonization constrained by Murray's law: each step
//! samples attraction points from the domain, associates them with nearby
//! tree nodes under perception-cone and proximity filters, and extends the
//! trees by elongation or bifurcation. Attractions satisfied by the
//! arterial system become sources for the venous system.
//!
//! Main components:
//! - [`attractor`] — attraction points pulling vessel growth.
//! - [`config`] — static settings and per-step runtime parameters.
//! - [`domain`] — tissue domains producing seeded sample points.
//! - [`influence`] — per-step node/attraction association map.
//! - [`law`] — Murray's-law radii, bifurcation angles, line fitting.
//! - [`octree`] — bounded spatial index serving the growth phases.
//! - [`synthesizer`] — the two-system simulation driver.
//! - [`tree`] — vessel trees, forests, and node topology.
//! - [`types`] — shared ids and system kinds.

pub mod attractor;
pub mod config;
pub mod domain;
pub mod influence;
pub mod law;
pub mod octree;
mod phases;
pub mod synthesizer;
pub mod tree;
pub mod types;

pub use attractor::Attractor;
pub use config::{GrowFunc, Settings, SystemSettings};
pub use domain::{BoxDomain, Domain, LineDomain, SphereDomain, VoxelDomain};
pub use influence::InfluenceMap;
pub use octree::{Octree, OutOfBounds};
pub use synthesizer::{StopHandle, Synthesizer};
pub use tree::{Forest, Tree, TreeNode};
pub use types::{NodeId, NodeRef, System, TreeId};
