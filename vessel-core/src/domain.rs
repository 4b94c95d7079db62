//! Tissue domains that produce attraction-point samples.
//!
//! A domain is solely defined by the points it samples; boundaries are not
//! enforced. The extents exist so the synthesizer can size its spatial
//! indices, and a run is uniquely determined by the domain's seed: all
//! samplers draw from a [`ChaCha8Rng`], which behaves identically across
//! platforms.

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub const DEFAULT_SEED: u32 = 42;

/// A source of sample points for attraction placement.
pub trait Domain {
    /// Re-seeds the sampler; identical seeds reproduce identical streams.
    fn seed(&mut self, seed: u32);

    /// Draws the next sample point.
    fn sample(&mut self) -> Vec3;

    /// Lower corner of the axis-aligned bounds enclosing all samples.
    fn min_extents(&self) -> Vec3;

    /// Upper corner of the axis-aligned bounds enclosing all samples.
    fn max_extents(&self) -> Vec3;

    /// Appends `count` samples to `out`.
    fn samples(&mut self, count: usize, out: &mut Vec<Vec3>) {
        out.reserve(count);
        for _ in 0..count {
            out.push(self.sample());
        }
    }
}

fn rng_from(seed: u32) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed as u64)
}

/// Uniform sampling inside a ball.
pub struct SphereDomain {
    center: Vec3,
    radius: f32,
    rng: ChaCha8Rng,
}

impl SphereDomain {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self {
            center,
            radius,
            rng: rng_from(DEFAULT_SEED),
        }
    }
}

impl Domain for SphereDomain {
    fn seed(&mut self, seed: u32) {
        self.rng = rng_from(seed);
    }

    fn sample(&mut self) -> Vec3 {
        // Rejection sampling from the bounding cube keeps the distribution
        // uniform without relying on a normal distribution.
        loop {
            let p = Vec3::new(
                self.rng.random_range(-1.0f32..=1.0),
                self.rng.random_range(-1.0f32..=1.0),
                self.rng.random_range(-1.0f32..=1.0),
            );
            if p.length_squared() <= 1.0 {
                return self.center + p * self.radius;
            }
        }
    }

    fn min_extents(&self) -> Vec3 {
        self.center - Vec3::splat(self.radius)
    }

    fn max_extents(&self) -> Vec3 {
        self.center + Vec3::splat(self.radius)
    }
}

/// Uniform sampling inside an axis-aligned box.
pub struct BoxDomain {
    min: Vec3,
    max: Vec3,
    rng: ChaCha8Rng,
}

impl BoxDomain {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min,
            max,
            rng: rng_from(DEFAULT_SEED),
        }
    }
}

impl Domain for BoxDomain {
    fn seed(&mut self, seed: u32) {
        self.rng = rng_from(seed);
    }

    fn sample(&mut self) -> Vec3 {
        Vec3::new(
            self.rng.random_range(self.min.x..=self.max.x),
            self.rng.random_range(self.min.y..=self.max.y),
            self.rng.random_range(self.min.z..=self.max.z),
        )
    }

    fn min_extents(&self) -> Vec3 {
        self.min
    }

    fn max_extents(&self) -> Vec3 {
        self.max
    }
}

/// Sampling along a set of line segments with a uniform deviation cube.
///
/// Useful to develop an initial trunk before switching to a volumetric
/// domain.
pub struct LineDomain {
    segments: Vec<(Vec3, Vec3)>,
    deviation: f32,
    min: Vec3,
    max: Vec3,
    rng: ChaCha8Rng,
}

impl LineDomain {
    /// ### Panics
    /// Panics if `segments` is empty.
    pub fn new(segments: Vec<(Vec3, Vec3)>, deviation: f32) -> Self {
        assert!(!segments.is_empty(), "line domain needs at least one segment");

        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for (start, end) in &segments {
            min = min.min(start.min(*end));
            max = max.max(start.max(*end));
        }
        min -= Vec3::splat(deviation);
        max += Vec3::splat(deviation);

        Self {
            segments,
            deviation,
            min,
            max,
            rng: rng_from(DEFAULT_SEED),
        }
    }
}

impl Domain for LineDomain {
    fn seed(&mut self, seed: u32) {
        self.rng = rng_from(seed);
    }

    fn sample(&mut self) -> Vec3 {
        let (start, end) = self.segments[self.rng.random_range(0..self.segments.len())];
        let t: f32 = self.rng.random_range(0.0..=1.0);
        let offset = Vec3::new(
            self.rng.random_range(-1.0f32..=1.0),
            self.rng.random_range(-1.0f32..=1.0),
            self.rng.random_range(-1.0f32..=1.0),
        ) * self.deviation;
        start.lerp(end, t) + offset
    }

    fn min_extents(&self) -> Vec3 {
        self.min
    }

    fn max_extents(&self) -> Vec3 {
        self.max
    }
}

/// Sampling inside an explicit set of voxels on a regular grid.
pub struct VoxelDomain {
    min: Vec3,
    max: Vec3,
    voxel_half: Vec3,
    centers: Vec<Vec3>,
    rng: ChaCha8Rng,
}

impl VoxelDomain {
    /// Builds a domain from explicit voxel centers.
    ///
    /// ### Panics
    /// Panics if `centers` is empty.
    pub fn from_centers(min: Vec3, max: Vec3, voxel_size: Vec3, centers: Vec<Vec3>) -> Self {
        assert!(!centers.is_empty(), "voxel domain needs at least one voxel");
        Self {
            min,
            max,
            voxel_half: voxel_size * 0.5,
            centers,
            rng: rng_from(DEFAULT_SEED),
        }
    }

    /// Builds a domain from a boolean occupancy mask over a
    /// `resolution[0] × resolution[1] × resolution[2]` grid spanning
    /// `min..max`, laid out x-fastest.
    ///
    /// ### Panics
    /// Panics if the mask length does not match the resolution, or if no
    /// voxel is set.
    pub fn from_mask(min: Vec3, max: Vec3, resolution: [usize; 3], mask: &[bool]) -> Self {
        assert_eq!(
            mask.len(),
            resolution[0] * resolution[1] * resolution[2],
            "mask length does not match resolution"
        );

        let voxel_size = (max - min)
            / Vec3::new(
                resolution[0] as f32,
                resolution[1] as f32,
                resolution[2] as f32,
            );

        let mut centers = Vec::new();
        for z in 0..resolution[2] {
            for y in 0..resolution[1] {
                for x in 0..resolution[0] {
                    if mask[x + y * resolution[0] + z * resolution[0] * resolution[1]] {
                        let index = Vec3::new(x as f32 + 0.5, y as f32 + 0.5, z as f32 + 0.5);
                        centers.push(min + index * voxel_size);
                    }
                }
            }
        }

        Self::from_centers(min, max, voxel_size, centers)
    }
}

impl Domain for VoxelDomain {
    fn seed(&mut self, seed: u32) {
        self.rng = rng_from(seed);
    }

    fn sample(&mut self) -> Vec3 {
        let center = self.centers[self.rng.random_range(0..self.centers.len())];
        let jitter = Vec3::new(
            self.rng.random_range(-1.0f32..=1.0),
            self.rng.random_range(-1.0f32..=1.0),
            self.rng.random_range(-1.0f32..=1.0),
        ) * self.voxel_half;
        center + jitter
    }

    fn min_extents(&self) -> Vec3 {
        self.min
    }

    fn max_extents(&self) -> Vec3 {
        self.max
    }
}
