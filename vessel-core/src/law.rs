//! Vascular branching laws.
//!
//! Pure geometry helpers used by the growth phases: Murray's law for radii
//! shrinkage throughout a vessel tree, the bifurcation angles that minimize
//! vessel volume in an idealized bifurcation, and a principal-component line
//! fit through a cloud of attraction points.

use glam::{Quat, Vec3};
use nalgebra::Matrix3;

/// Parent radius implied by Murray's law for two child radii.
///
/// Computes `(r_l^γ + r_r^γ)^(1/γ)` for exponent `γ > 0`.
pub fn murray_radius(r_l: f32, r_r: f32, exponent: f32) -> f32 {
    (r_l.powf(exponent) + r_r.powf(exponent)).powf(1.0 / exponent)
}

/// Bifurcation angles, in degrees, for a parent of radius `r_p` splitting
/// into children of radii `r_l` and `r_r`.
///
/// The left angle is negative, the right angle positive. The cosine
/// arguments are clamped to `[-1, 1]` to tolerate numerical drift, so the
/// function is total over positive radii.
pub fn murray_angles(r_p: f32, r_l: f32, r_r: f32) -> (f32, f32) {
    let cos_l = (r_p.powi(4) + r_l.powi(4) - r_r.powi(4)) / (2.0 * r_p.powi(2) * r_l.powi(2));
    let angle_l = -cos_l.clamp(-1.0, 1.0).acos().to_degrees();

    let cos_r = (r_p.powi(4) - r_l.powi(4) + r_r.powi(4)) / (2.0 * r_p.powi(2) * r_r.powi(2));
    let angle_r = cos_r.clamp(-1.0, 1.0).acos().to_degrees();

    (angle_l, angle_r)
}

/// Best-fit line through a set of points, minimizing orthogonal distances.
///
/// ### Returns
/// `(centroid, axis)` where `axis` is the unit eigenvector of the 3×3
/// covariance matrix with the largest eigenvalue. The axis sign is
/// arbitrary. For fewer than two distinct points the axis degenerates to
/// whatever direction the eigensolver reports for a zero matrix.
pub fn best_line_fit(points: &[Vec3]) -> (Vec3, Vec3) {
    let n = points.len().max(1) as f64;

    let mut mean = [0.0f64; 3];
    for p in points {
        mean[0] += p.x as f64;
        mean[1] += p.y as f64;
        mean[2] += p.z as f64;
    }
    mean[0] /= n;
    mean[1] /= n;
    mean[2] /= n;

    let mut cov = Matrix3::<f64>::zeros();
    for p in points {
        let d = [p.x as f64 - mean[0], p.y as f64 - mean[1], p.z as f64 - mean[2]];
        for i in 0..3 {
            for j in 0..3 {
                cov[(i, j)] += d[i] * d[j];
            }
        }
    }

    let eig = cov.symmetric_eigen();
    let mut dominant = 0;
    for i in 1..3 {
        if eig.eigenvalues[i] > eig.eigenvalues[dominant] {
            dominant = i;
        }
    }
    let col = eig.eigenvectors.column(dominant);

    let centroid = Vec3::new(mean[0] as f32, mean[1] as f32, mean[2] as f32);
    let axis = Vec3::new(col[0] as f32, col[1] as f32, col[2] as f32).normalize_or_zero();

    (centroid, axis)
}

/// Rotates `v` by `degrees` around the unit vector `axis`.
///
/// The axis must be normalized; callers are expected to have produced it
/// from a normalized cross product.
pub fn rotate_deg(v: Vec3, degrees: f32, axis: Vec3) -> Vec3 {
    Quat::from_axis_angle(axis, degrees.to_radians()) * v
}
