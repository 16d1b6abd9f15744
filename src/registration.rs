//! # Rigid frame registration (ICP)
//!
//! Aligns one frame's point set onto a reference frame's coordinate system
//! when the two frames are not already co-registered.
//!
//! ## Overview
//! -----------------
//! Given a moving point set and a reference point set with no known
//! correspondence, [`Icp::align`] estimates the [`RigidTransform`] minimizing
//! the sum of squared distances between each transformed moving point and its
//! nearest neighbor in the reference set:
//!
//! 1. apply the current transform to the moving set,
//! 2. match each transformed point to its nearest reference point (kd-tree),
//! 3. estimate the absolute rotation from the SVD of the cross-covariance of
//!    the centered matched sets, and the translation from the centroid
//!    difference corrected by that rotation,
//! 4. stop when both the rotation and translation updates fall below the
//!    convergence tolerance, or when the iteration cap is reached.
//!
//! ## Error Semantics
//! -----------------
//! * Registration is **best-effort**: exhausting the iteration cap is not an
//!   error; the last transform is returned and the event is logged at debug
//!   level.
//! * Point sets with fewer than 3 points make the cross-covariance
//!   rank-deficient, so the rotation estimate is unreliable. [`Icp::align`]
//!   refuses with [`SkyfitError::DegeneratePointSet`]; callers skip
//!   registration and pass points through untransformed.

use kiddo::immutable::float::kdtree::ImmutableKdTree;
use kiddo::SquaredEuclidean;
use nalgebra::{Matrix3, Vector3, SVD};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::Kilometer;
use crate::skyfit_errors::SkyfitError;

/// Kd-tree flavor used for nearest-neighbor queries over a frame's points.
pub(crate) type PointTree = ImmutableKdTree<f64, u32, 3, 32>;

/// Build a kd-tree over a set of positions.
pub(crate) fn build_point_tree(points: &[Vector3<Kilometer>]) -> PointTree {
    let entries: Vec<[f64; 3]> = points.iter().map(|p| [p.x, p.y, p.z]).collect();
    ImmutableKdTree::new_from_slice(&entries)
}

/// A proper rigid motion: rotation (orthonormal, det +1) plus translation.
///
/// Produced by [`Icp::align`] and applied to remap one frame's coordinates
/// into another frame of reference. Ephemeral: recomputed per frame pair,
/// never persisted as track state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RigidTransform {
    pub rotation: Matrix3<f64>,
    pub translation: Vector3<Kilometer>,
}

impl RigidTransform {
    /// The identity motion.
    pub fn identity() -> Self {
        RigidTransform {
            rotation: Matrix3::identity(),
            translation: Vector3::zeros(),
        }
    }

    /// Apply the motion to a point: `R·p + t`.
    #[inline]
    pub fn apply(&self, point: &Vector3<Kilometer>) -> Vector3<Kilometer> {
        self.rotation * point + self.translation
    }

    /// Rotate a direction vector (translation does not apply to directions).
    #[inline]
    pub fn rotate(&self, direction: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * direction
    }

    /// The inverse motion, such that `t.inverse().apply(&t.apply(&p)) == p`.
    pub fn inverse(&self) -> Self {
        let rotation = self.rotation.transpose();
        RigidTransform {
            rotation,
            translation: -(rotation * self.translation),
        }
    }

    /// Compose two motions: the result applies `other` first, then `self`.
    pub fn compose(&self, other: &RigidTransform) -> Self {
        RigidTransform {
            rotation: self.rotation * other.rotation,
            translation: self.rotation * other.translation + self.translation,
        }
    }
}

/// Iterative closest point alignment with a bounded iteration count.
#[derive(Debug, Clone)]
pub struct Icp {
    max_iterations: usize,
    tolerance: f64,
}

impl Icp {
    pub fn new(max_iterations: usize, tolerance: f64) -> Self {
        Icp {
            max_iterations,
            tolerance,
        }
    }

    /// Estimate the rigid transform aligning `moving` onto `reference`.
    ///
    /// Arguments
    /// -----------------
    /// * `moving`: point set to be remapped.
    /// * `reference`: point set defining the target coordinate system.
    ///
    /// Return
    /// ----------
    /// * `Ok(RigidTransform)` – the aligned motion (last iterate when the cap
    ///   is exhausted without convergence).
    /// * `Err(SkyfitError::DegeneratePointSet)` – either set has fewer than
    ///   3 points; the caller must skip registration.
    pub fn align(
        &self,
        moving: &[Vector3<Kilometer>],
        reference: &[Vector3<Kilometer>],
    ) -> Result<RigidTransform, SkyfitError> {
        let smallest = moving.len().min(reference.len());
        if smallest < 3 {
            return Err(SkyfitError::DegeneratePointSet(smallest));
        }

        let tree = build_point_tree(reference);
        let moving_centroid = centroid(moving);

        let mut transform = RigidTransform::identity();
        let mut converged = false;

        for iteration in 0..self.max_iterations {
            // Match each transformed moving point to its nearest reference point.
            let matched: Vec<Vector3<f64>> = moving
                .iter()
                .map(|p| {
                    let q = transform.apply(p);
                    let hit = tree.nearest_one::<SquaredEuclidean>(&[q.x, q.y, q.z]);
                    reference[hit.item as usize]
                })
                .collect();
            let matched_centroid = centroid(&matched);

            // Cross-covariance of the centered sets.
            let mut cross = Matrix3::zeros();
            for (p, q) in moving.iter().zip(matched.iter()) {
                cross += (p - moving_centroid) * (q - matched_centroid).transpose();
            }

            let rotation = rotation_from_cross_covariance(&cross);
            let translation = matched_centroid - rotation * moving_centroid;

            let delta_r = (rotation - transform.rotation).norm();
            let delta_t = (translation - transform.translation).norm();
            transform = RigidTransform {
                rotation,
                translation,
            };

            if delta_r < self.tolerance && delta_t < self.tolerance {
                converged = true;
                debug!(iteration, "icp converged");
                break;
            }
        }

        if !converged {
            debug!(
                max_iterations = self.max_iterations,
                "icp hit iteration cap; returning last transform"
            );
        }

        Ok(transform)
    }
}

/// Arithmetic mean of a point set. Callers guarantee a non-empty slice.
fn centroid(points: &[Vector3<f64>]) -> Vector3<f64> {
    points.iter().fold(Vector3::zeros(), |acc, p| acc + p) / points.len() as f64
}

/// Proper rotation from the SVD of a cross-covariance matrix, `R = V·Uᵀ`.
///
/// A plain `V·Uᵀ` can come out as a reflection on noisy or near-planar data;
/// in that case the singular vector of the smallest singular value is negated
/// so the determinant is +1.
fn rotation_from_cross_covariance(cross: &Matrix3<f64>) -> Matrix3<f64> {
    let svd = SVD::new(*cross, true, true);
    let u = svd.u.expect("SVD U requested");
    let mut v = svd.v_t.expect("SVD Vᵀ requested").transpose();

    let mut rotation = v * u.transpose();
    if rotation.determinant() < 0.0 {
        let smallest = smallest_index(&svd.singular_values);
        v.column_mut(smallest).neg_mut();
        rotation = v * u.transpose();
    }
    rotation
}

/// Index of the smallest entry (nalgebra does not guarantee singular-value ordering).
pub(crate) fn smallest_index(values: &Vector3<f64>) -> usize {
    let mut idx = 0;
    for i in 1..3 {
        if values[i] < values[idx] {
            idx = i;
        }
    }
    idx
}

#[cfg(test)]
mod registration_test {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Rotation3;

    fn sample_points() -> Vec<Vector3<f64>> {
        vec![
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 2.0, 0.0),
            Vector3::new(0.0, 0.0, 3.0),
            Vector3::new(1.5, -1.0, 0.5),
            Vector3::new(-0.5, 0.75, 2.0),
        ]
    }

    #[test]
    fn test_transform_round_trip() {
        let transform = RigidTransform {
            rotation: *Rotation3::from_euler_angles(0.1, -0.2, 0.3).matrix(),
            translation: Vector3::new(4.0, -2.0, 1.0),
        };
        for p in sample_points() {
            let back = transform.inverse().apply(&transform.apply(&p));
            assert_relative_eq!((back - p).norm(), 0.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_compose_matches_sequential_application() {
        let a = RigidTransform {
            rotation: *Rotation3::from_euler_angles(0.0, 0.1, 0.2).matrix(),
            translation: Vector3::new(1.0, 0.0, -1.0),
        };
        let b = RigidTransform {
            rotation: *Rotation3::from_euler_angles(-0.3, 0.0, 0.05).matrix(),
            translation: Vector3::new(0.0, 2.0, 0.5),
        };
        let p = Vector3::new(0.7, -1.2, 3.3);
        let composed = a.compose(&b).apply(&p);
        let sequential = a.apply(&b.apply(&p));
        assert_relative_eq!((composed - sequential).norm(), 0.0, epsilon = 1e-10);
    }

    #[test]
    fn test_icp_identity_on_identical_sets() {
        let points = sample_points();
        let icp = Icp::new(50, 1e-9);
        let transform = icp.align(&points, &points).unwrap();

        assert_relative_eq!(
            (transform.rotation - Matrix3::identity()).norm(),
            0.0,
            epsilon = 1e-9
        );
        assert_relative_eq!(transform.translation.norm(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_icp_recovers_known_motion() {
        let points = sample_points();
        // Small rotation plus translation keeps the initial nearest-neighbor
        // matching correct, so the recovery is exact for noise-free data.
        let rotation = *Rotation3::from_euler_angles(0.05, -0.04, 0.08).matrix();
        let translation = Vector3::new(0.2, -0.1, 0.15);
        let reference: Vec<Vector3<f64>> =
            points.iter().map(|p| rotation * p + translation).collect();

        let icp = Icp::new(100, 1e-10);
        let transform = icp.align(&points, &reference).unwrap();

        assert_relative_eq!((transform.rotation - rotation).norm(), 0.0, epsilon = 1e-6);
        assert_relative_eq!((transform.translation - translation).norm(), 0.0, epsilon = 1e-6);
        assert_relative_eq!(transform.rotation.determinant(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_icp_refuses_degenerate_sets() {
        let two = vec![Vector3::new(0.0, 0.0, 0.0), Vector3::new(1.0, 0.0, 0.0)];
        let icp = Icp::new(10, 1e-6);
        assert_eq!(
            icp.align(&two, &sample_points()),
            Err(SkyfitError::DegeneratePointSet(2))
        );
        assert_eq!(
            icp.align(&sample_points(), &two),
            Err(SkyfitError::DegeneratePointSet(2))
        );
    }
}
