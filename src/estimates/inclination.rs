//! # Orbital-plane inclination estimation
//!
//! Derives the orbital-plane normal from the covariance structure of a
//! track's positions: the singular vector of the smallest singular value of
//! the position covariance is the plane normal, and the inclination is the
//! angle between that normal and the reference +z axis.
//!
//! Prograde and retrograde motion are indistinguishable from geometry alone,
//! so the normal is canonicalized to non-negative z and the reported
//! inclination lies in [0, π/2].

use nalgebra::{Vector3, SVD};

use crate::constants::Radian;
use crate::registration::smallest_index;
use crate::skyfit_errors::SkyfitError;

use super::covariance_matrix;

/// Estimated orbital plane: unit normal plus inclination against +z.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaneEstimate {
    pub normal: Vector3<f64>,
    pub inclination: Radian,
}

/// Estimate the orbital-plane inclination of a position set.
///
/// Arguments
/// -----------------
/// * `positions`: track positions (at least 3).
/// * `condition_eps`: relative threshold on the separation of the two
///   smallest singular values; below it the plane normal is not uniquely
///   determined and the estimate is refused.
///
/// Return
/// ----------
/// * `Ok(PlaneEstimate)` – plane normal (unit, z ≥ 0) and inclination.
/// * `Err(SkyfitError::InsufficientDetections)` – fewer than 3 positions.
/// * `Err(SkyfitError::IllConditionedPlane)` – the two smallest singular
///   values are nearly equal, so the smallest-singular-value direction is
///   ambiguous (e.g. positions on a line, or an isotropic cloud).
pub fn estimate_inclination(
    positions: &[Vector3<f64>],
    condition_eps: f64,
) -> Result<PlaneEstimate, SkyfitError> {
    if positions.len() < 3 {
        return Err(SkyfitError::InsufficientDetections {
            needed: 3,
            got: positions.len(),
        });
    }

    let cov = covariance_matrix(positions);
    let svd = SVD::new(cov, true, true);
    let singular_values = svd.singular_values;

    let smallest = smallest_index(&singular_values);
    let largest = (0..3)
        .max_by(|&a, &b| {
            singular_values[a]
                .partial_cmp(&singular_values[b])
                .expect("singular values are finite")
        })
        .expect("three singular values");
    let middle = 3 - smallest - largest;

    // Unique plane normal requires a clear gap between the two smallest
    // singular values, measured relative to the largest.
    let scale = singular_values[largest];
    if scale <= 0.0
        || (singular_values[middle] - singular_values[smallest]).abs() <= condition_eps * scale
    {
        return Err(SkyfitError::IllConditionedPlane);
    }

    let v = svd.v_t.expect("SVD Vᵀ requested").transpose();
    let mut normal: Vector3<f64> = v.column(smallest).clone_owned();
    if normal.z < 0.0 {
        normal.neg_mut();
    }

    let inclination = normal.z.clamp(-1.0, 1.0).acos();

    Ok(PlaneEstimate {
        normal,
        inclination,
    })
}

#[cfg(test)]
mod inclination_test {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn ring(radius: f64, tilt: f64, n: usize) -> Vec<Vector3<f64>> {
        (0..n)
            .map(|k| {
                let theta = 2.0 * PI * k as f64 / n as f64;
                let p = Vector3::new(radius * theta.cos(), radius * theta.sin(), 0.0);
                nalgebra::Rotation3::from_axis_angle(&Vector3::x_axis(), tilt) * p
            })
            .collect()
    }

    #[test]
    fn test_equatorial_ring_has_zero_inclination() {
        let estimate = estimate_inclination(&ring(8000.0, 0.0, 12), 1e-6).unwrap();
        assert_relative_eq!(estimate.inclination, 0.0, epsilon = 1e-9);
        assert_relative_eq!((estimate.normal - Vector3::z()).norm(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_tilted_ring_recovers_tilt() {
        for tilt in [0.2, 0.7, 1.3] {
            let estimate = estimate_inclination(&ring(8000.0, tilt, 16), 1e-6).unwrap();
            assert_relative_eq!(estimate.inclination, tilt, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_too_few_positions() {
        let two = vec![Vector3::zeros(), Vector3::new(1.0, 0.0, 0.0)];
        assert_eq!(
            estimate_inclination(&two, 1e-6),
            Err(SkyfitError::InsufficientDetections { needed: 3, got: 2 })
        );
    }

    #[test]
    fn test_collinear_positions_are_ill_conditioned() {
        // All points on a line: both small singular values vanish, so the
        // normal direction is ambiguous.
        let line: Vec<Vector3<f64>> = (0..6)
            .map(|k| Vector3::new(k as f64, 2.0 * k as f64, 0.0))
            .collect();
        assert_eq!(
            estimate_inclination(&line, 1e-6),
            Err(SkyfitError::IllConditionedPlane)
        );
    }
}
