//! # Per-track geometric estimators
//!
//! Independent estimators consumed by the orbit fitter: the recurrence-based
//! orbital-period estimator ([`period`]) and the covariance-based
//! orbital-plane inclination estimator ([`inclination`]).
//!
//! Both operate on a single assembled flight path and never mutate it.

use nalgebra::{Matrix3, Vector3};

pub mod inclination;
pub mod period;

/// Covariance matrix of a centered 3-D point set, `(1/n)·Σ c·cᵀ`.
///
/// Callers guarantee a non-empty slice.
pub(crate) fn covariance_matrix(positions: &[Vector3<f64>]) -> Matrix3<f64> {
    let n = positions.len() as f64;
    let centroid = positions
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p)
        / n;

    let mut cov = Matrix3::zeros();
    for p in positions {
        let c = p - centroid;
        cov += c * c.transpose();
    }
    cov / n
}
