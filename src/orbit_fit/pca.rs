//! # PCA ellipse analysis
//!
//! Principal-component summary of a track's positions, used as a fast
//! initial-guess generator for the orbit fit: the two leading principal axes
//! approximate the orbit ellipse's semi-axes, and the leading axis direction
//! gives the in-plane orientation.
//!
//! This is deliberately **not** a final estimator — it ignores timestamps,
//! confidence weights and the anomaly model entirely — but it lands the
//! simplex close enough to cut the iteration count substantially.

use nalgebra::{Vector3, SVD};

use crate::constants::{Kilometer, Radian};
use crate::skyfit_errors::SkyfitError;

use crate::estimates::covariance_matrix;

/// Principal-axis summary of a 3-D point set.
#[derive(Debug, Clone, PartialEq)]
pub struct EllipseAxes {
    /// Mean of the positions.
    pub center: Vector3<Kilometer>,
    /// Length of the leading semi-axis (km).
    pub semi_major: Kilometer,
    /// Length of the second semi-axis (km).
    pub semi_minor: Kilometer,
    /// Angle of the leading axis in the x-y plane, `atan2(v.y, v.x)`.
    pub orientation: Radian,
}

impl EllipseAxes {
    /// Eccentricity implied by the axis ratio, clamped into [0, `max`].
    pub fn eccentricity(&self, max: f64) -> f64 {
        if self.semi_major <= 0.0 {
            return 0.0;
        }
        let ratio = (self.semi_minor / self.semi_major).min(1.0);
        (1.0 - ratio * ratio).sqrt().clamp(0.0, max)
    }
}

/// Fit an ellipse summary to a position set via PCA.
///
/// Arguments
/// -----------------
/// * `positions`: track positions (at least 3).
///
/// Return
/// ----------
/// * `Ok(EllipseAxes)` – center, semi-axis lengths and leading-axis
///   orientation. Axis lengths are `√(2λ)` for the covariance eigenvalues λ
///   (the variance of a uniformly sampled ellipse along an axis is half the
///   squared semi-axis).
/// * `Err(SkyfitError::InsufficientDetections)` – fewer than 3 positions.
pub fn ellipse_from_positions(positions: &[Vector3<f64>]) -> Result<EllipseAxes, SkyfitError> {
    if positions.len() < 3 {
        return Err(SkyfitError::InsufficientDetections {
            needed: 3,
            got: positions.len(),
        });
    }

    let center = positions
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p)
        / positions.len() as f64;

    let cov = covariance_matrix(positions);
    let svd = SVD::new(cov, true, true);
    let values = svd.singular_values;
    let v = svd.v_t.expect("SVD Vᵀ requested").transpose();

    // Order the axes by singular value, largest first.
    let mut order = [0usize, 1, 2];
    order.sort_unstable_by(|&a, &b| {
        values[b]
            .partial_cmp(&values[a])
            .expect("singular values are finite")
    });

    let leading: Vector3<f64> = v.column(order[0]).clone_owned();

    Ok(EllipseAxes {
        center,
        semi_major: (2.0 * values[order[0]]).sqrt(),
        semi_minor: (2.0 * values[order[1]]).sqrt(),
        orientation: leading.y.atan2(leading.x),
    })
}
