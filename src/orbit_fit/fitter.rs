//! # Per-track orbit fitter
//!
//! Fits the reduced element set `{semi-major axis, eccentricity,
//! orientation}` to one flight path by minimizing a confidence-weighted,
//! beta-regularized position residual. Period and inclination are hard
//! preconditions: an undetermined period fails the fit fast, and plane
//! estimation errors propagate unchanged, so callers can tell "no object
//! detected" apart from "object detected but orbit unresolvable".

use nalgebra::Vector3;
use tracing::debug;

use crate::constants::{FlightPath, Radian, Seconds, DPI};
use crate::estimates::inclination::estimate_inclination;
use crate::estimates::period::estimate_period;
use crate::kepler::{orbital_radius, perifocal_to_reference, principal_angle, solve_eccentric_anomaly, true_anomaly};
use crate::skyfit_errors::SkyfitError;

use super::elements::OrbitalElements;
use super::pca::ellipse_from_positions;
use super::simplex;
use super::FitParams;

/// Eccentricity ceiling inside the objective; keeps every evaluation in the
/// elliptical domain of the anomaly kernel regardless of where the simplex
/// wanders.
const ECC_CLAMP: f64 = 0.95;

/// Orbit fitter for assembled flight paths.
///
/// One fitter is cheap to build and can be shared across tracks; all state
/// lives in the [`FitParams`].
#[derive(Debug, Clone)]
pub struct OrbitFitter {
    params: FitParams,
}

impl OrbitFitter {
    pub fn new(params: FitParams) -> Self {
        OrbitFitter { params }
    }

    #[inline]
    pub fn params(&self) -> &FitParams {
        &self.params
    }

    /// Fit orbital elements to a flight path.
    ///
    /// Arguments
    /// -----------------
    /// * `track`: time-ordered flight path from the associator.
    ///
    /// Return
    /// ----------
    /// * `Ok((OrbitalElements, fit_error))` – the best-fit elements and the
    ///   total weighted residual at the optimum. A poorly converged fit shows
    ///   up as a large residual, not as an error.
    /// * `Err(SkyfitError::EmptyTrack)` – nothing to fit.
    /// * `Err(SkyfitError::UndeterminedPeriod)` – no recurrence was found;
    ///   the mean anomaly would divide by an undefined period.
    /// * `Err(SkyfitError::InsufficientDetections)` /
    ///   `Err(SkyfitError::IllConditionedPlane)` – from the inclination
    ///   estimator.
    pub fn fit(&self, track: &FlightPath) -> Result<(OrbitalElements, f64), SkyfitError> {
        if track.is_empty() {
            return Err(SkyfitError::EmptyTrack);
        }

        let period = estimate_period(track, &self.params).ok_or(SkyfitError::UndeterminedPeriod)?;

        let positions: Vec<Vector3<f64>> = track.iter().map(|d| d.position).collect();
        let plane = estimate_inclination(&positions, self.params.plane_condition_eps)?;

        let (a_seed, e_seed, orientation_seed) = self.seeds(&positions);

        let objective = |x: &[f64]| {
            self.track_error(track, period, plane.inclination, x[0], x[1], x[2])
        };
        let steps = [0.1 * a_seed.max(1.0), 0.05, 0.3];

        // The orientation angle is periodic and the PCA seed carries a sign
        // ambiguity, so a single simplex start can land in the antipodal
        // basin. Restart a quarter turn apart and keep the lowest residual.
        let mut best: Option<(Vec<f64>, f64)> = None;
        for quarter in 0..4 {
            let start = [
                a_seed,
                e_seed,
                orientation_seed + quarter as f64 * std::f64::consts::FRAC_PI_2,
            ];
            let (candidate, residual) = simplex::minimize(
                &objective,
                &start,
                &steps,
                self.params.simplex_max_iter,
                self.params.simplex_eps,
            );
            if best.as_ref().is_none_or(|(_, b)| residual < *b) {
                best = Some((candidate, residual));
            }
        }
        let (best, fit_error) = best.expect("at least one simplex restart ran");

        let elements = OrbitalElements {
            semi_major_axis: best[0].abs(),
            eccentricity: best[1].clamp(0.0, ECC_CLAMP),
            inclination: plane.inclination,
            periapsis_argument: principal_angle(best[2]),
            ascending_node_longitude: 0.0,
            // The mean anomaly is referenced to the track's first timestamp.
            mean_anomaly: 0.0,
            period,
        };
        debug!(%elements, fit_error, "orbit fit finished");

        Ok((elements, fit_error))
    }

    /// Initial guesses for `(a, e, orientation)`: PCA ellipse analysis when
    /// enabled and well-posed, the configured fixed seeds otherwise.
    fn seeds(&self, positions: &[Vector3<f64>]) -> (f64, f64, Radian) {
        if self.params.pca_seed {
            if let Ok(axes) = ellipse_from_positions(positions) {
                if axes.semi_major > 0.0 {
                    return (
                        axes.semi_major,
                        axes.eccentricity(ECC_CLAMP),
                        axes.orientation,
                    );
                }
            }
        }
        (
            self.params.semi_major_axis_seed,
            self.params.eccentricity_seed,
            self.params.orientation_seed,
        )
    }

    /// Total weighted fit error of the parameter triple over the track.
    ///
    /// Per detection: the mean anomaly follows from the elapsed time and the
    /// period estimate; eccentric and true anomaly through the anomaly
    /// kernel; the perifocal position is rotated by the estimated inclination
    /// and the varied orientation; detections carrying a velocity cue get the
    /// constant-velocity displacement correction scaled by `time_parity`.
    /// Per-point error is `confidence × (‖residual‖² + beta·(e − ē)²)`.
    fn track_error(
        &self,
        track: &FlightPath,
        period: Seconds,
        inclination: Radian,
        semi_major_axis: f64,
        eccentricity: f64,
        orientation: Radian,
    ) -> f64 {
        let a = semi_major_axis.abs();
        let e = eccentricity.clamp(0.0, ECC_CLAMP);
        let ecc_penalty = self.params.beta * (e - self.params.expected_eccentricity).powi(2);
        let t0 = track[0].time;

        let mut total = 0.0;
        for det in track.iter() {
            let mean_anomaly = DPI * (det.time - t0) / period;
            let ecc_anomaly = solve_eccentric_anomaly(
                mean_anomaly,
                e,
                self.params.kepler_eps,
                self.params.kepler_max_iter,
            );
            let nu = true_anomaly(ecc_anomaly, e).expect("eccentricity clamped to elliptical domain");
            let r = orbital_radius(a, e, nu);

            let perifocal = Vector3::new(r * nu.cos(), r * nu.sin(), 0.0);
            let mut model = perifocal_to_reference(&perifocal, inclination, orientation, 0.0);
            model += det.displacement(self.params.time_parity);

            let residual = (det.position - model).norm_squared();
            total += det.confidence * (residual + ecc_penalty);
        }
        total
    }
}
