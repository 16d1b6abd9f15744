//! # Orbit fitting
//!
//! This module defines the [`FitParams`] configuration struct and its
//! builder, the [`OrbitalElements`](elements::OrbitalElements) result type,
//! and the [`OrbitFitter`](fitter::OrbitFitter) that estimates orbital
//! elements for one flight path.
//!
//! ## Pipeline overview
//!
//! 1. **Period estimation**
//!    The recurrence-based estimator (see [`crate::estimates::period`]) must
//!    produce a period; an undetermined period fails the fit fast — the mean
//!    anomaly would otherwise divide by an undefined value.
//!
//! 2. **Inclination estimation**
//!    The orbital-plane normal comes from the covariance of the track
//!    positions (see [`crate::estimates::inclination`]); its errors
//!    (too few points, ill-conditioned plane) propagate unchanged.
//!
//! 3. **Seeding**
//!    Initial guesses are domain-informed: semi-major axis from the low-orbit
//!    shell constant, eccentricity near 0.1, orientation 0 — or, when
//!    `pca_seed` is set, from a PCA ellipse analysis of the track
//!    (see [`pca`]), which usually lands much closer.
//!
//! 4. **Minimization**
//!    A bounded Nelder–Mead simplex varies `{semi-major axis, eccentricity,
//!    orientation}` over the confidence-weighted, beta-regularized residual.
//!    Non-convergence shows up as an elevated residual, never as an error.
//!
//! ## Example
//!
//! ```rust,no_run
//! use skyfit::orbit_fit::{fitter::OrbitFitter, FitParams};
//!
//! # fn demo(track: &skyfit::constants::FlightPath) -> Result<(), skyfit::skyfit_errors::SkyfitError> {
//! let params = FitParams::builder()
//!     .proximity_threshold(1500.0)
//!     .beta(0.05)
//!     .build()?;
//!
//! let fitter = OrbitFitter::new(params);
//! let (elements, fit_error) = fitter.fit(track)?;
//! eprintln!("{elements} (error {fit_error:.3})");
//! # Ok(()) }
//! ```
//!
//! ## See also
//!
//! * [`crate::track_fit::TrackFit`] – batch driver fitting every track of a set.
use std::cmp::Ordering::{Equal, Greater};
use std::fmt;

use crate::constants::{Kilometer, Radian, Seconds, LEO_SHELL_KM};
use crate::skyfit_errors::SkyfitError;

pub mod elements;
pub mod fitter;
pub mod pca;
mod simplex;

/// Configuration parameters controlling the behavior of
/// [`OrbitFitter`](fitter::OrbitFitter) and the per-track estimators it
/// depends on.
///
/// Fields
/// -----------------
/// **Period estimation**
/// * `proximity_threshold` – recurrence radius (km) around the track's first
///   position.
/// * `min_departure_samples` – consecutive samples the object must spend
///   outside the threshold before a re-entry counts (noise hysteresis).
/// * `mad_multiplier` – deviation-from-mean cut in units of the MAD when
///   combining recurrence samples.
/// * `cadence_precheck` – gate tracks through the full-orbit cadence
///   heuristic before scanning for recurrences.
/// * `cadence_tolerance` – relative inter-sample interval tolerance used by
///   the cadence heuristic.
/// * `min_span_factor` – minimum track span in units of the first interval
///   for the cadence heuristic.
///
/// **Objective**
/// * `beta` – weight of the eccentricity-prior regularization term.
/// * `expected_eccentricity` – prior expectation for the eccentricity.
/// * `time_parity` – fixed inter-frame phase-offset constant (seconds);
///   detections carrying a velocity cue get a constant-velocity displacement
///   correction `speed · direction · time_parity` added to the model
///   position. Zero disables the correction.
///
/// **Seeding**
/// * `semi_major_axis_seed` – initial semi-major axis (km), defaulted to the
///   low-orbit shell radius.
/// * `eccentricity_seed` – initial eccentricity.
/// * `orientation_seed` – initial in-plane orientation angle (rad).
/// * `pca_seed` – derive the seeds from a PCA ellipse analysis of the track
///   when possible, falling back to the fixed seeds above.
///
/// **Numerical tolerances / iterations**
/// * `kepler_eps`, `kepler_max_iter` – Newton solve of Kepler's equation.
/// * `simplex_max_iter`, `simplex_eps` – Nelder–Mead iteration cap and
///   convergence threshold on the simplex value spread.
/// * `plane_condition_eps` – relative singular-value separation below which
///   the inclination estimate is refused as ill-conditioned.
///
/// Defaults
/// -----------------
/// ```rust
/// use skyfit::orbit_fit::FitParams;
/// let params = FitParams::default();
/// assert_eq!(params.min_departure_samples, 2);
/// ```
///
/// * `proximity_threshold`: 25.0 km
/// * `min_departure_samples`: 2
/// * `mad_multiplier`: 0.5
/// * `cadence_precheck`: true, `cadence_tolerance`: 0.1, `min_span_factor`: 1.5
/// * `beta`: 0.1, `expected_eccentricity`: 0.1, `time_parity`: 0.0 s
/// * `semi_major_axis_seed`: low-orbit shell (~8282 km), `eccentricity_seed`: 0.1,
///   `orientation_seed`: 0.0, `pca_seed`: true
/// * `kepler_eps`: 1e-6, `kepler_max_iter`: 1000
/// * `simplex_max_iter`: 400, `simplex_eps`: 1e-9
/// * `plane_condition_eps`: 1e-6
#[derive(Debug, Clone)]
pub struct FitParams {
    // --- Period estimation ---
    pub proximity_threshold: Kilometer,
    pub min_departure_samples: usize,
    pub mad_multiplier: f64,
    pub cadence_precheck: bool,
    pub cadence_tolerance: f64,
    pub min_span_factor: f64,

    // --- Objective ---
    pub beta: f64,
    pub expected_eccentricity: f64,
    pub time_parity: Seconds,

    // --- Seeding ---
    pub semi_major_axis_seed: Kilometer,
    pub eccentricity_seed: f64,
    pub orientation_seed: Radian,
    pub pca_seed: bool,

    // --- Numerical tolerances / iterations ---
    pub kepler_eps: f64,
    pub kepler_max_iter: usize,
    pub simplex_max_iter: usize,
    pub simplex_eps: f64,
    pub plane_condition_eps: f64,
}

impl FitParams {
    /// Construct a new [`FitParams`] with the default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new [`FitParamsBuilder`] to override defaults step by step.
    pub fn builder() -> FitParamsBuilder {
        FitParamsBuilder::new()
    }
}

impl Default for FitParams {
    fn default() -> Self {
        FitParams {
            proximity_threshold: 25.0,
            min_departure_samples: 2,
            mad_multiplier: 0.5,
            cadence_precheck: true,
            cadence_tolerance: 0.1,
            min_span_factor: 1.5,

            beta: 0.1,
            expected_eccentricity: 0.1,
            time_parity: 0.0,

            semi_major_axis_seed: LEO_SHELL_KM,
            eccentricity_seed: 0.1,
            orientation_seed: 0.0,
            pca_seed: true,

            kepler_eps: 1e-6,
            kepler_max_iter: 1000,
            simplex_max_iter: 400,
            simplex_eps: 1e-9,
            plane_condition_eps: 1e-6,
        }
    }
}

/// Builder for [`FitParams`], with validation.
#[derive(Debug, Clone, Default)]
pub struct FitParamsBuilder {
    params: FitParams,
}

impl FitParamsBuilder {
    pub fn new() -> Self {
        Self {
            params: FitParams::default(),
        }
    }

    // --- Period estimation ---
    pub fn proximity_threshold(mut self, v: Kilometer) -> Self {
        self.params.proximity_threshold = v;
        self
    }
    pub fn min_departure_samples(mut self, v: usize) -> Self {
        self.params.min_departure_samples = v;
        self
    }
    pub fn mad_multiplier(mut self, v: f64) -> Self {
        self.params.mad_multiplier = v;
        self
    }
    pub fn cadence_precheck(mut self, v: bool) -> Self {
        self.params.cadence_precheck = v;
        self
    }
    pub fn cadence_tolerance(mut self, v: f64) -> Self {
        self.params.cadence_tolerance = v;
        self
    }
    pub fn min_span_factor(mut self, v: f64) -> Self {
        self.params.min_span_factor = v;
        self
    }

    // --- Objective ---
    pub fn beta(mut self, v: f64) -> Self {
        self.params.beta = v;
        self
    }
    pub fn expected_eccentricity(mut self, v: f64) -> Self {
        self.params.expected_eccentricity = v;
        self
    }
    pub fn time_parity(mut self, v: Seconds) -> Self {
        self.params.time_parity = v;
        self
    }

    // --- Seeding ---
    pub fn semi_major_axis_seed(mut self, v: Kilometer) -> Self {
        self.params.semi_major_axis_seed = v;
        self
    }
    pub fn eccentricity_seed(mut self, v: f64) -> Self {
        self.params.eccentricity_seed = v;
        self
    }
    pub fn orientation_seed(mut self, v: Radian) -> Self {
        self.params.orientation_seed = v;
        self
    }
    pub fn pca_seed(mut self, v: bool) -> Self {
        self.params.pca_seed = v;
        self
    }

    // --- Numerics ---
    pub fn kepler_eps(mut self, v: f64) -> Self {
        self.params.kepler_eps = v;
        self
    }
    pub fn kepler_max_iter(mut self, v: usize) -> Self {
        self.params.kepler_max_iter = v;
        self
    }
    pub fn simplex_max_iter(mut self, v: usize) -> Self {
        self.params.simplex_max_iter = v;
        self
    }
    pub fn simplex_eps(mut self, v: f64) -> Self {
        self.params.simplex_eps = v;
        self
    }
    pub fn plane_condition_eps(mut self, v: f64) -> Self {
        self.params.plane_condition_eps = v;
        self
    }

    /// Return true iff x > 0.0 and comparable (i.e., not NaN).
    #[inline]
    fn gt0(x: f64) -> bool {
        x.partial_cmp(&0.0) == Some(Greater)
    }

    /// Return true iff x >= 0.0 and comparable (i.e., not NaN).
    #[inline]
    fn ge0(x: f64) -> bool {
        matches!(x.partial_cmp(&0.0), Some(Greater) | Some(Equal))
    }

    /// Finalize the builder and produce a [`FitParams`] instance.
    ///
    /// Validation rules
    /// -----------------
    /// * `proximity_threshold > 0`, `cadence_tolerance > 0`.
    /// * `min_departure_samples >= 1`, `min_span_factor >= 0`.
    /// * `mad_multiplier >= 0`, `beta >= 0`.
    /// * `expected_eccentricity ∈ [0, 1)` and `eccentricity_seed ∈ [0, 1)` –
    ///   the anomaly kernel only covers the elliptical domain.
    /// * `time_parity` finite (either sign is a legal phase offset).
    /// * `semi_major_axis_seed > 0`.
    /// * `kepler_eps > 0`, `kepler_max_iter >= 1`.
    /// * `simplex_eps > 0`, `simplex_max_iter >= 1`.
    /// * `plane_condition_eps > 0`.
    pub fn build(self) -> Result<FitParams, SkyfitError> {
        let p = &self.params;

        if !Self::gt0(p.proximity_threshold) {
            return Err(SkyfitError::InvalidFitParameter(
                "proximity_threshold must be > 0".into(),
            ));
        }
        if p.min_departure_samples == 0 {
            return Err(SkyfitError::InvalidFitParameter(
                "min_departure_samples must be >= 1".into(),
            ));
        }
        if !Self::ge0(p.mad_multiplier) {
            return Err(SkyfitError::InvalidFitParameter(
                "mad_multiplier must be >= 0".into(),
            ));
        }
        if !Self::gt0(p.cadence_tolerance) {
            return Err(SkyfitError::InvalidFitParameter(
                "cadence_tolerance must be > 0".into(),
            ));
        }
        if !Self::ge0(p.min_span_factor) {
            return Err(SkyfitError::InvalidFitParameter(
                "min_span_factor must be >= 0".into(),
            ));
        }
        if !Self::ge0(p.beta) {
            return Err(SkyfitError::InvalidFitParameter(
                "beta must be >= 0".into(),
            ));
        }
        if !(0.0..1.0).contains(&p.expected_eccentricity) {
            return Err(SkyfitError::InvalidFitParameter(
                "expected_eccentricity must be in [0, 1)".into(),
            ));
        }
        if !(0.0..1.0).contains(&p.eccentricity_seed) {
            return Err(SkyfitError::InvalidFitParameter(
                "eccentricity_seed must be in [0, 1)".into(),
            ));
        }
        if !p.time_parity.is_finite() {
            return Err(SkyfitError::InvalidFitParameter(
                "time_parity must be finite".into(),
            ));
        }
        if !Self::gt0(p.semi_major_axis_seed) {
            return Err(SkyfitError::InvalidFitParameter(
                "semi_major_axis_seed must be > 0".into(),
            ));
        }
        if !Self::gt0(p.kepler_eps) {
            return Err(SkyfitError::InvalidFitParameter(
                "kepler_eps must be > 0".into(),
            ));
        }
        if p.kepler_max_iter == 0 {
            return Err(SkyfitError::InvalidFitParameter(
                "kepler_max_iter must be >= 1".into(),
            ));
        }
        if !Self::gt0(p.simplex_eps) {
            return Err(SkyfitError::InvalidFitParameter(
                "simplex_eps must be > 0".into(),
            ));
        }
        if p.simplex_max_iter == 0 {
            return Err(SkyfitError::InvalidFitParameter(
                "simplex_max_iter must be >= 1".into(),
            ));
        }
        if !Self::gt0(p.plane_condition_eps) {
            return Err(SkyfitError::InvalidFitParameter(
                "plane_condition_eps must be > 0".into(),
            ));
        }

        Ok(self.params)
    }
}

impl fmt::Display for FitParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            writeln!(f, "Orbit Fit Parameters")?;
            writeln!(f, "--------------------")?;
            writeln!(f, "[Period estimation]")?;
            writeln!(f, "  proximity_threshold   = {:.3} km", self.proximity_threshold)?;
            writeln!(f, "  min_departure_samples = {}", self.min_departure_samples)?;
            writeln!(f, "  mad_multiplier        = {:.3}", self.mad_multiplier)?;
            writeln!(f, "  cadence_precheck      = {}", self.cadence_precheck)?;
            writeln!(f, "  cadence_tolerance     = {:.3}", self.cadence_tolerance)?;
            writeln!(f, "  min_span_factor       = {:.3}", self.min_span_factor)?;
            writeln!(f, "\n[Objective]")?;
            writeln!(f, "  beta                  = {:.3}", self.beta)?;
            writeln!(f, "  expected_eccentricity = {:.3}", self.expected_eccentricity)?;
            writeln!(f, "  time_parity           = {:.3} s", self.time_parity)?;
            writeln!(f, "\n[Seeding]")?;
            writeln!(f, "  semi_major_axis_seed  = {:.1} km", self.semi_major_axis_seed)?;
            writeln!(f, "  eccentricity_seed     = {:.3}", self.eccentricity_seed)?;
            writeln!(f, "  orientation_seed      = {:.3} rad", self.orientation_seed)?;
            writeln!(f, "  pca_seed              = {}", self.pca_seed)?;
            writeln!(f, "\n[Numerics]")?;
            writeln!(f, "  kepler_eps            = {:.1e}", self.kepler_eps)?;
            writeln!(f, "  kepler_max_iter       = {}", self.kepler_max_iter)?;
            writeln!(f, "  simplex_max_iter      = {}", self.simplex_max_iter)?;
            writeln!(f, "  simplex_eps           = {:.1e}", self.simplex_eps)?;
            write!(f, "  plane_condition_eps   = {:.1e}", self.plane_condition_eps)
        } else {
            write!(
                f,
                "FitParams(threshold={:.1}km, beta={:.2}, e_prior={:.2}, parity={:.2}s, a_seed={:.0}km, pca={})",
                self.proximity_threshold,
                self.beta,
                self.expected_eccentricity,
                self.time_parity,
                self.semi_major_axis_seed,
                self.pca_seed,
            )
        }
    }
}
