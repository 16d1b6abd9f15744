//! # Fitted orbital elements
//!
//! Result type of the orbit fitter: the classical element set describing the
//! fitted closed orbit, paired by the caller with a scalar fit error.
//!
//! ## Units
//!
//! - Lengths: **km**
//! - Angles: **radians**
//! - Time: **seconds**
//!
//! The reduced fit varies only `(a, e, ω)`; the inclination comes from the
//! plane estimator, the node longitude is fixed at 0 in that parameterization
//! and the mean-anomaly reference is the track's first timestamp.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{Kilometer, Radian, Seconds};

/// Fitted orbital elements for one flight path.
///
/// Fields
/// -----------------
/// * `semi_major_axis` – `a` (km), > 0.
/// * `eccentricity` – `e`, in [0, 1).
/// * `inclination` – orbital-plane tilt against the reference +z axis (rad).
/// * `periapsis_argument` – fitted in-plane orientation angle ω (rad).
/// * `ascending_node_longitude` – Ω (rad); 0 in the reduced parameterization.
/// * `mean_anomaly` – mean anomaly at the track's first timestamp (rad).
/// * `period` – orbital period from the recurrence estimator (s).
///
/// Immutable result object: produced once per track, never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrbitalElements {
    pub semi_major_axis: Kilometer,
    pub eccentricity: f64,
    pub inclination: Radian,
    pub periapsis_argument: Radian,
    pub ascending_node_longitude: Radian,
    pub mean_anomaly: Radian,
    pub period: Seconds,
}

impl fmt::Display for OrbitalElements {
    /// Compact by default; pretty multi-line when using the alternate flag (`{:#}`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rad_to_deg = 180.0 / std::f64::consts::PI;
        if f.alternate() {
            writeln!(f, "Orbital Elements")?;
            writeln!(f, "-------------------------------------------")?;
            writeln!(f, "  a   (semi-major axis)       = {:.3} km", self.semi_major_axis)?;
            writeln!(f, "  e   (eccentricity)          = {:.6}", self.eccentricity)?;
            writeln!(
                f,
                "  i   (inclination)           = {:.6} rad ({:.3}°)",
                self.inclination,
                self.inclination * rad_to_deg
            )?;
            writeln!(
                f,
                "  ω   (argument of periapsis) = {:.6} rad ({:.3}°)",
                self.periapsis_argument,
                self.periapsis_argument * rad_to_deg
            )?;
            writeln!(
                f,
                "  Ω   (longitude of node)     = {:.6} rad ({:.3}°)",
                self.ascending_node_longitude,
                self.ascending_node_longitude * rad_to_deg
            )?;
            writeln!(
                f,
                "  M   (mean anomaly)          = {:.6} rad ({:.3}°)",
                self.mean_anomaly,
                self.mean_anomaly * rad_to_deg
            )?;
            write!(f, "  T   (period)                = {:.3} s", self.period)
        } else {
            write!(
                f,
                "a={:.1}km e={:.4} i={:.4}rad ω={:.4}rad T={:.1}s",
                self.semi_major_axis,
                self.eccentricity,
                self.inclination,
                self.periapsis_argument,
                self.period,
            )
        }
    }
}
