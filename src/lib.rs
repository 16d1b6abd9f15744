//! # Skyfit
//!
//! Reconstructs the trajectory of orbiting debris from independent per-frame
//! point detections, then fits a closed-orbit model to each reconstructed
//! flight path.
//!
//! The pipeline: raw per-frame detections → optional ICP frame registration →
//! motion-predictive association into tracks → per-track period and
//! inclination estimation → confidence-weighted orbit fit. See
//! [`association`], [`estimates`] and [`orbit_fit`] for the individual
//! stages, and [`track_fit`] for the batch driver.

pub mod association;
pub mod constants;
pub mod detections;
pub mod estimates;
pub mod kepler;
pub mod orbit_fit;
pub mod registration;
pub mod skyfit_errors;
pub mod track_fit;

pub use association::{Associator, TrackingParams};
pub use constants::{FlightPath, TrackId, TrackSet};
pub use detections::{Detection, Frame};
pub use orbit_fit::elements::OrbitalElements;
pub use orbit_fit::fitter::OrbitFitter;
pub use orbit_fit::FitParams;
pub use registration::{Icp, RigidTransform};
pub use skyfit_errors::SkyfitError;
pub use track_fit::{FullFitResult, TrackFit};
