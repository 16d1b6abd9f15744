//! # Cross-frame data association
//!
//! This module defines the [`TrackingParams`] configuration struct and its
//! builder, which control how the motion-predictive [`Associator`] turns an
//! ordered sequence of frames into flight-path tracks, and whether frames are
//! ICP-registered into a common coordinate system first.
//!
//! ## Pipeline overview
//!
//! 1. **Registration (optional)**
//!    When `register` is set, each frame's point set is aligned onto its
//!    predecessor's (already aligned) point set with ICP. Frames with fewer
//!    than `min_registration_points` detections are passed through
//!    untransformed.
//!
//! 2. **Prediction**
//!    Each detection in frame *i* is extrapolated over the frame-pair elapsed
//!    time under a constant-velocity model. Detections without a velocity cue
//!    predict in place.
//!
//! 3. **Gated radius search**
//!    All detections of frame *i+1* within `tolerance` of a predicted
//!    position are valid associations. Multiple candidates fan out into
//!    multiple tracks (ambiguity is deferred to downstream fitting quality,
//!    not resolved here). A source with no candidate terminates its track;
//!    unclaimed detections seed new tracks.
//!
//! ## Example
//!
//! ```rust,no_run
//! use skyfit::association::{Associator, TrackingParams};
//!
//! # fn demo(frames: &[skyfit::detections::Frame]) {
//! let params = TrackingParams::builder()
//!     .tolerance(8.0)
//!     .register(true)
//!     .build()
//!     .unwrap();
//!
//! let tracks = Associator::new(params).build_tracks(frames);
//! # }
//! ```
//!
//! ## See also
//!
//! * [`Associator`] – the association algorithm itself.
//! * [`crate::registration::Icp`] – the frame alignment used when `register` is set.
use std::cmp::Ordering::Greater;
use std::fmt;

use crate::constants::{Kilometer, Seconds};
use crate::skyfit_errors::SkyfitError;

mod associator;

pub use associator::Associator;

/// Configuration parameters controlling the behavior of [`Associator`].
///
/// Fields
/// -----------------
/// * `delta_t` – fixed elapsed time per frame pair (seconds). `None` derives
///   the elapsed time from the frame timestamps, which is the right choice
///   whenever the cadence is uneven.
/// * `tolerance` – association gate radius (km) around each predicted position.
/// * `register` – run ICP frame registration before association.
/// * `min_registration_points` – minimum detections per frame for the ICP
///   covariance to be full-rank; smaller frames pass through untransformed.
/// * `icp_max_iterations` – iteration cap for the ICP fixed point.
/// * `icp_tolerance` – convergence tolerance on the ICP rotation and
///   translation updates.
/// * `min_track_length` – tracks shorter than this are dropped from the
///   output set (1 keeps everything, including single-detection candidates).
///
/// Defaults
/// -----------------
/// * `delta_t`: `None` (derive from timestamps)
/// * `tolerance`: 5.0 km
/// * `register`: false
/// * `min_registration_points`: 3
/// * `icp_max_iterations`: 50
/// * `icp_tolerance`: 1e-6
/// * `min_track_length`: 1
#[derive(Debug, Clone)]
pub struct TrackingParams {
    pub delta_t: Option<Seconds>,
    pub tolerance: Kilometer,
    pub register: bool,
    pub min_registration_points: usize,
    pub icp_max_iterations: usize,
    pub icp_tolerance: f64,
    pub min_track_length: usize,
}

impl TrackingParams {
    /// Construct a new [`TrackingParams`] with the default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new [`TrackingParamsBuilder`] to override defaults step by step.
    pub fn builder() -> TrackingParamsBuilder {
        TrackingParamsBuilder::new()
    }
}

impl Default for TrackingParams {
    fn default() -> Self {
        TrackingParams {
            delta_t: None,
            tolerance: 5.0,
            register: false,
            min_registration_points: 3,
            icp_max_iterations: 50,
            icp_tolerance: 1e-6,
            min_track_length: 1,
        }
    }
}

/// Builder for [`TrackingParams`], with validation.
#[derive(Debug, Clone, Default)]
pub struct TrackingParamsBuilder {
    params: TrackingParams,
}

impl TrackingParamsBuilder {
    pub fn new() -> Self {
        Self {
            params: TrackingParams::default(),
        }
    }

    pub fn delta_t(mut self, v: Seconds) -> Self {
        self.params.delta_t = Some(v);
        self
    }
    pub fn tolerance(mut self, v: Kilometer) -> Self {
        self.params.tolerance = v;
        self
    }
    pub fn register(mut self, v: bool) -> Self {
        self.params.register = v;
        self
    }
    pub fn min_registration_points(mut self, v: usize) -> Self {
        self.params.min_registration_points = v;
        self
    }
    pub fn icp_max_iterations(mut self, v: usize) -> Self {
        self.params.icp_max_iterations = v;
        self
    }
    pub fn icp_tolerance(mut self, v: f64) -> Self {
        self.params.icp_tolerance = v;
        self
    }
    pub fn min_track_length(mut self, v: usize) -> Self {
        self.params.min_track_length = v;
        self
    }

    /// Return true iff x > 0.0 and comparable (i.e., not NaN).
    #[inline]
    fn gt0(x: f64) -> bool {
        x.partial_cmp(&0.0) == Some(Greater)
    }

    /// Finalize the builder and produce a [`TrackingParams`] instance.
    ///
    /// Validation rules
    /// -----------------
    /// * `tolerance >= 0.0` – a zero gate is legal (exact-hit association).
    /// * `delta_t > 0.0` when set.
    /// * `icp_tolerance > 0.0`, `icp_max_iterations >= 1`.
    /// * `min_registration_points >= 3` – below that the ICP covariance is
    ///   rank-deficient.
    /// * `min_track_length >= 1`.
    pub fn build(self) -> Result<TrackingParams, SkyfitError> {
        let p = &self.params;

        if !matches!(p.tolerance.partial_cmp(&0.0), Some(o) if o != std::cmp::Ordering::Less) {
            return Err(SkyfitError::InvalidTrackingParameter(
                "tolerance must be non-negative".into(),
            ));
        }
        if let Some(dt) = p.delta_t {
            if !Self::gt0(dt) {
                return Err(SkyfitError::InvalidTrackingParameter(
                    "delta_t must be > 0 when set".into(),
                ));
            }
        }
        if !Self::gt0(p.icp_tolerance) {
            return Err(SkyfitError::InvalidTrackingParameter(
                "icp_tolerance must be > 0".into(),
            ));
        }
        if p.icp_max_iterations == 0 {
            return Err(SkyfitError::InvalidTrackingParameter(
                "icp_max_iterations must be >= 1".into(),
            ));
        }
        if p.min_registration_points < 3 {
            return Err(SkyfitError::InvalidTrackingParameter(
                "min_registration_points must be >= 3".into(),
            ));
        }
        if p.min_track_length == 0 {
            return Err(SkyfitError::InvalidTrackingParameter(
                "min_track_length must be >= 1".into(),
            ));
        }

        Ok(self.params)
    }
}

impl fmt::Display for TrackingParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TrackingParams(delta_t={}, tolerance={:.2}km, register={}, min_reg_pts={}, icp_it={}, icp_eps={:.1e}, min_len={})",
            self.delta_t
                .map_or("auto".to_string(), |dt| format!("{dt:.2}s")),
            self.tolerance,
            self.register,
            self.min_registration_points,
            self.icp_max_iterations,
            self.icp_tolerance,
            self.min_track_length,
        )
    }
}

#[cfg(test)]
mod tracking_params_test {
    use super::*;

    #[test]
    fn test_builder_defaults_are_valid() {
        let params = TrackingParams::builder().build().unwrap();
        assert_eq!(params.tolerance, 5.0);
        assert!(params.delta_t.is_none());
        assert!(!params.register);
    }

    #[test]
    fn test_builder_rejects_bad_values() {
        assert!(matches!(
            TrackingParams::builder().tolerance(-1.0).build(),
            Err(SkyfitError::InvalidTrackingParameter(_))
        ));
        assert!(matches!(
            TrackingParams::builder().delta_t(0.0).build(),
            Err(SkyfitError::InvalidTrackingParameter(_))
        ));
        assert!(matches!(
            TrackingParams::builder().tolerance(f64::NAN).build(),
            Err(SkyfitError::InvalidTrackingParameter(_))
        ));
        assert!(matches!(
            TrackingParams::builder().min_registration_points(2).build(),
            Err(SkyfitError::InvalidTrackingParameter(_))
        ));
        assert!(matches!(
            TrackingParams::builder().min_track_length(0).build(),
            Err(SkyfitError::InvalidTrackingParameter(_))
        ));
    }
}
