//! # Constants and type definitions for Skyfit
//!
//! This module centralizes the **physical constants**, **unit type aliases**, and **common
//! container definitions** used throughout the `skyfit` library.
//!
//! ## Overview
//!
//! - Geometric and orbital-shell constants used to seed the fit
//! - Core type aliases used across the crate (angles, distances, time)
//! - Identifiers for reconstructed tracks and source frames
//! - Container types for storing detections and flight paths
//!
//! These definitions are used by all main modules, including the associator, the
//! registration step, and the orbit fitter.

use crate::detections::Detection;
use ahash::RandomState;
use smallvec::SmallVec;
use std::collections::HashMap;

// -------------------------------------------------------------------------------------------------
// Physical constants
// -------------------------------------------------------------------------------------------------

/// 2π, useful for trigonometric conversions
pub const DPI: f64 = 2. * std::f64::consts::PI;

/// Numerical epsilon used for floating-point comparisons
pub const EPS: f64 = 1e-6;

/// Earth mean radius in kilometers
pub const EARTH_RADIUS_KM: f64 = 6_371.0;

/// Representative low-orbit shell radius in kilometers, used as the default
/// semi-major-axis seed for the fit (Earth radius extended by ~30%).
pub const LEO_SHELL_KM: f64 = EARTH_RADIUS_KM * 1.3;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;
/// Angle in radians
pub type Radian = f64;
/// Distance in kilometers
pub type Kilometer = f64;
/// Speed in kilometers per second
pub type KilometersPerSecond = f64;
/// Time in seconds (monotonic within a frame sequence)
pub type Seconds = f64;

/// Identifier of a source frame within an input sequence.
pub type FrameId = u32;

// -------------------------------------------------------------------------------------------------
// Identifiers and data containers
// -------------------------------------------------------------------------------------------------

/// Stable identifier of a reconstructed flight path.
///
/// Assigned by the associator when a track is created and never re-derived
/// from the track's coordinates, which are noisy floating-point values.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub struct TrackId(pub u32);

impl std::fmt::Display for TrackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "track-{}", self.0)
    }
}

impl From<u32> for TrackId {
    fn from(n: u32) -> Self {
        TrackId(n)
    }
}

/// A small, inline-optimized container for the detections of a single flight path.
///
/// Invariants maintained by the associator: detection timestamps strictly
/// increase, and each source frame contributes at most one detection.
pub type FlightPath = SmallVec<[Detection; 8]>;

/// Lookup table from [`TrackId`] to its reconstructed [`FlightPath`].
pub type TrackSet = HashMap<TrackId, FlightPath, RandomState>;
