//! # Batch orbit fitting over track sets
//!
//! Run the full per-track pipeline (period estimation, inclination
//! estimation, orbit fit) over a [`TrackSet`], collect **per-track
//! outcomes**, and expose convenience helpers to query results and summarize
//! track lengths.
//!
//! ## Overview
//! -----------------
//! A [`TrackSet`] maps each [`TrackId`] to its time-ordered
//! [`FlightPath`](crate::constants::FlightPath).
//! This module implements the [`TrackFit`] trait on `TrackSet`, providing:
//!
//! * `fit_all_orbits` – fit **every track** of the set,
//! * `total_detections` / `number_of_tracks` – quick set-level metrics,
//! * `track_length_stats` – summary statistics on track lengths,
//! * [`orbit_for`] / [`take_orbit`] – ergonomic access to results.
//!
//! ## Result Model
//! -----------------
//! Batch outcomes are returned as a [`FullFitResult`]:
//!
//! ```text
//! TrackId → Result<(OrbitalElements, fit_error: f64), SkyfitError>
//! ```
//!
//! * `Ok((OrbitalElements, fit_error))` – the best-fit orbit and its total
//!   weighted residual,
//! * `Err(SkyfitError)` – a failure **isolated** to that track (other tracks
//!   continue to be processed). Tracks with an undetermined period or an
//!   unresolvable plane are *reported*, never silently dropped, so callers
//!   can distinguish "no object detected" from "object detected but orbit
//!   unresolvable".
//!
//! ## Execution Model
//! -----------------
//! Tracks are independent of one another, so the batch fit runs one rayon
//! task per track. There is no shared mutable state: frames and tracks are
//! read-only and every inner loop is bounded by its iteration cap.
//!
//! ## Example
//! -----------------
//! ```rust,no_run
//! use skyfit::orbit_fit::{fitter::OrbitFitter, FitParams};
//! use skyfit::track_fit::TrackFit;
//!
//! # fn demo(tracks: skyfit::constants::TrackSet) -> Result<(), skyfit::skyfit_errors::SkyfitError> {
//! let fitter = OrbitFitter::new(FitParams::builder().build()?);
//! let results = tracks.fit_all_orbits(&fitter);
//! for (id, outcome) in &results {
//!     match outcome {
//!         Ok((elements, err)) => eprintln!("{id}: {elements} (error {err:.3})"),
//!         Err(e) => eprintln!("{id}: unresolved ({e})"),
//!     }
//! }
//! # Ok(()) }
//! ```
use std::collections::HashMap;
use std::fmt;

use ahash::RandomState;
use rayon::prelude::*;

use crate::constants::{TrackId, TrackSet};
use crate::orbit_fit::elements::OrbitalElements;
use crate::orbit_fit::fitter::OrbitFitter;
use crate::skyfit_errors::SkyfitError;

/// Full batch orbit fitting results.
///
/// Each entry maps a [`TrackId`] to the outcome of the orbit fit on its
/// flight path. Errors are per-track and do not abort the rest of the batch.
pub type FullFitResult =
    HashMap<TrackId, Result<(OrbitalElements, f64), SkyfitError>, RandomState>;

/// Borrow a fitted orbit (if any) and its fit error for a given key.
///
/// Return
/// ----------
/// * `Ok(Some((&OrbitalElements, f64)))` – a solution is present for the key.
/// * `Ok(None)` – key absent from the result map.
/// * `Err(&SkyfitError)` – the fit failed for that key.
pub fn orbit_for<'a>(
    all: &'a FullFitResult,
    key: &TrackId,
) -> Result<Option<(&'a OrbitalElements, f64)>, &'a SkyfitError> {
    match all.get(key) {
        None => Ok(None),
        Some(Err(e)) => Err(e),
        Some(Ok((elements, err))) => Ok(Some((elements, *err))),
    }
}

/// Take ownership of the solution for `key`, removing it from the map.
pub fn take_orbit(
    all: &mut FullFitResult,
    key: &TrackId,
) -> Result<Option<(OrbitalElements, f64)>, SkyfitError> {
    match all.remove(key) {
        None => Ok(None),
        Some(Err(e)) => Err(e),
        Some(Ok((elements, err))) => Ok(Some((elements, err))),
    }
}

/// Summary statistics for per-track detection counts.
///
/// Percentiles use the *nearest-rank* method: the index is
/// `round(q × (N-1))` for quantile `q ∈ [0,1]`, clamped to the valid range,
/// which stays stable for small sample sizes.
#[derive(Debug, Clone, Copy)]
pub struct TrackLengthStats {
    pub min: usize,
    pub p25: usize,
    pub median: usize,
    pub p95: usize,
    pub max: usize,
}

impl fmt::Display for TrackLengthStats {
    /// Compact by default; pretty multi-line when using the alternate flag (`{:#}`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            writeln!(f, "Detections per track — summary")?;
            writeln!(f, "------------------------------")?;
            writeln!(f, "min    : {}", self.min)?;
            writeln!(f, "p25    : {}", self.p25)?;
            writeln!(f, "median : {}", self.median)?;
            writeln!(f, "p95    : {}", self.p95)?;
            write!(f, "max    : {}", self.max)
        } else {
            write!(
                f,
                "min={}, p25={}, median={}, p95={}, max={}",
                self.min, self.p25, self.median, self.p95, self.max
            )
        }
    }
}

pub trait TrackFit {
    /// Fit an orbit for **every track** in the set and collect the results.
    ///
    /// Tracks are processed in parallel (one task per track) with the same
    /// fitter configuration; results are aggregated into a [`FullFitResult`].
    ///
    /// Arguments
    /// -----------------
    /// * `fitter`: the shared per-track orbit fitter.
    ///
    /// Return
    /// ----------
    /// * A [`FullFitResult`] with one entry per track, each either
    ///   `Ok((OrbitalElements, fit_error))` or `Err(SkyfitError)`.
    fn fit_all_orbits(&self, fitter: &OrbitFitter) -> FullFitResult;

    /// Count the total number of detections across all tracks.
    fn total_detections(&self) -> usize;

    /// Return the number of distinct tracks in the set.
    fn number_of_tracks(&self) -> usize;

    /// Compute distribution statistics for the number of detections per
    /// track, or `None` for an empty set.
    fn track_length_stats(&self) -> Option<TrackLengthStats>;
}

impl TrackFit for TrackSet {
    fn fit_all_orbits(&self, fitter: &OrbitFitter) -> FullFitResult {
        self.par_iter()
            .map(|(id, path)| (*id, fitter.fit(path)))
            .collect()
    }

    #[inline]
    fn total_detections(&self) -> usize {
        self.values().map(|path| path.len()).sum()
    }

    #[inline]
    fn number_of_tracks(&self) -> usize {
        self.len()
    }

    fn track_length_stats(&self) -> Option<TrackLengthStats> {
        let mut counts: Vec<usize> = self.values().map(|path| path.len()).collect();
        if counts.is_empty() {
            return None;
        }

        counts.sort_unstable();

        #[inline]
        fn q_index(n: usize, q: f64) -> usize {
            // Nearest-rank on [0, n-1]; robust for small n.
            let pos = q * (n as f64 - 1.0);
            let idx = pos.round() as isize;
            idx.clamp(0, (n as isize) - 1) as usize
        }

        let n = counts.len();
        Some(TrackLengthStats {
            min: counts[0],
            p25: counts[q_index(n, 0.25)],
            median: counts[q_index(n, 0.50)],
            p95: counts[q_index(n, 0.95)],
            max: counts[n - 1],
        })
    }
}

#[cfg(test)]
mod track_fit_test {
    use super::*;
    use crate::constants::FlightPath;
    use crate::detections::Detection;
    use nalgebra::Vector3;

    fn path_of_len(len: usize) -> FlightPath {
        (0..len)
            .map(|k| {
                Detection::new(
                    Vector3::new(k as f64, 0.0, 0.0),
                    1.0,
                    k as f64,
                    k as u32,
                )
            })
            .collect()
    }

    #[test]
    fn test_track_length_stats() {
        let mut set = TrackSet::default();
        for (i, len) in [2usize, 4, 8, 15, 20].iter().enumerate() {
            set.insert(TrackId(i as u32), path_of_len(*len));
        }

        let stats = set.track_length_stats().unwrap();
        assert_eq!(stats.min, 2);
        assert_eq!(stats.p25, 4);
        assert_eq!(stats.median, 8);
        assert_eq!(stats.p95, 20);
        assert_eq!(stats.max, 20);

        assert_eq!(set.total_detections(), 49);
        assert_eq!(set.number_of_tracks(), 5);
        assert_eq!(format!("{stats}"), "min=2, p25=4, median=8, p95=20, max=20");
    }

    #[test]
    fn test_empty_set_has_no_stats() {
        let set = TrackSet::default();
        assert!(set.track_length_stats().is_none());
        assert_eq!(set.total_detections(), 0);
    }
}
