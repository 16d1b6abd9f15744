//! # Orbital period estimation
//!
//! Detects recurrence of a flight path near its own starting position and
//! turns the recurrence times into a single period estimate.
//!
//! ## Overview
//! -----------------
//! The first track position is the reference point. Scanning forward, the
//! object must first sit **outside** the proximity threshold for at least
//! `min_departure_samples` consecutive samples (hysteresis against input
//! noise jitter); the next re-entry into the threshold then closes one
//! revolution and records a period sample. Scanning resumes from the
//! re-entry sample, so samples never overlap.
//!
//! Multiple samples are combined with MAD-based outlier rejection: samples
//! whose absolute deviation from the mean exceeds `mad_multiplier × MAD` are
//! discarded and the mean of the survivors is returned. If the filter
//! removes everything, the unfiltered mean is the fallback — the estimator
//! never fails once at least one recurrence was seen.
//!
//! Zero recurrences yield `None` ("undetermined"); callers must not
//! fabricate a period from it. The optional cadence precheck
//! ([`has_completed_full_orbit`]) short-circuits tracks whose sampling
//! pattern cannot contain a full revolution.

use crate::constants::{FlightPath, Seconds};
use crate::orbit_fit::FitParams;

/// Heuristic gate: can this timestamp pattern contain a full revolution?
///
/// Requires at least 3 samples, inter-sample intervals consistent with the
/// first interval within a relative `interval_tolerance`, and a total span
/// larger than `min_span_factor` times the first interval.
///
/// This is policy, not law: the thresholds come in from configuration and
/// the check can be disabled entirely (`FitParams::cadence_precheck`).
pub fn has_completed_full_orbit(
    timestamps: &[Seconds],
    interval_tolerance: f64,
    min_span_factor: f64,
) -> bool {
    if timestamps.len() < 3 {
        return false;
    }

    let intervals: Vec<Seconds> = timestamps.windows(2).map(|w| w[1] - w[0]).collect();
    let first = intervals[0];
    if first <= 0.0 {
        return false;
    }

    let consistent = intervals
        .iter()
        .all(|dt| (dt - first).abs() < interval_tolerance * first);

    consistent && intervals.iter().sum::<Seconds>() > first * min_span_factor
}

/// Estimate the orbital period of a flight path, or `None` when no
/// recurrence near the starting position is found.
///
/// Arguments
/// -----------------
/// * `track`: time-ordered flight path (the associator's invariants hold).
/// * `params`: proximity threshold, departure hysteresis, MAD multiplier and
///   cadence-precheck policy.
///
/// Return
/// ----------
/// * `Some(period)` – outlier-filtered mean of the recurrence samples.
/// * `None` – the track never left and re-entered the reference
///   neighborhood (or the cadence precheck rejected it).
pub fn estimate_period(track: &FlightPath, params: &FitParams) -> Option<Seconds> {
    if track.len() < 3 {
        return None;
    }

    if params.cadence_precheck {
        let times: Vec<Seconds> = track.iter().map(|d| d.time).collect();
        if !has_completed_full_orbit(&times, params.cadence_tolerance, params.min_span_factor) {
            return None;
        }
    }

    let reference = track[0].position;
    let mut samples: Vec<Seconds> = Vec::new();

    let mut last_epoch = track[0].time;
    let mut outside_run = 0usize;
    let mut departed = false;

    for det in track.iter().skip(1) {
        let outside = (det.position - reference).norm() > params.proximity_threshold;
        if outside {
            outside_run += 1;
            if outside_run >= params.min_departure_samples {
                departed = true;
            }
        } else {
            if departed {
                // Qualifying re-entry: one revolution closed.
                samples.push(det.time - last_epoch);
                last_epoch = det.time;
                departed = false;
            }
            outside_run = 0;
        }
    }

    if samples.is_empty() {
        return None;
    }

    Some(mad_filtered_mean(&samples, params.mad_multiplier))
}

/// Mean of `samples` after discarding entries whose deviation from the mean
/// exceeds `multiplier × MAD`. Falls back to the unfiltered mean when the
/// filter discards everything.
fn mad_filtered_mean(samples: &[Seconds], multiplier: f64) -> Seconds {
    let mean = samples.iter().sum::<f64>() / samples.len() as f64;

    let med = median(samples);
    let deviations: Vec<f64> = samples.iter().map(|x| (x - med).abs()).collect();
    let mad = median(&deviations);

    let kept: Vec<f64> = samples
        .iter()
        .copied()
        .filter(|x| (x - mean).abs() <= multiplier * mad)
        .collect();

    if kept.is_empty() {
        mean
    } else {
        kept.iter().sum::<f64>() / kept.len() as f64
    }
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_unstable_by(|a, b| a.partial_cmp(b).expect("period samples are finite"));
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}
