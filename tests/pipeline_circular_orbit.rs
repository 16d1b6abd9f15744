use nalgebra::Vector3;

use skyfit::association::{Associator, TrackingParams};
use skyfit::constants::DPI;
use skyfit::detections::{Detection, Frame};
use skyfit::orbit_fit::{fitter::OrbitFitter, FitParams};
use skyfit::track_fit::TrackFit;

const RADIUS_KM: f64 = 8000.0;
const PERIOD_S: f64 = 7200.0;

/// One object on a circular equatorial orbit, one detection per frame, with a
/// tangential velocity cue.
fn circular_orbit_frames(samples_per_orbit: usize, n_frames: usize) -> Vec<Frame> {
    let dt = PERIOD_S / samples_per_orbit as f64;
    let speed = DPI * RADIUS_KM / PERIOD_S;

    (0..n_frames)
        .map(|k| {
            let t = k as f64 * dt;
            let theta = DPI * t / PERIOD_S;
            let position = Vector3::new(RADIUS_KM * theta.cos(), RADIUS_KM * theta.sin(), 0.0);
            let direction = Vector3::new(-theta.sin(), theta.cos(), 0.0);
            let det =
                Detection::new(position, 1.0, t, k as u32).with_velocity(speed, direction);
            Frame::new(k as u32, t, vec![det])
        })
        .collect()
}

fn run_pipeline(frames: &[Frame], tolerance: f64) -> (skyfit::OrbitalElements, f64) {
    let associator = Associator::new(
        TrackingParams::builder()
            .tolerance(tolerance)
            .build()
            .unwrap(),
    );
    let tracks = associator.build_tracks(frames);
    assert_eq!(tracks.number_of_tracks(), 1);
    assert_eq!(tracks.total_detections(), frames.len());

    let fitter = OrbitFitter::new(
        FitParams::builder()
            .proximity_threshold(2000.0)
            .build()
            .unwrap(),
    );
    let results = tracks.fit_all_orbits(&fitter);
    assert_eq!(results.len(), 1);

    let outcome = results.into_values().next().unwrap();
    outcome.expect("pipeline should resolve the orbit")
}

#[test]
fn five_frames_recover_circular_orbit() {
    // Minimal scenario: four samples per orbit plus the closing sample. The
    // coarse sampling makes the constant-velocity prediction miss by a wide
    // margin, so the association gate has to be generous.
    let frames = circular_orbit_frames(4, 5);
    let (elements, _fit_error) = run_pipeline(&frames, 10_000.0);

    assert!(
        (elements.semi_major_axis - RADIUS_KM).abs() / RADIUS_KM < 0.05,
        "a = {}",
        elements.semi_major_axis
    );
    assert!(elements.eccentricity < 0.05, "e = {}", elements.eccentricity);
    assert!((elements.period - PERIOD_S).abs() / PERIOD_S < 0.01);
    assert!(elements.inclination.abs() < 1e-6);
}

#[test]
fn two_revolutions_tighten_the_fit() {
    let frames = circular_orbit_frames(8, 17);
    let (elements, fit_error) = run_pipeline(&frames, 3000.0);

    assert!(
        (elements.semi_major_axis - RADIUS_KM).abs() / RADIUS_KM < 0.02,
        "a = {}",
        elements.semi_major_axis
    );
    assert!(elements.eccentricity < 0.05, "e = {}", elements.eccentricity);
    assert!((elements.period - PERIOD_S).abs() < 1e-6);
    assert!(fit_error.is_finite());
}

#[test]
fn unresolvable_track_is_reported_not_omitted() {
    // A short drifting object never recurs: it must appear in the result map
    // as an explicit per-track error, so callers can tell "no object" from
    // "object with an unresolvable orbit".
    let frames: Vec<Frame> = (0..6)
        .map(|k| {
            let t = k as f64 * 60.0;
            let det = Detection::new(
                Vector3::new(7000.0 + 50.0 * k as f64, 10.0 * k as f64, 0.0),
                0.8,
                t,
                k as u32,
            )
            .with_velocity(
                (50.0f64 * 50.0 + 10.0 * 10.0).sqrt() / 60.0,
                Vector3::new(50.0, 10.0, 0.0).normalize(),
            );
            Frame::new(k as u32, t, vec![det])
        })
        .collect();

    let associator = Associator::new(TrackingParams::builder().tolerance(5.0).build().unwrap());
    let tracks = associator.build_tracks(&frames);
    assert_eq!(tracks.number_of_tracks(), 1);

    let fitter = OrbitFitter::new(FitParams::builder().build().unwrap());
    let results = tracks.fit_all_orbits(&fitter);
    assert_eq!(results.len(), 1);
    let outcome = results.into_values().next().unwrap();
    assert_eq!(outcome, Err(skyfit::SkyfitError::UndeterminedPeriod));
}
