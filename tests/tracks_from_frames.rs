use nalgebra::Vector3;

use skyfit::association::{Associator, TrackingParams};
use skyfit::detections::{Detection, Frame};
use skyfit::track_fit::TrackFit;

/// Two objects on parallel constant-velocity paths plus one low-confidence
/// stray detection in the middle frame.
fn two_object_frames() -> Vec<Frame> {
    (0..5)
        .map(|k| {
            let t = k as f64;
            let mut detections = vec![
                Detection::new(Vector3::new(t * 10.0, 0.0, 0.0), 0.9, t, k)
                    .with_velocity(10.0, Vector3::new(1.0, 0.0, 0.0)),
                Detection::new(Vector3::new(t * 10.0, 500.0, 0.0), 0.8, t, k)
                    .with_velocity(10.0, Vector3::new(1.0, 0.0, 0.0)),
            ];
            if k == 2 {
                detections.push(Detection::new(
                    Vector3::new(-300.0, -300.0, 0.0),
                    0.05,
                    t,
                    k,
                ));
            }
            Frame::new(k, t, detections)
        })
        .collect()
}

#[test]
fn parallel_objects_form_separate_full_tracks() {
    let frames = two_object_frames();
    let associator =
        Associator::new(TrackingParams::builder().tolerance(0.5).build().unwrap());
    let tracks = associator.build_tracks(&frames);

    // Two full tracks plus the stray singleton.
    assert_eq!(tracks.number_of_tracks(), 3);
    let mut lengths: Vec<usize> = tracks.values().map(|p| p.len()).collect();
    lengths.sort_unstable();
    assert_eq!(lengths, vec![1, 5, 5]);

    let stats = tracks.track_length_stats().unwrap();
    assert_eq!(stats.min, 1);
    assert_eq!(stats.max, 5);
    assert_eq!(tracks.total_detections(), 11);

    // Each full track stays with its own object (constant y).
    for path in tracks.values().filter(|p| p.len() == 5) {
        let y = path[0].position.y;
        assert!(path.iter().all(|d| (d.position.y - y).abs() < 1e-9));
    }
}

#[test]
fn confidence_floor_removes_stray_before_association() {
    let frames: Vec<Frame> = two_object_frames()
        .iter()
        .map(|f| f.discard_low_confidence(0.5))
        .collect();

    let associator =
        Associator::new(TrackingParams::builder().tolerance(0.5).build().unwrap());
    let tracks = associator.build_tracks(&frames);

    assert_eq!(tracks.number_of_tracks(), 2);
    assert!(tracks.values().all(|p| p.len() == 5));
}

#[test]
fn track_ids_are_stable_and_distinct() {
    let frames = two_object_frames();
    let associator =
        Associator::new(TrackingParams::builder().tolerance(0.5).build().unwrap());
    let tracks = associator.build_tracks(&frames);

    let mut ids: Vec<u32> = tracks.keys().map(|id| id.0).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), tracks.len());
}
