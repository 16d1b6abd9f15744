//! Motion-predictive track building across frames.

use itertools::Itertools;
use kiddo::SquaredEuclidean;
use smallvec::smallvec;
use tracing::debug;

use crate::constants::{FlightPath, TrackId, TrackSet};
use crate::detections::{Detection, Frame};
use crate::registration::{build_point_tree, Icp};

use super::TrackingParams;

/// A track still open for extension; its last detection belongs to the most
/// recently processed frame.
struct OpenTrack {
    id: TrackId,
    path: FlightPath,
}

/// Builds flight-path tracks from an ordered frame sequence by predicting
/// each detection's next position and gating candidates within a tolerance
/// radius in the subsequent frame.
///
/// See the [module documentation](crate::association) for the full pipeline
/// description and the fan-out policy on ambiguous associations.
#[derive(Debug, Clone)]
pub struct Associator {
    params: TrackingParams,
}

impl Associator {
    pub fn new(params: TrackingParams) -> Self {
        Associator { params }
    }

    #[inline]
    pub fn params(&self) -> &TrackingParams {
        &self.params
    }

    /// Produce the set of flight-path tracks for `frames`.
    ///
    /// Arguments
    /// -----------------
    /// * `frames`: frames ordered by strictly increasing timestamp. The
    ///   frames themselves are never mutated; when registration is enabled
    ///   the tracks carry re-registered *copies* of the detections.
    ///
    /// Return
    /// ----------
    /// * A [`TrackSet`] with one entry per reconstructed track. Tracks
    ///   shorter than `min_track_length` are dropped.
    pub fn build_tracks(&self, frames: &[Frame]) -> TrackSet {
        let mut tracks = TrackSet::default();
        if frames.is_empty() {
            return tracks;
        }

        let times: Vec<f64> = frames.iter().map(|f| f.time).collect();
        let frames = self.registered_copies(frames);

        let mut next_id: u32 = 0;
        let mut alloc_id = move || {
            let id = TrackId(next_id);
            next_id += 1;
            id
        };

        // Every detection of the first frame seeds a candidate track.
        let mut open: Vec<OpenTrack> = frames[0]
            .iter()
            .map(|det| OpenTrack {
                id: alloc_id(),
                path: smallvec![det.clone()],
            })
            .collect();

        for ((i, _current), (j, next)) in frames.iter().enumerate().tuple_windows() {
            let dt = self.params.delta_t.unwrap_or_else(|| times[j] - times[i]);

            if next.is_empty() {
                // Nothing to extend into and nothing new to seed.
                for track in open.drain(..) {
                    tracks.insert(track.id, track.path);
                }
                continue;
            }

            let positions: Vec<_> = next.iter().map(|d| d.position).collect();
            let tree = build_point_tree(&positions);
            let gate_sq = self.params.tolerance * self.params.tolerance;

            let mut claimed = vec![false; next.len()];
            let mut extended: Vec<OpenTrack> = Vec::new();

            for track in open.drain(..) {
                let last = track.path.last().expect("open track is never empty");
                let predicted = last.position + last.displacement(dt);
                let hits =
                    tree.within::<SquaredEuclidean>(&[predicted.x, predicted.y, predicted.z], gate_sq);

                if hits.is_empty() {
                    // No candidate inside the gate: the track terminates here.
                    tracks.insert(track.id, track.path);
                    continue;
                }

                // Fan-out: the first candidate extends the track in place,
                // every further candidate clones the prefix under a new id.
                let prefix = track.path.clone();
                let mut first = Some(track);
                for hit in hits {
                    let idx = hit.item as usize;
                    claimed[idx] = true;
                    let mut branch = match first.take() {
                        Some(t) => t,
                        None => OpenTrack {
                            id: alloc_id(),
                            path: prefix.clone(),
                        },
                    };
                    branch.path.push(next[idx].clone());
                    extended.push(branch);
                }
            }

            // Detections not claimed by any extension start new candidate tracks.
            for (idx, det) in next.iter().enumerate() {
                if !claimed[idx] {
                    extended.push(OpenTrack {
                        id: alloc_id(),
                        path: smallvec![det.clone()],
                    });
                }
            }

            open = extended;
        }

        for track in open {
            tracks.insert(track.id, track.path);
        }

        tracks.retain(|_, path| path.len() >= self.params.min_track_length);
        debug!(tracks = tracks.len(), "association finished");
        tracks
    }

    /// Working copies of the frame detections, ICP-registered into the first
    /// frame's coordinate system when `register` is set.
    ///
    /// Frames below `min_registration_points` (on either side of a pair) are
    /// passed through untransformed, as are all frames when registration is
    /// disabled.
    fn registered_copies(&self, frames: &[Frame]) -> Vec<Vec<Detection>> {
        let mut out: Vec<Vec<Detection>> = Vec::with_capacity(frames.len());

        for frame in frames {
            if !self.params.register || out.is_empty() {
                out.push(frame.detections.clone());
                continue;
            }

            let reference: Vec<_> = out
                .last()
                .expect("at least one frame already registered")
                .iter()
                .map(|d| d.position)
                .collect();
            let moving = frame.positions();

            if moving.len() < self.params.min_registration_points
                || reference.len() < self.params.min_registration_points
            {
                debug!(
                    frame = frame.id,
                    points = moving.len(),
                    "skipping registration of under-populated frame"
                );
                out.push(frame.detections.clone());
                continue;
            }

            let icp = Icp::new(self.params.icp_max_iterations, self.params.icp_tolerance);
            match icp.align(&moving, &reference) {
                Ok(transform) => {
                    out.push(
                        frame
                            .detections
                            .iter()
                            .map(|det| {
                                let mut det = det.clone();
                                det.position = transform.apply(&det.position);
                                det.direction = det.direction.map(|v| transform.rotate(&v));
                                det
                            })
                            .collect(),
                    );
                }
                Err(_) => out.push(frame.detections.clone()),
            }
        }

        out
    }
}
