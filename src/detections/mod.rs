//! # Detections and frames
//!
//! Input data model for the reconstruction pipeline: a [`Detection`] is one
//! observed point with an optional velocity cue, a confidence score and a
//! timestamp; a [`Frame`] is the set of detections sharing one timestamp.
//!
//! Frames are read-only inputs. The associator copies detections into flight
//! paths but never mutates a frame, so a frame sequence can be shared freely
//! across consumers.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::constants::{FrameId, Kilometer, KilometersPerSecond, Seconds};

/// One observed point from a single frame.
///
/// Fields
/// -----------------
/// * `position` – Cartesian coordinates (km).
/// * `speed` – optional speed scalar (km/s).
/// * `direction` – optional unit vector giving the direction of motion.
/// * `confidence` – score in [0, 1] expressing belief in the observation.
/// * `time` – timestamp of the source frame (seconds).
/// * `frame` – identifier of the source frame.
///
/// A detection is immutable once created: no mutating API is provided and
/// downstream stages only ever clone it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub position: Vector3<Kilometer>,
    pub speed: Option<KilometersPerSecond>,
    pub direction: Option<Vector3<f64>>,
    pub confidence: f64,
    pub time: Seconds,
    pub frame: FrameId,
}

impl Detection {
    /// Create a detection without a velocity cue.
    pub fn new(position: Vector3<Kilometer>, confidence: f64, time: Seconds, frame: FrameId) -> Self {
        Detection {
            position,
            speed: None,
            direction: None,
            confidence,
            time,
            frame,
        }
    }

    /// Attach a velocity cue (speed scalar plus unit direction).
    pub fn with_velocity(mut self, speed: KilometersPerSecond, direction: Vector3<f64>) -> Self {
        self.speed = Some(speed);
        self.direction = Some(direction);
        self
    }

    /// The predicted displacement over `dt` seconds under the constant-velocity
    /// model, or zero when the detection carries no velocity cue.
    #[inline]
    pub fn displacement(&self, dt: Seconds) -> Vector3<Kilometer> {
        match (self.speed, self.direction) {
            (Some(s), Some(v)) => v * (s * dt),
            _ => Vector3::zeros(),
        }
    }
}

/// An ordered-by-arrival set of detections sharing one timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub id: FrameId,
    pub time: Seconds,
    pub detections: Vec<Detection>,
}

impl Frame {
    pub fn new(id: FrameId, time: Seconds, detections: Vec<Detection>) -> Self {
        Frame {
            id,
            time,
            detections,
        }
    }

    /// Number of detections in this frame.
    #[inline]
    pub fn len(&self) -> usize {
        self.detections.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }

    /// Copy of this frame with every detection whose confidence falls below
    /// `min_confidence` removed. Useful as a cheap pre-filter before
    /// association when a sensor emits low-grade candidates.
    pub fn discard_low_confidence(&self, min_confidence: f64) -> Frame {
        Frame {
            id: self.id,
            time: self.time,
            detections: self
                .detections
                .iter()
                .filter(|d| d.confidence >= min_confidence)
                .cloned()
                .collect(),
        }
    }

    /// Positions of all detections, in arrival order.
    pub fn positions(&self) -> Vec<Vector3<Kilometer>> {
        self.detections.iter().map(|d| d.position).collect()
    }
}

#[cfg(test)]
mod detections_test {
    use super::*;

    fn frame_with_confidences(confidences: &[f64]) -> Frame {
        let detections = confidences
            .iter()
            .enumerate()
            .map(|(i, &c)| Detection::new(Vector3::new(i as f64, 0.0, 0.0), c, 10.0, 0))
            .collect();
        Frame::new(0, 10.0, detections)
    }

    #[test]
    fn test_discard_low_confidence() {
        let frame = frame_with_confidences(&[0.1, 0.55, 0.9, 0.4]);
        let kept = frame.discard_low_confidence(0.5);
        assert_eq!(kept.len(), 2);
        assert!(kept.detections.iter().all(|d| d.confidence >= 0.5));
        // The source frame is untouched.
        assert_eq!(frame.len(), 4);
    }

    #[test]
    fn test_displacement_without_cue_is_zero() {
        let det = Detection::new(Vector3::new(1.0, 2.0, 3.0), 0.9, 0.0, 0);
        assert_eq!(det.displacement(12.0), Vector3::zeros());

        let det = det.with_velocity(2.0, Vector3::new(0.0, 1.0, 0.0));
        assert_eq!(det.displacement(3.0), Vector3::new(0.0, 6.0, 0.0));
    }
}
