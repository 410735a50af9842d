//! Hand-landmark data model.
//!
//! Observations follow the MediaPipe hand-landmarker convention: 21 points
//! per hand in camera-normalized coordinates (x, y in 0–1 with the origin
//! at the top-left, z a relative depth), plus a handedness label and a
//! confidence score. The detector producing them is an external
//! collaborator; this crate only reads the data.

use serde::Deserialize;

/// Landmark indices (MediaPipe hand landmark model convention).
#[allow(dead_code)]
pub mod landmarks {
    pub const WRIST: usize = 0;
    pub const THUMB_CMC: usize = 1;
    pub const THUMB_MCP: usize = 2;
    pub const THUMB_IP: usize = 3;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_MCP: usize = 5;
    pub const INDEX_PIP: usize = 6;
    pub const INDEX_DIP: usize = 7;
    pub const INDEX_TIP: usize = 8;
    pub const MIDDLE_MCP: usize = 9;
    pub const MIDDLE_PIP: usize = 10;
    pub const MIDDLE_DIP: usize = 11;
    pub const MIDDLE_TIP: usize = 12;
    pub const RING_MCP: usize = 13;
    pub const RING_PIP: usize = 14;
    pub const RING_DIP: usize = 15;
    pub const RING_TIP: usize = 16;
    pub const PINKY_MCP: usize = 17;
    pub const PINKY_PIP: usize = 18;
    pub const PINKY_DIP: usize = 19;
    pub const PINKY_TIP: usize = 20;
}

/// A single tracked point on a hand.
///
/// `x` and `y` are normalized to the image (smaller `y` = higher on
/// screen); `z` is depth relative to the wrist, more negative = closer to
/// the camera.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Landmark { x, y, z }
    }

    /// 3D euclidean distance to another landmark.
    pub fn distance(&self, other: &Landmark) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// Which hand an observation belongs to, from the detector's classifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub enum Handedness {
    Left,
    Right,
}

/// One detected hand in one frame: all 21 landmarks, handedness and the
/// detector's confidence. Immutable once produced.
#[derive(Clone, Debug, PartialEq)]
pub struct HandObservation {
    pub landmarks: [Landmark; 21],
    pub handedness: Handedness,
    pub confidence: f32,
}

impl HandObservation {
    pub fn new(landmarks: [Landmark; 21], handedness: Handedness, confidence: f32) -> Self {
        HandObservation { landmarks, handedness, confidence }
    }

    pub fn landmark(&self, index: usize) -> Landmark {
        self.landmarks[index]
    }

    pub fn wrist(&self) -> Landmark {
        self.landmarks[landmarks::WRIST]
    }

    pub fn thumb_tip(&self) -> Landmark {
        self.landmarks[landmarks::THUMB_TIP]
    }

    pub fn index_tip(&self) -> Landmark {
        self.landmarks[landmarks::INDEX_TIP]
    }

    pub fn middle_tip(&self) -> Landmark {
        self.landmarks[landmarks::MIDDLE_TIP]
    }

    pub fn ring_tip(&self) -> Landmark {
        self.landmarks[landmarks::RING_TIP]
    }

    pub fn pinky_tip(&self) -> Landmark {
        self.landmarks[landmarks::PINKY_TIP]
    }

    /// Distance between thumb tip and index tip — the bow trigger.
    pub fn pinch_distance(&self) -> f32 {
        self.thumb_tip().distance(&self.index_tip())
    }
}
