//! Structured per-frame perception outputs

use serde::{Deserialize, Serialize};

/// A normalized facial or hand keypoint.
///
/// Coordinates are image-relative in `[0,1]` with a top-left origin; the
/// index a landmark was read from carries its meaning (see
/// [`crate::indices`]).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Convert to pixel coordinates for a frame of the given dimensions.
    pub fn to_px(&self, width: u32, height: u32) -> (f64, f64) {
        (self.x * f64::from(width), self.y * f64::from(height))
    }
}

/// Face bounding box, normalized, top-left origin
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FaceBox {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    pub confidence: f64,
}

/// Ordered dense landmark list for one face.
///
/// Index semantics are fixed by the external mesh model; absent entirely
/// when no face mesh was detected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FaceMesh {
    landmarks: Vec<Landmark>,
}

impl FaceMesh {
    pub fn new(landmarks: Vec<Landmark>) -> Self {
        Self { landmarks }
    }

    pub fn get(&self, index: usize) -> Option<&Landmark> {
        self.landmarks.get(index)
    }

    /// Pixel coordinates of the landmark at `index`, if present.
    pub fn point_px(&self, index: usize, width: u32, height: u32) -> Option<(f64, f64)> {
        self.get(index).map(|lm| lm.to_px(width, height))
    }

    pub fn len(&self) -> usize {
        self.landmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }
}

/// Which hand a landmark list belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Handedness {
    Left,
    Right,
}

/// One detected hand: handedness label plus landmark list, wrist at index 0
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hand {
    pub handedness: Handedness,
    pub landmarks: Vec<Landmark>,
}

impl Hand {
    /// The wrist landmark (index 0), if the landmark list is non-empty.
    pub fn wrist(&self) -> Option<&Landmark> {
        self.landmarks.first()
    }
}

/// Detected object box: normalized center coordinates plus extent
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ObjectBox {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    pub confidence: f64,
}

/// Everything perception produced for one frame
#[derive(Debug, Clone, Default)]
pub struct Perception {
    pub faces: Vec<FaceBox>,
    pub mesh: Option<FaceMesh>,
    pub hands: Vec<Hand>,
    pub objects: Vec<ObjectBox>,
}
