//! Perception Boundary
//!
//! The pipeline core consumes structured perception outputs only: face
//! boxes, face-mesh landmarks with a fixed index layout, hand landmarks
//! with handedness, and object boxes for target classes. The detectors
//! producing those outputs are external collaborators; this crate defines
//! the trait seams plus ONNX adapters for models exported with simple
//! post-processed output layouts.

pub mod indices;
pub mod onnx;
pub mod types;

pub use onnx::{OnnxFaceDetector, OnnxFaceMesh, OnnxHandDetector, OnnxObjectDetector};
pub use types::{FaceBox, FaceMesh, Hand, Handedness, Landmark, ObjectBox, Perception};

use capture::Frame;
use std::sync::Arc;
use thiserror::Error;

/// COCO class id for "cell phone", the monitored object class
pub const CELL_PHONE_CLASS: usize = 67;

/// Perception error types
#[derive(Error, Debug)]
pub enum PerceptionError {
    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Image processing failed: {0}")]
    ImageProcessing(String),
}

/// Detects face bounding boxes (zero or more per frame)
pub trait FaceDetector: Send + Sync {
    fn detect_faces(&self, frame: &Frame) -> Result<Vec<FaceBox>, PerceptionError>;
}

/// Detects the dense face-mesh landmark list for the primary face
pub trait FaceMeshDetector: Send + Sync {
    fn detect_mesh(&self, frame: &Frame) -> Result<Option<FaceMesh>, PerceptionError>;
}

/// Detects hand landmark lists with handedness labels
pub trait HandDetector: Send + Sync {
    fn detect_hands(&self, frame: &Frame) -> Result<Vec<Hand>, PerceptionError>;
}

/// Detects object boxes for the target class
pub trait ObjectDetector: Send + Sync {
    fn detect_objects(&self, frame: &Frame) -> Result<Vec<ObjectBox>, PerceptionError>;
}

/// The full set of per-frame perception sources.
///
/// All detectors are loaded once at process start and shared read-only;
/// inference calls are stateless.
#[derive(Clone)]
pub struct PerceptionStack {
    pub faces: Arc<dyn FaceDetector>,
    pub mesh: Arc<dyn FaceMeshDetector>,
    pub hands: Arc<dyn HandDetector>,
    pub objects: Arc<dyn ObjectDetector>,
}

impl PerceptionStack {
    /// Run every detector on one frame and collect the structured outputs.
    pub fn perceive(&self, frame: &Frame) -> Result<Perception, PerceptionError> {
        Ok(Perception {
            faces: self.faces.detect_faces(frame)?,
            mesh: self.mesh.detect_mesh(frame)?,
            hands: self.hands.detect_hands(frame)?,
            objects: self.objects.detect_objects(frame)?,
        })
    }
}

/// Stand-in for an unconfigured detector.
///
/// Yields empty outputs so absence flows through the assembler's defined
/// fallback values instead of fabricating detections.
pub struct Disabled;

impl FaceDetector for Disabled {
    fn detect_faces(&self, _frame: &Frame) -> Result<Vec<FaceBox>, PerceptionError> {
        Ok(Vec::new())
    }
}

impl FaceMeshDetector for Disabled {
    fn detect_mesh(&self, _frame: &Frame) -> Result<Option<FaceMesh>, PerceptionError> {
        Ok(None)
    }
}

impl HandDetector for Disabled {
    fn detect_hands(&self, _frame: &Frame) -> Result<Vec<Hand>, PerceptionError> {
        Ok(Vec::new())
    }
}

impl ObjectDetector for Disabled {
    fn detect_objects(&self, _frame: &Frame) -> Result<Vec<ObjectBox>, PerceptionError> {
        Ok(Vec::new())
    }
}
