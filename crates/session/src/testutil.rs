//! Shared fakes for session tests

use capture::Frame;
use ndarray::Array2;
use perception::{indices, Disabled, FaceMesh, FaceMeshDetector, Landmark, PerceptionError,
    PerceptionStack};
use scoring::{
    AnomalyDetector, Classifier, ClassifierOutput, EnsembleScorer, OracleError,
};
use std::sync::Arc;

/// A stack where every detector reports absence.
pub(crate) fn disabled_stack() -> PerceptionStack {
    PerceptionStack {
        faces: Arc::new(Disabled),
        mesh: Arc::new(Disabled),
        hands: Arc::new(Disabled),
        objects: Arc::new(Disabled),
    }
}

/// Mesh detector returning a fixed frontal-face mesh.
pub(crate) struct FixedMesh;

impl FaceMeshDetector for FixedMesh {
    fn detect_mesh(&self, _frame: &Frame) -> Result<Option<FaceMesh>, PerceptionError> {
        let mut landmarks = vec![Landmark::new(0.5, 0.5, 0.0); 478];
        landmarks[indices::NOSE_TIP] = Landmark::new(0.50, 0.52, 0.0);
        landmarks[indices::CHIN] = Landmark::new(0.50, 0.72, 0.0);
        landmarks[indices::LEFT_EYE_OUTER] = Landmark::new(0.40, 0.42, 0.0);
        landmarks[indices::RIGHT_EYE_INNER] = Landmark::new(0.60, 0.42, 0.0);
        landmarks[indices::LEFT_MOUTH] = Landmark::new(0.44, 0.62, 0.0);
        landmarks[indices::RIGHT_MOUTH] = Landmark::new(0.56, 0.62, 0.0);
        Ok(Some(FaceMesh::new(landmarks)))
    }
}

/// Oracles that always score 1.0.
pub(crate) struct ConstantOracles;

impl Classifier for ConstantOracles {
    fn predict(&self, batch: &Array2<f64>) -> Result<ClassifierOutput, OracleError> {
        Ok(ClassifierOutput {
            probabilities: vec![1.0; batch.nrows()],
            contributions: None,
        })
    }
}

impl AnomalyDetector for ConstantOracles {
    fn decision_function(&self, batch: &Array2<f64>) -> Result<Vec<f64>, OracleError> {
        Ok(vec![1.0; batch.nrows()])
    }
}

pub(crate) fn constant_scorer() -> EnsembleScorer {
    EnsembleScorer::new(Arc::new(ConstantOracles), Arc::new(ConstantOracles))
}

/// A tiny black frame.
pub(crate) fn frame() -> Frame {
    Frame::new(vec![0; 16 * 16 * 3], 16, 16)
}
