//! Scoring oracle traits.
//!
//! Oracles are pretrained models consumed as black boxes: loaded once at
//! process start from persisted artifacts and used strictly read-only.
//! Inputs are row-major batches over the frozen
//! [`feature_vector::MODEL_SCHEMA`] column order.

use ndarray::Array2;
use thiserror::Error;

/// Oracle error types
#[derive(Error, Debug)]
pub enum OracleError {
    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Malformed input shape: {0}")]
    InputShape(String),
}

/// Supervised classifier output for one batch
#[derive(Debug, Clone)]
pub struct ClassifierOutput {
    /// Per-sample probability of the positive ("distracted") class
    pub probabilities: Vec<f64>,
    /// Optional per-sample, per-feature signed contribution decomposition,
    /// shape `[batch, FEATURE_DIMENSION]`
    pub contributions: Option<Array2<f64>>,
}

/// Supervised classifier oracle
pub trait Classifier: Send + Sync {
    fn predict(&self, batch: &Array2<f64>) -> Result<ClassifierOutput, OracleError>;
}

/// Unsupervised anomaly oracle.
///
/// Scores follow the decision-function convention: more negative means
/// more anomalous. Values are raw and unbounded; the ensemble consumes
/// them without rescaling (see DESIGN.md on the scaling ambiguity).
pub trait AnomalyDetector: Send + Sync {
    fn decision_function(&self, batch: &Array2<f64>) -> Result<Vec<f64>, OracleError>;
}
