//! ONNX oracle adapters.
//!
//! Wraps persisted model artifacts (e.g. a random-forest classifier and
//! an isolation-forest anomaly model exported to ONNX) behind the oracle
//! traits. Artifacts are expected to take a single `[1, 17]` float input
//! row and produce a scalar output per call: the classifier the positive
//! class probability, the anomaly model a raw decision score. Contribution
//! decompositions are not representable in ONNX graphs, so the classifier
//! adapter reports none.

use crate::oracle::{AnomalyDetector, Classifier, ClassifierOutput, OracleError};
use feature_vector::FEATURE_DIMENSION;
use ndarray::Array2;
use std::path::Path;
use tract_onnx::prelude::*;
use tracing::info;

type RunnableOnnx = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

fn load_model<P: AsRef<Path>>(path: P) -> Result<RunnableOnnx, OracleError> {
    let path = path.as_ref();
    info!(model = %path.display(), "loading scoring oracle");
    tract_onnx::onnx()
        .model_for_path(path)
        .and_then(|m| m.with_input_fact(0, f32::fact([1, FEATURE_DIMENSION]).into()))
        .and_then(|m| m.into_optimized())
        .and_then(|m| m.into_runnable())
        .map_err(|e| OracleError::ModelLoad(format!("{}: {e}", path.display())))
}

/// Run the model once per batch row and collect the scalar outputs.
fn score_rows(model: &RunnableOnnx, batch: &Array2<f64>) -> Result<Vec<f64>, OracleError> {
    if batch.ncols() != FEATURE_DIMENSION {
        return Err(OracleError::InputShape(format!(
            "expected {} columns, got {}",
            FEATURE_DIMENSION,
            batch.ncols()
        )));
    }

    let mut scores = Vec::with_capacity(batch.nrows());
    for row in batch.rows() {
        let input = tract_ndarray::Array2::from_shape_fn((1, FEATURE_DIMENSION), |(_, j)| {
            row[j] as f32
        });
        let outputs = model
            .run(tvec!(Tensor::from(input).into()))
            .map_err(|e| OracleError::Inference(e.to_string()))?;
        let view = outputs[0]
            .to_array_view::<f32>()
            .map_err(|e| OracleError::Inference(e.to_string()))?;
        let score = view
            .iter()
            .next()
            .copied()
            .ok_or_else(|| OracleError::Inference("empty model output".into()))?;
        scores.push(f64::from(score));
    }
    Ok(scores)
}

/// Supervised classifier artifact
pub struct OnnxClassifier {
    model: RunnableOnnx,
}

impl OnnxClassifier {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, OracleError> {
        Ok(Self {
            model: load_model(path)?,
        })
    }
}

impl Classifier for OnnxClassifier {
    fn predict(&self, batch: &Array2<f64>) -> Result<ClassifierOutput, OracleError> {
        Ok(ClassifierOutput {
            probabilities: score_rows(&self.model, batch)?,
            contributions: None,
        })
    }
}

/// Unsupervised anomaly artifact
pub struct OnnxAnomalyDetector {
    model: RunnableOnnx,
}

impl OnnxAnomalyDetector {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, OracleError> {
        Ok(Self {
            model: load_model(path)?,
        })
    }
}

impl AnomalyDetector for OnnxAnomalyDetector {
    fn decision_function(&self, batch: &Array2<f64>) -> Result<Vec<f64>, OracleError> {
        score_rows(&self.model, batch)
    }
}
