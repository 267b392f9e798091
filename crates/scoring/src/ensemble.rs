//! Ensemble scorer: batch oracle fusion

use crate::oracle::{AnomalyDetector, Classifier};
use crate::warning::WarningLevel;
use feature_vector::{FEATURE_DIMENSION, MODEL_SCHEMA};
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Fixed fusion weight of the supervised probability
pub const SUPERVISED_WEIGHT: f64 = 0.7;
/// Fixed fusion weight of the anomaly score
pub const ANOMALY_WEIGHT: f64 = 0.3;

/// Fused scoring result for one batch of feature vectors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Batch-mean supervised probability
    pub rf_score: f64,
    /// Batch-mean anomaly decision score (raw scale)
    pub if_score: f64,
    /// Weighted fusion of the two oracle means
    pub integrity_score: f64,
    pub warning_level: WarningLevel,
    /// Feature name -> mean signed contribution; empty when the
    /// classifier provides no decomposition
    pub feature_impacts: BTreeMap<String, f64>,
}

impl ScoreResult {
    /// The result for an empty batch: zero scores, severe warning.
    fn empty_batch() -> Self {
        Self {
            rf_score: 0.0,
            if_score: 0.0,
            integrity_score: 0.0,
            warning_level: WarningLevel::from_score(0.0),
            feature_impacts: BTreeMap::new(),
        }
    }
}

/// Fuses the supervised and unsupervised oracles over a temporal window
/// of feature vectors.
#[derive(Clone)]
pub struct EnsembleScorer {
    classifier: Arc<dyn Classifier>,
    anomaly: Arc<dyn AnomalyDetector>,
}

impl EnsembleScorer {
    pub fn new(classifier: Arc<dyn Classifier>, anomaly: Arc<dyn AnomalyDetector>) -> Self {
        Self {
            classifier,
            anomaly,
        }
    }

    /// Score a window of samples.
    ///
    /// Oracle failures are recovered locally: the failing oracle's mean is
    /// substituted with 0. An empty window scores 0 with a severe warning
    /// rather than erroring.
    pub fn score(&self, samples: &[[f64; FEATURE_DIMENSION]]) -> ScoreResult {
        if samples.is_empty() {
            debug!("scoring an empty window");
            return ScoreResult::empty_batch();
        }

        let batch = Array2::from_shape_fn((samples.len(), FEATURE_DIMENSION), |(i, j)| {
            samples[i][j]
        });

        let (rf_score, feature_impacts) = match self.classifier.predict(&batch) {
            Ok(output) => {
                let impacts = output
                    .contributions
                    .as_ref()
                    .and_then(|c| c.mean_axis(Axis(0)))
                    .map(|means| {
                        MODEL_SCHEMA
                            .iter()
                            .zip(means.iter())
                            .map(|(name, &impact)| ((*name).to_string(), impact))
                            .collect()
                    })
                    .unwrap_or_default();
                (mean(&output.probabilities), impacts)
            }
            Err(e) => {
                warn!("classifier oracle failed, substituting 0: {e}");
                (0.0, BTreeMap::new())
            }
        };

        let if_score = match self.anomaly.decision_function(&batch) {
            Ok(scores) => mean(&scores),
            Err(e) => {
                warn!("anomaly oracle failed, substituting 0: {e}");
                0.0
            }
        };

        let integrity_score = SUPERVISED_WEIGHT * rf_score + ANOMALY_WEIGHT * if_score;

        ScoreResult {
            rf_score,
            if_score,
            integrity_score,
            warning_level: WarningLevel::from_score(integrity_score),
            feature_impacts,
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{ClassifierOutput, OracleError};

    /// Classifier returning fixed probabilities plus a constant
    /// contribution row per sample.
    struct FixedClassifier {
        probability: f64,
        contribution: Option<f64>,
    }

    impl Classifier for FixedClassifier {
        fn predict(&self, batch: &Array2<f64>) -> Result<ClassifierOutput, OracleError> {
            let n = batch.nrows();
            let contributions = self.contribution.map(|c| {
                Array2::from_shape_fn((n, FEATURE_DIMENSION), |(i, _)| {
                    // Alternate sign across samples so averaging is visible
                    if i % 2 == 0 {
                        c
                    } else {
                        -c
                    }
                })
            });
            Ok(ClassifierOutput {
                probabilities: vec![self.probability; n],
                contributions,
            })
        }
    }

    struct FixedAnomaly(f64);

    impl AnomalyDetector for FixedAnomaly {
        fn decision_function(&self, batch: &Array2<f64>) -> Result<Vec<f64>, OracleError> {
            Ok(vec![self.0; batch.nrows()])
        }
    }

    struct FailingClassifier;

    impl Classifier for FailingClassifier {
        fn predict(&self, _batch: &Array2<f64>) -> Result<ClassifierOutput, OracleError> {
            Err(OracleError::InputShape("wrong column count".into()))
        }
    }

    struct FailingAnomaly;

    impl AnomalyDetector for FailingAnomaly {
        fn decision_function(&self, _batch: &Array2<f64>) -> Result<Vec<f64>, OracleError> {
            Err(OracleError::Inference("model poisoned".into()))
        }
    }

    fn scorer(classifier: impl Classifier + 'static, anomaly: impl AnomalyDetector + 'static) -> EnsembleScorer {
        EnsembleScorer::new(Arc::new(classifier), Arc::new(anomaly))
    }

    fn sample() -> [f64; FEATURE_DIMENSION] {
        [0.5; FEATURE_DIMENSION]
    }

    #[test]
    fn test_fusion_weights() {
        let scorer = scorer(
            FixedClassifier {
                probability: 1.0,
                contribution: None,
            },
            FixedAnomaly(0.5),
        );
        let result = scorer.score(&[sample(), sample()]);

        assert!((result.rf_score - 1.0).abs() < 1e-12);
        assert!((result.if_score - 0.5).abs() < 1e-12);
        assert!((result.integrity_score - 0.85).abs() < 1e-12);
        assert_eq!(result.warning_level, WarningLevel::None);
    }

    #[test]
    fn test_empty_batch_scores_zero_severe() {
        let scorer = scorer(
            FixedClassifier {
                probability: 1.0,
                contribution: None,
            },
            FixedAnomaly(1.0),
        );
        let result = scorer.score(&[]);

        assert_eq!(result.integrity_score, 0.0);
        assert_eq!(result.rf_score, 0.0);
        assert_eq!(result.if_score, 0.0);
        assert_eq!(result.warning_level, WarningLevel::Severe);
        assert!(result.feature_impacts.is_empty());
    }

    #[test]
    fn test_classifier_failure_substitutes_zero() {
        let scorer = scorer(FailingClassifier, FixedAnomaly(1.0));
        let result = scorer.score(&[sample()]);

        assert_eq!(result.rf_score, 0.0);
        assert!((result.if_score - 1.0).abs() < 1e-12);
        assert!((result.integrity_score - 0.3).abs() < 1e-12);
        assert_eq!(result.warning_level, WarningLevel::Moderate);
    }

    #[test]
    fn test_both_oracles_failing_is_severe() {
        let scorer = scorer(FailingClassifier, FailingAnomaly);
        let result = scorer.score(&[sample()]);

        assert_eq!(result.integrity_score, 0.0);
        assert_eq!(result.warning_level, WarningLevel::Severe);
    }

    #[test]
    fn test_contribution_averaging() {
        // Two samples with +0.2 / -0.2 contributions average to 0
        let scorer = scorer(
            FixedClassifier {
                probability: 0.5,
                contribution: Some(0.2),
            },
            FixedAnomaly(0.0),
        );
        let result = scorer.score(&[sample(), sample()]);

        assert_eq!(result.feature_impacts.len(), FEATURE_DIMENSION);
        for (_, impact) in &result.feature_impacts {
            assert!(impact.abs() < 1e-12);
        }

        // A single sample keeps its raw contribution
        let result = scorer.score(&[sample()]);
        assert!((result.feature_impacts["face_x"] - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_raw_anomaly_scale_preserved() {
        // Negative decision scores (anomalous) pull integrity down
        let scorer = scorer(
            FixedClassifier {
                probability: 0.9,
                contribution: None,
            },
            FixedAnomaly(-0.5),
        );
        let result = scorer.score(&[sample()]);

        assert!((result.integrity_score - 0.48).abs() < 1e-9);
        assert_eq!(result.warning_level, WarningLevel::Low);
    }
}
