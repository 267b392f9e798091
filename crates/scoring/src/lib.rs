//! Ensemble Scoring
//!
//! Fuses two opaque scoring oracles over batches of feature vectors:
//! - a supervised classifier returning the per-sample probability of the
//!   "distracted" class, optionally with per-feature contributions
//! - an unsupervised anomaly model returning per-sample decision scores
//!
//! Batch means are combined with fixed 0.7/0.3 weights into the integrity
//! score, which a monotonic threshold ladder discretizes into a warning
//! level.

pub mod ensemble;
pub mod onnx;
pub mod oracle;
pub mod warning;

pub use ensemble::{EnsembleScorer, ScoreResult, ANOMALY_WEIGHT, SUPERVISED_WEIGHT};
pub use onnx::{OnnxAnomalyDetector, OnnxClassifier};
pub use oracle::{AnomalyDetector, Classifier, ClassifierOutput, OracleError};
pub use warning::WarningLevel;
