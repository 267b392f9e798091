//! Frame pipelines.
//!
//! [`FeaturePipeline`] is the stateless single-shot path used by the
//! protocol operations: perceive, derive, assemble, no smoothing.
//! [`MonitorPipeline`] is the stateful live path: it smooths the pose and
//! per-eye gaze streams and accumulates oracle rows into a scoring
//! window.

use crate::events::{unix_timestamp, MonitoringData};
use capture::Frame;
use feature_vector::{assemble, Features, FEATURE_DIMENSION};
use geometry::{
    head_offset, GazeConfig, GazeEstimate, GazeEstimator, HeadPoseEstimate, HeadPoseEstimator,
    Smoother,
};
use perception::{FaceMesh, Perception, PerceptionError, PerceptionStack};
use scoring::{EnsembleScorer, ScoreResult};
use tracing::debug;

/// Stateless single-shot feature extraction
#[derive(Clone)]
pub struct FeaturePipeline {
    perception: PerceptionStack,
    pose: HeadPoseEstimator,
    gaze: GazeEstimator,
}

impl FeaturePipeline {
    pub fn new(perception: PerceptionStack, gaze_config: GazeConfig) -> Self {
        Self {
            perception,
            pose: HeadPoseEstimator::new(),
            gaze: GazeEstimator::new(gaze_config),
        }
    }

    /// Extract one frame's feature map.
    pub fn extract(&self, frame: &Frame) -> Result<Features, PerceptionError> {
        let perceived = self.perception.perceive(frame)?;
        let derived = self.derive(&perceived, frame);
        Ok(assemble(
            &perceived,
            derived.as_ref().map(|(pose, _)| pose),
            derived.as_ref().map(|(_, gaze)| gaze),
        ))
    }

    /// Whether the target object class is present in the frame.
    pub fn object_present(&self, frame: &Frame) -> Result<bool, PerceptionError> {
        Ok(!self.perception.objects.detect_objects(frame)?.is_empty())
    }

    fn derive(
        &self,
        perceived: &Perception,
        frame: &Frame,
    ) -> Option<(HeadPoseEstimate, GazeEstimate)> {
        let mesh = perceived.mesh.as_ref().filter(|mesh| !mesh.is_empty())?;
        Some((
            self.pose.estimate(mesh, frame.width, frame.height),
            self.gaze.estimate(mesh, frame.width, frame.height),
        ))
    }
}

/// Stateful live-monitoring pipeline: smoothing plus windowed scoring.
///
/// Smoother state lives only as long as the pipeline; each session start
/// creates a fresh pipeline, which is the only way smoothers reset.
pub struct MonitorPipeline {
    perception: PerceptionStack,
    pose: HeadPoseEstimator,
    gaze: GazeEstimator,
    scorer: EnsembleScorer,
    pose_smoother: Smoother<3>,
    left_eye_smoother: Smoother<2>,
    right_eye_smoother: Smoother<2>,
    window: Vec<[f64; FEATURE_DIMENSION]>,
    window_size: usize,
}

impl MonitorPipeline {
    pub fn new(
        perception: PerceptionStack,
        gaze_config: GazeConfig,
        scorer: EnsembleScorer,
        window_size: usize,
        alpha: f64,
    ) -> Self {
        Self {
            perception,
            pose: HeadPoseEstimator::new(),
            gaze: GazeEstimator::new(gaze_config),
            scorer,
            pose_smoother: Smoother::new(alpha),
            left_eye_smoother: Smoother::new(alpha),
            right_eye_smoother: Smoother::new(alpha),
            window: Vec::with_capacity(window_size),
            window_size,
        }
    }

    /// Process one frame: derive and smooth the signal streams, feed the
    /// scoring window, and report what should be emitted.
    ///
    /// The per-frame data is `Some` only when the frame carried a usable
    /// mesh; the score result is `Some` once per completed window.
    pub fn process(
        &mut self,
        frame: &Frame,
    ) -> Result<(Option<MonitoringData>, Option<ScoreResult>), PerceptionError> {
        let perceived = self.perception.perceive(frame)?;

        let derived = match perceived.mesh.as_ref().filter(|mesh| !mesh.is_empty()) {
            Some(mesh) => Some(self.derive_smoothed(mesh, frame)),
            None => None,
        };

        let features = assemble(
            &perceived,
            derived.as_ref().map(|(pose, _, _)| pose),
            derived.as_ref().map(|(_, gaze, _)| gaze),
        );
        self.window.push(features.model_row());

        let data = derived.map(|(pose, gaze, head)| MonitoringData {
            pitch: pose.pitch,
            yaw: pose.yaw,
            roll: pose.roll,
            orientation: pose.orientation,
            head_x: head.0,
            head_y: head.1,
            gaze_x: gaze.point.0,
            gaze_y: gaze.point.1,
            gaze_direction: gaze.direction,
            timestamp: unix_timestamp(),
        });

        let scores = if self.window.len() >= self.window_size {
            debug!(samples = self.window.len(), "scoring completed window");
            let result = self.scorer.score(&self.window);
            self.window.clear();
            Some(result)
        } else {
            None
        };

        Ok((data, scores))
    }

    fn derive_smoothed(
        &mut self,
        mesh: &FaceMesh,
        frame: &Frame,
    ) -> (HeadPoseEstimate, GazeEstimate, (f64, f64)) {
        let raw_pose = self.pose.estimate(mesh, frame.width, frame.height);
        let [pitch, yaw, roll] =
            self.pose_smoother
                .update([raw_pose.pitch, raw_pose.yaw, raw_pose.roll]);
        let pose = HeadPoseEstimate::from_angles(pitch, yaw, roll);

        let (left, right) = self.gaze.eye_offsets(mesh, frame.width, frame.height);
        let [lx, ly] = self.left_eye_smoother.update([left.0, left.1]);
        let [rx, ry] = self.right_eye_smoother.update([right.0, right.1]);
        let gaze = self.gaze.fuse((lx, ly), (rx, ry));

        let head = head_offset(mesh, frame.width, frame.height);

        (pose, gaze, head)
    }
}
