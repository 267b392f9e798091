//! Events emitted by the monitoring worker.
//!
//! Serialized as single-line JSON objects on the outbound protocol
//! stream, interleaved with request responses.

use geometry::{GazeDirection, Orientation};
use scoring::ScoreResult;
use serde::Serialize;

/// Unix timestamp in fractional seconds
pub fn unix_timestamp() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}

/// Per-frame derived signals, emitted whenever a frame carries a usable
/// face mesh
#[derive(Debug, Clone, Serialize)]
pub struct MonitoringData {
    /// Smoothed raw pitch in degrees
    pub pitch: f64,
    /// Smoothed raw yaw in degrees
    pub yaw: f64,
    /// Smoothed raw roll in degrees
    pub roll: f64,
    pub orientation: Orientation,
    /// Nose offset from frame center, each axis in `[-1,1]`
    pub head_x: f64,
    pub head_y: f64,
    /// Fused screen-space gaze point (may leave `[0,1]`)
    pub gaze_x: f64,
    pub gaze_y: f64,
    pub gaze_direction: GazeDirection,
    pub timestamp: f64,
}

/// Aggregated window scores, emitted once per completed sampling window
#[derive(Debug, Clone, Serialize)]
pub struct MonitoringScores {
    #[serde(flatten)]
    pub scores: ScoreResult,
    pub timestamp: f64,
}

/// Outbound monitoring event envelope
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MonitorEvent {
    MonitoringData(MonitoringData),
    MonitoringScores(MonitoringScores),
}

#[cfg(test)]
mod tests {
    use super::*;
    use scoring::WarningLevel;
    use std::collections::BTreeMap;

    #[test]
    fn test_event_envelope_carries_type_tag() {
        let event = MonitorEvent::MonitoringData(MonitoringData {
            pitch: 1.0,
            yaw: 2.0,
            roll: 3.0,
            orientation: Orientation::Forward,
            head_x: 0.0,
            head_y: 0.0,
            gaze_x: 0.5,
            gaze_y: 0.5,
            gaze_direction: GazeDirection::Center,
            timestamp: 1234.5,
        });
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "monitoring_data");
        assert_eq!(json["yaw"], 2.0);
        assert_eq!(json["orientation"], "forward");
        assert_eq!(json["gaze_direction"], "center");
    }

    #[test]
    fn test_scores_event_flattens_result() {
        let event = MonitorEvent::MonitoringScores(MonitoringScores {
            scores: ScoreResult {
                rf_score: 0.8,
                if_score: 0.1,
                integrity_score: 0.59,
                warning_level: WarningLevel::Low,
                feature_impacts: BTreeMap::new(),
            },
            timestamp: 1234.5,
        });
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "monitoring_scores");
        assert_eq!(json["integrity_score"], 0.59);
        assert_eq!(json["warning_level"], "low");
    }
}
