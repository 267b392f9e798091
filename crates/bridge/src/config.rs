//! Bridge configuration.
//!
//! Layered the usual way: optional TOML file, then `MONITOR_`-prefixed
//! environment overrides (e.g. `MONITOR_CAMERA__DEVICE=/dev/video2`).

use capture::CameraConfig;
use geometry::GazeConfig;
use serde::Deserialize;
use session::SessionConfig;

/// Model artifact locations.
///
/// The two scoring oracles are mandatory and loaded at process start;
/// unset detector paths disable that perception modality.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelPaths {
    pub classifier: String,
    pub anomaly: String,
    pub face: Option<String>,
    pub face_mesh: Option<String>,
    pub hands: Option<String>,
    pub objects: Option<String>,
}

impl Default for ModelPaths {
    fn default() -> Self {
        Self {
            classifier: "models/classifier.onnx".to_string(),
            anomaly: "models/anomaly.onnx".to_string(),
            face: None,
            face_mesh: None,
            hands: None,
            objects: None,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub camera: CameraConfig,
    pub session: SessionConfig,
    pub gaze: GazeConfig,
    pub models: ModelPaths,
}

impl BridgeConfig {
    /// Load configuration from an optional file plus the environment.
    pub fn load(file: Option<&str>) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::with_name(file.unwrap_or("monitor")).required(false))
            .add_source(config::Environment::with_prefix("MONITOR").separator("__"))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BridgeConfig::default();
        assert_eq!(config.camera.device, "/dev/video0");
        assert_eq!(config.session.window_size, 10);
        assert_eq!(config.models.classifier, "models/classifier.onnx");
        assert!(config.models.face_mesh.is_none());
    }
}
