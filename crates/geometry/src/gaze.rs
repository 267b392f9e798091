//! Eye gaze estimation from iris and eye-socket landmarks.
//!
//! Each eye yields a normalized offset of the iris inside its socket box;
//! the two offsets are averaged, shifted by a configurable bias, and
//! remapped to screen space through empirically calibrated bounds. The
//! remap extrapolates outside the source interval on purpose — unlike
//! pose normalization, which clamps — so out-of-range gaze points signal
//! extreme looks to downstream consumers.

use perception::{indices, FaceMesh};
use serde::{Deserialize, Serialize};

/// Guard against zero-size socket boxes on degenerate detections
const EPSILON: f64 = 1e-6;

/// Empirical screen-space source bounds for the x remap
const X_SOURCE: (f64, f64) = (0.2, 0.8);
/// Empirical screen-space source bounds for the y remap
const Y_SOURCE: (f64, f64) = (0.1, 0.5);

/// Directional bias added to the fused gaze before the remap, accounting
/// for the camera sitting above (or beside) the screen.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GazeConfig {
    pub shift_x: f64,
    pub shift_y: f64,
}

/// Categorical gaze direction; compound corners join the side labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GazeDirection {
    #[default]
    Center,
    Top,
    Bottom,
    Left,
    Right,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl GazeDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            GazeDirection::Center => "center",
            GazeDirection::Top => "top",
            GazeDirection::Bottom => "bottom",
            GazeDirection::Left => "left",
            GazeDirection::Right => "right",
            GazeDirection::TopLeft => "top_left",
            GazeDirection::TopRight => "top_right",
            GazeDirection::BottomLeft => "bottom_left",
            GazeDirection::BottomRight => "bottom_right",
        }
    }

    fn classify(x: f64, y: f64) -> Self {
        let vertical = if y < 0.4 {
            Some(true)
        } else if y > 0.6 {
            Some(false)
        } else {
            None
        };
        let horizontal = if x < 0.4 {
            Some(true)
        } else if x > 0.6 {
            Some(false)
        } else {
            None
        };

        match (vertical, horizontal) {
            (Some(true), Some(true)) => GazeDirection::TopLeft,
            (Some(true), Some(false)) => GazeDirection::TopRight,
            (Some(false), Some(true)) => GazeDirection::BottomLeft,
            (Some(false), Some(false)) => GazeDirection::BottomRight,
            (Some(true), None) => GazeDirection::Top,
            (Some(false), None) => GazeDirection::Bottom,
            (None, Some(true)) => GazeDirection::Left,
            (None, Some(false)) => GazeDirection::Right,
            (None, None) => GazeDirection::Center,
        }
    }
}

/// Gaze for one mesh frame: per-eye offsets, the fused screen point, and
/// the categorical direction
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GazeEstimate {
    /// Left-eye normalized offset, each axis in `[-1,1]`
    pub left: (f64, f64),
    /// Right-eye normalized offset, each axis in `[-1,1]`
    pub right: (f64, f64),
    /// Fused screen-space gaze point; may leave `[0,1]` under extrapolation
    pub point: (f64, f64),
    pub direction: GazeDirection,
}

/// Piecewise-linear remap of `value` from `source` onto `[0,1]`.
/// Values outside `source` extrapolate; they are not clamped.
fn map_value(value: f64, source: (f64, f64)) -> f64 {
    (value - source.0) / (source.1 - source.0)
}

/// Derives gaze estimates from face meshes
#[derive(Debug, Clone, Copy, Default)]
pub struct GazeEstimator {
    config: GazeConfig,
}

impl GazeEstimator {
    pub fn new(config: GazeConfig) -> Self {
        Self { config }
    }

    /// Normalized iris offset for one eye: `(0,0)` is the socket center,
    /// axes clamped to `[-1,1]`. Missing or malformed landmarks yield the
    /// center offset rather than an error.
    pub fn eye_offset(
        mesh: &FaceMesh,
        width: u32,
        height: u32,
        iris_index: usize,
        socket: [usize; 4],
    ) -> (f64, f64) {
        let points = [
            mesh.point_px(iris_index, width, height),
            mesh.point_px(socket[0], width, height),
            mesh.point_px(socket[1], width, height),
            mesh.point_px(socket[2], width, height),
            mesh.point_px(socket[3], width, height),
        ];
        let [Some(iris), Some(left), Some(right), Some(top), Some(bottom)] = points else {
            return (0.0, 0.0);
        };

        let center = ((left.0 + right.0) / 2.0, (left.1 + right.1) / 2.0);
        let half_width = (distance(right, left) + EPSILON) / 2.0;
        let half_height = (distance(bottom, top) + EPSILON) / 2.0;

        (
            ((iris.0 - center.0) / half_width).clamp(-1.0, 1.0),
            ((iris.1 - center.1) / half_height).clamp(-1.0, 1.0),
        )
    }

    /// Both per-eye offsets for a mesh frame.
    pub fn eye_offsets(&self, mesh: &FaceMesh, width: u32, height: u32) -> ((f64, f64), (f64, f64)) {
        (
            Self::eye_offset(
                mesh,
                width,
                height,
                indices::LEFT_IRIS_CENTER,
                indices::LEFT_EYE_BOX,
            ),
            Self::eye_offset(
                mesh,
                width,
                height,
                indices::RIGHT_IRIS_CENTER,
                indices::RIGHT_EYE_BOX,
            ),
        )
    }

    /// Average the per-eye offsets, apply the configured shift, and remap
    /// into screen space. Exposed separately so the monitoring loop can
    /// smooth the per-eye streams before fusing.
    pub fn fuse(&self, left: (f64, f64), right: (f64, f64)) -> GazeEstimate {
        let gx = (left.0 + right.0) / 2.0;
        let gy = (left.1 + right.1) / 2.0;

        let x = map_value(0.5 + gx / 2.0 + self.config.shift_x, X_SOURCE);
        let y = map_value(0.5 + gy / 2.0 + self.config.shift_y, Y_SOURCE);

        GazeEstimate {
            left,
            right,
            point: (x, y),
            direction: GazeDirection::classify(x, y),
        }
    }

    /// Single-shot estimate: per-eye offsets plus fusion, no smoothing.
    pub fn estimate(&self, mesh: &FaceMesh, width: u32, height: u32) -> GazeEstimate {
        let (left, right) = self.eye_offsets(mesh, width, height);
        self.fuse(left, right)
    }
}

fn distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}
