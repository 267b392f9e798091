//! Derived Geometry
//!
//! Turns raw face-mesh landmarks into interpretable signals:
//! - head pose Euler angles via 2D-3D pose solving ([`head_pose`])
//! - normalized eye gaze from iris/socket geometry ([`gaze`])
//! - exponential smoothing for noisy per-frame streams ([`smoother`])

pub mod gaze;
pub mod head_pose;
pub mod smoother;

pub use gaze::{GazeConfig, GazeDirection, GazeEstimate, GazeEstimator};
pub use head_pose::{head_offset, HeadPoseEstimate, HeadPoseEstimator, Orientation};
pub use smoother::{Smoother, DEFAULT_ALPHA};
