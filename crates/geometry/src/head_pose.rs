//! Head pose estimation from six landmark correspondences.
//!
//! Solves the Perspective-n-Point problem between six mesh landmarks and a
//! fixed anthropometric 3D face model, then decomposes the recovered
//! rotation into Euler angles. Camera intrinsics are approximated from the
//! frame: focal length = frame width, principal point = frame center, no
//! lens distortion.

use nalgebra::{Matrix3, SMatrix, SVector, Vector3, Vector6};
use perception::{indices, FaceMesh};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Canonical 3D face model in millimeters, ordered to match
/// [`CORRESPONDENCE_INDICES`].
pub const CANONICAL_FACE_MODEL: [[f64; 3]; 6] = [
    [0.0, 0.0, 0.0],       // nose tip
    [0.0, -63.6, -12.5],   // chin
    [-43.3, 32.7, -26.0],  // left eye outer corner
    [43.3, 32.7, -26.0],   // right eye inner corner
    [-28.9, -28.9, -24.1], // left mouth corner
    [28.9, -28.9, -24.1],  // right mouth corner
];

/// Mesh indices of the six correspondence points, model order
pub const CORRESPONDENCE_INDICES: [usize; 6] = [
    indices::NOSE_TIP,
    indices::CHIN,
    indices::LEFT_EYE_OUTER,
    indices::RIGHT_EYE_INNER,
    indices::LEFT_MOUTH,
    indices::RIGHT_MOUTH,
];

/// Coarse head orientation derived from normalized pitch/yaw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    Forward,
    Up,
    Down,
    Left,
    Right,
}

impl Orientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Forward => "forward",
            Orientation::Up => "up",
            Orientation::Down => "down",
            Orientation::Left => "left",
            Orientation::Right => "right",
        }
    }
}

/// Head pose: raw Euler angles plus normalized components and the
/// categorical orientation
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HeadPoseEstimate {
    /// Raw pitch in degrees
    pub pitch: f64,
    /// Raw yaw in degrees
    pub yaw: f64,
    /// Raw roll in degrees
    pub roll: f64,
    /// Normalized pitch in `[0,1]` (0.5 = level)
    pub pitch_n: f64,
    /// Normalized yaw in `[0,1]`
    pub yaw_n: f64,
    /// Normalized roll in `[0,1]`
    pub roll_n: f64,
    pub orientation: Orientation,
}

impl HeadPoseEstimate {
    /// Build the estimate from raw angles: wrap, normalize, classify.
    pub fn from_angles(pitch: f64, yaw: f64, roll: f64) -> Self {
        let pitch_n = normalize_angle(pitch);
        let yaw_n = normalize_angle(yaw);
        let roll_n = normalize_angle(roll);
        Self {
            pitch,
            yaw,
            roll,
            pitch_n,
            yaw_n,
            roll_n,
            orientation: classify(pitch_n, yaw_n),
        }
    }

    /// Fixed default when no landmarks are available: all normalized
    /// components at the 0.5 midpoint, facing forward.
    pub fn neutral() -> Self {
        Self::from_angles(0.0, 0.0, 0.0)
    }
}

/// Wrap an angle outside `(-90, 90)` by ±180°, then normalize to `[0,1]`
/// as `clamp((angle + 45) / 90, 0, 1)`.
fn normalize_angle(mut angle: f64) -> f64 {
    if angle > 90.0 {
        angle -= 180.0;
    } else if angle < -90.0 {
        angle += 180.0;
    }
    ((angle + 45.0) / 90.0).clamp(0.0, 1.0)
}

/// Pitch is checked before yaw; the first matching band wins.
fn classify(pitch_n: f64, yaw_n: f64) -> Orientation {
    if pitch_n < 0.35 {
        Orientation::Up
    } else if pitch_n > 0.65 {
        Orientation::Down
    } else if yaw_n < 0.35 {
        Orientation::Left
    } else if yaw_n > 0.65 {
        Orientation::Right
    } else {
        Orientation::Forward
    }
}

/// Estimates head pose for one mesh frame
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadPoseEstimator;

impl HeadPoseEstimator {
    pub fn new() -> Self {
        Self
    }

    /// Estimate pose from a face mesh in a frame of the given dimensions.
    ///
    /// Missing correspondence landmarks yield the neutral default without
    /// attempting a solve; a non-convergent solve falls back to raw
    /// `(0, 0, 0)` rather than an error.
    pub fn estimate(&self, mesh: &FaceMesh, width: u32, height: u32) -> HeadPoseEstimate {
        let mut image_points = [(0.0, 0.0); 6];
        for (slot, &index) in image_points.iter_mut().zip(&CORRESPONDENCE_INDICES) {
            match mesh.point_px(index, width, height) {
                Some(point) => *slot = point,
                None => return HeadPoseEstimate::neutral(),
            }
        }

        let intrinsics = CameraIntrinsics::for_frame(width, height);
        let (pitch, yaw, roll) = match solve_pnp(&image_points, &intrinsics) {
            Some(pose) => euler_angles(&rodrigues(pose.fixed_rows::<3>(0).into_owned())),
            None => {
                debug!("pose solve did not converge, using zero-angle fallback");
                (0.0, 0.0, 0.0)
            }
        };

        HeadPoseEstimate::from_angles(pitch, yaw, roll)
    }
}

/// Normalized nose offset from frame center, each axis clamped to `[-1,1]`.
pub fn head_offset(mesh: &FaceMesh, width: u32, height: u32) -> (f64, f64) {
    let Some((nose_x, nose_y)) = mesh.point_px(indices::NOSE_TIP, width, height) else {
        return (0.0, 0.0);
    };
    let half_w = f64::from(width) / 2.0;
    let half_h = f64::from(height) / 2.0;
    (
        ((nose_x - half_w) / half_w).clamp(-1.0, 1.0),
        ((nose_y - half_h) / half_h).clamp(-1.0, 1.0),
    )
}

/// Approximate pinhole intrinsics for a frame
#[derive(Debug, Clone, Copy)]
struct CameraIntrinsics {
    focal: f64,
    cx: f64,
    cy: f64,
}

impl CameraIntrinsics {
    fn for_frame(width: u32, height: u32) -> Self {
        Self {
            focal: f64::from(width),
            cx: f64::from(width) / 2.0,
            cy: f64::from(height) / 2.0,
        }
    }
}

/// Rodrigues rotation-vector to rotation-matrix conversion
fn rodrigues(rvec: Vector3<f64>) -> Matrix3<f64> {
    let theta = rvec.norm();
    if theta < 1e-12 {
        return Matrix3::identity();
    }
    let axis = rvec / theta;
    let k = Matrix3::new(
        0.0, -axis.z, axis.y, //
        axis.z, 0.0, -axis.x, //
        -axis.y, axis.x, 0.0,
    );
    Matrix3::identity() + k * theta.sin() + k * k * (1.0 - theta.cos())
}

/// Euler angles (pitch, yaw, roll) in degrees from a rotation matrix,
/// convention R = Ry(yaw)·Rx(pitch)·Rz(roll).
fn euler_angles(r: &Matrix3<f64>) -> (f64, f64, f64) {
    let pitch = (-r[(1, 2)]).clamp(-1.0, 1.0).asin();
    let yaw = r[(0, 2)].atan2(r[(2, 2)]);
    let roll = r[(1, 0)].atan2(r[(1, 1)]);
    (pitch.to_degrees(), yaw.to_degrees(), roll.to_degrees())
}

/// Reprojection residuals of all six correspondences under pose
/// `theta = (rvec, tvec)`.
fn residuals(
    theta: &Vector6<f64>,
    image_points: &[(f64, f64); 6],
    intrinsics: &CameraIntrinsics,
) -> SVector<f64, 12> {
    let rotation = rodrigues(theta.fixed_rows::<3>(0).into_owned());
    let translation = theta.fixed_rows::<3>(3).into_owned();

    let mut r = SVector::<f64, 12>::zeros();
    for (i, (model_point, observed)) in CANONICAL_FACE_MODEL.iter().zip(image_points).enumerate() {
        let p = rotation * Vector3::new(model_point[0], model_point[1], model_point[2])
            + translation;
        let z = p.z.max(1e-6);
        r[2 * i] = intrinsics.focal * p.x / z + intrinsics.cx - observed.0;
        r[2 * i + 1] = intrinsics.focal * p.y / z + intrinsics.cy - observed.1;
    }
    r
}

/// Reject correspondence sets whose image points are coincident or
/// collinear: the 2D scatter matrix of the points must have two
/// significant eigenvalues.
fn is_degenerate(image_points: &[(f64, f64); 6]) -> bool {
    let n = image_points.len() as f64;
    let (mx, my) = image_points
        .iter()
        .fold((0.0, 0.0), |(ax, ay), (x, y)| (ax + x / n, ay + y / n));

    let (mut sxx, mut sxy, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in image_points {
        let (dx, dy) = (x - mx, y - my);
        sxx += dx * dx;
        sxy += dx * dy;
        syy += dy * dy;
    }

    let trace = sxx + syy;
    let det = sxx * syy - sxy * sxy;
    let half = trace / 2.0;
    let disc = (half * half - det).max(0.0).sqrt();
    let min_eig = half - disc;
    let max_eig = half + disc;

    max_eig < 1e-9 || min_eig <= 1e-6 * max_eig
}

const MAX_ITERATIONS: usize = 50;
const STEP_EPSILON: f64 = 1e-10;
const CONVERGED_ERROR: f64 = 1e-9;

/// Iterative PnP refinement: Levenberg-Marquardt over `(rvec, tvec)` with
/// a numeric Jacobian. Returns `None` when the geometry is degenerate or
/// the normal equations cannot be solved.
fn solve_pnp(
    image_points: &[(f64, f64); 6],
    intrinsics: &CameraIntrinsics,
) -> Option<Vector6<f64>> {
    if is_degenerate(image_points) {
        return None;
    }

    // Start from an unrotated face half a meter from the camera.
    let mut theta = Vector6::new(0.0, 0.0, 0.0, 0.0, 0.0, 500.0);
    let mut error = residuals(&theta, image_points, intrinsics).norm_squared();
    let mut lambda = 1e-3;

    for _ in 0..MAX_ITERATIONS {
        if error < CONVERGED_ERROR {
            break;
        }

        // Numeric Jacobian, central differences
        let mut jacobian = SMatrix::<f64, 12, 6>::zeros();
        for col in 0..6 {
            let h = 1e-5 * theta[col].abs().max(1.0);
            let mut plus = theta;
            let mut minus = theta;
            plus[col] += h;
            minus[col] -= h;
            let dr = (residuals(&plus, image_points, intrinsics)
                - residuals(&minus, image_points, intrinsics))
                / (2.0 * h);
            jacobian.set_column(col, &dr);
        }

        let jt = jacobian.transpose();
        let normal = jt * jacobian + SMatrix::<f64, 6, 6>::identity() * lambda;
        let gradient = jt * residuals(&theta, image_points, intrinsics);
        let step = normal.cholesky()?.solve(&(-gradient));

        let candidate = theta + step;
        let candidate_error = residuals(&candidate, image_points, intrinsics).norm_squared();

        if candidate_error.is_finite() && candidate_error < error {
            theta = candidate;
            error = candidate_error;
            lambda = (lambda * 0.5).max(1e-12);
            if step.norm() < STEP_EPSILON {
                break;
            }
        } else {
            lambda *= 10.0;
            if lambda > 1e9 {
                return None;
            }
        }
    }

    if !error.is_finite() {
        return None;
    }
    Some(theta)
}
