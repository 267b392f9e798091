//! Fixed face-mesh landmark index table.
//!
//! Index semantics come from the external mesh model's layout and are
//! compile-time constants, never inferred at runtime.

/// Nose tip
pub const NOSE_TIP: usize = 1;
/// Chin
pub const CHIN: usize = 199;
/// Left eye outer corner
pub const LEFT_EYE_OUTER: usize = 33;
/// Right eye inner corner
pub const RIGHT_EYE_INNER: usize = 263;
/// Left mouth corner
pub const LEFT_MOUTH: usize = 61;
/// Right mouth corner
pub const RIGHT_MOUTH: usize = 291;

/// Left iris center
pub const LEFT_IRIS_CENTER: usize = 468;
/// Right iris center
pub const RIGHT_IRIS_CENTER: usize = 473;

/// Left eye socket corners: left, right, top, bottom
pub const LEFT_EYE_BOX: [usize; 4] = [33, 133, 159, 145];
/// Right eye socket corners: left, right, top, bottom
pub const RIGHT_EYE_BOX: [usize; 4] = [362, 263, 386, 374];

/// Number of landmarks produced by the refined mesh model (with irises)
pub const MESH_LANDMARK_COUNT: usize = 478;
