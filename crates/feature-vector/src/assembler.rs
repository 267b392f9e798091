//! Feature assembly with per-modality fallbacks.
//!
//! Absence is never an error; each missing modality has a defined
//! substitute. The substitutes are intentionally inconsistent: a missing
//! face means "nothing" (zeros), while a missing mesh on the pose/gaze
//! side means "assume neutral" (0.5 midpoints). The oracles were trained
//! against exactly these values.

use crate::schema::Features;
use geometry::{GazeEstimate, HeadPoseEstimate};
use perception::{Hand, Handedness, Perception};

/// Assemble one frame's feature map.
///
/// `pose`/`gaze` are `None` when no usable mesh existed for the frame;
/// they are derived independently of the face box, so a mesh without a
/// face box still produces real pose/gaze values next to zeroed face
/// fields.
pub fn assemble(
    perception: &Perception,
    pose: Option<&HeadPoseEstimate>,
    gaze: Option<&GazeEstimate>,
) -> Features {
    let mut features = Features::default();

    if let Some(face) = perception.faces.first() {
        features.face_present = 1.0;
        features.face_x = face.x;
        features.face_y = face.y;
        features.face_w = face.w;
        features.face_h = face.h;
        features.face_conf = face.confidence;
        features.face_count = perception.faces.len() as f64;
    }

    let (left, right) = first_per_side(&perception.hands);
    if let Some(wrist) = left.and_then(Hand::wrist) {
        features.wrist_left_x = wrist.x;
        features.wrist_left_y = wrist.y;
    }
    if let Some(wrist) = right.and_then(Hand::wrist) {
        features.wrist_right_x = wrist.x;
        features.wrist_right_y = wrist.y;
    }
    features.hand_count = f64::from(u8::from(left.is_some()) + u8::from(right.is_some()));

    match pose {
        Some(pose) => {
            features.head_yaw = pose.yaw_n;
            features.head_pitch = pose.pitch_n;
            features.head_roll = pose.roll_n;
        }
        None => {
            features.head_yaw = 0.5;
            features.head_pitch = 0.5;
            features.head_roll = 0.5;
        }
    }

    match gaze {
        Some(gaze) => {
            features.eye_gaze_x = gaze.point.0;
            features.eye_gaze_y = gaze.point.1;
        }
        None => {
            features.eye_gaze_x = 0.5;
            features.eye_gaze_y = 0.5;
        }
    }

    if let Some(object) = perception.objects.first() {
        features.phone_present = 1.0;
        features.phone_x = object.x;
        features.phone_y = object.y;
        features.phone_conf = object.confidence;
    }

    features
}

/// First detected hand per side; extra detections of the same side are
/// ignored.
fn first_per_side(hands: &[Hand]) -> (Option<&Hand>, Option<&Hand>) {
    let mut left = None;
    let mut right = None;
    for hand in hands {
        match hand.handedness {
            Handedness::Left if left.is_none() => left = Some(hand),
            Handedness::Right if right.is_none() => right = Some(hand),
            _ => {}
        }
    }
    (left, right)
}

#[cfg(test)]
mod tests {
    use super::*;
    use perception::{FaceBox, FaceMesh, Landmark, ObjectBox};

    fn face_box() -> FaceBox {
        FaceBox {
            x: 0.3,
            y: 0.2,
            w: 0.4,
            h: 0.5,
            confidence: 0.95,
        }
    }

    fn hand(handedness: Handedness, x: f64) -> Hand {
        Hand {
            handedness,
            landmarks: vec![Landmark::new(x, 0.8, 0.0)],
        }
    }

    #[test]
    fn test_empty_frame_fallbacks() {
        let features = assemble(&Perception::default(), None, None);

        // Face modality absent: zeros
        assert_eq!(features.face_present, 0.0);
        assert_eq!(features.face_conf, 0.0);
        assert_eq!(features.face_count, 0.0);
        // Mesh absent: pose and gaze sit at the neutral midpoint
        assert_eq!(features.head_yaw, 0.5);
        assert_eq!(features.head_pitch, 0.5);
        assert_eq!(features.head_roll, 0.5);
        assert_eq!(features.eye_gaze_x, 0.5);
        assert_eq!(features.eye_gaze_y, 0.5);
        // Hands and object absent: zeros
        assert_eq!(features.hand_count, 0.0);
        assert_eq!(features.wrist_left_x, 0.0);
        assert_eq!(features.phone_present, 0.0);
    }

    #[test]
    fn test_face_fields_populated() {
        let perception = Perception {
            faces: vec![face_box(), face_box()],
            ..Default::default()
        };
        let features = assemble(&perception, None, None);

        assert_eq!(features.face_present, 1.0);
        assert_eq!(features.face_x, 0.3);
        assert_eq!(features.face_count, 2.0);
    }

    #[test]
    fn test_mesh_without_face_box() {
        // Boundary case: derived values flow through even when the face
        // detector saw nothing
        let pose = HeadPoseEstimate::from_angles(10.0, -20.0, 0.0);
        let gaze = geometry::GazeEstimator::default().estimate(&FaceMesh::default(), 640, 480);
        let features = assemble(&Perception::default(), Some(&pose), Some(&gaze));

        assert_eq!(features.face_present, 0.0);
        assert_eq!(features.face_w, 0.0);
        assert!((features.head_pitch - pose.pitch_n).abs() < 1e-12);
        assert!((features.head_yaw - pose.yaw_n).abs() < 1e-12);
        assert_eq!(features.eye_gaze_x, gaze.point.0);
    }

    #[test]
    fn test_first_hand_per_side_wins() {
        let perception = Perception {
            hands: vec![
                hand(Handedness::Left, 0.1),
                hand(Handedness::Left, 0.9),
                hand(Handedness::Right, 0.6),
            ],
            ..Default::default()
        };
        let features = assemble(&perception, None, None);

        assert_eq!(features.hand_count, 2.0);
        assert_eq!(features.wrist_left_x, 0.1);
        assert_eq!(features.wrist_right_x, 0.6);
    }

    #[test]
    fn test_single_left_hand() {
        let perception = Perception {
            hands: vec![hand(Handedness::Left, 0.25)],
            ..Default::default()
        };
        let features = assemble(&perception, None, None);

        assert_eq!(features.hand_count, 1.0);
        assert_eq!(features.wrist_left_y, 0.8);
        assert_eq!(features.wrist_right_x, 0.0);
        assert_eq!(features.wrist_right_y, 0.0);
    }

    #[test]
    fn test_object_features() {
        let perception = Perception {
            objects: vec![ObjectBox {
                x: 0.7,
                y: 0.6,
                w: 0.1,
                h: 0.2,
                confidence: 0.88,
            }],
            ..Default::default()
        };
        let features = assemble(&perception, None, None);

        assert_eq!(features.phone_present, 1.0);
        assert_eq!(features.phone_x, 0.7);
        assert_eq!(features.phone_conf, 0.88);
    }
}
