//! Feature schema shared with the trained model oracles

use serde::{Deserialize, Serialize};

/// Number of columns the oracles were trained on
pub const FEATURE_DIMENSION: usize = 17;

/// Ordered oracle input schema. The order is frozen: reordering or
/// renaming breaks compatibility with the persisted model artifacts.
pub const MODEL_SCHEMA: [&str; FEATURE_DIMENSION] = [
    "face_x",
    "face_y",
    "face_w",
    "face_h",
    "face_conf",
    "eye_gaze_x",
    "eye_gaze_y",
    "head_yaw",
    "head_pitch",
    "head_roll",
    "wrist_left_x",
    "wrist_left_y",
    "wrist_right_x",
    "wrist_right_y",
    "face_count",
    "hand_count",
    "face_present",
];

/// One frame's assembled feature map.
///
/// Carries the oracle schema columns plus the monitored-object features;
/// [`Features::model_row`] selects the oracle columns in schema order.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Features {
    pub face_present: f64,
    pub face_x: f64,
    pub face_y: f64,
    pub face_w: f64,
    pub face_h: f64,
    pub face_conf: f64,
    pub face_count: f64,

    pub hand_count: f64,
    pub wrist_left_x: f64,
    pub wrist_left_y: f64,
    pub wrist_right_x: f64,
    pub wrist_right_y: f64,

    pub head_yaw: f64,
    pub head_pitch: f64,
    pub head_roll: f64,

    pub eye_gaze_x: f64,
    pub eye_gaze_y: f64,

    pub phone_present: f64,
    pub phone_x: f64,
    pub phone_y: f64,
    pub phone_conf: f64,
}

impl Features {
    /// Look up a feature by schema name; unknown names read as 0.
    pub fn value(&self, key: &str) -> f64 {
        match key {
            "face_present" => self.face_present,
            "face_x" => self.face_x,
            "face_y" => self.face_y,
            "face_w" => self.face_w,
            "face_h" => self.face_h,
            "face_conf" => self.face_conf,
            "face_count" => self.face_count,
            "hand_count" => self.hand_count,
            "wrist_left_x" => self.wrist_left_x,
            "wrist_left_y" => self.wrist_left_y,
            "wrist_right_x" => self.wrist_right_x,
            "wrist_right_y" => self.wrist_right_y,
            "head_yaw" => self.head_yaw,
            "head_pitch" => self.head_pitch,
            "head_roll" => self.head_roll,
            "eye_gaze_x" => self.eye_gaze_x,
            "eye_gaze_y" => self.eye_gaze_y,
            "phone_present" => self.phone_present,
            "phone_x" => self.phone_x,
            "phone_y" => self.phone_y,
            "phone_conf" => self.phone_conf,
            _ => 0.0,
        }
    }

    /// The oracle input row, columns in [`MODEL_SCHEMA`] order.
    pub fn model_row(&self) -> [f64; FEATURE_DIMENSION] {
        let mut row = [0.0; FEATURE_DIMENSION];
        for (slot, key) in row.iter_mut().zip(MODEL_SCHEMA) {
            *slot = self.value(key);
        }
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_row_follows_schema_order() {
        let features = Features {
            face_x: 0.1,
            face_present: 1.0,
            eye_gaze_x: 0.7,
            hand_count: 2.0,
            ..Default::default()
        };
        let row = features.model_row();

        assert_eq!(row[0], 0.1); // face_x leads the schema
        assert_eq!(row[5], 0.7); // eye_gaze_x
        assert_eq!(row[15], 2.0); // hand_count
        assert_eq!(row[16], 1.0); // face_present closes the schema
    }

    #[test]
    fn test_phone_features_stay_out_of_model_row() {
        let features = Features {
            phone_present: 1.0,
            phone_conf: 0.99,
            ..Default::default()
        };
        assert_eq!(features.model_row(), [0.0; FEATURE_DIMENSION]);
    }

    #[test]
    fn test_unknown_key_reads_zero() {
        assert_eq!(Features::default().value("no_such_feature"), 0.0);
    }
}
