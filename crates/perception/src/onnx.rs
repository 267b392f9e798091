//! ONNX detector adapters.
//!
//! Each adapter wraps a tract runnable model exported with post-processed
//! outputs (plain rows of boxes or landmark grids), so the adapters only
//! decode tensors into the structured types — detection logic itself lives
//! in the model artifacts.

use crate::types::{FaceBox, FaceMesh, Hand, Handedness, Landmark, ObjectBox};
use crate::{
    FaceDetector, FaceMeshDetector, HandDetector, ObjectDetector, PerceptionError,
    CELL_PHONE_CLASS,
};
use capture::Frame;
use std::path::Path;
use tract_onnx::prelude::*;
use tracing::info;

type RunnableOnnx = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Detection confidence floor shared by all adapters
const MIN_CONFIDENCE: f32 = 0.5;

/// Mesh presence score below which the frame is treated as face-free
const MESH_PRESENCE_THRESHOLD: f32 = 0.5;

/// At most this many faces are reported per frame
const MAX_FACES: usize = 2;

fn load_model<P: AsRef<Path>>(
    path: P,
    input_shape: [usize; 4],
) -> Result<RunnableOnnx, PerceptionError> {
    let path = path.as_ref();
    info!(model = %path.display(), "loading perception model");
    tract_onnx::onnx()
        .model_for_path(path)
        .and_then(|m| m.with_input_fact(0, f32::fact(input_shape).into()))
        .and_then(|m| m.into_optimized())
        .and_then(|m| m.into_runnable())
        .map_err(|e| PerceptionError::ModelLoad(format!("{}: {e}", path.display())))
}

/// Resize a frame and pack it into an NCHW float tensor.
///
/// `zero_centered` selects `[-1,1]` normalization (short-range face
/// detectors) over plain `[0,1]`.
fn input_tensor(
    frame: &Frame,
    width: u32,
    height: u32,
    zero_centered: bool,
) -> Result<Tensor, PerceptionError> {
    let img = frame.to_rgb_image().ok_or_else(|| {
        PerceptionError::ImageProcessing("frame buffer does not match dimensions".into())
    })?;
    let resized =
        image::imageops::resize(&img, width, height, image::imageops::FilterType::Triangle);

    let tensor = tract_ndarray::Array4::from_shape_fn(
        (1, 3, height as usize, width as usize),
        |(_, c, y, x)| {
            let v = f32::from(resized.get_pixel(x as u32, y as u32)[c]);
            if zero_centered {
                v / 127.5 - 1.0
            } else {
                v / 255.0
            }
        },
    );
    Ok(tensor.into())
}

fn run(model: &RunnableOnnx, input: Tensor) -> Result<TVec<TValue>, PerceptionError> {
    model
        .run(tvec!(input.into()))
        .map_err(|e| PerceptionError::Inference(e.to_string()))
}

/// Collect an output tensor into rows of `stride` floats.
fn output_rows(value: &TValue, stride: usize) -> Result<Vec<Vec<f64>>, PerceptionError> {
    let view = value
        .to_array_view::<f32>()
        .map_err(|e| PerceptionError::Inference(e.to_string()))?;
    let flat: Vec<f64> = view.iter().map(|&v| f64::from(v)).collect();
    Ok(flat.chunks_exact(stride).map(<[f64]>::to_vec).collect())
}

/// Face box detector.
///
/// Expects `[n,5]` rows of `(x, y, w, h, confidence)`, normalized with a
/// top-left origin.
pub struct OnnxFaceDetector {
    model: RunnableOnnx,
}

impl OnnxFaceDetector {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, PerceptionError> {
        Ok(Self {
            model: load_model(path, [1, 3, 128, 128])?,
        })
    }
}

impl FaceDetector for OnnxFaceDetector {
    fn detect_faces(&self, frame: &Frame) -> Result<Vec<FaceBox>, PerceptionError> {
        let outputs = run(&self.model, input_tensor(frame, 128, 128, true)?)?;
        let faces = output_rows(&outputs[0], 5)?
            .into_iter()
            .filter(|row| row[4] >= f64::from(MIN_CONFIDENCE))
            .take(MAX_FACES)
            .map(|row| FaceBox {
                x: row[0],
                y: row[1],
                w: row[2],
                h: row[3],
                confidence: row[4],
            })
            .collect();
        Ok(faces)
    }
}

/// Dense face-mesh detector.
///
/// Expects normalized `(x, y, z)` landmark triples as the first output and
/// an optional presence score as the second.
pub struct OnnxFaceMesh {
    model: RunnableOnnx,
}

impl OnnxFaceMesh {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, PerceptionError> {
        Ok(Self {
            model: load_model(path, [1, 3, 192, 192])?,
        })
    }
}

impl FaceMeshDetector for OnnxFaceMesh {
    fn detect_mesh(&self, frame: &Frame) -> Result<Option<FaceMesh>, PerceptionError> {
        let outputs = run(&self.model, input_tensor(frame, 192, 192, false)?)?;

        if let Some(score) = outputs.get(1) {
            let view = score
                .to_array_view::<f32>()
                .map_err(|e| PerceptionError::Inference(e.to_string()))?;
            if view.iter().next().copied().unwrap_or(0.0) < MESH_PRESENCE_THRESHOLD {
                return Ok(None);
            }
        }

        let landmarks: Vec<Landmark> = output_rows(&outputs[0], 3)?
            .into_iter()
            .map(|row| Landmark::new(row[0], row[1], row[2]))
            .collect();

        if landmarks.is_empty() {
            return Ok(None);
        }
        Ok(Some(FaceMesh::new(landmarks)))
    }
}

/// Hand landmark detector.
///
/// Expects `[n,65]` rows: score, handedness score (< 0.5 left, otherwise
/// right), then 21 normalized `(x, y, z)` landmark triples with the wrist
/// first.
pub struct OnnxHandDetector {
    model: RunnableOnnx,
}

impl OnnxHandDetector {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, PerceptionError> {
        Ok(Self {
            model: load_model(path, [1, 3, 224, 224])?,
        })
    }
}

impl HandDetector for OnnxHandDetector {
    fn detect_hands(&self, frame: &Frame) -> Result<Vec<Hand>, PerceptionError> {
        let outputs = run(&self.model, input_tensor(frame, 224, 224, false)?)?;
        let hands = output_rows(&outputs[0], 65)?
            .into_iter()
            .filter(|row| row[0] >= f64::from(MIN_CONFIDENCE))
            .map(|row| {
                let handedness = if row[1] < 0.5 {
                    Handedness::Left
                } else {
                    Handedness::Right
                };
                let landmarks = row[2..]
                    .chunks_exact(3)
                    .map(|lm| Landmark::new(lm[0], lm[1], lm[2]))
                    .collect();
                Hand {
                    handedness,
                    landmarks,
                }
            })
            .collect();
        Ok(hands)
    }
}

/// Object detector for the monitored class.
///
/// Expects `[n,6]` rows of `(cx, cy, w, h, confidence, class)` in
/// input-pixel scale; the adapter normalizes coordinates to `[0,1]`.
pub struct OnnxObjectDetector {
    model: RunnableOnnx,
    target_class: usize,
}

const OBJECT_INPUT: u32 = 640;

impl OnnxObjectDetector {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, PerceptionError> {
        Self::with_target_class(path, CELL_PHONE_CLASS)
    }

    pub fn with_target_class<P: AsRef<Path>>(
        path: P,
        target_class: usize,
    ) -> Result<Self, PerceptionError> {
        Ok(Self {
            model: load_model(
                path,
                [1, 3, OBJECT_INPUT as usize, OBJECT_INPUT as usize],
            )?,
            target_class,
        })
    }
}

impl ObjectDetector for OnnxObjectDetector {
    fn detect_objects(&self, frame: &Frame) -> Result<Vec<ObjectBox>, PerceptionError> {
        let outputs = run(
            &self.model,
            input_tensor(frame, OBJECT_INPUT, OBJECT_INPUT, false)?,
        )?;
        let scale = f64::from(OBJECT_INPUT);
        let objects = output_rows(&outputs[0], 6)?
            .into_iter()
            .filter(|row| {
                row[4] >= f64::from(MIN_CONFIDENCE) && row[5] as usize == self.target_class
            })
            .map(|row| ObjectBox {
                x: row[0] / scale,
                y: row[1] / scale,
                w: row[2] / scale,
                h: row[3] / scale,
                confidence: row[4],
            })
            .collect();
        Ok(objects)
    }
}
