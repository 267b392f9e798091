//! Decoded frame type and wire-format decoding

use crate::CaptureError;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::RgbImage;
use std::path::Path;

/// Decoded RGB video frame
#[derive(Debug, Clone)]
pub struct Frame {
    /// RGB pixel data (width * height * 3)
    pub data: Vec<u8>,
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
}

impl Frame {
    /// Create a new frame from raw RGB data
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            data,
            width,
            height,
        }
    }

    /// Decode an encoded image buffer (JPEG/PNG) into an RGB frame
    pub fn decode(bytes: &[u8]) -> Result<Self, CaptureError> {
        let img = image::load_from_memory(bytes)
            .map_err(|e| CaptureError::Decode(e.to_string()))?;
        Ok(Self::from(img.to_rgb8()))
    }

    /// Decode a base64 frame payload as produced by `canvas.toDataURL()`.
    ///
    /// The `data:...,` header is optional and stripped before decoding.
    pub fn from_data_url(payload: &str) -> Result<Self, CaptureError> {
        let encoded = match payload.split_once(',') {
            Some((_, body)) => body,
            None => payload,
        };
        let bytes = BASE64
            .decode(encoded.trim())
            .map_err(|e| CaptureError::Decode(format!("invalid base64: {e}")))?;
        Self::decode(&bytes)
    }

    /// Load a frame from an image file on disk
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CaptureError> {
        let img = image::open(path.as_ref()).map_err(|e| {
            CaptureError::Decode(format!("{}: {e}", path.as_ref().display()))
        })?;
        Ok(Self::from(img.to_rgb8()))
    }

    /// View the frame as an `image` buffer for resizing/cropping.
    /// Returns `None` if the byte length does not match the dimensions.
    pub fn to_rgb_image(&self) -> Option<RgbImage> {
        RgbImage::from_raw(self.width, self.height, self.data.clone())
    }
}

impl From<RgbImage> for Frame {
    fn from(img: RgbImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            data: img.into_raw(),
            width,
            height,
        }
    }
}

/// Convert a packed YUYV 4:2:2 buffer to RGB.
///
/// Each 4-byte group encodes two pixels sharing one chroma pair.
pub fn yuyv_to_rgb(buf: &[u8], width: u32, height: u32) -> Result<Vec<u8>, CaptureError> {
    let pixels = (width * height) as usize;
    if buf.len() < pixels * 2 {
        return Err(CaptureError::Read(format!(
            "YUYV buffer too short: expected {}, got {}",
            pixels * 2,
            buf.len()
        )));
    }

    let mut rgb = Vec::with_capacity(pixels * 3);
    for chunk in buf[..pixels * 2].chunks_exact(4) {
        let y0 = chunk[0] as f32;
        let u = chunk[1] as f32 - 128.0;
        let y1 = chunk[2] as f32;
        let v = chunk[3] as f32 - 128.0;

        for y in [y0, y1] {
            let r = (y + 1.402 * v).clamp(0.0, 255.0) as u8;
            let g = (y - 0.344 * u - 0.714 * v).clamp(0.0, 255.0) as u8;
            let b = (y + 1.772 * u).clamp(0.0, 255.0) as u8;
            rgb.extend_from_slice(&[r, g, b]);
        }
    }
    Ok(rgb)
}
