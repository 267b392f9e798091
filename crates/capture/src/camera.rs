//! V4L2 webcam capture via the `v4l` crate

use crate::frame::{yuyv_to_rgb, Frame};
use crate::{CaptureError, FrameSource, SourceFactory};
use serde::Deserialize;
use std::path::Path;
use tracing::info;
use v4l::buffer::Type as BufType;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;
use v4l::FourCC;

/// Camera configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Device path (e.g., "/dev/video0")
    pub device: String,
    /// Requested capture width
    pub width: u32,
    /// Requested capture height
    pub height: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device: "/dev/video0".to_string(),
            width: 640,
            height: 480,
        }
    }
}

impl SourceFactory for CameraConfig {
    fn open(&self) -> Result<Box<dyn FrameSource>, CaptureError> {
        Ok(Box::new(V4lCamera::open(self)?))
    }
}

/// Negotiated pixel format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PixelFormat {
    Rgb24,
    Yuyv,
}

/// V4L2 camera device handle
pub struct V4lCamera {
    device: Device,
    width: u32,
    height: u32,
    pixel_format: PixelFormat,
}

impl V4lCamera {
    /// Open and configure a V4L2 capture device.
    ///
    /// Requests RGB3 and accepts a YUYV fallback; anything else is a
    /// format negotiation failure.
    pub fn open(config: &CameraConfig) -> Result<Self, CaptureError> {
        if !Path::new(&config.device).exists() {
            return Err(CaptureError::Open(format!(
                "device not found: {}",
                config.device
            )));
        }

        let device = Device::with_path(&config.device)
            .map_err(|e| CaptureError::Open(format!("{}: {e}", config.device)))?;

        let caps = device
            .query_caps()
            .map_err(|e| CaptureError::Open(format!("failed to query capabilities: {e}")))?;
        if !caps
            .capabilities
            .contains(v4l::capability::Flags::VIDEO_CAPTURE)
        {
            return Err(CaptureError::Open("not a video capture device".into()));
        }

        let mut fmt = device
            .format()
            .map_err(|e| CaptureError::Format(format!("failed to get format: {e}")))?;
        fmt.fourcc = FourCC::new(b"RGB3");
        fmt.width = config.width;
        fmt.height = config.height;

        let negotiated = device
            .set_format(&fmt)
            .map_err(|e| CaptureError::Format(format!("failed to set format: {e}")))?;

        let pixel_format = if negotiated.fourcc == FourCC::new(b"RGB3") {
            PixelFormat::Rgb24
        } else if negotiated.fourcc == FourCC::new(b"YUYV") {
            PixelFormat::Yuyv
        } else {
            return Err(CaptureError::Format(format!(
                "unsupported pixel format: {} (need RGB3 or YUYV)",
                negotiated.fourcc
            )));
        };

        info!(
            device = %config.device,
            driver = %caps.driver,
            width = negotiated.width,
            height = negotiated.height,
            fourcc = %negotiated.fourcc,
            "opened camera"
        );

        Ok(Self {
            device,
            width: negotiated.width,
            height: negotiated.height,
            pixel_format,
        })
    }
}

impl FrameSource for V4lCamera {
    fn read_frame(&mut self) -> Result<Frame, CaptureError> {
        let mut stream = MmapStream::with_buffers(&self.device, BufType::VideoCapture, 4)
            .map_err(|e| CaptureError::Read(format!("failed to create mmap stream: {e}")))?;

        let (buf, _meta) = stream
            .next()
            .map_err(|e| CaptureError::Read(format!("failed to dequeue buffer: {e}")))?;

        let pixels = (self.width * self.height) as usize;
        let data = match self.pixel_format {
            PixelFormat::Rgb24 => {
                if buf.len() < pixels * 3 {
                    return Err(CaptureError::Read(format!(
                        "RGB3 buffer too short: expected {}, got {}",
                        pixels * 3,
                        buf.len()
                    )));
                }
                buf[..pixels * 3].to_vec()
            }
            PixelFormat::Yuyv => yuyv_to_rgb(buf, self.width, self.height)?,
        };

        Ok(Frame::new(data, self.width, self.height))
    }
}
