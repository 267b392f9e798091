//! Frame Acquisition
//!
//! Provides the decoded RGB frame type shared by the whole pipeline and
//! the two ways frames enter the system:
//! - live capture from a V4L2 webcam (monitoring sessions)
//! - decoding of base64 data-URL payloads or image files sent by the
//!   host process over the control protocol

pub mod camera;
pub mod frame;

pub use camera::{CameraConfig, V4lCamera};
pub use frame::Frame;

use thiserror::Error;

/// Capture error types
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Failed to open capture device: {0}")]
    Open(String),

    #[error("Format negotiation failed: {0}")]
    Format(String),

    #[error("Frame read failed: {0}")]
    Read(String),

    #[error("Frame decode failed: {0}")]
    Decode(String),
}

/// A source of decoded RGB frames.
///
/// Implementations are owned exclusively by the monitoring worker while a
/// session is running; dropping the source releases the device.
pub trait FrameSource: Send {
    /// Read the next frame. A transient failure is reported as
    /// [`CaptureError::Read`]; callers decide whether to retry.
    fn read_frame(&mut self) -> Result<Frame, CaptureError>;
}

/// Opens a [`FrameSource`].
///
/// The session controller holds a factory rather than a live device so
/// that every `start()` opens the device fresh and every `stop()` fully
/// releases it.
pub trait SourceFactory: Send + Sync {
    fn open(&self) -> Result<Box<dyn FrameSource>, CaptureError>;
}
