//! Monitoring Session
//!
//! Owns the live-monitoring lifecycle: a session value with explicit
//! start/stop, a cancellable background sampling worker, and the frame
//! pipelines shared with the single-shot protocol operations.
//!
//! One worker exists per running session at most. Cancellation is
//! cooperative: the worker checks a shared stop flag once per loop
//! iteration, and `stop()` blocks until the worker has fully exited, so a
//! following `start()` can never race a draining worker for the capture
//! device.

pub mod controller;
pub mod events;
pub mod pipeline;

#[cfg(test)]
pub(crate) mod testutil;

pub use controller::{SessionConfig, SessionController, SessionState};
pub use events::{MonitorEvent, MonitoringData, MonitoringScores};
pub use pipeline::{FeaturePipeline, MonitorPipeline};

use capture::CaptureError;
use thiserror::Error;

/// Session error types
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Capture device unavailable: {0}")]
    Device(#[from] CaptureError),
}
