//! Session lifecycle controller.
//!
//! An owned state machine over `{Idle, Running, Stopping}` with
//! idempotent `start`/`stop`. The background worker owns the capture
//! device for the whole `Running` state and releases it on every exit
//! path; `stop()` joins the worker before returning, which keeps the
//! worker count at zero-or-one and makes a subsequent `start()` safe.

use crate::events::{unix_timestamp, MonitorEvent, MonitoringScores};
use crate::pipeline::MonitorPipeline;
use crate::SessionError;
use capture::{FrameSource, SourceFactory};
use geometry::GazeConfig;
use perception::PerceptionStack;
use scoring::EnsembleScorer;
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Sampling configuration for the monitoring loop
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Target sampling rate in frames per second
    pub fps: f64,
    /// Samples per aggregated scoring window
    pub window_size: usize,
    /// Smoothing decay for the pose/gaze streams
    pub alpha: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            fps: 5.0,
            window_size: 10,
            alpha: geometry::DEFAULT_ALPHA,
        }
    }
}

/// Session lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running,
    Stopping,
}

/// Owns one monitoring session: at most one live worker and one open
/// capture device at any instant.
pub struct SessionController {
    state: SessionState,
    stop_flag: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
    source_factory: Arc<dyn SourceFactory>,
    perception: PerceptionStack,
    gaze_config: GazeConfig,
    scorer: EnsembleScorer,
    config: SessionConfig,
    events: UnboundedSender<MonitorEvent>,
}

impl SessionController {
    pub fn new(
        source_factory: Arc<dyn SourceFactory>,
        perception: PerceptionStack,
        gaze_config: GazeConfig,
        scorer: EnsembleScorer,
        config: SessionConfig,
        events: UnboundedSender<MonitorEvent>,
    ) -> Self {
        Self {
            state: SessionState::Idle,
            stop_flag: Arc::new(AtomicBool::new(false)),
            worker: None,
            source_factory,
            perception,
            gaze_config,
            scorer,
            config,
            events,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }

    /// Start the background sampling worker.
    ///
    /// A no-op while already running. Opening the capture device is the
    /// only fallible step; its failure is fatal for this start attempt and
    /// is never retried internally.
    pub fn start(&mut self) -> Result<(), SessionError> {
        if self.state == SessionState::Running {
            debug!("start requested while already running, ignoring");
            return Ok(());
        }

        let source = self.source_factory.open()?;

        // Fresh pipeline per session: smoother state never survives a stop
        let pipeline = MonitorPipeline::new(
            self.perception.clone(),
            self.gaze_config,
            self.scorer.clone(),
            self.config.window_size,
            self.config.alpha,
        );

        let stop_flag = Arc::new(AtomicBool::new(false));
        let period = Duration::from_secs_f64(1.0 / self.config.fps.max(0.1));
        let events = self.events.clone();

        let worker_flag = Arc::clone(&stop_flag);
        let handle = tokio::task::spawn_blocking(move || {
            worker_loop(source, pipeline, events, worker_flag, period);
        });

        self.stop_flag = stop_flag;
        self.worker = Some(handle);
        self.state = SessionState::Running;
        info!(fps = self.config.fps, window = self.config.window_size, "monitoring started");
        Ok(())
    }

    /// Stop the worker and block until it has fully exited.
    ///
    /// A no-op while idle. The in-flight loop iteration completes before
    /// the flag is honored; once this returns, the capture device is
    /// closed and the session can be started again.
    pub async fn stop(&mut self) {
        if self.state == SessionState::Idle {
            debug!("stop requested while idle, ignoring");
            return;
        }

        self.state = SessionState::Stopping;
        self.stop_flag.store(true, Ordering::Release);

        if let Some(handle) = self.worker.take() {
            if let Err(e) = handle.await {
                warn!("monitoring worker terminated abnormally: {e}");
            }
        }

        self.state = SessionState::Idle;
        info!("monitoring stopped");
    }
}

/// The sampling loop. Owns the capture device; dropping `source` on any
/// exit path releases it.
fn worker_loop(
    mut source: Box<dyn FrameSource>,
    mut pipeline: MonitorPipeline,
    events: UnboundedSender<MonitorEvent>,
    stop_flag: Arc<AtomicBool>,
    period: Duration,
) {
    info!("monitoring worker entering sampling loop");

    while !stop_flag.load(Ordering::Acquire) {
        let tick = Instant::now();

        match source.read_frame() {
            Ok(frame) => match pipeline.process(&frame) {
                Ok((data, scores)) => {
                    if let Some(data) = data {
                        let _ = events.send(MonitorEvent::MonitoringData(data));
                    }
                    if let Some(scores) = scores {
                        let _ = events.send(MonitorEvent::MonitoringScores(MonitoringScores {
                            scores,
                            timestamp: unix_timestamp(),
                        }));
                    }
                }
                Err(e) => warn!("frame pipeline failed, skipping frame: {e}"),
            },
            // Transient read failure: stay in the loop, next iteration retries
            Err(e) => {
                warn!("frame read failed: {e}");
                std::thread::sleep(Duration::from_millis(100));
            }
        }

        // Self-pacing: no catch-up when processing overruns the period
        if let Some(remaining) = period.checked_sub(tick.elapsed()) {
            std::thread::sleep(remaining);
        }
    }

    info!("monitoring worker exited");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{constant_scorer, disabled_stack, frame};
    use capture::{CaptureError, Frame};
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::mpsc;

    /// Frame source counting opens and reads
    struct CountingSource {
        reads: Arc<AtomicUsize>,
    }

    impl FrameSource for CountingSource {
        fn read_frame(&mut self) -> Result<Frame, CaptureError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(frame())
        }
    }

    struct CountingFactory {
        opens: Arc<AtomicUsize>,
        reads: Arc<AtomicUsize>,
    }

    impl SourceFactory for CountingFactory {
        fn open(&self) -> Result<Box<dyn FrameSource>, CaptureError> {
            self.opens.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(CountingSource {
                reads: Arc::clone(&self.reads),
            }))
        }
    }

    struct BrokenFactory;

    impl SourceFactory for BrokenFactory {
        fn open(&self) -> Result<Box<dyn FrameSource>, CaptureError> {
            Err(CaptureError::Open("no such device".into()))
        }
    }

    fn controller(
        factory: Arc<dyn SourceFactory>,
        config: SessionConfig,
    ) -> (SessionController, mpsc::UnboundedReceiver<MonitorEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            SessionController::new(
                factory,
                disabled_stack(),
                GazeConfig::default(),
                constant_scorer(),
                config,
                tx,
            ),
            rx,
        )
    }

    fn fast_config() -> SessionConfig {
        SessionConfig {
            fps: 200.0,
            window_size: 3,
            alpha: 0.35,
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_start_is_idempotent() {
        let opens = Arc::new(AtomicUsize::new(0));
        let reads = Arc::new(AtomicUsize::new(0));
        let factory = Arc::new(CountingFactory {
            opens: Arc::clone(&opens),
            reads: Arc::clone(&reads),
        });
        let (mut session, _rx) = controller(factory, fast_config());

        session.start().unwrap();
        session.start().unwrap();
        session.start().unwrap();

        // One device handle despite repeated starts
        assert_eq!(opens.load(Ordering::SeqCst), 1);
        assert!(session.is_running());

        session.stop().await;
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_stop_then_start_reopens_device() {
        let opens = Arc::new(AtomicUsize::new(0));
        let reads = Arc::new(AtomicUsize::new(0));
        let factory = Arc::new(CountingFactory {
            opens: Arc::clone(&opens),
            reads: Arc::clone(&reads),
        });
        let (mut session, _rx) = controller(factory, fast_config());

        session.start().unwrap();
        session.stop().await;

        // Device was released; a fresh start opens it again
        session.start().unwrap();
        session.stop().await;
        assert_eq!(opens.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_stop_while_idle_is_noop() {
        let factory = Arc::new(CountingFactory {
            opens: Arc::new(AtomicUsize::new(0)),
            reads: Arc::new(AtomicUsize::new(0)),
        });
        let (mut session, _rx) = controller(factory, fast_config());

        session.stop().await;
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_device_failure_is_fatal_for_start() {
        let (mut session, _rx) = controller(Arc::new(BrokenFactory), fast_config());

        assert!(session.start().is_err());
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_window_scores_are_emitted() {
        let factory = Arc::new(CountingFactory {
            opens: Arc::new(AtomicUsize::new(0)),
            reads: Arc::new(AtomicUsize::new(0)),
        });
        let (mut session, mut rx) = controller(factory, fast_config());

        session.start().unwrap();

        // window_size=3 at 200fps: a scores event lands well within a second
        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for a monitoring event")
            .expect("event channel closed");

        match event {
            MonitorEvent::MonitoringScores(scores) => {
                // Constant oracles score 1.0 -> integrity 1.0
                assert!((scores.scores.integrity_score - 1.0).abs() < 1e-9);
            }
            MonitorEvent::MonitoringData(_) => {
                panic!("disabled mesh should not produce monitoring_data")
            }
        }

        session.stop().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_worker_reads_frames_until_stopped() {
        let opens = Arc::new(AtomicUsize::new(0));
        let reads = Arc::new(AtomicUsize::new(0));
        let factory = Arc::new(CountingFactory {
            opens: Arc::clone(&opens),
            reads: Arc::clone(&reads),
        });
        let (mut session, _rx) = controller(factory, fast_config());

        session.start().unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        session.stop().await;

        let after_stop = reads.load(Ordering::SeqCst);
        assert!(after_stop > 0, "worker never read a frame");

        // Joined worker reads nothing further
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(reads.load(Ordering::SeqCst), after_stop);
    }
}
