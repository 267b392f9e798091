//! Host Bridge
//!
//! Newline-delimited JSON request/response protocol over stdin/stdout,
//! plus the wiring that assembles the pipeline from configuration. The
//! main task reads and dispatches one request line at a time while the
//! monitoring worker emits events concurrently; all outbound lines are
//! serialized through one writer task. Logging goes to stderr — stdout
//! carries the wire protocol.

pub mod config;
pub mod protocol;

pub use crate::config::{BridgeConfig, ModelPaths};

use crate::protocol::Request;
use anyhow::Context;
use capture::Frame;
use feature_vector::{Features, FEATURE_DIMENSION};
use perception::{
    Disabled, FaceDetector, FaceMeshDetector, HandDetector, ObjectDetector, OnnxFaceDetector,
    OnnxFaceMesh, OnnxHandDetector, OnnxObjectDetector, PerceptionStack,
};
use scoring::{EnsembleScorer, OnnxAnomalyDetector, OnnxClassifier};
use serde_json::Value;
use session::{FeaturePipeline, MonitorEvent, SessionController};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Initialize logging to stderr (stdout is the protocol stream)
pub fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

/// Protocol dispatcher state: the single-shot pipeline, the scorer, and
/// the owned monitoring session
pub struct Bridge {
    pipeline: FeaturePipeline,
    scorer: EnsembleScorer,
    session: SessionController,
}

impl Bridge {
    pub fn new(
        pipeline: FeaturePipeline,
        scorer: EnsembleScorer,
        session: SessionController,
    ) -> Self {
        Self {
            pipeline,
            scorer,
            session,
        }
    }

    /// Assemble the full pipeline from configuration. Scoring oracles are
    /// mandatory; unconfigured detectors degrade to absence.
    pub fn from_config(
        config: &BridgeConfig,
    ) -> anyhow::Result<(Self, UnboundedReceiver<MonitorEvent>)> {
        let stack = build_stack(&config.models)?;

        let classifier = OnnxClassifier::from_path(&config.models.classifier)
            .context("loading classifier oracle")?;
        let anomaly = OnnxAnomalyDetector::from_path(&config.models.anomaly)
            .context("loading anomaly oracle")?;
        let scorer = EnsembleScorer::new(Arc::new(classifier), Arc::new(anomaly));

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let session = SessionController::new(
            Arc::new(config.camera.clone()),
            stack.clone(),
            config.gaze,
            scorer.clone(),
            config.session,
            events_tx,
        );

        let pipeline = FeaturePipeline::new(stack, config.gaze);
        Ok((Self::new(pipeline, scorer, session), events_rx))
    }

    /// Handle one input line; `None` for blank lines.
    ///
    /// Every failure path becomes an error envelope — a bad line never
    /// terminates the dispatcher.
    pub async fn handle_line(&mut self, line: &str) -> Option<Value> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => return Some(protocol::error(format!("invalid JSON: {e}"), None)),
        };
        let correlation = value.get("correlationId").cloned();
        let correlation = correlation.as_ref();

        let request = match protocol::parse_request(&value) {
            Ok(request) => request,
            Err(message) => return Some(protocol::error(message, correlation)),
        };

        let response = match self.dispatch(request).await {
            Ok((kind, Some(data))) => protocol::ok(kind, data, correlation),
            Ok((kind, None)) => protocol::ack(kind, correlation),
            Err(message) => protocol::error(message, correlation),
        };
        Some(response)
    }

    async fn dispatch(
        &mut self,
        request: Request,
    ) -> Result<(&'static str, Option<Value>), String> {
        match request {
            Request::Ping => Ok(("pong", None)),

            Request::StartMonitoring => {
                self.session.start().map_err(|e| e.to_string())?;
                Ok(("monitoring_started", None))
            }

            Request::StopMonitoring => {
                self.session.stop().await;
                Ok(("monitoring_stopped", None))
            }

            Request::ExtractFeatures { frames } => {
                let features = self.features_from_payloads(&frames)?;
                let data = serde_json::to_value(features).map_err(|e| e.to_string())?;
                Ok(("features", Some(data)))
            }

            Request::ExtractScoresFromFrames { frames } => {
                let features = self.features_from_payloads(&frames)?;
                Ok(("scores", Some(self.score(&features)?)))
            }

            Request::ExtractScoresFromPaths { paths } => {
                let features = self.features_from_paths(&paths)?;
                Ok(("scores", Some(self.score(&features)?)))
            }

            Request::DetectPhoneFromFrames { frames } => {
                let mut present = false;
                for payload in &frames {
                    let frame = Frame::from_data_url(payload).map_err(|e| e.to_string())?;
                    if self.pipeline.object_present(&frame).map_err(|e| e.to_string())? {
                        present = true;
                        break;
                    }
                }
                Ok(("phone", Some(phone_payload(present))))
            }

            Request::DetectPhoneFromPaths { paths } => {
                let mut present = false;
                for path in &paths {
                    let frame = Frame::open(path).map_err(|e| e.to_string())?;
                    if self.pipeline.object_present(&frame).map_err(|e| e.to_string())? {
                        present = true;
                        break;
                    }
                }
                Ok(("phone", Some(phone_payload(present))))
            }
        }
    }

    fn features_from_payloads(&self, frames: &[String]) -> Result<Vec<Features>, String> {
        frames
            .iter()
            .map(|payload| {
                let frame = Frame::from_data_url(payload).map_err(|e| e.to_string())?;
                self.pipeline.extract(&frame).map_err(|e| e.to_string())
            })
            .collect()
    }

    fn features_from_paths(&self, paths: &[String]) -> Result<Vec<Features>, String> {
        paths
            .iter()
            .map(|path| {
                let frame = Frame::open(path).map_err(|e| e.to_string())?;
                self.pipeline.extract(&frame).map_err(|e| e.to_string())
            })
            .collect()
    }

    fn score(&self, features: &[Features]) -> Result<Value, String> {
        let rows: Vec<[f64; FEATURE_DIMENSION]> =
            features.iter().map(Features::model_row).collect();
        serde_json::to_value(self.scorer.score(&rows)).map_err(|e| e.to_string())
    }

    /// Stop any running session; used on shutdown so the device is
    /// released before the process exits.
    pub async fn shutdown(&mut self) {
        self.session.stop().await;
    }
}

fn phone_payload(present: bool) -> Value {
    serde_json::json!({ "is_phone_present": present })
}

fn build_stack(models: &ModelPaths) -> anyhow::Result<PerceptionStack> {
    let faces: Arc<dyn FaceDetector> = match &models.face {
        Some(path) => Arc::new(OnnxFaceDetector::from_path(path).context("loading face model")?),
        None => {
            warn!("no face model configured, face detection disabled");
            Arc::new(Disabled)
        }
    };
    let mesh: Arc<dyn FaceMeshDetector> = match &models.face_mesh {
        Some(path) => {
            Arc::new(OnnxFaceMesh::from_path(path).context("loading face-mesh model")?)
        }
        None => {
            warn!("no face-mesh model configured, pose/gaze derivation disabled");
            Arc::new(Disabled)
        }
    };
    let hands: Arc<dyn HandDetector> = match &models.hands {
        Some(path) => Arc::new(OnnxHandDetector::from_path(path).context("loading hand model")?),
        None => {
            warn!("no hand model configured, hand detection disabled");
            Arc::new(Disabled)
        }
    };
    let objects: Arc<dyn ObjectDetector> = match &models.objects {
        Some(path) => {
            Arc::new(OnnxObjectDetector::from_path(path).context("loading object model")?)
        }
        None => {
            warn!("no object model configured, phone detection disabled");
            Arc::new(Disabled)
        }
    };

    Ok(PerceptionStack {
        faces,
        mesh,
        hands,
        objects,
    })
}

/// Run the bridge: pump monitoring events and request responses through
/// one stdout writer, reading requests line by line until stdin closes.
pub async fn run_bridge(
    mut bridge: Bridge,
    mut events: UnboundedReceiver<MonitorEvent>,
) -> anyhow::Result<()> {
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();

    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(line) = out_rx.recv().await {
            if stdout.write_all(line.as_bytes()).await.is_err()
                || stdout.write_all(b"\n").await.is_err()
                || stdout.flush().await.is_err()
            {
                break;
            }
        }
    });

    let event_tx = out_tx.clone();
    let pump = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match serde_json::to_string(&event) {
                Ok(line) => {
                    if event_tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => warn!("failed to serialize monitoring event: {e}"),
            }
        }
    });

    // Announce readiness before accepting requests
    out_tx.send(serde_json::json!({ "type": "ready" }).to_string())?;
    info!("bridge ready, reading requests");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if let Some(response) = bridge.handle_line(&line).await {
            out_tx.send(response.to_string())?;
        }
    }

    info!("stdin closed, shutting down");
    bridge.shutdown().await;
    pump.abort();
    drop(out_tx);
    let _ = writer.await;
    Ok(())
}
