use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::thread;
use std::time::Duration;

use opencv::core::Mat;
use opencv::imgproc;

use crate::camera::CameraSource;
use crate::classify::{format_classifications, Classification, ImageClassifier};
use crate::config::{CameraConfig, ClassifierConfig};

use super::alignment::FrameAligner;
use super::stability::StabilityGate;

const IDLE_RETRY: Duration = Duration::from_millis(500);
const ERROR_RETRY: Duration = Duration::from_secs(5);

/// Shared per-camera view of the scan loop, published for the API.
#[derive(Debug, Default)]
pub struct ScanState {
    pub frames_processed: u64,
    pub stable: bool,
    pub drift: Option<(f64, f64)>,
    pub latest: Vec<Classification>,
    pub summary: Option<String>,
}

struct ScanSession {
    camera_id: String,
    source: CameraSource,
    aligner: FrameAligner,
    gate: StabilityGate,
    classifier: ImageClassifier,
    state: Arc<RwLock<ScanState>>,
}

impl ScanSession {
    fn new(
        config: &CameraConfig,
        classifier: ImageClassifier,
        state: Arc<RwLock<ScanState>>,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let source = CameraSource::open(config)?;

        Ok(Self {
            camera_id: config.id.clone(),
            source,
            aligner: FrameAligner::new(),
            gate: StabilityGate::new(),
            classifier,
            state,
        })
    }

    fn run(mut self, shutdown: Arc<AtomicBool>) {
        tracing::info!(camera = %self.camera_id, "scan session started");

        while !shutdown.load(Ordering::Relaxed) {
            match self.step() {
                Ok(true) => {}
                Ok(false) => {
                    thread::sleep(IDLE_RETRY);
                }
                Err(e) => {
                    tracing::error!(camera = %self.camera_id, error = %e, "scan error");
                    thread::sleep(ERROR_RETRY);
                }
            }
        }

        let frames = self
            .state
            .read()
            .map(|s| s.frames_processed)
            .unwrap_or_default();
        tracing::info!(camera = %self.camera_id, frames, "scan session stopped");
    }

    /// Process one frame. Returns `Ok(false)` when the source had no
    /// frame, which also invalidates the previous-frame reference.
    fn step(&mut self) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        let Some(frame) = self.source.read_frame()? else {
            self.aligner.invalidate();
            self.gate.reset();
            return Ok(false);
        };

        let mut gray = Mat::default();
        imgproc::cvt_color(&frame, &mut gray, imgproc::COLOR_BGR2GRAY, 0)?;

        match self.aligner.track(&gray)? {
            Some(shift) => self.gate.record(shift),
            None => self.gate.reset(),
        }

        let stable = self.gate.is_stable();
        let drift = self.gate.mean_drift().map(|d| (d.x, d.y));

        tracing::trace!(
            camera = %self.camera_id,
            window = self.gate.len(),
            stable,
            "frame tracked"
        );

        // The window is not reset after a trigger, so a stationary scene
        // keeps reclassifying on every frame until new motion appears.
        let results = if stable {
            Some(self.classifier.classify(&frame)?)
        } else {
            None
        };

        let mut state = self.state.write().map_err(|_| "scan state lock poisoned")?;
        state.frames_processed += 1;
        state.stable = stable;
        state.drift = drift;

        if let Some(results) = results {
            let summary = format_classifications(&results);
            tracing::debug!(
                camera = %self.camera_id,
                frame = state.frames_processed,
                result = %summary.replace('\n', "; "),
                "scene classified"
            );
            state.latest = results;
            state.summary = Some(summary);
        }

        Ok(true)
    }
}

pub fn spawn_session(
    camera: CameraConfig,
    classifier: ClassifierConfig,
    state: Arc<RwLock<ScanState>>,
    shutdown: Arc<AtomicBool>,
) -> tokio::task::JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        let classifier = match ImageClassifier::new(&classifier) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(camera = %camera.id, error = %e, "failed to load classifier");
                return;
            }
        };

        match ScanSession::new(&camera, classifier, state) {
            Ok(session) => session.run(shutdown),
            Err(e) => {
                tracing::error!(camera = %camera.id, error = %e, "failed to start scan session");
            }
        }
    })
}
