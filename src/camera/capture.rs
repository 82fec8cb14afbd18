use opencv::{
    core::Mat,
    prelude::*,
    videoio::{self, VideoCapture},
    Result as CvResult,
};

use crate::config::CameraConfig;

/// Frame source backed by an OpenCV capture. The configured source is
/// either a device index ("0") or a stream URL / file path.
pub struct CameraSource {
    capture: VideoCapture,
}

impl CameraSource {
    pub fn open(config: &CameraConfig) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let capture = match config.source.parse::<i32>() {
            Ok(index) => VideoCapture::new(index, videoio::CAP_ANY)?,
            Err(_) => VideoCapture::from_file(&config.source, videoio::CAP_ANY)?,
        };

        if !capture.is_opened()? {
            return Err(format!("failed to open camera source '{}'", config.source).into());
        }

        tracing::info!(camera = %config.id, source = %config.source, "camera source opened");

        Ok(Self { capture })
    }

    /// Read the next BGR frame. `None` means the source produced no
    /// frame (end of stream or a stalled capture).
    pub fn read_frame(&mut self) -> CvResult<Option<Mat>> {
        let mut frame = Mat::default();
        if !self.capture.read(&mut frame)? || frame.empty() {
            return Ok(None);
        }
        Ok(Some(frame))
    }
}
