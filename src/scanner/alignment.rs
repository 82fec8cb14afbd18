use opencv::{
    core::{no_array, Mat, CV_32F},
    imgproc,
    prelude::*,
    Result as CvResult,
};

use super::stability::Displacement;

/// Estimates the translation between consecutive frames via phase
/// correlation, keeping the previous frame as the reference.
pub struct FrameAligner {
    previous: Option<Mat>,
}

impl FrameAligner {
    pub fn new() -> Self {
        Self { previous: None }
    }

    /// Feed the next grayscale frame. Returns `None` when there is no
    /// previous frame to align against (session start or after
    /// `invalidate`) — the caller should reset its stability window.
    pub fn track(&mut self, gray: &Mat) -> CvResult<Option<Displacement>> {
        let mut current = Mat::default();
        gray.convert_to(&mut current, CV_32F, 1.0, 0.0)?;

        let Some(previous) = self.previous.take() else {
            self.previous = Some(current);
            return Ok(None);
        };

        let mut response = 0.0;
        let shift = imgproc::phase_correlate(&previous, &current, &no_array(), &mut response)?;
        self.previous = Some(current);

        Ok(Some(Displacement::new(shift.x, shift.y)))
    }

    /// Drop the previous-frame reference after a stream discontinuity.
    pub fn invalidate(&mut self) {
        self.previous = None;
    }
}
