//! Test fixtures shared across the workspace.
//!
//! These helpers compile into the library (not behind `cfg(test)`) so
//! integration tests in downstream crates can use them without duplication.

use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use image::{Rgb, RgbImage};
use nokhwa::NokhwaError;

use crate::{
    config::CameraSettings,
    webcam::{CameraError, CameraProvider, FrameSource},
};

/// Build a solid-color RGB image.
pub fn solid_rgb_image(width: u32, height: u32, color: [u8; 3]) -> RgbImage {
    RgbImage::from_pixel(width, height, Rgb(color))
}

/// Scripted [`CameraProvider`] for exercising capture flows without hardware.
///
/// Each opened source yields a fixed number of copies of one frame, then
/// fails like a disconnected device. The provider counts opens and releases
/// so tests can assert that no device is left acquired.
#[derive(Debug)]
pub struct CountingCameraProvider {
    frame: RgbImage,
    frames_per_source: usize,
    refuse_open: AtomicBool,
    opened: AtomicUsize,
    released: Arc<AtomicUsize>,
}

impl CountingCameraProvider {
    pub fn new(frame: RgbImage, frames_per_source: usize) -> Self {
        Self {
            frame,
            frames_per_source,
            refuse_open: AtomicBool::new(false),
            opened: AtomicUsize::new(0),
            released: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// When set, the next `open` calls fail like a missing device.
    pub fn set_refuse_open(&self, refuse: bool) {
        self.refuse_open.store(refuse, Ordering::Relaxed);
    }

    /// Number of sources handed out so far.
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::Relaxed)
    }

    /// Number of handed-out sources that have been dropped.
    pub fn released(&self) -> usize {
        self.released.load(Ordering::Relaxed)
    }

    /// True when every opened source has been released again.
    pub fn all_released(&self) -> bool {
        self.opened() == self.released()
    }
}

impl CameraProvider for CountingCameraProvider {
    fn open(&self, settings: &CameraSettings) -> Result<Box<dyn FrameSource>, CameraError> {
        if self.refuse_open.load(Ordering::Relaxed) {
            return Err(CameraError::Open {
                index: settings.device_index,
                source: NokhwaError::GeneralError("scripted open refusal".to_string()),
            });
        }
        self.opened.fetch_add(1, Ordering::Relaxed);
        Ok(Box::new(ScriptedFrameSource {
            frame: self.frame.clone(),
            remaining: self.frames_per_source,
            released: Arc::clone(&self.released),
        }))
    }
}

struct ScriptedFrameSource {
    frame: RgbImage,
    remaining: usize,
    released: Arc<AtomicUsize>,
}

impl FrameSource for ScriptedFrameSource {
    fn read_frame(&mut self) -> Result<RgbImage, CameraError> {
        if self.remaining == 0 {
            return Err(CameraError::Capture(NokhwaError::ReadFrameError(
                "scripted frame budget exhausted".to_string(),
            )));
        }
        self.remaining -= 1;
        Ok(self.frame.clone())
    }

    fn resolution(&self) -> (u32, u32) {
        self.frame.dimensions()
    }
}

impl Drop for ScriptedFrameSource {
    fn drop(&mut self) {
        self.released.fetch_add(1, Ordering::Relaxed);
    }
}
