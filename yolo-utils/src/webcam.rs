//! Camera capture for realtime detection, behind small capability traits.
//!
//! The realtime loop talks to [`CameraProvider`] and [`FrameSource`] rather
//! than to `nokhwa` directly, so tests can drive it with scripted devices
//! (see [`crate::fixtures::CountingCameraProvider`]).

use image::RgbImage;
use log::{debug, info, warn};
use nokhwa::{
    Camera, NokhwaError,
    pixel_format::RgbFormat,
    utils::{CameraIndex, RequestedFormat, RequestedFormatType, Resolution},
};
use thiserror::Error;

use crate::config::CameraSettings;

/// Errors raised while opening or reading a capture device.
#[derive(Debug, Error)]
pub enum CameraError {
    #[error("could not open camera {index}: {source}")]
    Open {
        index: u32,
        #[source]
        source: NokhwaError,
    },
    #[error("could not start stream on camera {index}: {source}")]
    Stream {
        index: u32,
        #[source]
        source: NokhwaError,
    },
    #[error("failed to capture frame: {0}")]
    Capture(#[source] NokhwaError),
}

/// An opened capture device yielding RGB frames.
///
/// Dropping the source releases the device, on every exit path.
pub trait FrameSource: Send {
    /// Grab and decode the next frame.
    fn read_frame(&mut self) -> Result<RgbImage, CameraError>;

    /// Actual capture resolution after driver negotiation.
    fn resolution(&self) -> (u32, u32);
}

/// Opens capture devices described by [`CameraSettings`].
pub trait CameraProvider: Send + Sync {
    fn open(&self, settings: &CameraSettings) -> Result<Box<dyn FrameSource>, CameraError>;
}

/// Capture provider backed by real hardware through `nokhwa`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NokhwaProvider;

impl CameraProvider for NokhwaProvider {
    fn open(&self, settings: &CameraSettings) -> Result<Box<dyn FrameSource>, CameraError> {
        let device_index = settings.device_index;
        let index = CameraIndex::Index(device_index);
        let requested =
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestResolution);

        debug!(
            "opening camera {} with requested resolution {}x{} @ {} fps",
            device_index, settings.width, settings.height, settings.fps
        );

        let mut camera = Camera::new(index, requested).map_err(|source| CameraError::Open {
            index: device_index,
            source,
        })?;

        // Open the stream first; some drivers reject format changes before it.
        camera.open_stream().map_err(|source| CameraError::Stream {
            index: device_index,
            source,
        })?;

        // Resolution and frame rate requests may be refused; the camera
        // default is acceptable in that case.
        if let Err(err) = camera.set_resolution(Resolution::new(settings.width, settings.height)) {
            warn!(
                "camera {} kept its default resolution ({}x{} refused: {err})",
                device_index, settings.width, settings.height
            );
        }
        if let Err(err) = camera.set_frame_rate(settings.fps) {
            warn!(
                "camera {} kept its default frame rate ({} fps refused: {err})",
                device_index, settings.fps
            );
        }

        let actual = camera.resolution();
        info!(
            "camera {} streaming at {}x{} @ {} fps",
            device_index,
            actual.width(),
            actual.height(),
            camera.frame_rate()
        );

        Ok(Box::new(NokhwaCamera {
            camera,
            device_index,
        }))
    }
}

/// A hardware camera with an open stream.
struct NokhwaCamera {
    camera: Camera,
    device_index: u32,
}

impl FrameSource for NokhwaCamera {
    fn read_frame(&mut self) -> Result<RgbImage, CameraError> {
        let frame = self.camera.frame().map_err(CameraError::Capture)?;
        frame
            .decode_image::<RgbFormat>()
            .map_err(CameraError::Capture)
    }

    fn resolution(&self) -> (u32, u32) {
        let resolution = self.camera.resolution();
        (resolution.width(), resolution.height())
    }
}

impl Drop for NokhwaCamera {
    fn drop(&mut self) {
        if let Err(err) = self.camera.stop_stream() {
            warn!(
                "failed to stop stream on camera {}: {err}",
                self.device_index
            );
        } else {
            info!("camera {} released", self.device_index);
        }
    }
}
