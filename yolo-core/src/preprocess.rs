//! Preprocessing utilities for preparing frames for inference.
//!
//! The helpers in this module resize frames to the network input resolution
//! and convert them into the expected `[1, 3, H, W]` tensor layout with
//! values scaled to `[0, 1]`.

use std::borrow::Cow;

use anyhow::Result;
use image::{RgbImage, imageops::FilterType};
use tract_onnx::prelude::Tensor;
use yolo_utils::telemetry::timing_guard;
use yolo_utils::{
    config::{InputDimensions, ResizeQuality},
    resize_image, rgb_to_chw,
};

/// Input resolution the network expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputSize {
    /// The width of the input tensor.
    pub width: u32,
    /// The height of the input tensor.
    pub height: u32,
}

impl InputSize {
    /// Creates a new `InputSize`.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for InputSize {
    fn default() -> Self {
        Self {
            width: 416,
            height: 416,
        }
    }
}

/// Configuration for preprocessing a frame before inference.
#[derive(Debug, Clone, Default)]
pub struct PreprocessConfig {
    /// The target input size for the network.
    pub input_size: InputSize,
    /// Resize filter preference controlling the quality vs speed trade-off.
    pub resize_quality: ResizeQuality,
}

impl PreprocessConfig {
    fn resize_filter(&self) -> FilterType {
        match self.resize_quality {
            ResizeQuality::Quality => FilterType::Triangle,
            ResizeQuality::Speed => FilterType::Nearest,
        }
    }
}

impl From<InputDimensions> for InputSize {
    fn from(dimensions: InputDimensions) -> Self {
        InputSize::new(dimensions.width, dimensions.height)
    }
}

impl From<InputDimensions> for PreprocessConfig {
    fn from(dimensions: InputDimensions) -> Self {
        let InputDimensions {
            width,
            height,
            resize_quality,
        } = dimensions;
        PreprocessConfig {
            input_size: InputSize::new(width, height),
            resize_quality,
        }
    }
}

impl From<&InputDimensions> for PreprocessConfig {
    fn from(dimensions: &InputDimensions) -> Self {
        (*dimensions).into()
    }
}

/// Output of preprocessing: tensor plus the frame size detections map onto.
///
/// Detection coordinates leave the network normalized to `[0, 1]`, so the
/// original size is all postprocessing needs to reach pixel space.
#[derive(Debug)]
pub struct PreprocessOutput {
    /// The preprocessed tensor, ready for inference.
    pub tensor: Tensor,
    /// The original dimensions of the input frame.
    pub original_size: (u32, u32),
}

/// Abstraction over preprocessing implementations.
///
/// Primarily useful for substituting instrumented implementations in tests.
pub trait Preprocessor: Send + Sync + std::fmt::Debug {
    /// Convert the provided frame into a network-ready tensor.
    fn preprocess(&self, frame: &RgbImage, config: &PreprocessConfig) -> Result<PreprocessOutput>;
}

/// Default CPU implementation backed by `image` + ndarray utilities.
#[derive(Debug, Default, Clone, Copy)]
pub struct CpuPreprocessor;

impl Preprocessor for CpuPreprocessor {
    fn preprocess(&self, frame: &RgbImage, config: &PreprocessConfig) -> Result<PreprocessOutput> {
        cpu_preprocess(frame, config)
    }
}

/// Preprocess an in-memory frame with the default CPU implementation.
pub fn preprocess_frame(frame: &RgbImage, config: &PreprocessConfig) -> Result<PreprocessOutput> {
    let cpu = CpuPreprocessor;
    cpu.preprocess(frame, config)
}

fn cpu_preprocess(frame: &RgbImage, config: &PreprocessConfig) -> Result<PreprocessOutput> {
    let _guard = timing_guard("yolo_core::preprocess_frame", log::Level::Trace);
    let input_w = config.input_size.width;
    let input_h = config.input_size.height;
    anyhow::ensure!(
        input_w > 0 && input_h > 0,
        "input dimensions must be greater than zero"
    );

    let (orig_w, orig_h) = frame.dimensions();
    anyhow::ensure!(
        orig_w > 0 && orig_h > 0,
        "source frame dimensions must be greater than zero"
    );

    let resized: Cow<'_, RgbImage> = if orig_w == input_w && orig_h == input_h {
        Cow::Borrowed(frame)
    } else {
        Cow::Owned(resize_image(frame, input_w, input_h, config.resize_filter()))
    };
    let chw = rgb_to_chw(&resized);

    let shape = [1usize, 3, input_h as usize, input_w as usize];
    let (data, offset) = chw.into_raw_vec_and_offset();
    debug_assert_eq!(offset, Some(0), "expected contiguous array");
    let tensor = Tensor::from_shape(&shape, &data)
        .map_err(|e| anyhow::anyhow!("failed to build tensor: {e}"))?;

    Ok(PreprocessOutput {
        tensor,
        original_size: (orig_w, orig_h),
    })
}
