//! Core YOLOv3 inference primitives.
//!
//! This crate loads the pretrained ONNX network, runs inference with
//! `tract-onnx`, and turns raw outputs into annotated frames, detection
//! lists, and summary text.

/// Drawing boxes and label text onto frames.
pub mod annotate;
/// High-level detection runner coupling model, labels, and settings.
pub mod detector;
/// Error taxonomy for the detection pipeline.
pub mod error;
/// Class label table loaded from a names file.
pub mod labels;
/// ONNX model loading and execution.
pub mod model;
/// Detection post-processing (score filtering, box decoding).
pub mod postprocess;
/// Image pre-processing (resizing, tensor conversion).
pub mod preprocess;

pub use annotate::{draw_detections, load_label_font};
pub use detector::{DetectionOutput, InferenceBackend, YoloDetector, detection_summary};
pub use error::DetectorError;
pub use labels::ClassLabels;
pub use model::{ModelSpec, YoloModel};
pub use postprocess::{BoundingBox, Detection, PostprocessConfig, apply_postprocess};
pub use preprocess::{
    CpuPreprocessor, InputSize, PreprocessConfig, PreprocessOutput, Preprocessor, preprocess_frame,
};

/// Returns the crate version for diagnostics.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
