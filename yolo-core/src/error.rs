//! Error taxonomy for the detection pipeline.

use thiserror::Error;

/// Failure modes surfaced by [`crate::detector::YoloDetector`].
///
/// `ModelLoad` means a required resource (weights, network description,
/// labels) could not be brought up; without it no detection can ever run.
/// `Inference` covers per-frame failures; the next frame may still succeed.
#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("could not load model files: {0:#}")]
    ModelLoad(anyhow::Error),
    #[error("detection failed: {0:#}")]
    Inference(anyhow::Error),
}

impl DetectorError {
    /// True when no later operation can succeed either.
    pub fn is_fatal(&self) -> bool {
        matches!(self, DetectorError::ModelLoad(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_load_is_fatal_inference_is_not() {
        let load = DetectorError::ModelLoad(anyhow::anyhow!("weights missing"));
        assert!(load.is_fatal());
        assert!(format!("{load}").contains("could not load model files"));

        let inference = DetectorError::Inference(anyhow::anyhow!("bad tensor"));
        assert!(!inference.is_fatal());
        assert!(format!("{inference}").contains("detection failed"));
    }

    #[test]
    fn display_includes_error_chain() {
        let root = anyhow::anyhow!("file not found").context("reading weights");
        let err = DetectorError::ModelLoad(root);
        let message = format!("{err}");
        assert!(message.contains("reading weights"));
        assert!(message.contains("file not found"));
    }
}
