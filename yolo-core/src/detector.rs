use std::{fmt::Write, sync::Arc};

use ab_glyph::FontVec;
use anyhow::Result;
use image::RgbImage;
use log::{debug, info, warn};
use tract_onnx::prelude::Tensor;

use yolo_utils::config::AppSettings;
use yolo_utils::timing_guard;

use crate::annotate::{draw_detections, load_label_font};
use crate::error::DetectorError;
use crate::labels::ClassLabels;
use crate::model::{ModelSpec, YoloModel};
use crate::postprocess::{Detection, PostprocessConfig, apply_postprocess};
use crate::preprocess::{PreprocessConfig, preprocess_frame};

/// Everything produced by one detection pass over a frame.
#[derive(Debug, Clone)]
pub struct DetectionOutput {
    /// Copy of the input frame with boxes (and labels) drawn on.
    pub annotated: RgbImage,
    /// The detections that survived filtering, in network row order.
    pub detections: Vec<Detection>,
    /// Human-readable listing, one line per detection.
    pub summary: String,
}

/// Abstraction over the inference engine.
///
/// Implemented by [`YoloModel`]; primarily useful for injecting scripted
/// outputs in tests.
pub trait InferenceBackend: Send + Sync + std::fmt::Debug {
    /// Run the network on a preprocessed input tensor.
    fn infer(&self, input: Tensor) -> Result<Vec<Tensor>>;
}

impl InferenceBackend for YoloModel {
    fn infer(&self, input: Tensor) -> Result<Vec<Tensor>> {
        self.run(input)
    }
}

/// Couples the network with its label table and pipeline settings.
///
/// This is the main entry point for running object detection; one instance
/// serves both single images and the realtime loop.
pub struct YoloDetector {
    backend: Arc<dyn InferenceBackend>,
    labels: ClassLabels,
    preprocess: PreprocessConfig,
    postprocess: PostprocessConfig,
    font: Option<FontVec>,
}

impl std::fmt::Debug for YoloDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YoloDetector")
            .field("classes", &self.labels.len())
            .field("preprocess", &self.preprocess)
            .field("postprocess", &self.postprocess)
            .field("has_font", &self.font.is_some())
            .finish_non_exhaustive()
    }
}

impl YoloDetector {
    /// Load every model resource named in the settings.
    ///
    /// Missing or malformed weights, network description, or labels fail
    /// here, before any detection can run. A missing font only disables
    /// label text on annotated frames.
    pub fn from_settings(settings: &AppSettings) -> Result<Self, DetectorError> {
        let _guard = timing_guard("yolo_core::load_model", log::Level::Debug);

        let spec = ModelSpec::load_from_path(settings.model.resolved_config_path())
            .map_err(DetectorError::ModelLoad)?;
        let labels = ClassLabels::load_from_path(settings.model.resolved_labels_path())
            .map_err(DetectorError::ModelLoad)?;
        if labels.len() != spec.class_count {
            return Err(DetectorError::ModelLoad(anyhow::anyhow!(
                "labels file lists {} names but the network scores {} classes",
                labels.len(),
                spec.class_count
            )));
        }
        let model = YoloModel::load(settings.model.resolved_weights_path())
            .map_err(DetectorError::ModelLoad)?;

        let font = settings
            .model
            .resolved_font_path()
            .and_then(|path| match load_label_font(&path) {
                Ok(font) => Some(font),
                Err(err) => {
                    warn!("label font unavailable ({err:#}); frames will carry boxes only");
                    None
                }
            });
        if font.is_none() {
            debug!("no label font; annotated frames carry boxes only");
        }

        info!(
            "detector ready: {} classes, input {}x{}",
            labels.len(),
            settings.input.width,
            settings.input.height
        );

        Ok(Self {
            backend: Arc::new(model),
            labels,
            preprocess: PreprocessConfig::from(settings.input),
            postprocess: PostprocessConfig::new(&settings.detection, spec.class_count),
            font,
        })
    }

    /// Build a detector around an existing inference backend.
    ///
    /// Primarily useful for injecting scripted backends in tests.
    pub fn with_backend(
        backend: Arc<dyn InferenceBackend>,
        labels: ClassLabels,
        preprocess: PreprocessConfig,
        postprocess: PostprocessConfig,
    ) -> Self {
        Self {
            backend,
            labels,
            preprocess,
            postprocess,
            font: None,
        }
    }

    /// The class label table resolved at load time.
    pub fn labels(&self) -> &ClassLabels {
        &self.labels
    }

    /// Run the full pipeline on one frame.
    ///
    /// The input frame is left untouched; the annotated copy, the
    /// surviving detections, and the summary text come back together.
    pub fn detect(&self, frame: &RgbImage) -> Result<DetectionOutput, DetectorError> {
        let _guard = timing_guard("yolo_core::detect_frame", log::Level::Debug);

        let prep = {
            let _guard = timing_guard("yolo_core::preprocess", log::Level::Debug);
            preprocess_frame(frame, &self.preprocess).map_err(DetectorError::Inference)?
        };

        let outputs = {
            let _guard = timing_guard("yolo_core::onnx_inference", log::Level::Debug);
            self.backend
                .infer(prep.tensor)
                .map_err(DetectorError::Inference)?
        };

        let mut detections = {
            let _guard = timing_guard("yolo_core::postprocess", log::Level::Debug);
            apply_postprocess(&outputs, prep.original_size, &self.postprocess)
                .map_err(DetectorError::Inference)?
        };

        // Load-time validation pins the label count to the class count, so
        // this only fires for hand-built detectors with mismatched tables.
        detections.retain(|detection| {
            if self.labels.get(detection.class_id).is_none() {
                warn!(
                    "dropping detection with unknown class id {}",
                    detection.class_id
                );
                false
            } else {
                true
            }
        });

        let mut annotated = frame.clone();
        {
            let _guard = timing_guard("yolo_core::annotate", log::Level::Debug);
            draw_detections(&mut annotated, &detections, &self.labels, self.font.as_ref());
        }
        let summary = detection_summary(&detections, &self.labels);

        Ok(DetectionOutput {
            annotated,
            detections,
            summary,
        })
    }
}

/// Build the `Detected Objects:` text block listing every detection.
pub fn detection_summary(detections: &[Detection], labels: &ClassLabels) -> String {
    let mut summary = String::from("Detected Objects:\n");
    for detection in detections {
        let label = labels.get(detection.class_id).unwrap_or("?");
        let _ = writeln!(summary, "{}: {:.2}", label, detection.confidence);
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocess::InputSize;
    use yolo_utils::fixtures::solid_rgb_image;

    // Three-class rows: [cx, cy, w, h, objectness, c0, c1, c2].
    const COLS: usize = 8;

    #[derive(Debug)]
    struct ScriptedBackend {
        tensor: Tensor,
    }

    impl ScriptedBackend {
        fn from_rows(rows: &[[f32; COLS]]) -> Self {
            let flat: Vec<f32> = rows.iter().flatten().copied().collect();
            Self {
                tensor: Tensor::from_shape(&[rows.len(), COLS], &flat).unwrap(),
            }
        }
    }

    impl InferenceBackend for ScriptedBackend {
        fn infer(&self, _input: Tensor) -> Result<Vec<Tensor>> {
            Ok(vec![self.tensor.clone()])
        }
    }

    #[derive(Debug)]
    struct FailingBackend;

    impl InferenceBackend for FailingBackend {
        fn infer(&self, _input: Tensor) -> Result<Vec<Tensor>> {
            Err(anyhow::anyhow!("scripted inference failure"))
        }
    }

    fn three_class_detector(backend: Arc<dyn InferenceBackend>) -> YoloDetector {
        YoloDetector::with_backend(
            backend,
            ClassLabels::from_names(["person", "bicycle", "car"]),
            PreprocessConfig {
                input_size: InputSize::new(416, 416),
                ..Default::default()
            },
            PostprocessConfig {
                confidence_threshold: 0.5,
                class_count: 3,
            },
        )
    }

    #[test]
    fn detect_annotates_and_summarizes() {
        let backend = ScriptedBackend::from_rows(&[[0.5, 0.5, 0.2, 0.2, 1.0, 0.0, 0.0, 0.9]]);
        let detector = three_class_detector(Arc::new(backend));
        let frame = solid_rgb_image(416, 416, [0, 0, 0]);

        let output = detector.detect(&frame).expect("detect");

        assert_eq!(output.detections.len(), 1);
        let detection = &output.detections[0];
        assert_eq!(detection.class_id, 2);
        assert_eq!(
            (
                detection.bbox.x,
                detection.bbox.y,
                detection.bbox.width,
                detection.bbox.height
            ),
            (166, 166, 83, 83)
        );
        assert_eq!(output.summary, "Detected Objects:\ncar: 0.90\n");

        // The box corner was painted on the copy, not on the input.
        assert_eq!(*output.annotated.get_pixel(166, 166), image::Rgb([0, 255, 0]));
        assert_eq!(*frame.get_pixel(166, 166), image::Rgb([0, 0, 0]));
    }

    #[test]
    fn no_detections_return_header_and_identical_pixels() {
        let backend = ScriptedBackend::from_rows(&[[0.5, 0.5, 0.2, 0.2, 1.0, 0.1, 0.1, 0.1]]);
        let detector = three_class_detector(Arc::new(backend));
        let frame = solid_rgb_image(416, 416, [40, 50, 60]);

        let output = detector.detect(&frame).expect("detect");

        assert!(output.detections.is_empty());
        assert_eq!(output.summary, "Detected Objects:\n");
        assert_eq!(output.annotated.as_raw(), frame.as_raw());
    }

    #[test]
    fn score_exactly_at_threshold_is_rejected() {
        let backend = ScriptedBackend::from_rows(&[[0.5, 0.5, 0.2, 0.2, 1.0, 0.5, 0.0, 0.0]]);
        let detector = three_class_detector(Arc::new(backend));
        let frame = solid_rgb_image(416, 416, [0, 0, 0]);

        let output = detector.detect(&frame).expect("detect");
        assert!(output.detections.is_empty());
    }

    #[test]
    fn failing_backend_reports_inference_error() {
        let detector = three_class_detector(Arc::new(FailingBackend));
        let frame = solid_rgb_image(416, 416, [0, 0, 0]);

        let err = detector.detect(&frame).expect_err("detect should fail");
        assert!(matches!(err, DetectorError::Inference(_)));
        assert!(!err.is_fatal());
    }

    #[test]
    fn detections_with_unknown_class_ids_are_dropped() {
        let backend = ScriptedBackend::from_rows(&[[0.5, 0.5, 0.2, 0.2, 1.0, 0.0, 0.0, 0.9]]);
        let detector = YoloDetector::with_backend(
            Arc::new(backend),
            ClassLabels::from_names(["person", "bicycle"]),
            PreprocessConfig {
                input_size: InputSize::new(416, 416),
                ..Default::default()
            },
            PostprocessConfig {
                confidence_threshold: 0.5,
                class_count: 3,
            },
        );
        let frame = solid_rgb_image(416, 416, [0, 0, 0]);

        let output = detector.detect(&frame).expect("detect");
        assert!(output.detections.is_empty());
        assert_eq!(output.annotated.as_raw(), frame.as_raw());
    }

    #[test]
    fn summary_lists_detections_in_row_order() {
        let backend = ScriptedBackend::from_rows(&[
            [0.25, 0.25, 0.1, 0.1, 1.0, 0.9, 0.0, 0.0],
            [0.75, 0.75, 0.1, 0.1, 1.0, 0.0, 0.85, 0.0],
        ]);
        let detector = three_class_detector(Arc::new(backend));
        let frame = solid_rgb_image(416, 416, [0, 0, 0]);

        let output = detector.detect(&frame).expect("detect");
        assert_eq!(
            output.summary,
            "Detected Objects:\nperson: 0.90\nbicycle: 0.85\n"
        );
    }
}
