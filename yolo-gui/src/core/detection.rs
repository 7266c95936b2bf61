//! Detector startup and image detection jobs.

use std::path::{Path, PathBuf};
use std::sync::{Arc, mpsc};

use log::{error, info};
use yolo_core::{DetectorError, YoloDetector};
use yolo_utils::{AppSettings, load_image};

use crate::{ErrorKind, ErrorReport, ImageJobSuccess, JobMessage};

/// Map a detector failure onto the dialog category and detail text.
pub fn detector_error_report(err: DetectorError) -> ErrorReport {
    match err {
        DetectorError::ModelLoad(inner) => ErrorReport {
            kind: ErrorKind::ModelLoad,
            detail: format!("{inner:#}"),
        },
        DetectorError::Inference(inner) => ErrorReport {
            kind: ErrorKind::Inference,
            detail: format!("{inner:#}"),
        },
    }
}

/// Loads the detector on a worker thread during the splash phase.
///
/// The result comes back as [`JobMessage::DetectorReady`] or
/// [`JobMessage::DetectorFailed`]; the window stays on the splash screen
/// until one of them arrives.
pub fn spawn_detector_load(settings: &AppSettings, job_tx: mpsc::Sender<JobMessage>) {
    let settings = settings.clone();
    rayon::spawn(move || {
        let message = match YoloDetector::from_settings(&settings) {
            Ok(detector) => JobMessage::DetectorReady(Arc::new(detector)),
            Err(err) => JobMessage::DetectorFailed {
                detail: detector_error_report(err).detail,
            },
        };

        if job_tx.send(message).is_err() {
            error!("GUI dropped the detector load result");
        }
    });
}

/// Performs object detection on an image file and returns the results.
pub fn perform_detection(
    detector: &YoloDetector,
    path: &Path,
) -> Result<ImageJobSuccess, ErrorReport> {
    let image = load_image(path).map_err(|err| ErrorReport {
        kind: ErrorKind::ImageDecode,
        detail: err.to_string(),
    })?;
    let frame = image.to_rgb8();

    let output = detector.detect(&frame).map_err(detector_error_report)?;

    let size = [
        output.annotated.width() as usize,
        output.annotated.height() as usize,
    ];
    let color_image = egui::ColorImage::from_rgb(size, output.annotated.as_raw());

    Ok(ImageJobSuccess {
        path: path.to_path_buf(),
        color_image,
        detections: output.detections,
        summary: output.summary,
        original_size: frame.dimensions(),
    })
}

/// Starts a background detection job for the given image path.
pub fn start_image_job(
    path: PathBuf,
    detector: Arc<YoloDetector>,
    job_id: u64,
    job_tx: mpsc::Sender<JobMessage>,
) {
    info!("Launching detection job {} for {}", job_id, path.display());

    rayon::spawn(move || {
        let payload = match perform_detection(&detector, &path) {
            Ok(data) => JobMessage::ImageFinished { job_id, data },
            Err(report) => JobMessage::ImageFailed { job_id, report },
        };

        if job_tx.send(payload).is_err() {
            error!("GUI dropped detection result for {}", path.display());
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use tract_onnx::prelude::Tensor;
    use yolo_core::{ClassLabels, InferenceBackend, PostprocessConfig, PreprocessConfig};
    use yolo_utils::solid_rgb_image;

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
        fn infer(&self, _input: Tensor) -> anyhow::Result<Vec<Tensor>> {
            Ok(vec![self.tensor.clone()])
        }
    }

    fn scripted_detector(rows: &[[f32; COLS]]) -> YoloDetector {
        YoloDetector::with_backend(
            Arc::new(ScriptedBackend::from_rows(rows)),
            ClassLabels::from_names(["person", "bicycle", "car"]),
            PreprocessConfig::default(),
            PostprocessConfig {
                confidence_threshold: 0.5,
                class_count: 3,
            },
        )
    }

    #[test]
    fn unreadable_image_reports_decode_error() {
        let detector = scripted_detector(&[]);
        let missing = std::env::temp_dir().join("yolo-gui-no-such-image.png");

        let report = perform_detection(&detector, &missing)
            .err()
            .expect("detection should fail");
        assert_eq!(report.kind, ErrorKind::ImageDecode);
        assert!(report.detail.contains("yolo-gui-no-such-image.png"));
    }

    #[test]
    fn detection_job_payload_carries_annotated_image() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("frame.png");
        solid_rgb_image(416, 416, [0, 0, 0])
            .save(&path)
            .expect("write test image");

        let detector = scripted_detector(&[[0.5, 0.5, 0.2, 0.2, 1.0, 0.0, 0.0, 0.9]]);
        let data = perform_detection(&detector, &path).expect("detect");

        assert_eq!(data.path, path);
        assert_eq!(data.original_size, (416, 416));
        assert_eq!(data.detections.len(), 1);
        assert_eq!(data.summary, "Detected Objects:\ncar: 0.90\n");
        assert_eq!(data.color_image.size, [416, 416]);
        // Box corner pixel is painted in the uploaded image.
        assert_eq!(
            data.color_image.pixels[166 * 416 + 166],
            egui::Color32::from_rgb(0, 255, 0)
        );
    }

    #[test]
    fn detector_errors_map_to_dialog_categories() {
        let load = detector_error_report(DetectorError::ModelLoad(anyhow::anyhow!("weights gone")));
        assert_eq!(load.kind, ErrorKind::ModelLoad);
        assert!(load.detail.contains("weights gone"));

        let inference =
            detector_error_report(DetectorError::Inference(anyhow::anyhow!("bad tensor")));
        assert_eq!(inference.kind, ErrorKind::Inference);
        assert!(inference.detail.contains("bad tensor"));
    }
}
