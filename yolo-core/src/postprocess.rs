use anyhow::Result;
use tract_onnx::prelude::{Tensor, tract_ndarray::ArrayView2};
use yolo_utils::config::DetectionSettings;

/// Parameters controlling how raw network outputs become detections.
#[derive(Debug, Clone)]
pub struct PostprocessConfig {
    /// Minimum class confidence for a detection to be kept.
    /// The comparison is strict: a score exactly at the threshold is dropped.
    pub confidence_threshold: f32,
    /// Number of class columns each detection row carries after the four
    /// box coordinates and the objectness column.
    pub class_count: usize,
}

impl Default for PostprocessConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DetectionSettings::default().confidence_threshold,
            class_count: 80,
        }
    }
}

impl PostprocessConfig {
    /// Combine user detection settings with the network's class count.
    pub fn new(settings: &DetectionSettings, class_count: usize) -> Self {
        Self {
            confidence_threshold: settings.confidence_threshold,
            class_count,
        }
    }

    fn columns(&self) -> usize {
        5 + self.class_count
    }
}

/// Axis-aligned bounding box in original-frame pixel coordinates.
///
/// Coordinates are truncated to integers the same way twice (center and
/// extent first, then the corner), so boxes land on the exact pixels the
/// annotation step draws on. Corners may lie outside the frame; drawing
/// clips them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    /// The x-coordinate of the top-left corner.
    pub x: i32,
    /// The y-coordinate of the top-left corner.
    pub y: i32,
    /// The width of the box.
    pub width: i32,
    /// The height of the box.
    pub height: i32,
}

/// A single detection: class, confidence, box.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Index into the class label table.
    pub class_id: usize,
    /// Winning class score in `[0, 1]`.
    pub confidence: f32,
    /// Bounding box in original-frame pixels.
    pub bbox: BoundingBox,
}

/// Decode raw output tensors into filtered detections.
///
/// Every output head contributes rows in order. Per row the class scores
/// (columns 5 and up) are scanned for the best class; the objectness value
/// in column 4 is not consulted. Rows whose best score does not exceed the
/// threshold are dropped. Overlapping boxes are all kept; no non-maximum
/// suppression runs, so one object may yield several detections.
///
/// # Arguments
///
/// * `outputs` - One tensor per network output head.
/// * `frame_size` - Original frame dimensions detections are mapped onto.
/// * `config` - The post-processing parameters.
pub fn apply_postprocess(
    outputs: &[Tensor],
    frame_size: (u32, u32),
    config: &PostprocessConfig,
) -> Result<Vec<Detection>> {
    let (frame_w, frame_h) = frame_size;
    anyhow::ensure!(
        frame_w > 0 && frame_h > 0,
        "frame dimensions must be non-zero"
    );
    anyhow::ensure!(config.class_count > 0, "class count must be non-zero");

    let mut detections = Vec::new();
    for output in outputs {
        collect_detections(output, frame_size, config, &mut detections)?;
    }
    Ok(detections)
}

fn collect_detections(
    output: &Tensor,
    frame_size: (u32, u32),
    config: &PostprocessConfig,
    detections: &mut Vec<Detection>,
) -> Result<()> {
    let rows = detection_rows(output, config.columns())?;
    let width = frame_size.0 as f32;
    let height = frame_size.1 as f32;

    for row in rows.rows() {
        let mut class_id = 0usize;
        let mut confidence = f32::NEG_INFINITY;
        for (idx, score) in row.iter().skip(5).enumerate() {
            if *score > confidence {
                class_id = idx;
                confidence = *score;
            }
        }

        if !confidence.is_finite() || confidence <= config.confidence_threshold {
            continue;
        }

        // Center and extent truncate to whole pixels before the corner is
        // derived, so the corner truncates a second time.
        let center_x = (row[0] * width) as i32;
        let center_y = (row[1] * height) as i32;
        let box_w = (row[2] * width) as i32;
        let box_h = (row[3] * height) as i32;
        let x = (center_x as f32 - box_w as f32 / 2.0) as i32;
        let y = (center_y as f32 - box_h as f32 / 2.0) as i32;

        detections.push(Detection {
            class_id,
            confidence,
            bbox: BoundingBox {
                x,
                y,
                width: box_w,
                height: box_h,
            },
        });
    }

    Ok(())
}

/// Extract the detection rows from one output tensor.
///
/// Accepts `[N, C]` and batched `[1, N, C]` layouts where `C` is the
/// configured column count.
fn detection_rows(output: &Tensor, expected_cols: usize) -> Result<ArrayView2<'_, f32>> {
    let shape = output.shape();
    let (rows, cols) = match shape {
        [rows, cols] => (*rows, *cols),
        [1, rows, cols] => (*rows, *cols),
        other => anyhow::bail!(
            "network output must have shape [N, C] or [1, N, C] (got {:?})",
            other
        ),
    };
    anyhow::ensure!(
        cols == expected_cols,
        "network output rows have {} columns, expected {} (4 box + objectness + {} classes)",
        cols,
        expected_cols,
        expected_cols - 5
    );

    let slice = output
        .as_slice::<f32>()
        .map_err(|e| anyhow::anyhow!("network output is not f32: {e}"))?;

    ArrayView2::from_shape((rows, cols), slice)
        .map_err(|_| anyhow::anyhow!("network output data is not contiguous"))
}
