//! Draw detection boxes and label text onto frames.

use std::path::Path;

use ab_glyph::{FontVec, PxScale};
use anyhow::{Context, Result};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;

use crate::labels::ClassLabels;
use crate::postprocess::{BoundingBox, Detection};

/// Box and label color.
pub const BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

const BOX_THICKNESS: i32 = 2;
const LABEL_SCALE: f32 = 20.0;
const LABEL_GAP: i32 = 10;

/// Load a TrueType font for label text.
pub fn load_label_font<P: AsRef<Path>>(path: P) -> Result<FontVec> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read font file {}", path.display()))?;
    FontVec::try_from_vec(bytes)
        .map_err(|_| anyhow::anyhow!("font file {} is not a valid font", path.display()))
}

/// Draw every detection onto the frame in place.
///
/// Boxes are drawn as two nested one-pixel outlines. When a font is
/// available each box gets a `{label} {confidence}` line above its top-left
/// corner; without a font the frame carries boxes only. Boxes partially or
/// fully outside the frame are clipped.
pub fn draw_detections(
    frame: &mut RgbImage,
    detections: &[Detection],
    labels: &ClassLabels,
    font: Option<&FontVec>,
) {
    for detection in detections {
        draw_box(frame, &detection.bbox);

        if let Some(font) = font {
            let label = labels.get(detection.class_id).unwrap_or("?");
            let text = format!("{} {:.2}", label, detection.confidence);
            let text_y = detection.bbox.y - LABEL_GAP - LABEL_SCALE as i32;
            draw_text_mut(
                frame,
                BOX_COLOR,
                detection.bbox.x,
                text_y,
                PxScale::from(LABEL_SCALE),
                font,
                &text,
            );
        }
    }
}

fn draw_box(frame: &mut RgbImage, bbox: &BoundingBox) {
    for inset in 0..BOX_THICKNESS {
        let width = bbox.width - 2 * inset;
        let height = bbox.height - 2 * inset;
        if width <= 0 || height <= 0 {
            break;
        }
        let rect = Rect::at(bbox.x + inset, bbox.y + inset).of_size(width as u32, height as u32);
        draw_hollow_rect_mut(frame, rect, BOX_COLOR);
    }
}
