//! Image loading, resizing, and tensor conversion.

use std::{
    fs,
    path::{Path, PathBuf},
};

use image::{DynamicImage, RgbImage, imageops::FilterType};
use ndarray::Array3;
use thiserror::Error;

/// Errors raised while bringing an image file into memory.
///
/// Read and decode failures are reported separately so callers can tell a
/// missing file apart from a corrupt one.
#[derive(Debug, Error)]
pub enum ImageLoadError {
    #[error("failed to read image {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode image {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Load an image from disk into memory.
///
/// # Arguments
///
/// * `path` - The path to the image file.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<DynamicImage, ImageLoadError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| ImageLoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    image::load_from_memory(&bytes).map_err(|source| ImageLoadError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

/// Resize a frame to exactly the requested resolution.
///
/// The aspect ratio is not preserved; the network input is a fixed square
/// and frames are stretched to fill it.
pub fn resize_image(image: &RgbImage, width: u32, height: u32, filter: FilterType) -> RgbImage {
    image::imageops::resize(image, width, height, filter)
}

/// Convert an RGB image into a CHW array scaled to `[0, 1]`.
///
/// The layout moves from HWC (height, width, channels) to CHW and every
/// channel value is multiplied by 1/255, matching what the network was
/// trained on.
pub fn rgb_to_chw(image: &RgbImage) -> Array3<f32> {
    let (width, height) = image.dimensions();
    let mut array = Array3::<f32>::zeros((3, height as usize, width as usize));
    for (x, y, pixel) in image.enumerate_pixels() {
        let (xi, yi) = (x as usize, y as usize);
        array[(0, yi, xi)] = pixel[0] as f32 / 255.0;
        array[(1, yi, xi)] = pixel[1] as f32 / 255.0;
        array[(2, yi, xi)] = pixel[2] as f32 / 255.0;
    }
    array
}
