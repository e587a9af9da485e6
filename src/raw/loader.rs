//! Source image loader
//!
//! This module decodes microscopy rasters (TIFF, PNG, JPEG) into a single
//! intensity channel. Samples keep their native bit depth so that the
//! percentile calibration sees the real dynamic range of the sensor.
use image::DynamicImage;
use log::debug;
use std::path::Path;

use crate::error::{InnervationError, Result};

/// Raw pixel grid as loaded from disk
///
/// Immutable. Only the currently active file is kept in memory.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub width: u32,
    pub height: u32,
    /// Bits per sample of the decoded intensity channel (8, 16 or 32)
    pub bit_depth: u8,
    /// Row-major intensity samples, `width * height` entries
    pub data: Vec<f64>,
}

impl SourceImage {
    /// Build a source image from row-major samples
    pub fn from_samples(width: u32, height: u32, bit_depth: u8, data: Vec<f64>) -> Self {
        Self {
            width,
            height,
            bit_depth,
            data,
        }
    }

    /// Number of pixels
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when the image has no pixels
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Load a raster and reduce it to one intensity channel
///
/// # Errors
/// * `Load` if the file is missing, unreadable or in an unsupported format
/// * `InvalidImage` if the decoded image has zero width or height
pub fn load_source(path: &Path) -> Result<SourceImage> {
    let decoded = image::open(path).map_err(|source| InnervationError::Load {
        path: path.to_path_buf(),
        source,
    })?;

    let source = from_dynamic(decoded);
    if source.width == 0 || source.height == 0 || source.is_empty() {
        return Err(InnervationError::InvalidImage {
            path: path.to_path_buf(),
        });
    }

    debug!(
        "📷 Loaded {}: {}x{} ({}-bit)",
        path.display(),
        source.width,
        source.height,
        source.bit_depth
    );
    Ok(source)
}

/// Convert any decoded image to a single intensity channel
///
/// Grayscale buffers are taken as-is; color buffers go through the
/// luminance conversion of the `image` crate at their own bit depth.
pub fn from_dynamic(img: DynamicImage) -> SourceImage {
    let (width, height) = (img.width(), img.height());
    match img {
        DynamicImage::ImageLuma8(buf) => {
            let data = buf.into_raw().into_iter().map(f64::from).collect();
            SourceImage::from_samples(width, height, 8, data)
        }
        DynamicImage::ImageLuma16(buf) => {
            let data = buf.into_raw().into_iter().map(f64::from).collect();
            SourceImage::from_samples(width, height, 16, data)
        }
        DynamicImage::ImageLumaA16(_) | DynamicImage::ImageRgb16(_) | DynamicImage::ImageRgba16(_) => {
            let data = img.to_luma16().into_raw().into_iter().map(f64::from).collect();
            SourceImage::from_samples(width, height, 16, data)
        }
        DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_) => {
            let data = img.to_luma32f().into_raw().into_iter().map(f64::from).collect();
            SourceImage::from_samples(width, height, 32, data)
        }
        other => {
            let data = other.to_luma8().into_raw().into_iter().map(f64::from).collect();
            SourceImage::from_samples(width, height, 8, data)
        }
    }
}
