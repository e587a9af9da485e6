//! Percentile calibration of source images to 8-bit
//!
//! The 2nd and 98th percentiles of the source intensities are stretched to
//! 0 and 255. Hot pixels and exposure differences between images therefore
//! do not change the scale of the calibrated grid.
use image::{GrayImage, Luma};
use log::info;
use std::path::Path;

use super::loader::{load_source, SourceImage};
use crate::error::Result;

/// Lower calibration percentile
pub const LOW_PERCENTILE: f64 = 2.0;
/// Upper calibration percentile
pub const HIGH_PERCENTILE: f64 = 98.0;

/// 8-bit intensity grid derived from a `SourceImage`
///
/// Immutable; every crop, preview and measurement reads from it without
/// ever writing back.
#[derive(Debug, Clone)]
pub struct CalibratedImage {
    pixels: GrayImage,
    /// Source intensity mapped to 0
    pub low: f64,
    /// Source intensity mapped to 255
    pub high: f64,
}

impl CalibratedImage {
    /// Wrap an existing 8-bit grid without recalibrating it
    pub fn from_gray(pixels: GrayImage) -> Self {
        Self {
            pixels,
            low: 0.0,
            high: 255.0,
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// The calibrated pixels
    pub fn pixels(&self) -> &GrayImage {
        &self.pixels
    }

    /// Intensity at `(x, y)`
    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.pixels.get_pixel(x, y)[0]
    }
}

/// Load a file and calibrate it in one step
pub fn load_calibrated(path: &Path) -> Result<CalibratedImage> {
    let source = load_source(path)?;
    let calibrated = calibrate(&source);
    info!(
        "🔬 Calibrated {} ({}x{}, {}-bit): p2={:.2} p98={:.2}",
        path.display(),
        source.width,
        source.height,
        source.bit_depth,
        calibrated.low,
        calibrated.high
    );
    Ok(calibrated)
}

/// Map `[p2, p98]` linearly onto `[0, 255]`, clip and round
///
/// A flat image (p2 == p98) uses a range of 1 so that the mapping is still
/// defined; every pixel then lands on 0 or 255.
pub fn calibrate(source: &SourceImage) -> CalibratedImage {
    let mut sorted = source.data.clone();
    sorted.sort_by(f64::total_cmp);

    let low = percentile(&sorted, LOW_PERCENTILE);
    let high = percentile(&sorted, HIGH_PERCENTILE);
    let range = if high - low != 0.0 { high - low } else { 1.0 };

    let pixels = GrayImage::from_fn(source.width, source.height, |x, y| {
        let idx = y as usize * source.width as usize + x as usize;
        Luma([map_intensity(source.data[idx], low, range)])
    });

    CalibratedImage { pixels, low, high }
}

#[inline]
fn map_intensity(value: f64, low: f64, range: f64) -> u8 {
    let scaled = (value - low) / range * 255.0;
    if scaled.is_nan() {
        return 0;
    }
    scaled.clamp(0.0, 255.0).round() as u8
}

/// Percentile of already sorted samples with linear interpolation between
/// the closest ranks
///
/// Returns 0 for an empty slice.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = (p / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}
