//! Innervation index computation
//!
//! index = 100 × (masked non-zero pixels above threshold) / (masked non-zero pixels)
use image::{imageops, GrayImage};
use log::info;

use super::adjust::apply_adjustments;
use super::threshold::ThresholdConfig;
use crate::raw::CalibratedImage;
use crate::state::edit::AdjustmentSettings;
use crate::ui::roi::RoiMask;

/// One computed measurement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    /// Percentage in [0, 100], never NaN
    pub index: f64,
    /// Threshold the samples were compared against
    pub threshold: f64,
    /// Masked non-zero samples
    pub samples: usize,
    /// Samples strictly above the threshold
    pub above: usize,
}

impl Measurement {
    /// Result for an ROI without any non-zero pixel
    pub fn empty(threshold: f64) -> Self {
        Self {
            index: 0.0,
            threshold,
            samples: 0,
            above: 0,
        }
    }
}

/// The ROI bounding box cropped from the calibrated image and run through
/// the adjustment pipeline; `None` for an empty box
///
/// Co-indexed with `roi.mask`. Both the index and the in-ROI overlay read
/// from this buffer.
pub fn processed_bbox(
    calibrated: &CalibratedImage,
    roi: &RoiMask,
    settings: &AdjustmentSettings,
) -> Option<GrayImage> {
    let bbox = roi.bbox;
    if bbox.width == 0 || bbox.height == 0 {
        return None;
    }
    let crop = imageops::crop_imm(calibrated.pixels(), bbox.x, bbox.y, bbox.width, bbox.height).to_image();
    Some(apply_adjustments(&crop, settings))
}

/// Processed intensities of the masked pixels, zeros removed
pub fn masked_samples(
    calibrated: &CalibratedImage,
    roi: &RoiMask,
    settings: &AdjustmentSettings,
) -> Vec<u8> {
    processed_bbox(calibrated, roi, settings)
        .map(|processed| selected_samples(&processed, roi))
        .unwrap_or_default()
}

/// Non-zero values of an already processed bounding box under the mask
pub fn selected_samples(processed: &GrayImage, roi: &RoiMask) -> Vec<u8> {
    processed
        .as_raw()
        .iter()
        .zip(roi.mask.iter())
        .filter(|&(&v, &selected)| selected && v > 0)
        .map(|(&v, _)| v)
        .collect()
}

/// Index of a sample population against a fixed threshold
pub fn index_from_samples(samples: &[u8], threshold: f64) -> Measurement {
    if samples.is_empty() {
        return Measurement::empty(threshold);
    }
    let above = samples.iter().filter(|&&v| f64::from(v) > threshold).count();
    Measurement {
        index: 100.0 * above as f64 / samples.len() as f64,
        threshold,
        samples: samples.len(),
        above,
    }
}

/// Full measurement: crop, adjust, mask, drop zeros, threshold, count
///
/// Otsu is fitted on exactly the masked non-zero population.
pub fn compute_index(
    calibrated: &CalibratedImage,
    roi: &RoiMask,
    settings: &AdjustmentSettings,
    config: &ThresholdConfig,
) -> Measurement {
    let samples = masked_samples(calibrated, roi, settings);
    let threshold = config.resolve(&samples);
    let measurement = index_from_samples(&samples, threshold);
    info!(
        "🧮 Index {:.4}% ({} of {} samples > {:.1})",
        measurement.index, measurement.above, measurement.samples, measurement.threshold
    );
    measurement
}
