/// Measurement module
///
/// This module handles:
/// - Intensity histograms (histogram.rs)
/// - Threshold selection, fixed or Otsu (threshold.rs)
/// - The blur → contrast → brightness preview pipeline (adjust.rs)
/// - The innervation index itself (index.rs)

pub mod histogram;
pub mod threshold;
pub mod adjust;
pub mod index;

pub use adjust::apply_adjustments;
pub use index::{compute_index, Measurement};
pub use threshold::{otsu_threshold, ThresholdConfig, DEFAULT_CUTOFF};
