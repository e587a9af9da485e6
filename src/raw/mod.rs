/// Source image handling
///
/// This module handles:
/// - Decoding microscopy rasters to one intensity channel
/// - Percentile calibration to an 8-bit grid

pub mod loader;
pub mod calibrate;

pub use calibrate::{calibrate, load_calibrated, CalibratedImage};
pub use loader::{load_source, SourceImage};
