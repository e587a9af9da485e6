//! Innervation index measurement for grayscale microscopy images
//!
//! A folder of images is processed one file at a time: each image is
//! calibrated to 8 bits, the user zooms and draws a region of interest,
//! and the percentage of non-zero ROI pixels above a threshold is appended
//! to a result log in the same folder.

pub mod error;
pub mod measure;
pub mod raw;
pub mod script;
pub mod state;
pub mod ui;

pub use error::{InnervationError, Result};
pub use measure::{compute_index, Measurement, ThresholdConfig};
pub use raw::{load_calibrated, CalibratedImage};
pub use state::{AdjustmentSettings, BatchState, Session, SessionConfig};
