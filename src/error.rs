//! Error types shared by every stage of the measurement pipeline
//!
//! Per-file failures (`Load`, `InvalidImage`) are caught by the session and
//! turned into a skipped file. Selection and parse failures are recovered
//! locally (mode revert, default cutoff). Only I/O on the result log and
//! config parsing propagate to the caller.
use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong while measuring a batch
#[derive(Debug, Error)]
pub enum InnervationError {
    /// The file could not be opened or decoded
    #[error("failed to load {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The file decoded to an image without pixels
    #[error("image {path} has zero area")]
    InvalidImage { path: PathBuf },

    /// Zoom rectangle or ROI too small to be used
    #[error("degenerate selection: {0}")]
    DegenerateSelection(String),

    /// Fixed cutoff text is not a number
    #[error("cannot parse threshold cutoff {0:?}")]
    ThresholdParse(String),

    /// Calculate was requested without a finalized ROI
    #[error("no region of interest drawn")]
    RoiMissing,

    /// No file is loaded (batch not started or already complete)
    #[error("no active file")]
    NoActiveFile,

    /// Save was requested before any calculation
    #[error("no measurement to save")]
    NoMeasurement,

    /// Result log or folder I/O
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Malformed JSON config, settings or script
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, InnervationError>;
