/// Shared data structures for the batch workflow
///
/// These structs flow between the session and the result log.

use serde::{Deserialize, Serialize};

/// One saved measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementResult {
    /// Filename only (e.g., "mouse3_left_02.tif")
    pub filename: String,
    /// Innervation index in percent (0.0 to 100.0)
    pub index: f64,
}

impl MeasurementResult {
    pub fn new(filename: impl Into<String>, index: f64) -> Self {
        Self {
            filename: filename.into(),
            index,
        }
    }
}

/// Where the batch stands on its file list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    /// 1-based position of the active file
    pub position: usize,
    pub total: usize,
    pub filename: String,
}

impl std::fmt::Display for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}/{}) - {}", self.position, self.total, self.filename)
    }
}

/// A file that could not be loaded and was passed over
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub filename: String,
    pub reason: String,
}
