//! Session configuration
//!
//! Stored as JSON. Every field has a default, so a partial file (or no file)
//! is always usable.
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::library::RESULTS_FILE_NAME;
use super::queue::DEFAULT_EXTENSIONS;
use crate::error::Result;
use crate::measure::ThresholdConfig;
use crate::ui::canvas::{Viewport, MIN_ZOOM_SIZE, ZOOM_OUT_FACTOR};
use crate::ui::roi::RoiMode;

/// Settings fixed for the duration of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Polygon or Freehand ROI capture
    pub roi_mode: RoiMode,
    /// Initial threshold selection
    pub threshold: ThresholdConfig,
    /// Canvas size the view is fitted into
    pub viewport: Viewport,
    /// Expansion factor of one zoom-out step
    pub zoom_out_factor: f64,
    /// Smallest accepted zoom rectangle side, image pixels
    pub min_zoom_size: f64,
    /// Name of the result log created in the input folder
    pub results_file: String,
    /// Image extensions picked up from the input folder
    pub extensions: Vec<String>,
    /// Paint pixels above threshold in the preview
    pub show_overlay: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            roi_mode: RoiMode::Polygon,
            threshold: ThresholdConfig::default(),
            viewport: Viewport::default(),
            zoom_out_factor: ZOOM_OUT_FACTOR,
            min_zoom_size: MIN_ZOOM_SIZE,
            results_file: RESULTS_FILE_NAME.to_string(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            show_overlay: false,
        }
    }
}

impl SessionConfig {
    /// Parse a JSON config file
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Parse JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config.sanitized())
    }

    /// Load `path` if it exists, defaults otherwise
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            info!("⚙️  Loading config from {}", path.display());
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// `<config dir>/innervation/config.json`
    pub fn default_path() -> Option<PathBuf> {
        let mut path = dirs::config_dir().or_else(dirs::home_dir)?;
        path.push("innervation");
        path.push("config.json");
        Some(path)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Replace values that would break the view math
    fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if !(self.zoom_out_factor.is_finite() && self.zoom_out_factor > 1.0) {
            self.zoom_out_factor = defaults.zoom_out_factor;
        }
        if !(self.min_zoom_size.is_finite() && self.min_zoom_size >= 1.0) {
            self.min_zoom_size = defaults.min_zoom_size;
        }
        if let ThresholdConfig::FixedCutoff(v) = self.threshold {
            if !v.is_finite() {
                self.threshold = defaults.threshold;
            }
        }
        if self.results_file.trim().is_empty() {
            self.results_file = defaults.results_file;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = SessionConfig::from_json(r#"{"roi_mode":"Freehand","threshold":"Otsu"}"#).unwrap();
        assert_eq!(config.roi_mode, RoiMode::Freehand);
        assert_eq!(config.threshold, ThresholdConfig::Otsu);
        assert_eq!(config.viewport, Viewport::new(800, 600));
        assert_eq!(config.results_file, "innervation_results.txt");
    }

    #[test]
    fn test_round_trip() {
        let config = SessionConfig {
            zoom_out_factor: 2.0,
            ..SessionConfig::default()
        };
        let restored = SessionConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(config, restored);
    }

    #[test]
    fn test_bad_values_are_replaced() {
        let config = SessionConfig::from_json(r#"{"zoom_out_factor":0.5,"min_zoom_size":-3}"#).unwrap();
        assert_eq!(config.zoom_out_factor, ZOOM_OUT_FACTOR);
        assert_eq!(config.min_zoom_size, MIN_ZOOM_SIZE);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = SessionConfig::load_or_default(Path::new("/nonexistent/config.json")).unwrap();
        assert_eq!(config, SessionConfig::default());
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(SessionConfig::from_json("{not json").is_err());
    }
}
