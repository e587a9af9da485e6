/// Transient image adjustment parameters
///
/// These settings drive the preview pipeline (blur → contrast →
/// brightness). They are applied to copies of the calibrated image and
/// never modify it. Every file starts from the neutral settings.

use serde::{Deserialize, Serialize};

/// Allowed contrast factors
pub const CONTRAST_RANGE: (f64, f64) = (0.5, 3.0);
/// Allowed brightness factors
pub const BRIGHTNESS_RANGE: (f64, f64) = (0.5, 3.0);
/// Allowed blur radii (0 disables the blur)
pub const BLUR_RANGE: (f64, f64) = (0.0, 5.0);

/// Adjustment parameters for the active file
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct AdjustmentSettings {
    /// Contrast factor around the mean intensity (0.5 to 3.0)
    /// - 1.0 = no adjustment
    pub contrast: f64,

    /// Brightness factor (0.5 to 3.0)
    /// - 1.0 = no adjustment
    pub brightness: f64,

    /// Gaussian blur radius used as noise reduction (0.0 to 5.0)
    /// - 0.0 = no blur
    #[serde(alias = "noise")]
    pub blur_radius: f64,
}

impl Default for AdjustmentSettings {
    /// Neutral settings (no adjustment)
    fn default() -> Self {
        Self {
            contrast: 1.0,
            brightness: 1.0,
            blur_radius: 0.0,
        }
    }
}

impl AdjustmentSettings {
    /// Create settings, clamping each value into its allowed range
    pub fn new(contrast: f64, brightness: f64, blur_radius: f64) -> Self {
        Self {
            contrast: clamp_finite(contrast, CONTRAST_RANGE, 1.0),
            brightness: clamp_finite(brightness, BRIGHTNESS_RANGE, 1.0),
            blur_radius: clamp_finite(blur_radius, BLUR_RANGE, 0.0),
        }
    }

    /// Same values forced back into range (after deserialization)
    pub fn clamped(self) -> Self {
        Self::new(self.contrast, self.brightness, self.blur_radius)
    }

    /// Convert to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse from JSON string, clamping out-of-range values
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Self>(json).map(Self::clamped)
    }

    /// Check if these are the neutral settings
    pub fn is_unedited(&self) -> bool {
        *self == Self::default()
    }

    /// Reset all adjustments to neutral
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

fn clamp_finite(value: f64, (lo, hi): (f64, f64), fallback: f64) -> f64 {
    if value.is_finite() {
        value.clamp(lo, hi)
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unedited() {
        let settings = AdjustmentSettings::default();
        assert!(settings.is_unedited());
    }

    #[test]
    fn test_values_are_clamped() {
        let settings = AdjustmentSettings::new(10.0, 0.1, -2.0);
        assert_eq!(settings, AdjustmentSettings::new(3.0, 0.5, 0.0));
        assert_eq!(AdjustmentSettings::new(f64::NAN, 1.0, 0.0).contrast, 1.0);
    }

    #[test]
    fn test_serialization() {
        let settings = AdjustmentSettings::new(1.5, 2.0, 1.2);
        let json = settings.to_json().unwrap();
        let restored = AdjustmentSettings::from_json(&json).unwrap();
        assert_eq!(settings, restored);
        assert!(!restored.is_unedited());
    }

    #[test]
    fn test_from_json_clamps_and_accepts_noise_alias() {
        let restored =
            AdjustmentSettings::from_json(r#"{"contrast":9.0,"brightness":1.0,"noise":7.0}"#).unwrap();
        assert_eq!(restored, AdjustmentSettings::new(3.0, 1.0, 5.0));
    }

    #[test]
    fn test_reset() {
        let mut settings = AdjustmentSettings::new(2.0, 2.0, 2.0);
        assert!(!settings.is_unedited());
        settings.reset();
        assert!(settings.is_unedited());
    }
}
