//! Binary threshold selection
//!
//! Either a user-entered fixed cutoff or Otsu's method. A pixel is signal
//! when its processed intensity is strictly greater than the threshold.
use log::warn;
use serde::{Deserialize, Serialize};

use super::histogram::Histogram;
use crate::error::{InnervationError, Result};

/// Cutoff substituted when the entered text is not a number
pub const DEFAULT_CUTOFF: f64 = 128.0;

/// How the threshold is chosen
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ThresholdConfig {
    /// `pixel > value`
    FixedCutoff(f64),
    /// Fitted per measurement on the masked non-zero samples
    Otsu,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        ThresholdConfig::FixedCutoff(DEFAULT_CUTOFF)
    }
}

impl ThresholdConfig {
    /// Parse the fixed cutoff entry
    pub fn parse_cutoff(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(ThresholdConfig::FixedCutoff(value)),
            _ => Err(InnervationError::ThresholdParse(text.to_string())),
        }
    }

    /// Parse the fixed cutoff entry, degrading to `DEFAULT_CUTOFF`
    pub fn cutoff_or_default(text: &str) -> Self {
        Self::parse_cutoff(text).unwrap_or_else(|err| {
            warn!("⚠️  {}, using cutoff {}", err, DEFAULT_CUTOFF);
            ThresholdConfig::FixedCutoff(DEFAULT_CUTOFF)
        })
    }

    /// Threshold to apply to `samples`
    ///
    /// For `Otsu` the samples must be exactly the population being measured.
    pub fn resolve(&self, samples: &[u8]) -> f64 {
        match *self {
            ThresholdConfig::FixedCutoff(value) => value,
            ThresholdConfig::Otsu => f64::from(otsu_threshold(samples)),
        }
    }
}

/// Otsu's method over a 256-bin histogram of `samples`
///
/// For every candidate `t` whose cumulative weight is strictly between 0
/// and 1 the inter-class variance `w(1-w)(mean_bg - mean_fg)^2` is
/// evaluated; background is `<= t`. When several bins share the maximum
/// variance (empty bins between two modes) the midpoint of the first and
/// last of them is returned. Empty or single-valued input gives 0.
pub fn otsu_threshold(samples: &[u8]) -> u8 {
    let hist = Histogram::from_samples(samples);
    if hist.distinct() < 2 {
        return 0;
    }

    let total = hist.total;
    let total_sum: f64 = hist
        .data
        .iter()
        .enumerate()
        .map(|(i, &c)| i as f64 * f64::from(c))
        .sum();

    let mut cum_count = 0u64;
    let mut cum_sum = 0.0;
    let mut best = f64::NEG_INFINITY;
    let (mut first, mut last) = (0usize, 0usize);

    for (t, &count) in hist.data.iter().enumerate() {
        cum_count += u64::from(count);
        cum_sum += t as f64 * f64::from(count);
        if cum_count == 0 || cum_count == total {
            continue;
        }

        let w = cum_count as f64 / total as f64;
        let mean_bg = cum_sum / cum_count as f64;
        let mean_fg = (total_sum - cum_sum) / (total - cum_count) as f64;
        let variance = w * (1.0 - w) * (mean_bg - mean_fg).powi(2);

        if variance > best {
            best = variance;
            first = t;
            last = t;
        } else if variance == best {
            last = t;
        }
    }

    ((first + last) / 2) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_otsu_bimodal_between_modes() {
        let mut samples = vec![10u8; 1000];
        samples.extend(std::iter::repeat(200u8).take(1000));
        let t = otsu_threshold(&samples);
        assert!(t > 10 && t < 200, "threshold {} should separate the modes", t);
    }

    #[test]
    fn test_otsu_spread_clusters() {
        let mut samples: Vec<u8> = (20..60).collect();
        samples.extend(150..230u8);
        let t = otsu_threshold(&samples);
        assert!((59..150).contains(&t), "threshold {}", t);
    }

    #[test]
    fn test_otsu_degenerate() {
        assert_eq!(otsu_threshold(&[]), 0);
        assert_eq!(otsu_threshold(&[77; 50]), 0);
    }

    #[test]
    fn test_otsu_two_adjacent_values() {
        assert_eq!(otsu_threshold(&[4, 4, 5, 5]), 4);
    }

    #[test]
    fn test_parse_cutoff() {
        assert_eq!(
            ThresholdConfig::parse_cutoff(" 42.5 ").unwrap(),
            ThresholdConfig::FixedCutoff(42.5)
        );
        assert!(matches!(
            ThresholdConfig::parse_cutoff("abc"),
            Err(InnervationError::ThresholdParse(_))
        ));
        assert!(ThresholdConfig::parse_cutoff("NaN").is_err());
    }

    #[test]
    fn test_invalid_cutoff_degrades_to_default() {
        assert_eq!(
            ThresholdConfig::cutoff_or_default(""),
            ThresholdConfig::FixedCutoff(DEFAULT_CUTOFF)
        );
    }

    #[test]
    fn test_resolve() {
        assert_eq!(ThresholdConfig::FixedCutoff(9.0).resolve(&[1, 2, 3]), 9.0);
        assert_eq!(ThresholdConfig::Otsu.resolve(&[]), 0.0);
    }

    #[test]
    fn test_serde_shape() {
        let json = serde_json::to_string(&ThresholdConfig::Otsu).unwrap();
        assert_eq!(json, "\"Otsu\"");
        let parsed: ThresholdConfig = serde_json::from_str("{\"FixedCutoff\":50.0}").unwrap();
        assert_eq!(parsed, ThresholdConfig::FixedCutoff(50.0));
    }
}
