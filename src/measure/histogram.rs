//! Intensity histogram over the 8-bit range
//!
//! Used by Otsu threshold selection and by the contrast step of the preview.

/// 256-bin histogram of 8-bit samples
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// Counts per intensity value
    pub data: [u32; 256],
    /// Number of samples counted
    pub total: u64,
}

impl Default for Histogram {
    fn default() -> Self {
        Self {
            data: [0; 256],
            total: 0,
        }
    }
}

impl Histogram {
    /// Count every sample
    pub fn from_samples(samples: &[u8]) -> Self {
        let mut hist = Self::default();
        for &s in samples {
            hist.data[s as usize] += 1;
        }
        hist.total = samples.len() as u64;
        hist
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Number of distinct values present
    pub fn distinct(&self) -> usize {
        self.data.iter().filter(|&&c| c > 0).count()
    }

    /// Mean intensity, 0 when empty
    pub fn mean(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let sum: f64 = self
            .data
            .iter()
            .enumerate()
            .map(|(i, &c)| i as f64 * f64::from(c))
            .sum();
        sum / self.total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_and_mean() {
        let hist = Histogram::from_samples(&[0, 0, 10, 20]);
        assert_eq!(hist.data[0], 2);
        assert_eq!(hist.total, 4);
        assert_eq!(hist.distinct(), 3);
        assert_eq!(hist.mean(), 7.5);
    }

    #[test]
    fn test_empty() {
        let hist = Histogram::from_samples(&[]);
        assert!(hist.is_empty());
        assert_eq!(hist.mean(), 0.0);
        assert_eq!(hist.distinct(), 0);
    }
}
