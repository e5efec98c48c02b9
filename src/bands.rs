//! Volatility envelope (moving average +/- k standard deviations)

use crate::error::{GotobiError, Result};
use crate::types::{Price, PriceSeries};
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, Distribution};

/// Default trailing window
pub const DEFAULT_WINDOW: usize = 20;

/// Default band width in standard deviations
pub const DEFAULT_MULTIPLIER: f64 = 2.0;

/// Band snapshot for the most recent bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandEstimate {
    pub last_price: Price,
    pub middle: Price,
    pub upper_band: Price,
    pub lower_band: Price,
}

impl BandEstimate {
    /// Price at or below the lower band
    pub fn pierces_lower(&self, threshold: Price) -> bool {
        self.last_price <= threshold
    }

    /// Price at or above the upper band
    pub fn pierces_upper(&self) -> bool {
        self.last_price >= self.upper_band
    }

    /// Width of the envelope
    pub fn width(&self) -> Price {
        self.upper_band - self.lower_band
    }
}

/// Computes the envelope over the trailing closes of a series
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandEstimator {
    window: usize,
    multiplier: f64,
}

impl BandEstimator {
    /// Create an estimator; the window must hold at least two bars
    pub fn new(window: usize, multiplier: f64) -> Result<Self> {
        if window < 2 {
            return Err(GotobiError::Config(format!(
                "Band window must be at least 2, got {}",
                window
            )));
        }
        if !(multiplier.is_finite() && multiplier > 0.0) {
            return Err(GotobiError::Config(format!(
                "Band multiplier must be positive, got {}",
                multiplier
            )));
        }
        Ok(Self { window, multiplier })
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    /// Estimate bands from the trailing `window` closes
    pub fn estimate(&self, series: &PriceSeries) -> Result<BandEstimate> {
        let closes = series
            .trailing_closes(self.window)
            .ok_or(GotobiError::InsufficientData {
                required: self.window,
                available: series.len(),
            })?;

        let data = Data::new(closes);
        let middle = data.mean().unwrap_or(0.0);
        let std_dev = data.std_dev().unwrap_or(0.0);

        Ok(BandEstimate {
            last_price: series.last_price(),
            middle,
            upper_band: middle + self.multiplier * std_dev,
            lower_band: middle - self.multiplier * std_dev,
        })
    }
}

impl Default for BandEstimator {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            multiplier: DEFAULT_MULTIPLIER,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_known_values() {
        let series = PriceSeries::from_closes(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        let estimator = BandEstimator::new(8, 2.0).unwrap();
        let bands = estimator.estimate(&series).unwrap();

        // mean 5, sample variance 32/7
        let std_dev = (32.0_f64 / 7.0).sqrt();
        assert_relative_eq!(bands.middle, 5.0, epsilon = 1e-12);
        assert_relative_eq!(bands.upper_band, 5.0 + 2.0 * std_dev, epsilon = 1e-12);
        assert_relative_eq!(bands.lower_band, 5.0 - 2.0 * std_dev, epsilon = 1e-12);
        assert_eq!(bands.last_price, 9.0);
    }

    #[test]
    fn test_uses_only_trailing_window() {
        let series = PriceSeries::from_closes(&[1000.0, 10.0, 10.0, 10.0]).unwrap();
        let bands = BandEstimator::new(3, 2.0).unwrap().estimate(&series).unwrap();
        assert_relative_eq!(bands.middle, 10.0);
        assert_relative_eq!(bands.width(), 0.0);
    }

    #[test]
    fn test_insufficient_data() {
        let series = PriceSeries::from_closes(&[150.0; 9]).unwrap();
        let err = BandEstimator::new(10, 2.0).unwrap().estimate(&series).unwrap_err();
        assert!(matches!(
            err,
            GotobiError::InsufficientData {
                required: 10,
                available: 9
            }
        ));
    }

    #[test]
    fn test_rejects_bad_parameters() {
        assert!(BandEstimator::new(1, 2.0).is_err());
        assert!(BandEstimator::new(20, 0.0).is_err());
        assert!(BandEstimator::new(20, f64::NAN).is_err());
    }

    #[test]
    fn test_piercing() {
        let bands = BandEstimate {
            last_price: 149.0,
            middle: 150.0,
            upper_band: 151.0,
            lower_band: 149.5,
        };
        assert!(bands.pierces_lower(bands.lower_band));
        assert!(!bands.pierces_upper());
    }
}
