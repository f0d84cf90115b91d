//! Running state shared by the tracking metrics.

use crate::error::{MetricError, MetricResult};

/// Exponential moving average updated as `value = rate * value + (1 - rate) * sample`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExponentialMovingAverage {
    rate: f64,
    value: f64,
}

impl ExponentialMovingAverage {
    /// Creates an average starting at `initial` that keeps `rate` of its value per update.
    pub const fn new(rate: f64, initial: f64) -> Self {
        Self {
            rate,
            value: initial,
        }
    }

    /// Blends `sample` into the average and returns the new value.
    pub fn update(&mut self, sample: f64) -> f64 {
        self.value = self.rate * self.value + (1.0 - self.rate) * sample;
        self.value
    }

    /// Current value of the average.
    pub const fn value(&self) -> f64 {
        self.value
    }

    /// Decay rate of the average.
    pub const fn rate(&self) -> f64 {
        self.rate
    }
}

/// Sum and count of the per-batch scores seen during the current epoch.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EpochAccumulator {
    sum: f64,
    count: usize,
}

impl EpochAccumulator {
    pub fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    /// Mean of the epoch so far, zero before the first batch.
    pub fn mean(&self) -> f64 {
        if self.count > 0 {
            self.sum / self.count as f64
        } else {
            0.0
        }
    }

    /// Number of batches that contributed to the epoch.
    pub const fn count(&self) -> usize {
        self.count
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Checks that an EMA rate lies in `[0, 1)`.
pub(crate) fn validate_ema_rate(name: &str, rate: f64) -> MetricResult<()> {
    if (0.0..1.0).contains(&rate) {
        Ok(())
    } else {
        Err(MetricError::InvalidConfig {
            reason: format!("{name} must lie in [0, 1), got {rate}"),
        })
    }
}

pub(crate) fn validate_finite(name: &str, value: f64) -> MetricResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(MetricError::InvalidConfig {
            reason: format!("{name} must be finite, got {value}"),
        })
    }
}

/// Mean of a slice, `None` when it is empty.
pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ema_blends_samples_with_rate() {
        let mut ema = ExponentialMovingAverage::new(0.9, 0.0);

        ema.update(1.0);
        assert!((ema.value() - 0.1).abs() < 1e-12);

        ema.update(1.0);
        assert!((ema.value() - 0.19).abs() < 1e-12);
    }

    #[test]
    fn accumulator_mean_and_reset() {
        let mut epoch = EpochAccumulator::default();
        assert_eq!(epoch.mean(), 0.0);

        epoch.push(0.5);
        epoch.push(1.0);
        assert_eq!(epoch.count(), 2);
        assert!((epoch.mean() - 0.75).abs() < 1e-12);

        epoch.reset();
        assert_eq!(epoch.count(), 0);
        assert_eq!(epoch.mean(), 0.0);
    }

    #[test]
    fn ema_rate_must_be_below_one() {
        assert!(validate_ema_rate("rate", 0.0).is_ok());
        assert!(validate_ema_rate("rate", 0.99).is_ok());
        assert!(validate_ema_rate("rate", 1.0).is_err());
        assert!(validate_ema_rate("rate", -0.1).is_err());
        assert!(validate_ema_rate("rate", f64::NAN).is_err());
    }

    #[test]
    fn mean_of_empty_slice_is_none() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[0.25, 0.75]), Some(0.5));
    }
}
