//! Moving average calculations
//!
//! Contains the trailing mean used as the always-available forecasting
//! fallback: the mean of the most recent `period` values, or of all values
//! when fewer than `period` have been seen.

use crate::{MathError, Result};
use statrs::statistics::Statistics;
use std::collections::VecDeque;

/// Trailing mean over at most `period` values
#[derive(Debug, Clone)]
pub struct TrailingMean {
    period: usize,
    values: VecDeque<f64>,
}

impl TrailingMean {
    /// Create a new trailing mean with the specified period
    pub fn new(period: usize) -> Result<Self> {
        if period == 0 {
            return Err(MathError::InvalidInput(
                "Period must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            period,
            values: VecDeque::with_capacity(period),
        })
    }

    /// Update the trailing mean with a new value
    pub fn update(&mut self, value: f64) -> Result<()> {
        if !value.is_finite() {
            return Err(MathError::InvalidInput(format!(
                "Cannot average non-finite value {}",
                value
            )));
        }

        self.values.push_back(value);
        if self.values.len() > self.period {
            self.values.pop_front();
        }

        Ok(())
    }

    /// Get the current mean over the retained values
    pub fn value(&self) -> Result<f64> {
        if self.values.is_empty() {
            return Err(MathError::InsufficientData(
                "No data available for a trailing mean".to_string(),
            ));
        }

        Ok(self.values.iter().mean())
    }

    /// Number of values currently inside the window
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no value has been seen yet
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get the current period
    pub fn period(&self) -> usize {
        self.period
    }

    /// Reset the trailing mean, clearing all values
    pub fn reset(&mut self) {
        self.values.clear();
    }
}

/// Mean of the last `min(period, values.len())` values
pub fn trailing_mean(values: &[f64], period: usize) -> Result<f64> {
    let mut mean = TrailingMean::new(period)?;
    for &value in &values[values.len().saturating_sub(period)..] {
        mean.update(value)?;
    }
    mean.value()
}
