//! Exponential smoothing model for daily revenue forecasting
//!
//! Holt's linear method: additive trend, no seasonality, smoothing
//! parameters fitted by grid search.

use crate::data::BranchSeries;
use crate::error::{ForecastError, Result};
use crate::models::{ForecastModel, ForecastResult, TrainedForecastModel};
use forecast_math::forecasting::{fit_holt, DoubleExponentialSmoothing};
use std::time::Instant;

/// Additive-trend exponential smoothing model
#[derive(Debug, Clone)]
pub struct HoltLinear {
    /// Name of the model
    name: String,
    /// Fits still running after this instant are abandoned
    deadline: Option<Instant>,
}

/// Trained additive-trend exponential smoothing model
#[derive(Debug, Clone)]
pub struct TrainedHoltLinear {
    /// Name of the model
    name: String,
    /// Fitted smoothing state
    state: DoubleExponentialSmoothing,
    /// Last observed value
    last_value: f64,
}

impl HoltLinear {
    /// Create a new Holt linear model
    pub fn new() -> Self {
        Self {
            name: "Holt Linear Exponential Smoothing".to_string(),
            deadline: None,
        }
    }

    /// Abandon the fit once `deadline` has passed
    pub fn with_deadline(mut self, deadline: Option<Instant>) -> Self {
        self.deadline = deadline;
        self
    }
}

impl Default for HoltLinear {
    fn default() -> Self {
        Self::new()
    }
}

impl ForecastModel for HoltLinear {
    type Trained = TrainedHoltLinear;

    fn train(&self, data: &BranchSeries) -> Result<Self::Trained> {
        let values = data.values();
        let last_value = data.last_value().ok_or_else(|| {
            ForecastError::DataError("Empty time series data".to_string())
        })?;

        let state = fit_holt(&values, self.deadline)?;

        Ok(TrainedHoltLinear {
            name: format!(
                "{} (alpha={:.2}, beta={:.2})",
                self.name,
                state.alpha(),
                state.beta()
            ),
            state,
            last_value,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedHoltLinear {
    /// Last observed training value
    pub fn last_value(&self) -> f64 {
        self.last_value
    }

    /// Fitted smoothing state
    pub fn state(&self) -> &DoubleExponentialSmoothing {
        &self.state
    }
}

impl TrainedForecastModel for TrainedHoltLinear {
    fn forecast(&self, horizon: usize) -> Result<ForecastResult> {
        let values = (1..=horizon)
            .map(|step| self.state.forecast(step))
            .collect::<forecast_math::Result<Vec<f64>>>()?;

        ForecastResult::new(values, horizon)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
