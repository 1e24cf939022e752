//! Moving average model for daily revenue forecasting

use crate::data::BranchSeries;
use crate::error::{ForecastError, Result};
use crate::models::{ForecastModel, ForecastResult, TrainedForecastModel};
use crate::utils::round_value;
use forecast_math::moving_averages::trailing_mean;

/// Default trailing window in days
pub const DEFAULT_WINDOW: usize = 7;

/// Simple Moving Average over at most `window` trailing values
#[derive(Debug, Clone)]
pub struct SimpleMA {
    /// Name of the model
    name: String,
    /// Window size
    window: usize,
}

/// Trained Simple Moving Average model
#[derive(Debug, Clone)]
pub struct TrainedSimpleMA {
    /// Name of the model
    name: String,
    /// Number of values actually averaged
    used: usize,
    /// Average rounded to cents
    average: f64,
}

impl SimpleMA {
    /// Create a new Simple Moving Average model
    pub fn new(window: usize) -> Result<Self> {
        if window == 0 {
            return Err(ForecastError::InvalidParameter(
                "Window size must be positive".to_string(),
            ));
        }

        Ok(Self {
            name: format!("Simple Moving Average (window={})", window),
            window,
        })
    }

    /// Get the window size
    pub fn window(&self) -> usize {
        self.window
    }
}

impl Default for SimpleMA {
    fn default() -> Self {
        Self {
            name: format!("Simple Moving Average (window={})", DEFAULT_WINDOW),
            window: DEFAULT_WINDOW,
        }
    }
}

impl ForecastModel for SimpleMA {
    type Trained = TrainedSimpleMA;

    fn train(&self, data: &BranchSeries) -> Result<Self::Trained> {
        let values = data.values();
        if values.is_empty() {
            return Err(ForecastError::DataError(
                "Empty time series data".to_string(),
            ));
        }

        let average = round_value(trailing_mean(&values, self.window)?);

        Ok(TrainedSimpleMA {
            name: self.name.clone(),
            used: values.len().min(self.window),
            average,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedSimpleMA {
    /// Get the rounded average
    pub fn average(&self) -> f64 {
        self.average
    }

    /// Number of trailing values that went into the average
    pub fn used(&self) -> usize {
        self.used
    }
}

impl TrainedForecastModel for TrainedSimpleMA {
    fn forecast(&self, horizon: usize) -> Result<ForecastResult> {
        // The forecast is flat at the last average
        ForecastResult::new(vec![self.average; horizon], horizon)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
