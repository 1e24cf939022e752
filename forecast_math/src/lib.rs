//! # Forecast Math
//!
//! Numerical kernels used by the branch revenue forecaster.
//! This crate provides the smoothing, averaging and least-squares
//! calculations behind each forecasting tier, free of any notion of
//! branches, calendars or I/O.

use thiserror::Error;

pub mod forecasting;
pub mod moving_averages;

/// Errors that can occur in forecasting calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),

    #[error("Fit time budget exceeded after {0} candidate(s)")]
    BudgetExceeded(usize),
}

/// Result type for forecasting math operations
pub type Result<T> = std::result::Result<T, MathError>;

/// Round a value to a fixed number of decimal places (half away from zero)
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
