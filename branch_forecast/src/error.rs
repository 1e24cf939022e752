//! Error types for the branch_forecast crate

use forecast_math::MathError;
use thiserror::Error;

/// Custom error types for the branch_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// Error related to forecasting operations
    #[error("Forecasting error: {0}")]
    ForecastingError(String),

    /// Error related to parameter validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Error from the numerical kernels
    #[error("Math error: {0}")]
    MathError(MathError),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A model fit ran past its time budget
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from JSON encoding or decoding
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Error from loading configuration
    #[error("Config error: {0}")]
    ConfigError(String),

    /// Error from the result store
    #[error("Sink error: {0}")]
    SinkError(String),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<MathError> for ForecastError {
    fn from(err: MathError) -> Self {
        match err {
            MathError::BudgetExceeded(evaluated) => ForecastError::Timeout(format!(
                "fit abandoned after {} candidate(s)",
                evaluated
            )),
            other => ForecastError::MathError(other),
        }
    }
}

impl From<toml::de::Error> for ForecastError {
    fn from(err: toml::de::Error) -> Self {
        ForecastError::ConfigError(err.to_string())
    }
}
