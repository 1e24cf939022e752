//! Tiered forecaster: an ordered fallback chain of forecasting techniques
//!
//! Tiers are tried in priority order and the first success wins. A tier is
//! skipped when the training series is shorter than its minimum, and any
//! failure inside a tier (error, non-finite value, panic, time budget) falls
//! through to the next one. When every tier is exhausted the prediction is
//! the zero default.

use crate::data::BranchSeries;
use crate::error::{ForecastError, Result};
use crate::events::BranchOverlay;
use crate::models::exponential_smoothing::HoltLinear;
use crate::models::moving_average::SimpleMA;
use crate::models::regression::{EventRegression, DEFAULT_RIDGE};
use crate::models::{ForecastModel, TrainedForecastModel};
use crate::utils::{days_between, round_value};
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt::Debug;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};
use tracing::debug;

/// Minimum training points for the model-fitting tiers
pub const MIN_MODEL_POINTS: usize = 3;

/// Which technique produced a prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TierUsed {
    /// Trend + seasonality regression with event regressors
    Regression,
    /// Additive-trend exponential smoothing
    Smoothing,
    /// Trailing moving average
    Average,
    /// Zero default (no usable training data)
    None,
}

impl std::fmt::Display for TierUsed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TierUsed::Regression => write!(f, "regression"),
            TierUsed::Smoothing => write!(f, "smoothing"),
            TierUsed::Average => write!(f, "average"),
            TierUsed::None => write!(f, "none"),
        }
    }
}

/// One predicted value for one (branch, day)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// Branch identifier
    pub branch: String,
    /// Target day
    pub date: NaiveDate,
    /// Predicted value, rounded to cents
    pub value: f64,
    /// Tier that produced the value
    pub tier: TierUsed,
}

/// One technique in the fallback chain
pub trait ForecastTier: Debug + Send + Sync {
    /// Tier reported when this technique succeeds
    fn tier(&self) -> TierUsed;

    /// Minimum number of training points
    fn min_points(&self) -> usize;

    /// Predict the value on `target` from `training`
    fn predict(
        &self,
        training: &BranchSeries,
        overlay: Option<&BranchOverlay>,
        target: NaiveDate,
    ) -> Result<f64>;
}

/// Steps from the last training date to `target`
fn horizon_to(training: &BranchSeries, target: NaiveDate) -> Result<i64> {
    let last = training
        .last_date()
        .ok_or_else(|| ForecastError::DataError("Empty training series".to_string()))?;
    Ok(days_between(last, target))
}

/// Regression with promotion and unavailability regressors
#[derive(Debug, Clone)]
pub struct RegressionTier {
    ridge: f64,
    fit_timeout: Option<Duration>,
}

impl RegressionTier {
    /// Create the tier with an optional fit time budget
    pub fn new(fit_timeout: Option<Duration>) -> Self {
        Self {
            ridge: DEFAULT_RIDGE,
            fit_timeout,
        }
    }
}

impl ForecastTier for RegressionTier {
    fn tier(&self) -> TierUsed {
        TierUsed::Regression
    }

    fn min_points(&self) -> usize {
        MIN_MODEL_POINTS
    }

    fn predict(
        &self,
        training: &BranchSeries,
        overlay: Option<&BranchOverlay>,
        target: NaiveDate,
    ) -> Result<f64> {
        let deadline = self.fit_timeout.map(|budget| Instant::now() + budget);
        let trained = EventRegression::new(overlay)
            .with_ridge(self.ridge)?
            .with_deadline(deadline)
            .train(training)?;

        let steps = horizon_to(training, target)?;
        if steps < 1 {
            return trained.predict_on(target);
        }

        trained
            .forecast(steps as usize)?
            .last()
            .ok_or_else(|| ForecastError::ForecastingError("Empty regression forecast".to_string()))
    }
}

/// Additive-trend exponential smoothing
#[derive(Debug, Clone)]
pub struct SmoothingTier {
    fit_timeout: Option<Duration>,
}

impl SmoothingTier {
    /// Create the tier with an optional fit time budget
    pub fn new(fit_timeout: Option<Duration>) -> Self {
        Self { fit_timeout }
    }
}

impl ForecastTier for SmoothingTier {
    fn tier(&self) -> TierUsed {
        TierUsed::Smoothing
    }

    fn min_points(&self) -> usize {
        MIN_MODEL_POINTS
    }

    fn predict(
        &self,
        training: &BranchSeries,
        _overlay: Option<&BranchOverlay>,
        target: NaiveDate,
    ) -> Result<f64> {
        let deadline = self.fit_timeout.map(|budget| Instant::now() + budget);
        let trained = HoltLinear::new().with_deadline(deadline).train(training)?;

        let steps = horizon_to(training, target)?;
        if steps < 1 {
            return Ok(trained.last_value());
        }

        trained
            .forecast(steps as usize)?
            .last()
            .ok_or_else(|| ForecastError::ForecastingError("Empty smoothing forecast".to_string()))
    }
}

/// Mean of the last `min(window, N)` training values
#[derive(Debug, Clone)]
pub struct AverageTier {
    model: SimpleMA,
}

impl AverageTier {
    /// Create the tier with the given trailing window
    pub fn new(window: usize) -> Result<Self> {
        Ok(Self {
            model: SimpleMA::new(window)?,
        })
    }
}

impl Default for AverageTier {
    fn default() -> Self {
        Self {
            model: SimpleMA::default(),
        }
    }
}

impl ForecastTier for AverageTier {
    fn tier(&self) -> TierUsed {
        TierUsed::Average
    }

    fn min_points(&self) -> usize {
        1
    }

    fn predict(
        &self,
        training: &BranchSeries,
        _overlay: Option<&BranchOverlay>,
        _target: NaiveDate,
    ) -> Result<f64> {
        Ok(self.model.train(training)?.average())
    }
}

/// Which optional tiers are available
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierCapabilities {
    /// Enable the event regression tier
    pub regression: bool,
    /// Enable the exponential smoothing tier
    pub smoothing: bool,
}

impl TierCapabilities {
    /// Every tier enabled
    pub fn all() -> Self {
        Self {
            regression: true,
            smoothing: true,
        }
    }

    /// Only the moving average (and the zero default)
    pub fn average_only() -> Self {
        Self {
            regression: false,
            smoothing: false,
        }
    }
}

impl Default for TierCapabilities {
    fn default() -> Self {
        Self::all()
    }
}

/// Ordered fallback chain of forecasting tiers
#[derive(Debug)]
pub struct TieredForecaster {
    tiers: Vec<Box<dyn ForecastTier>>,
}

impl TieredForecaster {
    /// Build the standard chain for the given capabilities
    pub fn from_capabilities(capabilities: TierCapabilities, fit_timeout: Option<Duration>) -> Self {
        let mut tiers: Vec<Box<dyn ForecastTier>> = Vec::new();
        if capabilities.regression {
            tiers.push(Box::new(RegressionTier::new(fit_timeout)));
        }
        if capabilities.smoothing {
            tiers.push(Box::new(SmoothingTier::new(fit_timeout)));
        }
        tiers.push(Box::new(AverageTier::default()));

        Self { tiers }
    }

    /// Build a chain from an explicit list of tiers
    pub fn with_tiers(tiers: Vec<Box<dyn ForecastTier>>) -> Self {
        Self { tiers }
    }

    /// Tiers in the order they are attempted
    pub fn tier_order(&self) -> Vec<TierUsed> {
        self.tiers.iter().map(|tier| tier.tier()).collect()
    }

    /// Predict one (branch, day)
    ///
    /// `training` must already exclude observations dated on or after
    /// `target`; the walk-forward engine guarantees this.
    pub fn predict(
        &self,
        training: &BranchSeries,
        overlay: Option<&BranchOverlay>,
        target: NaiveDate,
    ) -> Prediction {
        let branch = training.branch();

        for tier in &self.tiers {
            if training.len() < tier.min_points() {
                continue;
            }

            let attempt = panic::catch_unwind(AssertUnwindSafe(|| {
                tier.predict(training, overlay, target)
            }));
            match attempt {
                Ok(Ok(value)) if value.is_finite() => {
                    return Prediction {
                        branch: branch.to_string(),
                        date: target,
                        value: round_value(value),
                        tier: tier.tier(),
                    };
                }
                Ok(Ok(value)) => {
                    debug!(branch, day = %target, tier = %tier.tier(), value, "non-finite prediction, falling through");
                }
                Ok(Err(err)) => {
                    debug!(branch, day = %target, tier = %tier.tier(), error = %err, "tier failed, falling through");
                }
                Err(_) => {
                    debug!(branch, day = %target, tier = %tier.tier(), "tier panicked, falling through");
                }
            }
        }

        Prediction {
            branch: branch.to_string(),
            date: target,
            value: 0.0,
            tier: TierUsed::None,
        }
    }
}

impl Default for TieredForecaster {
    fn default() -> Self {
        Self::from_capabilities(TierCapabilities::all(), None)
    }
}
