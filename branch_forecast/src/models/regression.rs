//! Trend + weekly seasonality regression with event regressors
//!
//! The design row for a date is
//! `[1, t, weekly Fourier terms, one indicator per event kind]`, where `t`
//! counts weeks since the first training date. Weekly terms are included
//! only once the training span covers two full weeks.
//!
//! Overlay events are not truncated at the training cutoff: an event on the
//! target day (or later) still shapes the design rows. This lets a known
//! future promotion move the prediction, and is also a leakage path.

use crate::data::BranchSeries;
use crate::error::{ForecastError, Result};
use crate::events::{BranchOverlay, EventKind};
use crate::models::{ForecastModel, ForecastResult, TrainedForecastModel};
use chrono::{Datelike, Days, NaiveDate};
use forecast_math::forecasting::LeastSquares;
use std::f64::consts::PI;
use std::time::Instant;

/// Default ridge penalty on non-intercept coefficients
pub const DEFAULT_RIDGE: f64 = 1e-3;

/// Fourier orders used for the weekly cycle
const WEEKLY_ORDER: usize = 3;

/// Minimum training span (in days) before weekly terms are fitted
const MIN_SEASONAL_SPAN_DAYS: i64 = 14;

/// Regression on trend, weekly seasonality and known events
#[derive(Debug, Clone)]
pub struct EventRegression<'a> {
    /// Name of the model
    name: String,
    /// Ridge penalty
    ridge: f64,
    /// Known events for the branch
    overlay: Option<&'a BranchOverlay>,
    /// Fits still running after this instant are abandoned
    deadline: Option<Instant>,
}

/// Column layout shared by training and forecasting
#[derive(Debug, Clone)]
struct DesignLayout {
    origin: NaiveDate,
    seasonal: bool,
    event_kinds: Vec<EventKind>,
}

impl DesignLayout {
    fn row(&self, date: NaiveDate, overlay: Option<&BranchOverlay>) -> Vec<f64> {
        let mut row = Vec::with_capacity(2 + 2 * WEEKLY_ORDER + self.event_kinds.len());
        row.push(1.0);
        row.push((date - self.origin).num_days() as f64 / 7.0);

        if self.seasonal {
            let weekday = date.weekday().num_days_from_monday() as f64;
            for order in 1..=WEEKLY_ORDER {
                let angle = 2.0 * PI * order as f64 * weekday / 7.0;
                row.push(angle.sin());
                row.push(angle.cos());
            }
        }

        for &kind in &self.event_kinds {
            let active = overlay.is_some_and(|o| o.has_event(date, kind));
            row.push(if active { 1.0 } else { 0.0 });
        }

        row
    }
}

/// Trained event regression
#[derive(Debug, Clone)]
pub struct TrainedEventRegression {
    /// Name of the model
    name: String,
    /// Fitted coefficients
    solver: LeastSquares,
    /// Column layout
    layout: DesignLayout,
    /// Events that shape future design rows
    overlay: Option<BranchOverlay>,
    /// Last training date
    last_date: NaiveDate,
}

impl<'a> EventRegression<'a> {
    /// Create a new event regression with the default ridge penalty
    pub fn new(overlay: Option<&'a BranchOverlay>) -> Self {
        Self {
            name: "Event Regression".to_string(),
            ridge: DEFAULT_RIDGE,
            overlay,
            deadline: None,
        }
    }

    /// Use a different ridge penalty
    pub fn with_ridge(mut self, ridge: f64) -> Result<Self> {
        if !ridge.is_finite() || ridge < 0.0 {
            return Err(ForecastError::InvalidParameter(
                "Ridge penalty must be non-negative".to_string(),
            ));
        }
        self.ridge = ridge;
        Ok(self)
    }

    /// Abandon the fit once `deadline` has passed
    pub fn with_deadline(mut self, deadline: Option<Instant>) -> Self {
        self.deadline = deadline;
        self
    }

    fn check_deadline(&self) -> Result<()> {
        if self.deadline.is_some_and(|limit| Instant::now() > limit) {
            return Err(ForecastError::Timeout(
                "event regression fit exceeded its budget".to_string(),
            ));
        }
        Ok(())
    }
}

impl ForecastModel for EventRegression<'_> {
    type Trained = TrainedEventRegression;

    fn train(&self, data: &BranchSeries) -> Result<Self::Trained> {
        let (origin, last_date) = match (data.first_date(), data.last_date()) {
            (Some(first), Some(last)) => (first, last),
            _ => {
                return Err(ForecastError::DataError(
                    "Empty time series data".to_string(),
                ))
            }
        };

        let layout = DesignLayout {
            origin,
            seasonal: (last_date - origin).num_days() + 1 >= MIN_SEASONAL_SPAN_DAYS,
            event_kinds: self
                .overlay
                .map(|o| o.kinds().into_iter().collect())
                .unwrap_or_default(),
        };

        let rows: Vec<Vec<f64>> = data
            .dates()
            .into_iter()
            .map(|date| layout.row(date, self.overlay))
            .collect();

        self.check_deadline()?;
        let mut solver = LeastSquares::new(self.ridge)?;
        solver.fit(&rows, &data.values())?;
        self.check_deadline()?;

        Ok(TrainedEventRegression {
            name: format!("{} ({} columns)", self.name, rows[0].len()),
            solver,
            layout,
            overlay: self.overlay.cloned(),
            last_date,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedEventRegression {
    /// Predicted value for any calendar date
    pub fn predict_on(&self, date: NaiveDate) -> Result<f64> {
        let row = self.layout.row(date, self.overlay.as_ref());
        let value = self.solver.predict(&row)?;
        if !value.is_finite() {
            return Err(ForecastError::ForecastingError(format!(
                "Event regression produced a non-finite value for {}",
                date
            )));
        }
        Ok(value)
    }

    /// Last training date
    pub fn last_date(&self) -> NaiveDate {
        self.last_date
    }
}

impl TrainedForecastModel for TrainedEventRegression {
    fn forecast(&self, horizon: usize) -> Result<ForecastResult> {
        let values = (1..=horizon as u64)
            .map(|step| {
                let date = self
                    .last_date
                    .checked_add_days(Days::new(step))
                    .ok_or_else(|| {
                        ForecastError::ForecastingError("Forecast date out of range".to_string())
                    })?;
                self.predict_on(date)
            })
            .collect::<Result<Vec<f64>>>()?;

        ForecastResult::new(values, horizon)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
