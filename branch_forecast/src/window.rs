//! Walk-forward forecasting over the fixed 14-day window
//!
//! Every window day, past ones included, is predicted from observations
//! dated strictly before that day. Recorded actuals never appear in the
//! window; the engine reports what would have been predicted.

use crate::data::{BranchSeries, RevenueHistory};
use crate::events::{BranchOverlay, EventCalendar};
use crate::tiers::{Prediction, TierUsed, TieredForecaster};
use chrono::{Days, NaiveDate};
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::info;

/// Days before today in the window
pub const PAST_DAYS: u64 = 7;

/// Days after today in the window
pub const FUTURE_DAYS: u64 = 6;

/// Total window length (past days, today, future days)
pub const WINDOW_LEN: usize = (PAST_DAYS + 1 + FUTURE_DAYS) as usize;

/// The contiguous run of window days around "today"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastWindow {
    today: NaiveDate,
    days: Vec<NaiveDate>,
}

impl ForecastWindow {
    /// Window spanning `[today - 7, today + 6]`
    pub fn around(today: NaiveDate) -> Self {
        let start = today
            .checked_sub_days(Days::new(PAST_DAYS))
            .unwrap_or(NaiveDate::MIN);
        let days = start.iter_days().take(WINDOW_LEN).collect();
        Self { today, days }
    }

    /// The reference day
    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Window days in ascending order
    pub fn days(&self) -> &[NaiveDate] {
        &self.days
    }

    /// First window day
    pub fn start(&self) -> Option<NaiveDate> {
        self.days.first().copied()
    }

    /// Last window day
    pub fn end(&self) -> Option<NaiveDate> {
        self.days.last().copied()
    }

    /// Number of window days
    pub fn len(&self) -> usize {
        self.days.len()
    }

    /// Check if the window has no days
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

/// Predictions for one branch keyed by day
pub type PredictionMap = BTreeMap<NaiveDate, Prediction>;

/// Count of predictions per tier
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TierUsage {
    counts: BTreeMap<TierUsed, usize>,
}

impl TierUsage {
    /// Record one prediction
    pub fn record(&mut self, tier: TierUsed) {
        *self.counts.entry(tier).or_insert(0) += 1;
    }

    /// Predictions produced by `tier`
    pub fn count(&self, tier: TierUsed) -> usize {
        self.counts.get(&tier).copied().unwrap_or(0)
    }

    /// Total predictions recorded
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }
}

impl std::fmt::Display for TierUsage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .counts
            .iter()
            .map(|(tier, count)| format!("{}={}", tier, count))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// Per-branch prediction maps for the whole window
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowForecast {
    predictions: BTreeMap<String, PredictionMap>,
    usage: TierUsage,
}

impl WindowForecast {
    /// Prediction map for a branch
    pub fn branch(&self, branch: &str) -> Option<&PredictionMap> {
        self.predictions.get(branch)
    }

    /// Predicted value for (branch, day)
    pub fn value(&self, branch: &str, day: NaiveDate) -> Option<f64> {
        self.predictions
            .get(branch)
            .and_then(|map| map.get(&day))
            .map(|prediction| prediction.value)
    }

    /// Branches with predictions
    pub fn branches(&self) -> Vec<&str> {
        self.predictions.keys().map(String::as_str).collect()
    }

    /// Tier tally across all predictions
    pub fn usage(&self) -> &TierUsage {
        &self.usage
    }
}

/// Drives the tiered forecaster across the window, per branch
#[derive(Debug, Clone, Copy)]
pub struct WalkForwardEngine<'a> {
    forecaster: &'a TieredForecaster,
    parallel: bool,
}

impl<'a> WalkForwardEngine<'a> {
    /// Create a sequential engine
    pub fn new(forecaster: &'a TieredForecaster) -> Self {
        Self {
            forecaster,
            parallel: false,
        }
    }

    /// Evaluate branches on the rayon pool
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Predict every window day for one branch
    pub fn forecast_branch(
        &self,
        series: &BranchSeries,
        overlay: Option<&BranchOverlay>,
        window: &ForecastWindow,
    ) -> PredictionMap {
        window
            .days()
            .iter()
            .map(|&day| {
                let training = series.before(day);
                (day, self.forecaster.predict(&training, overlay, day))
            })
            .collect()
    }

    /// Predict every (branch, day) in the window
    pub fn run(
        &self,
        history: &RevenueHistory,
        calendar: &EventCalendar,
        window: &ForecastWindow,
    ) -> WindowForecast {
        let series: Vec<&BranchSeries> = history.all_series().collect();
        let forecast_one = |s: &&BranchSeries| {
            let overlay = calendar.overlay_for(s.branch());
            (s.branch().to_string(), self.forecast_branch(s, overlay, window))
        };

        let per_branch: Vec<(String, PredictionMap)> = if self.parallel {
            series.par_iter().map(forecast_one).collect()
        } else {
            series.iter().map(forecast_one).collect()
        };

        let mut usage = TierUsage::default();
        for prediction in per_branch.iter().flat_map(|(_, map)| map.values()) {
            usage.record(prediction.tier);
        }
        info!(
            branches = per_branch.len(),
            days = window.len(),
            tiers = %usage,
            "walk-forward forecast complete"
        );

        WindowForecast {
            predictions: per_branch.into_iter().collect(),
            usage,
        }
    }
}
