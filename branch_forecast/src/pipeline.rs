//! One forecast run over a single input snapshot

use crate::config::ForecastConfig;
use crate::data::{IngestReport, RawDailyRecord, RevenueHistory};
use crate::events::{EventOverlayBuilder, PromoRecord, UnavailabilityRecord};
use crate::output::{OutputAssembler, OutputRecord};
use crate::tiers::TieredForecaster;
use crate::window::{ForecastWindow, TierUsage, WalkForwardEngine};
use chrono::{Datelike, NaiveDate};
use tracing::{info, warn};

/// Raw inputs for a run
#[derive(Debug, Clone, Default)]
pub struct ForecastInputs {
    /// Daily revenue records
    pub records: Vec<RawDailyRecord>,
    /// Promotion records (may be empty)
    pub promos: Vec<PromoRecord>,
    /// Unavailability records (may be empty)
    pub unavailability: Vec<UnavailabilityRecord>,
}

/// Outcome of a run
#[derive(Debug, Clone)]
pub struct ForecastRun {
    /// One record per window day, ascending
    pub records: Vec<OutputRecord>,
    /// What ingest accepted and skipped
    pub ingest: IngestReport,
    /// Predictions per tier
    pub usage: TierUsage,
    /// The window that was forecast
    pub window: ForecastWindow,
}

/// Ingest, overlay, forecast and assemble for the given `today`
///
/// Yearless dates in the inputs are resolved against `today`'s year.
pub fn run_forecast(inputs: &ForecastInputs, today: NaiveDate, config: &ForecastConfig) -> ForecastRun {
    let reference_year = today.year();

    let (history, ingest) = RevenueHistory::from_records(&inputs.records, reference_year);
    let branches = history.branches();
    info!(
        rows = ingest.total_rows,
        accepted = ingest.accepted,
        skipped = ?ingest.skipped_by_kind(),
        branches = branches.len(),
        "ingested daily records"
    );

    let calendar = EventOverlayBuilder::new(&inputs.promos, &inputs.unavailability, reference_year)
        .build_calendar(&branches);
    if calendar.skipped_dates() > 0 {
        warn!(skipped = calendar.skipped_dates(), "skipped unparsable event dates");
    }

    let forecaster = TieredForecaster::from_capabilities(config.capabilities(), config.fit_timeout());
    let window = ForecastWindow::around(today);
    let forecast = WalkForwardEngine::new(&forecaster)
        .with_parallel(config.engine.parallel)
        .run(&history, &calendar, &window);

    let records = OutputAssembler::assemble(&window, &branches, &forecast);

    ForecastRun {
        records,
        ingest,
        usage: forecast.usage().clone(),
        window,
    }
}
