//! # Branch Forecast
//!
//! Walk-forward daily revenue forecasting for a set of branches.
//!
//! ## Features
//!
//! - Ingest of loosely-typed daily revenue exports into per-branch series
//! - Promotion and unavailability overlays used as regression inputs
//! - A tiered forecaster: event regression, Holt linear smoothing, trailing
//!   moving average, then a zero default
//! - A fixed 14-day window (`today - 7` to `today + 6`) where every day is
//!   predicted from strictly earlier observations
//! - Flat per-day output records and a replace-all result store
//!
//! ## Quick Start
//!
//! ```rust
//! use branch_forecast::config::ForecastConfig;
//! use branch_forecast::data::DataLoader;
//! use branch_forecast::pipeline::{run_forecast, ForecastInputs};
//! use chrono::NaiveDate;
//!
//! let records = DataLoader::from_json_str(
//!     r#"[{"date": "2024-03-01", "north": 100.0},
//!         {"date": "2024-03-02", "north": 120.0}]"#,
//! )?;
//! let inputs = ForecastInputs {
//!     records,
//!     ..ForecastInputs::default()
//! };
//!
//! let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
//! let run = run_forecast(&inputs, today, &ForecastConfig::default());
//! assert_eq!(run.records.len(), 14);
//! # Ok::<(), branch_forecast::ForecastError>(())
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod events;
pub mod models;
pub mod output;
pub mod pipeline;
pub mod sink;
pub mod tiers;
pub mod utils;
pub mod window;

// Re-export commonly used types
pub use crate::config::ForecastConfig;
pub use crate::data::{BranchSeries, DataLoader, RevenueHistory};
pub use crate::error::ForecastError;
pub use crate::events::{EventCalendar, EventOverlayBuilder};
pub use crate::models::{ForecastModel, ForecastResult};
pub use crate::output::{OutputAssembler, OutputRecord};
pub use crate::pipeline::{run_forecast, ForecastInputs, ForecastRun};
pub use crate::sink::{JsonFileSink, MemorySink, ResultSink};
pub use crate::tiers::{TierUsed, TieredForecaster};
pub use crate::window::{ForecastWindow, WalkForwardEngine};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
