//! # Branch Forecast Workspace
//!
//! Umbrella crate re-exporting the workspace members.
//!
//! ## Example
//!
//! ```
//! use branch_forecast_workspace::forecast::window::ForecastWindow;
//! use chrono::NaiveDate;
//!
//! let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
//! let window = ForecastWindow::around(today);
//! assert_eq!(window.len(), 14);
//! ```

pub use branch_forecast as forecast;
pub use forecast_math as math;
