//! Output assembly: one flat record per window day

use crate::error::Result;
use crate::utils::round_value;
use crate::window::{ForecastWindow, WindowForecast};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::info;

/// One output document
///
/// Serialises as `{"date": "YYYY-MM-DD", "<branch>": n, ..., "total": n}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRecord {
    /// ISO calendar date
    pub date: String,
    /// Predicted value per branch
    #[serde(flatten)]
    pub branches: BTreeMap<String, f64>,
    /// Sum of the branch values
    pub total: f64,
}

impl OutputRecord {
    /// Build a record, computing the total from the branch values
    pub fn new(date: impl Into<String>, branches: BTreeMap<String, f64>) -> Self {
        let total = round_value(branches.values().sum());
        Self {
            date: date.into(),
            branches,
            total,
        }
    }
}

/// Merges per-branch prediction maps into per-day records
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputAssembler;

impl OutputAssembler {
    /// One record per window day, ascending by date
    ///
    /// Every branch in `branches` gets a field on every record; a missing
    /// prediction is written as 0.0.
    pub fn assemble<S: AsRef<str>>(
        window: &ForecastWindow,
        branches: &[S],
        forecast: &WindowForecast,
    ) -> Vec<OutputRecord> {
        window
            .days()
            .iter()
            .map(|&day| {
                let values = branches
                    .iter()
                    .map(|branch| {
                        let branch = branch.as_ref();
                        (branch.to_string(), forecast.value(branch, day).unwrap_or(0.0))
                    })
                    .collect();
                OutputRecord::new(day.format("%Y-%m-%d").to_string(), values)
            })
            .collect()
    }
}

/// Write records as a pretty-printed JSON array, creating parent directories
pub fn write_output_json<P: AsRef<Path>>(path: P, records: &[OutputRecord]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let content = serde_json::to_string_pretty(records)?;
    fs::write(path, content)?;

    info!(path = %path.display(), records = records.len(), "wrote forecast output");
    Ok(())
}
