//! Daily revenue data handling for forecasting
//!
//! Raw daily records carry a `date` plus one numeric field per branch. They
//! are normalised into one [`BranchSeries`] per branch on a shared date axis.

use crate::error::{ForecastError, Result};
use crate::events::{PromoRecord, UnavailabilityRecord};
use crate::utils::{parse_date, ParsedDate};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// One raw daily record as read from the upstream export
pub type RawDailyRecord = Map<String, Value>;

/// Field holding the record date
pub const DATE_FIELD: &str = "date";

/// Field reserved for the output total
pub const TOTAL_FIELD: &str = "total";

/// Promotion records discovered next to the primary input
pub const PROMOS_FILE: &str = "promos.json";

/// Unavailability records discovered next to the primary input
pub const UNAVAILABILITY_FILE: &str = "unavailability.json";

/// A single daily revenue value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    /// Calendar date of the value
    pub date: NaiveDate,
    /// Revenue for that date (never negative)
    pub value: f64,
}

impl Observation {
    /// Create a new observation
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// Chronologically ordered revenue for one branch
#[derive(Debug, Clone, PartialEq)]
pub struct BranchSeries {
    /// Branch identifier
    branch: String,
    /// Observations, strictly increasing by date
    observations: Vec<Observation>,
}

impl BranchSeries {
    /// Create a new series, validating ordering and values
    pub fn new(branch: impl Into<String>, observations: Vec<Observation>) -> Result<Self> {
        let branch = branch.into();

        if let Some(pair) = observations.windows(2).find(|w| w[0].date >= w[1].date) {
            return Err(ForecastError::ValidationError(format!(
                "Series for '{}' is not strictly increasing at {}",
                branch, pair[1].date
            )));
        }
        if let Some(bad) = observations
            .iter()
            .find(|o| !o.value.is_finite() || o.value < 0.0)
        {
            return Err(ForecastError::ValidationError(format!(
                "Series for '{}' has invalid value {} on {}",
                branch, bad.value, bad.date
            )));
        }

        Ok(Self {
            branch,
            observations,
        })
    }

    /// Create a new series from (date, value) pairs
    pub fn from_points(branch: impl Into<String>, points: &[(NaiveDate, f64)]) -> Result<Self> {
        let observations = points
            .iter()
            .map(|&(date, value)| Observation::new(date, value))
            .collect();
        Self::new(branch, observations)
    }

    /// Get the branch identifier
    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// Get the observations
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Observations dated strictly before `cutoff`
    pub fn before(&self, cutoff: NaiveDate) -> BranchSeries {
        let end = self.observations.partition_point(|o| o.date < cutoff);
        BranchSeries {
            branch: self.branch.clone(),
            observations: self.observations[..end].to_vec(),
        }
    }

    /// Get the values as a vector
    pub fn values(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.value).collect()
    }

    /// Get the dates as a vector
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.observations.iter().map(|o| o.date).collect()
    }

    /// Date of the first observation
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.observations.first().map(|o| o.date)
    }

    /// Date of the last observation
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.observations.last().map(|o| o.date)
    }

    /// Value of the last observation
    pub fn last_value(&self) -> Option<f64> {
        self.observations.last().map(|o| o.value)
    }

    /// Check if the series is empty
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Get the length of the series
    pub fn len(&self) -> usize {
        self.observations.len()
    }
}

/// Why a raw record was left out of the history
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// No string `date` field
    MissingDate,
    /// The `date` field matched no accepted form
    UnparsableDate(String),
    /// A branch field was not numeric
    InvalidValue {
        /// Offending field name
        field: String,
    },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::MissingDate => write!(f, "missing date"),
            SkipReason::UnparsableDate(raw) => write!(f, "unparsable date '{}'", raw),
            SkipReason::InvalidValue { field } => write!(f, "invalid value in field '{}'", field),
        }
    }
}

/// Result of normalising one raw record
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    /// The record contributed to the history
    Accepted(NaiveDate),
    /// The record was left out
    Skipped(SkipReason),
}

/// Summary of one ingest pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestReport {
    /// Number of raw records seen
    pub total_rows: usize,
    /// Number of records that contributed to the history
    pub accepted: usize,
    /// Skipped records as (row index, reason)
    pub skipped: Vec<(usize, SkipReason)>,
}

impl IngestReport {
    /// Number of skipped records
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    /// Skipped record counts grouped by reason kind
    pub fn skipped_by_kind(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for (_, reason) in &self.skipped {
            let kind = match reason {
                SkipReason::MissingDate => "missing_date",
                SkipReason::UnparsableDate(_) => "unparsable_date",
                SkipReason::InvalidValue { .. } => "invalid_value",
            };
            *counts.entry(kind).or_insert(0) += 1;
        }
        counts
    }
}

/// Per-branch revenue history on a shared date axis
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RevenueHistory {
    /// Sorted accepted record dates
    dates: Vec<NaiveDate>,
    /// Series keyed by branch identifier
    series: BTreeMap<String, BranchSeries>,
}

impl RevenueHistory {
    /// Normalise raw records into per-branch series
    ///
    /// The branch set is the union of field names across accepted records.
    /// Records sharing a date are summed.
    pub fn from_records(records: &[RawDailyRecord], reference_year: i32) -> (Self, IngestReport) {
        let mut branches: BTreeSet<String> = BTreeSet::new();
        let mut report = IngestReport {
            total_rows: records.len(),
            ..IngestReport::default()
        };
        let mut rows: BTreeMap<NaiveDate, BTreeMap<String, f64>> = BTreeMap::new();

        for (index, record) in records.iter().enumerate() {
            match parse_row(record, reference_year) {
                Ok((date, values)) => {
                    let row = rows.entry(date).or_default();
                    for (branch, value) in values {
                        branches.insert(branch.clone());
                        *row.entry(branch).or_insert(0.0) += value;
                    }
                    report.accepted += 1;
                }
                Err(reason) => {
                    debug!(row = index, %reason, "skipping daily record");
                    report.skipped.push((index, reason));
                }
            }
        }

        let dates: Vec<NaiveDate> = rows.keys().copied().collect();
        let series = branches
            .into_iter()
            .map(|branch| {
                let observations = rows
                    .iter()
                    .map(|(date, row)| {
                        Observation::new(*date, row.get(&branch).copied().unwrap_or(0.0))
                    })
                    .collect();
                let series = BranchSeries {
                    branch: branch.clone(),
                    observations,
                };
                (branch, series)
            })
            .collect();

        if report.skipped_count() > 0 {
            warn!(
                skipped = report.skipped_count(),
                accepted = report.accepted,
                "some daily records were skipped"
            );
        }

        (Self { dates, series }, report)
    }

    /// Build a history directly from already-ordered series
    pub fn from_series(series: Vec<BranchSeries>) -> Self {
        let dates: BTreeSet<NaiveDate> = series
            .iter()
            .flat_map(|s| s.observations.iter().map(|o| o.date))
            .collect();
        let series = series
            .into_iter()
            .map(|s| (s.branch.clone(), s))
            .collect();

        Self {
            dates: dates.into_iter().collect(),
            series,
        }
    }

    /// Branch identifiers in ascending order
    pub fn branches(&self) -> Vec<&str> {
        self.series.keys().map(String::as_str).collect()
    }

    /// Series for one branch
    pub fn series(&self, branch: &str) -> Option<&BranchSeries> {
        self.series.get(branch)
    }

    /// All series in branch order
    pub fn all_series(&self) -> impl Iterator<Item = &BranchSeries> {
        self.series.values()
    }

    /// The shared date axis
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Number of dates on the axis
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Check if no record was accepted
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// Parse one raw record into its date and branch values
fn parse_row(
    record: &RawDailyRecord,
    reference_year: i32,
) -> std::result::Result<(NaiveDate, BTreeMap<String, f64>), SkipReason> {
    let raw_date = record
        .get(DATE_FIELD)
        .and_then(Value::as_str)
        .ok_or(SkipReason::MissingDate)?;

    let date = match parse_date(raw_date, reference_year) {
        ParsedDate::Parsed(date) => date,
        ParsedDate::Unparsable => return Err(SkipReason::UnparsableDate(raw_date.to_string())),
    };

    let mut values = BTreeMap::new();
    for (field, raw) in record {
        if field == DATE_FIELD || field == TOTAL_FIELD {
            continue;
        }
        let value = field_value(raw).ok_or_else(|| SkipReason::InvalidValue {
            field: field.clone(),
        })?;
        values.insert(field.clone(), value);
    }

    Ok((date, values))
}

/// Interpret a branch field: numbers, numeric strings, and null/empty as zero
///
/// Negative amounts (refunds) are numeric and floored at zero.
fn field_value(raw: &Value) -> Option<f64> {
    let value = match raw {
        Value::Null => 0.0,
        Value::Number(number) => number.as_f64()?,
        Value::String(text) if text.trim().is_empty() => 0.0,
        Value::String(text) => text.trim().parse::<f64>().ok()?,
        _ => return None,
    };

    value.is_finite().then_some(value.max(0.0))
}

/// Data loader for the JSON exports
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load raw daily records from a JSON array file
    ///
    /// A missing or unreadable file, or a document that is not an array, is an
    /// error. Array elements that are not objects become empty records and
    /// are later skipped by ingest.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Vec<RawDailyRecord>> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let records = Self::from_json_str(&content)?;
        info!(path = %path.display(), records = records.len(), "loaded daily records");
        Ok(records)
    }

    /// Parse raw daily records from a JSON array string
    pub fn from_json_str(content: &str) -> Result<Vec<RawDailyRecord>> {
        let document: Value = serde_json::from_str(content)?;
        let Value::Array(items) = document else {
            return Err(ForecastError::DataError(
                "Daily revenue input must be a JSON array".to_string(),
            ));
        };

        Ok(items
            .into_iter()
            .map(|item| match item {
                Value::Object(map) => map,
                _ => Map::new(),
            })
            .collect())
    }

    /// Load the optional promotion and unavailability files next to `primary`
    pub fn load_sibling_events<P: AsRef<Path>>(
        primary: P,
    ) -> (Vec<PromoRecord>, Vec<UnavailabilityRecord>) {
        let base = primary
            .as_ref()
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        let promos = Self::read_optional_records(&base.join(PROMOS_FILE));
        let unavailability = Self::read_optional_records(&base.join(UNAVAILABILITY_FILE));
        (promos, unavailability)
    }

    /// Read a JSON array of records, tolerating absence and malformed entries
    pub fn read_optional_records<T: DeserializeOwned>(path: &Path) -> Vec<T> {
        if !path.exists() {
            debug!(path = %path.display(), "optional event file not present");
            return Vec::new();
        }

        let items: Vec<Value> = match fs::read_to_string(path)
            .map_err(ForecastError::from)
            .and_then(|content| serde_json::from_str(&content).map_err(ForecastError::from))
        {
            Ok(items) => items,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "ignoring unreadable event file");
                return Vec::new();
            }
        };

        let total = items.len();
        let records: Vec<T> = items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect();
        if records.len() < total {
            warn!(
                path = %path.display(),
                dropped = total - records.len(),
                "ignoring malformed event records"
            );
        }
        records
    }
}
