//! Known-event overlays (promotions and unavailability)
//!
//! Events are used only as regressors by the top forecasting tier. Overlays
//! are built per branch; records for other branches are ignored and
//! individual unparsable dates are skipped without aborting the overlay.

use crate::utils::{parse_date, parse_event_date, ParsedDate};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Kind of a known event
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A promotion ran on that date
    Promo,
    /// The branch was unavailable on that date
    Unavailability,
}

impl EventKind {
    /// Label used in logs and model column names
    pub fn label(self) -> &'static str {
        match self {
            EventKind::Promo => "promo",
            EventKind::Unavailability => "unavailability",
        }
    }
}

/// One labeled calendar event
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Event {
    /// Event date
    pub date: NaiveDate,
    /// Event kind
    pub kind: EventKind,
}

impl Event {
    /// Create a new event
    pub fn new(date: NaiveDate, kind: EventKind) -> Self {
        Self { date, kind }
    }
}

/// Promotion export record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromoRecord {
    /// Branch the promotion applies to
    #[serde(default)]
    pub branch_id: Option<String>,
    /// Raw date strings, one per promotion day
    #[serde(default)]
    pub promo_dates: Vec<Value>,
}

impl PromoRecord {
    /// Create a promotion record from date strings
    pub fn new(branch_id: impl Into<String>, dates: &[&str]) -> Self {
        Self {
            branch_id: Some(branch_id.into()),
            promo_dates: dates.iter().map(|d| Value::String(d.to_string())).collect(),
        }
    }
}

/// Unavailability export record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnavailabilityRecord {
    /// Branch that was unavailable
    #[serde(default)]
    pub branch_id: Option<String>,
    /// Raw date string
    #[serde(default)]
    pub date_unavailable: Option<Value>,
}

impl UnavailabilityRecord {
    /// Create an unavailability record from a date string
    pub fn new(branch_id: impl Into<String>, date: &str) -> Self {
        Self {
            branch_id: Some(branch_id.into()),
            date_unavailable: Some(Value::String(date.to_string())),
        }
    }
}

/// Sparse calendar of events for one branch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BranchOverlay {
    branch: String,
    events: BTreeSet<Event>,
    skipped_dates: usize,
}

impl BranchOverlay {
    /// Create an empty overlay
    pub fn new(branch: impl Into<String>) -> Self {
        Self {
            branch: branch.into(),
            events: BTreeSet::new(),
            skipped_dates: 0,
        }
    }

    /// Add an event
    pub fn insert(&mut self, event: Event) -> bool {
        self.events.insert(event)
    }

    /// Branch identifier
    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// Events in (date, kind) order
    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    /// Whether an event of `kind` falls on `date`
    pub fn has_event(&self, date: NaiveDate, kind: EventKind) -> bool {
        self.events.contains(&Event::new(date, kind))
    }

    /// Distinct event kinds present
    pub fn kinds(&self) -> BTreeSet<EventKind> {
        self.events.iter().map(|e| e.kind).collect()
    }

    /// Number of dates that could not be parsed
    pub fn skipped_dates(&self) -> usize {
        self.skipped_dates
    }

    /// Number of events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if the overlay has no events
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Overlays for every branch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventCalendar {
    overlays: BTreeMap<String, BranchOverlay>,
}

impl EventCalendar {
    /// Overlay for a branch, only when it has events
    pub fn overlay_for(&self, branch: &str) -> Option<&BranchOverlay> {
        self.overlays.get(branch).filter(|overlay| !overlay.is_empty())
    }

    /// Add or replace a branch overlay
    pub fn insert(&mut self, overlay: BranchOverlay) {
        self.overlays.insert(overlay.branch.clone(), overlay);
    }

    /// Total events across all branches
    pub fn event_count(&self) -> usize {
        self.overlays.values().map(BranchOverlay::len).sum()
    }

    /// Total skipped dates across all branches
    pub fn skipped_dates(&self) -> usize {
        self.overlays.values().map(BranchOverlay::skipped_dates).sum()
    }
}

/// Builds per-branch overlays from promotion and unavailability records
#[derive(Debug, Clone, Copy)]
pub struct EventOverlayBuilder<'a> {
    promos: &'a [PromoRecord],
    unavailability: &'a [UnavailabilityRecord],
    reference_year: i32,
}

impl<'a> EventOverlayBuilder<'a> {
    /// Create a builder over the raw records
    pub fn new(
        promos: &'a [PromoRecord],
        unavailability: &'a [UnavailabilityRecord],
        reference_year: i32,
    ) -> Self {
        Self {
            promos,
            unavailability,
            reference_year,
        }
    }

    /// Build the overlay for one branch
    pub fn build_for(&self, branch: &str) -> BranchOverlay {
        let mut overlay = BranchOverlay::new(branch);

        let promo_dates = self
            .promos
            .iter()
            .filter(|record| record.branch_id.as_deref() == Some(branch))
            .flat_map(|record| record.promo_dates.iter());
        for raw in promo_dates {
            let parsed = raw
                .as_str()
                .map_or(ParsedDate::Unparsable, |text| {
                    parse_event_date(text, self.reference_year)
                });
            self.record(&mut overlay, parsed, EventKind::Promo);
        }

        let unavailable_dates = self
            .unavailability
            .iter()
            .filter(|record| record.branch_id.as_deref() == Some(branch))
            .map(|record| record.date_unavailable.as_ref());
        for raw in unavailable_dates {
            let parsed = raw
                .and_then(Value::as_str)
                .map_or(ParsedDate::Unparsable, |text| {
                    parse_date(text, self.reference_year)
                });
            self.record(&mut overlay, parsed, EventKind::Unavailability);
        }

        if overlay.skipped_dates > 0 {
            debug!(
                branch,
                skipped = overlay.skipped_dates,
                "skipped unparsable event dates"
            );
        }
        overlay
    }

    /// Build overlays for every listed branch
    pub fn build_calendar<I, S>(&self, branches: I) -> EventCalendar
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut calendar = EventCalendar::default();
        for branch in branches {
            calendar.insert(self.build_for(branch.as_ref()));
        }
        calendar
    }

    fn record(&self, overlay: &mut BranchOverlay, parsed: ParsedDate, kind: EventKind) {
        match parsed {
            ParsedDate::Parsed(date) => {
                overlay.insert(Event::new(date, kind));
            }
            ParsedDate::Unparsable => overlay.skipped_dates += 1,
        }
    }
}
