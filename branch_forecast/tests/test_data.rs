use branch_forecast::data::{BranchSeries, DataLoader, RevenueHistory, SkipReason};
use branch_forecast::events::{PromoRecord, UnavailabilityRecord};
use branch_forecast::ForecastError;
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use std::fs;
use std::io::Write;
use tempfile::{tempdir, NamedTempFile};

fn day(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

#[test]
fn test_data_loader_from_json_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"[{{"date": "2024-03-01", "north": 100.5, "south": 80}},
            {{"date": "2024-03-02", "north": 110.0, "south": null}}]"#
    )
    .unwrap();

    let records = DataLoader::from_json_file(file.path()).unwrap();
    assert_eq!(records.len(), 2);

    let (history, report) = RevenueHistory::from_records(&records, 2024);
    assert_eq!(report.accepted, 2);
    assert_eq!(history.branches(), vec!["north", "south"]);
    assert_eq!(history.series("south").unwrap().values(), vec![80.0, 0.0]);
}

#[test]
fn test_data_loader_rejects_non_array() {
    let result = DataLoader::from_json_str(r#"{"date": "2024-03-01"}"#);
    assert!(matches!(result, Err(ForecastError::DataError(_))));
}

#[test]
fn test_data_loader_missing_file() {
    let result = DataLoader::from_json_file("/nonexistent/daily.json");
    assert!(matches!(result, Err(ForecastError::IoError(_))));
}

#[test]
fn test_non_object_elements_are_skipped() {
    let records = DataLoader::from_json_str(r#"[42, {"date": "2024-03-01", "north": 1}]"#).unwrap();
    let (history, report) = RevenueHistory::from_records(&records, 2024);

    assert_eq!(report.total_rows, 2);
    assert_eq!(report.accepted, 1);
    assert_eq!(report.skipped, vec![(0, SkipReason::MissingDate)]);
    assert_eq!(history.len(), 1);
}

#[test]
fn test_ingest_skip_counts() {
    let records = DataLoader::from_json_str(
        r#"[
            {"date": "2024-03-01", "north": 10},
            {"date": "not a date", "north": 11},
            {"north": 12},
            {"date": "2024-03-02", "north": "abc"},
            {"date": "2024-03-03", "north": -5},
            {"date": "2024-03-04", "north": true},
            {"date": "2024-03-05", "north": "13.5"}
        ]"#,
    )
    .unwrap();

    let (history, report) = RevenueHistory::from_records(&records, 2024);

    assert_eq!(report.total_rows, 7);
    assert_eq!(report.accepted, 3);
    assert_eq!(report.skipped_count(), 4);

    let by_kind = report.skipped_by_kind();
    assert_eq!(by_kind.get("missing_date"), Some(&1));
    assert_eq!(by_kind.get("unparsable_date"), Some(&1));
    assert_eq!(by_kind.get("invalid_value"), Some(&2));

    assert_eq!(
        history.series("north").unwrap().values(),
        vec![10.0, 0.0, 13.5]
    );
}

#[test]
fn test_negative_value_keeps_the_record() {
    let records = DataLoader::from_json_str(
        r#"[
            {"date": "2024-03-01", "north": 10, "south": -3},
            {"date": "2024-03-02", "north": 20, "south": 4}
        ]"#,
    )
    .unwrap();

    let (history, report) = RevenueHistory::from_records(&records, 2024);

    assert_eq!(report.accepted, 2);
    assert!(report.skipped.is_empty());
    assert_eq!(history.series("north").unwrap().values(), vec![10.0, 20.0]);
    assert_eq!(history.series("south").unwrap().values(), vec![0.0, 4.0]);
}

#[test]
fn test_skipped_records_add_no_branches() {
    let records = DataLoader::from_json_str(
        r#"[
            {"date": "2024-03-01", "north": 10},
            {"date": "not a date", "ghost": 5},
            {"date": "2024-03-02", "east": "abc", "north": 11}
        ]"#,
    )
    .unwrap();

    let (history, report) = RevenueHistory::from_records(&records, 2024);
    assert_eq!(report.skipped_count(), 2);
    assert_eq!(history.branches(), vec!["north"]);
    assert!(history.series("ghost").is_none());
    assert!(history.series("east").is_none());
}

#[test]
fn test_duplicate_dates_are_summed_and_sorted() {
    let records = DataLoader::from_json_str(
        r#"[
            {"date": "2024-03-02", "north": 5},
            {"date": "2024-03-01", "north": 1},
            {"date": "2024-03-02T18:30:00", "north": 7, "total": 999}
        ]"#,
    )
    .unwrap();

    let (history, report) = RevenueHistory::from_records(&records, 2024);
    assert_eq!(report.accepted, 3);
    assert_eq!(history.branches(), vec!["north"]);
    assert_eq!(history.dates(), &[day("2024-03-01"), day("2024-03-02")]);
    assert_eq!(history.series("north").unwrap().values(), vec![1.0, 12.0]);
}

#[test]
fn test_yearless_dates_use_reference_year() {
    let records = DataLoader::from_json_str(r#"[{"date": "Aug 16", "north": 3}]"#).unwrap();
    let (history, _) = RevenueHistory::from_records(&records, 2025);
    assert_eq!(history.dates(), &[day("2025-08-16")]);
}

#[test]
fn test_branch_series_validation() {
    let unordered = BranchSeries::from_points(
        "north",
        &[(day("2024-03-02"), 1.0), (day("2024-03-01"), 2.0)],
    );
    assert!(matches!(unordered, Err(ForecastError::ValidationError(_))));

    let negative = BranchSeries::from_points("north", &[(day("2024-03-01"), -1.0)]);
    assert!(matches!(negative, Err(ForecastError::ValidationError(_))));

    let empty = BranchSeries::from_points("north", &[]).unwrap();
    assert!(empty.is_empty());
    assert_eq!(empty.last_date(), None);
}

#[test]
fn test_branch_series_before_is_strict() {
    let series = BranchSeries::from_points(
        "north",
        &[
            (day("2024-03-01"), 1.0),
            (day("2024-03-02"), 2.0),
            (day("2024-03-04"), 4.0),
        ],
    )
    .unwrap();

    assert_eq!(series.before(day("2024-03-02")).values(), vec![1.0]);
    assert_eq!(series.before(day("2024-03-03")).values(), vec![1.0, 2.0]);
    assert!(series.before(day("2024-03-01")).is_empty());
    assert_eq!(series.before(day("2025-01-01")).len(), 3);
    assert_eq!(series.before(day("2024-03-03")).branch(), "north");
}

#[test]
fn test_load_sibling_events() {
    let dir = tempdir().unwrap();
    let primary = dir.path().join("daily.json");
    fs::write(&primary, "[]").unwrap();
    fs::write(
        dir.path().join("promos.json"),
        r#"[{"branch_id": "north", "promo_dates": ["2024-03-05"]}, "junk"]"#,
    )
    .unwrap();

    let (promos, unavailability) = DataLoader::load_sibling_events(&primary);
    assert_eq!(promos, vec![PromoRecord::new("north", &["2024-03-05"])]);
    assert_eq!(unavailability, Vec::<UnavailabilityRecord>::new());
}

#[test]
fn test_malformed_sibling_file_is_ignored() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("unavailability.json");
    fs::write(&path, "{ not json").unwrap();

    let records: Vec<UnavailabilityRecord> = DataLoader::read_optional_records(&path);
    assert!(records.is_empty());
}
