use branch_forecast::output::OutputRecord;
use branch_forecast::sink::{publish, JsonFileSink, MemorySink, ResultSink, MAX_STORED_RECORDS};
use branch_forecast::ForecastError;
use chrono::{Days, NaiveDate};
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;
use std::fs;
use tempfile::tempdir;

fn records(count: u64, value: f64) -> Vec<OutputRecord> {
    let first = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    (0..count)
        .map(|i| {
            let date = (first + Days::new(i)).format("%Y-%m-%d").to_string();
            OutputRecord::new(date, BTreeMap::from([("north".to_string(), value)]))
        })
        .collect()
}

#[test]
fn test_memory_sink_replaces_prior_set() {
    let mut sink = MemorySink::with_documents(records(20, 1.0));
    let fresh = records(14, 2.0);

    let stored = sink.replace_all(&fresh).unwrap();

    assert_eq!(stored, 14);
    assert_eq!(sink.documents(), fresh.as_slice());
}

#[test]
fn test_sink_keeps_newest_records() {
    let mut sink = MemorySink::default();
    let many = records(20, 3.0);

    assert_eq!(sink.replace_all(&many).unwrap(), MAX_STORED_RECORDS);
    assert_eq!(sink.documents(), &many[6..]);
}

#[test]
fn test_json_file_sink_replaces_prior_set() {
    let dir = tempdir().unwrap();
    let mut sink = JsonFileSink::new(dir.path(), "forecast").unwrap();

    sink.replace_all(&records(20, 1.0)).unwrap();
    assert_eq!(sink.load().unwrap().len(), MAX_STORED_RECORDS);

    let fresh = records(14, 9.0);
    assert_eq!(publish(&mut sink, &fresh), Some(14));
    assert_eq!(sink.load().unwrap(), fresh);

    let leftovers: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(leftovers, vec![std::ffi::OsString::from("forecast.json")]);
}

#[test]
fn test_json_file_sink_empty_before_first_write() {
    let dir = tempdir().unwrap();
    let sink = JsonFileSink::new(dir.path().join("store"), "forecast").unwrap();
    assert!(sink.load().unwrap().is_empty());
    assert!(sink.describe().ends_with("forecast.json"));
}

#[test]
fn test_json_file_sink_rejects_bad_collection() {
    for name in ["", "../escape", ".hidden"] {
        assert!(matches!(
            JsonFileSink::new("/tmp", name),
            Err(ForecastError::InvalidParameter(_))
        ));
    }
}

#[test]
fn test_publish_failure_is_not_fatal() {
    let dir = tempdir().unwrap();
    // A regular file where the store directory should be
    let blocker = dir.path().join("store");
    fs::write(&blocker, "not a directory").unwrap();

    let mut sink = JsonFileSink::new(&blocker, "forecast").unwrap();
    assert_eq!(publish(&mut sink, &records(3, 1.0)), None);
    assert_eq!(fs::read_to_string(&blocker).unwrap(), "not a directory");
}
