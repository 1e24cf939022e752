//! Result sinks with replace-all semantics
//!
//! A sink holds one named collection of output records. Every publish
//! deletes the prior set and stores the newest records in its place.

use crate::error::{ForecastError, Result};
use crate::output::OutputRecord;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Most records kept in the collection
pub const MAX_STORED_RECORDS: usize = 14;

/// Local store directory used when none is configured
pub const DEFAULT_STORE_DIR: &str = "output/store";

/// Default collection name
pub const DEFAULT_COLLECTION: &str = "forecast";

/// A store whose collection is wholly replaced on each run
pub trait ResultSink {
    /// Replace every stored record with the newest `MAX_STORED_RECORDS` of `records`
    ///
    /// Returns the number of records stored.
    fn replace_all(&mut self, records: &[OutputRecord]) -> Result<usize>;

    /// Human-readable target for logs
    fn describe(&self) -> String;
}

/// The newest records, capped at `MAX_STORED_RECORDS`
fn newest(records: &[OutputRecord]) -> &[OutputRecord] {
    &records[records.len().saturating_sub(MAX_STORED_RECORDS)..]
}

/// Publish to a sink, downgrading failure to a warning
pub fn publish(sink: &mut dyn ResultSink, records: &[OutputRecord]) -> Option<usize> {
    match sink.replace_all(records) {
        Ok(stored) => {
            info!(store = %sink.describe(), stored, "replaced stored forecast");
            Some(stored)
        }
        Err(err) => {
            warn!(store = %sink.describe(), error = %err, "failed to write forecast to store");
            None
        }
    }
}

/// In-memory sink
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemorySink {
    documents: Vec<OutputRecord>,
}

impl MemorySink {
    /// Create a sink pre-populated with existing documents
    pub fn with_documents(documents: Vec<OutputRecord>) -> Self {
        Self { documents }
    }

    /// Currently stored documents
    pub fn documents(&self) -> &[OutputRecord] {
        &self.documents
    }
}

impl ResultSink for MemorySink {
    fn replace_all(&mut self, records: &[OutputRecord]) -> Result<usize> {
        self.documents = newest(records).to_vec();
        Ok(self.documents.len())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

/// Sink storing a collection as one JSON file under a directory
///
/// The new set is written to a temporary file and renamed over the
/// collection file, so readers see either the old set or the new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonFileSink {
    dir: PathBuf,
    collection: String,
}

impl JsonFileSink {
    /// Create a sink for `collection` under `dir`
    pub fn new(dir: impl Into<PathBuf>, collection: impl Into<String>) -> Result<Self> {
        let collection = collection.into();
        if collection.is_empty()
            || collection.contains(['/', '\\'])
            || collection.starts_with('.')
        {
            return Err(ForecastError::InvalidParameter(format!(
                "Invalid collection name '{}'",
                collection
            )));
        }

        Ok(Self {
            dir: dir.into(),
            collection,
        })
    }

    /// Path of the collection file
    pub fn collection_path(&self) -> PathBuf {
        self.dir.join(format!("{}.json", self.collection))
    }

    /// Read the stored collection (empty when it does not exist yet)
    pub fn load(&self) -> Result<Vec<OutputRecord>> {
        let path = self.collection_path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn write_atomically(&self, path: &Path, content: &str) -> Result<()> {
        let staging = self.dir.join(format!(".{}.json.tmp", self.collection));
        fs::write(&staging, content)?;
        fs::rename(&staging, path).map_err(|err| {
            let _ = fs::remove_file(&staging);
            ForecastError::SinkError(format!(
                "could not replace {}: {}",
                path.display(),
                err
            ))
        })
    }
}

impl ResultSink for JsonFileSink {
    fn replace_all(&mut self, records: &[OutputRecord]) -> Result<usize> {
        fs::create_dir_all(&self.dir).map_err(|err| {
            ForecastError::SinkError(format!(
                "could not open store {}: {}",
                self.dir.display(),
                err
            ))
        })?;

        let stored = newest(records);
        let content = serde_json::to_string_pretty(stored)?;
        self.write_atomically(&self.collection_path(), &content)?;
        Ok(stored.len())
    }

    fn describe(&self) -> String {
        self.collection_path().display().to_string()
    }
}
