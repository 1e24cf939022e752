//! Run configuration
//!
//! Loaded from an optional TOML file, then overridden by environment
//! variables. Every section and field is optional.
//!
//! ```toml
//! [tiers]
//! regression = true
//! smoothing = true
//!
//! [engine]
//! fit_timeout_ms = 2000
//! parallel = false
//!
//! [output]
//! path = "output/forecast_output.json"
//!
//! [sink]
//! enabled = true
//! dir = "output/store"
//! collection = "forecast"
//! ```

use crate::error::{ForecastError, Result};
use crate::sink::{DEFAULT_COLLECTION, DEFAULT_STORE_DIR};
use crate::tiers::TierCapabilities;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Overrides the sink directory
pub const ENV_STORE_DIR: &str = "FORECAST_STORE_DIR";

/// Overrides the sink collection name
pub const ENV_STORE_COLLECTION: &str = "FORECAST_STORE_COLLECTION";

/// Default primary output path
pub const DEFAULT_OUTPUT_PATH: &str = "output/forecast_output.json";

/// Which optional tiers are enabled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierSettings {
    pub regression: bool,
    pub smoothing: bool,
}

impl Default for TierSettings {
    fn default() -> Self {
        Self {
            regression: true,
            smoothing: true,
        }
    }
}

/// Walk-forward engine settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Per-fit time budget in milliseconds; 0 disables the budget
    ///
    /// The budget is wall-clock time, so an overrun under load can change
    /// which tier serves a day. Runs are reproducible only with 0.
    pub fit_timeout_ms: u64,
    /// Evaluate branches in parallel
    pub parallel: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            fit_timeout_ms: 2000,
            parallel: false,
        }
    }
}

/// Primary output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub path: PathBuf,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_OUTPUT_PATH),
        }
    }
}

/// Result store settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkSettings {
    pub enabled: bool,
    /// Store directory; `output/store` when unset
    pub dir: Option<PathBuf>,
    pub collection: String,
}

impl Default for SinkSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
            collection: DEFAULT_COLLECTION.to_string(),
        }
    }
}

/// Full run configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    pub tiers: TierSettings,
    pub engine: EngineSettings,
    pub output: OutputSettings,
    pub sink: SinkSettings,
}

impl ForecastConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Read a configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|err| {
            ForecastError::ConfigError(format!("cannot read {}: {}", path.display(), err))
        })?;
        Self::from_toml_str(&content)
    }

    /// Load from an optional file and apply process environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        Ok(config.with_env_overrides(|key| std::env::var(key).ok()))
    }

    /// Apply overrides from a variable lookup
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(ENV_STORE_DIR).filter(|v| !v.trim().is_empty()) {
            self.sink.dir = Some(PathBuf::from(dir.trim()));
        }
        if let Some(collection) = lookup(ENV_STORE_COLLECTION).filter(|v| !v.trim().is_empty()) {
            self.sink.collection = collection.trim().to_string();
        }
        self
    }

    /// Tier capabilities for the forecaster
    pub fn capabilities(&self) -> TierCapabilities {
        TierCapabilities {
            regression: self.tiers.regression,
            smoothing: self.tiers.smoothing,
        }
    }

    /// Per-fit time budget, if any
    pub fn fit_timeout(&self) -> Option<Duration> {
        (self.engine.fit_timeout_ms > 0).then(|| Duration::from_millis(self.engine.fit_timeout_ms))
    }

    /// Resolved sink directory
    pub fn sink_dir(&self) -> PathBuf {
        self.sink
            .dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_DIR))
    }
}
