//! Pipeline configuration
//!
//! This module contains the configuration structures used to drive a
//! pipeline run and the query server, loaded from YAML. Every field has a
//! default, so an empty file (or no file at all) yields the standard
//! Manhattan yellow-taxi setup.

use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete pipeline configuration loaded from YAML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Analytical store settings
    pub store: StoreSettings,

    /// Input locations
    pub input: InputSettings,

    /// Fact acceptance filter
    pub filters: FilterBounds,

    /// Aggregate thresholds
    pub aggregates: AggregateSettings,

    /// Anomaly query thresholds
    pub anomalies: AnomalySettings,

    /// Query server settings
    pub server: ServerSettings,
}

impl PipelineConfig {
    /// Load configuration from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read config file '{}': {e}",
                path.display()
            ))
        })?;
        Self::from_yaml_str(&content)
    }

    /// Parse configuration from a YAML string and validate it
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate value ranges and cross-field constraints
    pub fn validate(&self) -> Result<()> {
        self.store.validate()?;
        self.input.validate()?;
        self.filters.validate()?;
        self.aggregates.validate()?;
        self.anomalies.validate()?;
        Ok(())
    }
}

// ============================================================================
// Store Settings
// ============================================================================

/// DuckDB store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Path of the DuckDB database file
    pub path: PathBuf,

    /// DuckDB `memory_limit` setting (e.g. "8GB")
    pub memory_limit: String,

    /// DuckDB worker threads
    pub threads: usize,

    /// Drop and re-create all tables before loading
    pub rebuild: bool,

    /// Build into a staging file and rename it over `path` on success
    pub staging: bool,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/taxi_analytics.duckdb"),
            memory_limit: "8GB".to_string(),
            threads: 8,
            rebuild: false,
            staging: false,
        }
    }
}

impl StoreSettings {
    /// Path the pipeline actually writes to
    pub fn build_path(&self) -> PathBuf {
        if self.staging {
            let mut name = self.path.as_os_str().to_owned();
            name.push(".staging");
            PathBuf::from(name)
        } else {
            self.path.clone()
        }
    }

    fn validate(&self) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Err(Error::invalid_value("store.path", "cannot be empty"));
        }
        if self.threads == 0 {
            return Err(Error::invalid_value("store.threads", "must be at least 1"));
        }
        if self.memory_limit.contains('\'') {
            return Err(Error::invalid_value(
                "store.memory_limit",
                "cannot contain quotes",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Input Settings
// ============================================================================

/// Where batch files and reference data come from
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputSettings {
    /// Directory scanned for batch files
    pub batch_dir: PathBuf,

    /// Regex a file name must match to count as a batch
    pub batch_pattern: String,

    /// Explicit batch files; when non-empty, `batch_dir` is not scanned
    pub batches: Vec<PathBuf>,

    /// Zone lookup CSV (LocationID, Borough, Zone, service_zone)
    pub zone_lookup: PathBuf,
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            batch_dir: PathBuf::from("data/raw"),
            batch_pattern: default_batch_pattern(),
            batches: Vec::new(),
            zone_lookup: PathBuf::from("data/raw/taxi_zone_lookup.csv"),
        }
    }
}

fn default_batch_pattern() -> String {
    r"^yellow_tripdata_\d{4}-\d{2}\.parquet$".to_string()
}

impl InputSettings {
    /// Compile the batch file name pattern
    pub fn batch_regex(&self) -> Result<Regex> {
        Ok(Regex::new(&self.batch_pattern)?)
    }

    fn validate(&self) -> Result<()> {
        self.batch_regex()
            .map_err(|e| Error::invalid_value("input.batch_pattern", e.to_string()))?;
        Ok(())
    }
}

// ============================================================================
// Filter Bounds
// ============================================================================

/// Acceptance filter for fact rows, shared with the aggregate builder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterBounds {
    /// Boroughs whose zones are accepted for pickup and dropoff (empty = all)
    pub boroughs: Vec<String>,

    /// Exclusive upper bound on fare amount
    pub fare_max: f64,

    /// Exclusive upper bound on trip distance
    pub distance_max: f64,

    /// Inclusive lower bound on passenger count
    pub passengers_min: u8,

    /// Inclusive upper bound on passenger count
    pub passengers_max: u8,

    /// Exclusive upper bound on trip duration in seconds
    pub duration_max_secs: u32,
}

impl Default for FilterBounds {
    fn default() -> Self {
        Self {
            boroughs: vec!["Manhattan".to_string()],
            fare_max: 500.0,
            distance_max: 200.0,
            passengers_min: 1,
            passengers_max: 6,
            duration_max_secs: 7200,
        }
    }
}

impl FilterBounds {
    fn validate(&self) -> Result<()> {
        if !is_positive(self.fare_max) {
            return Err(Error::invalid_value("filters.fare_max", "must be positive"));
        }
        if !is_positive(self.distance_max) {
            return Err(Error::invalid_value(
                "filters.distance_max",
                "must be positive",
            ));
        }
        if self.passengers_min > self.passengers_max {
            return Err(Error::invalid_value(
                "filters.passengers_min",
                format!(
                    "{} is greater than passengers_max {}",
                    self.passengers_min, self.passengers_max
                ),
            ));
        }
        if self.duration_max_secs == 0 {
            return Err(Error::invalid_value(
                "filters.duration_max_secs",
                "must be positive",
            ));
        }
        if self.boroughs.iter().any(|b| b.trim().is_empty()) {
            return Err(Error::invalid_value(
                "filters.boroughs",
                "borough names cannot be blank",
            ));
        }
        Ok(())
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

// ============================================================================
// Aggregate Settings
// ============================================================================

/// Thresholds for the materialized aggregates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregateSettings {
    /// Minimum trips for an origin-destination pair to be kept
    pub od_min_trips: u32,
}

impl Default for AggregateSettings {
    fn default() -> Self {
        Self { od_min_trips: 100 }
    }
}

impl AggregateSettings {
    fn validate(&self) -> Result<()> {
        if self.od_min_trips == 0 {
            return Err(Error::invalid_value(
                "aggregates.od_min_trips",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Anomaly Settings
// ============================================================================

/// Thresholds used by the anomaly queries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalySettings {
    /// Fare per mile above which a trip is flagged
    pub fare_per_mile: f64,

    /// Fares at or above this are ignored as data errors
    pub fare_ceiling: f64,

    /// Trips at or above this distance are left out of the outlier listing
    pub distance_ceiling: f64,

    /// Fare above which a zero tip is suspicious
    pub expensive_fare: f64,

    /// Minimum airport trips for an origin zone to be listed
    pub airport_min_trips: u32,
}

impl Default for AnomalySettings {
    fn default() -> Self {
        Self {
            fare_per_mile: 50.0,
            fare_ceiling: 1000.0,
            distance_ceiling: 100.0,
            expensive_fare: 50.0,
            airport_min_trips: 10,
        }
    }
}

impl AnomalySettings {
    fn validate(&self) -> Result<()> {
        if !is_positive(self.fare_per_mile) {
            return Err(Error::invalid_value(
                "anomalies.fare_per_mile",
                "must be positive",
            ));
        }
        if !is_positive(self.fare_ceiling) {
            return Err(Error::invalid_value(
                "anomalies.fare_ceiling",
                "must be positive",
            ));
        }
        if !is_positive(self.distance_ceiling) {
            return Err(Error::invalid_value(
                "anomalies.distance_ceiling",
                "must be positive",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Server Settings
// ============================================================================

/// Query server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Port to listen on
    pub port: u16,

    /// CORS origins; "*" allows any
    pub allowed_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 8000,
            allowed_origins: vec!["*".to_string()],
        }
    }
}
