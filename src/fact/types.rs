//! Fact loader types
//!
//! Per-batch outcomes and the cumulative load report.

use crate::error::Error;
use std::path::PathBuf;
use std::time::Duration;

/// One input file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFile {
    /// File name, used in logs and reports
    pub name: String,
    /// Full path
    pub path: PathBuf,
}

impl BatchFile {
    /// Create a batch from a path, naming it after the file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().to_string());
        Self { name, path }
    }
}

/// Counts for a batch that loaded
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    /// Batch name
    pub batch: String,
    /// Rows in the source file
    pub source_rows: u64,
    /// Rows inserted into the fact table
    pub accepted: u64,
    /// Rows dropped by the acceptance filter
    pub rejected: u64,
    /// First trip id assigned (None when nothing was accepted)
    pub first_trip_id: Option<i64>,
    /// Last trip id assigned
    pub last_trip_id: Option<i64>,
    /// Wall-clock time for the batch
    pub elapsed: Duration,
}

impl BatchReport {
    /// Accepted rows per second
    pub fn rows_per_sec(&self) -> f64 {
        rate(self.accepted, self.elapsed)
    }

    /// Percentage of source rows rejected
    pub fn filter_rate(&self) -> f64 {
        percentage(self.rejected, self.source_rows)
    }
}

/// What happened to one batch
#[derive(Debug)]
pub enum BatchOutcome {
    /// Batch inserted (possibly zero rows)
    Loaded(BatchReport),
    /// Batch skipped; the run continues
    Failed {
        /// Batch name
        batch: String,
        /// Why it failed
        error: Error,
    },
}

impl BatchOutcome {
    /// Batch name
    pub fn batch(&self) -> &str {
        match self {
            Self::Loaded(report) => &report.batch,
            Self::Failed { batch, .. } => batch,
        }
    }

    /// Check if this batch loaded
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }

    /// Report for a loaded batch
    pub fn report(&self) -> Option<&BatchReport> {
        match self {
            Self::Loaded(report) => Some(report),
            Self::Failed { .. } => None,
        }
    }
}

/// Result of the fact stage
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Outcome per batch, in load order
    pub outcomes: Vec<BatchOutcome>,
    /// Total accepted rows
    pub accepted: u64,
    /// Total rejected rows across loaded batches
    pub rejected: u64,
    /// Wall-clock time for the stage
    pub elapsed: Duration,
}

impl LoadReport {
    /// Record a batch outcome and update totals
    pub fn push(&mut self, outcome: BatchOutcome) {
        if let BatchOutcome::Loaded(report) = &outcome {
            self.accepted += report.accepted;
            self.rejected += report.rejected;
        }
        self.outcomes.push(outcome);
    }

    /// Number of batches that loaded
    pub fn loaded_batches(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_loaded()).count()
    }

    /// Batches that failed, with their errors
    pub fn failed_batches(&self) -> impl Iterator<Item = (&str, &Error)> {
        self.outcomes.iter().filter_map(|o| match o {
            BatchOutcome::Failed { batch, error } => Some((batch.as_str(), error)),
            BatchOutcome::Loaded(_) => None,
        })
    }

    /// Percentage of rows rejected across loaded batches
    pub fn filter_rate(&self) -> f64 {
        percentage(self.rejected, self.accepted + self.rejected)
    }

    /// Accepted rows per second over the whole stage
    pub fn rows_per_sec(&self) -> f64 {
        rate(self.accepted, self.elapsed)
    }
}

fn rate(rows: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        rows as f64 / secs
    } else {
        0.0
    }
}

fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 * 100.0 / whole as f64
    }
}
