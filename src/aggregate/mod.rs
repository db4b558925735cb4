//! Aggregate builder
//!
//! Recomputes the six materialized rollups from `fact_trip`. Tables are
//! replaced in place, so the stage can run any number of times. Any failure
//! is fatal to the stage.

mod definitions;

pub use definitions::{aggregate_definitions, AggregateDef};

use crate::config::{AggregateSettings, FilterBounds};
use crate::error::{Error, Result};
use crate::store::Store;
use std::time::{Duration, Instant};

/// Row count and timing for one rollup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateTableReport {
    pub table: &'static str,
    pub rows: i64,
    pub elapsed: Duration,
}

/// Result of the aggregate stage
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateReport {
    pub tables: Vec<AggregateTableReport>,
    pub elapsed: Duration,
}

impl AggregateReport {
    /// Row count of a rollup, if it was built
    pub fn rows(&self, table: &str) -> Option<i64> {
        self.tables.iter().find(|t| t.table == table).map(|t| t.rows)
    }
}

/// Build every rollup
pub fn build_aggregates(
    store: &Store,
    bounds: &FilterBounds,
    settings: &AggregateSettings,
) -> Result<AggregateReport> {
    let start = Instant::now();
    let mut report = AggregateReport::default();

    for def in aggregate_definitions(bounds, settings) {
        report.tables.push(build_one(store, &def)?);
    }

    report.elapsed = start.elapsed();
    Ok(report)
}

fn build_one(store: &Store, def: &AggregateDef) -> Result<AggregateTableReport> {
    let start = Instant::now();
    tracing::debug!(table = def.table, "Building aggregate");

    store
        .execute_batch(&def.create_sql())
        .map_err(|e| Error::aggregate(def.table, e.to_string()))?;
    let rows = store
        .count_rows(def.table)
        .map_err(|e| Error::aggregate(def.table, e.to_string()))?;

    let elapsed = start.elapsed();
    tracing::info!(
        table = def.table,
        rows,
        elapsed_ms = elapsed.as_millis() as u64,
        "Aggregate built"
    );
    Ok(AggregateTableReport {
        table: def.table,
        rows,
        elapsed,
    })
}
