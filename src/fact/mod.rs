//! Fact loader
//!
//! Streams Parquet batches through the acceptance filter into `fact_trip`.
//!
//! # Overview
//!
//! - `discover_batches` - Find input files (pattern match or explicit list)
//! - `inspect_batch` - Footer row count and required-column check
//! - `AcceptanceFilter` - Row filter rendered as SQL
//! - `FactLoader` - Reset, then insert batch by batch with running trip ids
//! - `load_facts` - The whole stage
//!
//! A batch that cannot be read is recorded as `BatchOutcome::Failed` and the
//! load moves on. Discovery and reset failures are returned as `Err`.

mod batch;
mod filter;
mod loader;
mod types;

pub use batch::{discover_batches, inspect_batch, missing_columns, BatchInspection, REQUIRED_COLUMNS};
pub use filter::AcceptanceFilter;
pub use loader::{insert_sql, FactLoader};
pub use types::{BatchFile, BatchOutcome, BatchReport, LoadReport};

use crate::config::InputSettings;
use crate::error::Result;
use crate::store::Store;

/// Run the fact stage: discover, reset, load
pub fn load_facts(
    store: &Store,
    input: &InputSettings,
    filter: AcceptanceFilter,
) -> Result<LoadReport> {
    let batches = discover_batches(input)?;
    if batches.is_empty() {
        tracing::warn!(
            dir = %input.batch_dir.display(),
            pattern = %input.batch_pattern,
            "No batches found; the fact table will be empty"
        );
    }

    let mut loader = FactLoader::new(store, filter);
    loader.reset()?;
    let report = loader.load_all(&batches);

    let failed = report.failed_batches().count();
    tracing::info!(
        batches = batches.len(),
        failed,
        accepted = report.accepted,
        rejected = report.rejected,
        filter_rate = format!("{:.1}%", report.filter_rate()),
        rows_per_sec = report.rows_per_sec() as u64,
        "Fact load complete"
    );
    Ok(report)
}
