//! Pipeline orchestrator
//!
//! Runs the stages strictly in order against one read-write connection:
//!
//! 1. schema
//! 2. dimensions
//! 3. facts
//! 4. indexes (best-effort)
//! 5. aggregates
//! 6. summary
//! 7. analyze (best-effort)
//! 8. statistics
//!
//! A fatal stage error halts the run and comes back as
//! `Error::StageFailed`. With `store.staging` the run builds into
//! `<path>.staging` and renames it over the target only after success.

mod types;

pub use types::{PipelineReport, Stage, StageTiming};

use crate::aggregate::build_aggregates;
use crate::config::PipelineConfig;
use crate::dimension::load_dimensions;
use crate::error::{Error, Result};
use crate::fact::{load_facts, AcceptanceFilter};
use crate::index::build_indexes;
use crate::schema::{create_schema, ALL_TABLES};
use crate::store::Store;
use crate::summary::build_summary;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Run the whole pipeline described by `config`
pub fn run_pipeline(config: &PipelineConfig) -> Result<PipelineReport> {
    config.validate()?;

    let target = config.store.path.clone();
    let build_path = config.store.build_path();
    if config.store.staging {
        remove_store_files(&build_path)?;
        tracing::info!(staging = %build_path.display(), "Building into staging store");
    }

    let store = Store::open(&build_path)?;
    store.configure(&config.store)?;

    let mut report = Pipeline::new(&store, config).run()?;

    store.checkpoint()?;
    store.close()?;

    if config.store.staging {
        swap_into_place(&build_path, &target)?;
    }
    report.store_path = target;

    tracing::info!(
        store = %report.store_path.display(),
        elapsed_secs = report.elapsed.as_secs(),
        "Pipeline complete"
    );
    Ok(report)
}

/// Stage runner over an open store
pub struct Pipeline<'a> {
    store: &'a Store,
    config: &'a PipelineConfig,
    timings: Vec<StageTiming>,
}

impl<'a> Pipeline<'a> {
    pub fn new(store: &'a Store, config: &'a PipelineConfig) -> Self {
        Self {
            store,
            config,
            timings: Vec::new(),
        }
    }

    /// Run every stage in order
    pub fn run(mut self) -> Result<PipelineReport> {
        let start = Instant::now();
        let config = self.config;
        let store = self.store;

        let schema = self.stage(Stage::Schema, || {
            create_schema(store, config.store.rebuild)
        })?;

        let dimensions = self.stage(Stage::Dimensions, || {
            load_dimensions(store, &config.input.zone_lookup, &config.filters.boroughs)
        })?;

        let filter = AcceptanceFilter::new(
            config.filters.clone(),
            dimensions.accepted_locations.clone(),
        );
        let load = self.stage(Stage::Facts, || load_facts(store, &config.input, filter))?;

        let indexes = self.stage(Stage::Indexes, || Ok(build_indexes(store)))?;

        let aggregates = self.stage(Stage::Aggregates, || {
            build_aggregates(store, &config.filters, &config.aggregates)
        })?;

        let summary = self.stage(Stage::Summary, || build_summary(store))?;

        let analyzed = self.stage(Stage::Analyze, || {
            Ok(match store.analyze() {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(error = %e, "ANALYZE unavailable, continuing");
                    false
                }
            })
        })?;

        let table_counts = self.stage(Stage::Statistics, || {
            let counts = store.table_row_counts(&ALL_TABLES);
            for (table, count) in &counts {
                match count {
                    Some(rows) => tracing::info!(table = %table, rows, "Table statistics"),
                    None => tracing::warn!(table = %table, "Table not found"),
                }
            }
            Ok(counts)
        })?;

        Ok(PipelineReport {
            store_path: store.path().map(Path::to_path_buf).unwrap_or_default(),
            timings: self.timings,
            schema,
            dimensions,
            load,
            indexes,
            aggregates,
            summary,
            analyzed,
            table_counts,
            elapsed: start.elapsed(),
        })
    }

    /// Time one stage and tag any error with it
    fn stage<T>(&mut self, stage: Stage, run: impl FnOnce() -> Result<T>) -> Result<T> {
        tracing::info!(stage = %stage, "Stage started");
        let start = Instant::now();
        let result = run();
        let elapsed = start.elapsed();
        self.timings.push(StageTiming { stage, elapsed });

        match result {
            Ok(value) => {
                tracing::info!(
                    stage = %stage,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Stage finished"
                );
                Ok(value)
            }
            Err(error) => {
                tracing::error!(stage = %stage, error = %error, "Stage failed, halting");
                Err(Error::stage(stage, error))
            }
        }
    }
}

/// DuckDB keeps uncommitted changes in a sibling `.wal` file
fn wal_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".wal");
    PathBuf::from(name)
}

fn remove_store_files(path: &Path) -> Result<()> {
    for file in [path.to_path_buf(), wal_path(path)] {
        match std::fs::remove_file(&file) {
            Ok(()) => tracing::debug!(file = %file.display(), "Removed stale store file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Rename the finished staging store over the target
fn swap_into_place(staging: &Path, target: &Path) -> Result<()> {
    // A stale WAL next to the old target would be replayed against the new file
    match std::fs::remove_file(wal_path(target)) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    std::fs::rename(staging, target).map_err(|e| {
        Error::store(format!(
            "failed to move '{}' to '{}': {e}",
            staging.display(),
            target.display()
        ))
    })?;
    tracing::info!(store = %target.display(), "Staging store swapped into place");
    Ok(())
}

#[cfg(test)]
mod tests;
