//! Orchestrator tests

use super::*;
use crate::schema::{FACT_TRIP, MV_ZONE_PICKUP};
use crate::test_support::{input_for, write_batch, write_zones, TripRow};
use pretty_assertions::assert_eq;
use std::path::Path;

fn config_for(dir: &Path) -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.store.path = dir.join("out").join("taxi.duckdb");
    config.store.memory_limit = "1GB".to_string();
    config.store.threads = 2;
    config.input = input_for(dir);
    config
}

fn seed(dir: &Path) {
    write_zones(dir);
    let trips: Vec<TripRow> = (0..4).map(|_| TripRow::valid(4, 13)).collect();
    write_batch(&dir.join("yellow_tripdata_2025-01.parquet"), &trips);
    write_batch(
        &dir.join("yellow_tripdata_2025-02.parquet"),
        &[TripRow::valid(43, 4), TripRow::valid(43, 4).fare(-3.0)],
    );
}

#[test]
fn test_stage_names() {
    let names: Vec<String> = Stage::ALL.iter().map(Stage::to_string).collect();
    assert_eq!(
        names,
        vec![
            "schema",
            "dimensions",
            "facts",
            "indexes",
            "aggregates",
            "summary",
            "analyze",
            "statistics"
        ]
    );
}

#[test]
fn test_runs_every_stage_in_order() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());
    let config = config_for(dir.path());
    let store = Store::in_memory().unwrap();

    let report = Pipeline::new(&store, &config).run().unwrap();

    let stages: Vec<Stage> = report.timings.iter().map(|t| t.stage).collect();
    assert_eq!(stages, Stage::ALL.to_vec());
    assert_eq!(report.load.accepted, 5);
    assert_eq!(report.load.rejected, 1);
    assert_eq!(report.summary.total_trips, 5);
    assert_eq!(report.indexes.built(), 7);
    assert_eq!(report.aggregates.rows(MV_ZONE_PICKUP), Some(2));
    assert!(report.passed());

    let facts = report
        .table_counts
        .iter()
        .find(|(t, _)| t == FACT_TRIP)
        .unwrap();
    assert_eq!(facts.1, Some(5));

    let rendered = report.to_string();
    assert!(rendered.contains("PASS"));
    assert!(rendered.contains("accepted:  5"));
}

#[test]
fn test_broken_zone_file_halts_in_dimensions() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());
    std::fs::write(dir.path().join("taxi_zone_lookup.csv"), "id,name\n1,x\n").unwrap();
    let config = config_for(dir.path());
    let store = Store::in_memory().unwrap();

    let err = Pipeline::new(&store, &config).run().unwrap_err();

    assert_eq!(err.failed_stage(), Some(Stage::Dimensions));
    // Nothing after the failed stage ran
    assert!(!store.table_exists(MV_ZONE_PICKUP).unwrap());
    assert_eq!(store.count_rows(FACT_TRIP).unwrap(), 0);
}

#[test]
fn test_missing_batch_dir_halts_in_facts() {
    let dir = tempfile::tempdir().unwrap();
    write_zones(dir.path());
    let mut config = config_for(dir.path());
    config.input.batch_dir = dir.path().join("nope");
    let store = Store::in_memory().unwrap();

    let err = Pipeline::new(&store, &config).run().unwrap_err();
    assert_eq!(err.failed_stage(), Some(Stage::Facts));
}

#[test]
fn test_run_pipeline_writes_store_file() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());
    let config = config_for(dir.path());

    let report = run_pipeline(&config).unwrap();

    assert_eq!(report.store_path, config.store.path);
    let reader = Store::open_read_only(&config.store.path).unwrap();
    assert_eq!(reader.count_rows(FACT_TRIP).unwrap(), 5);
}

#[test]
fn test_rerun_without_rebuild_is_clean() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());
    let config = config_for(dir.path());

    run_pipeline(&config).unwrap();
    let report = run_pipeline(&config).unwrap();

    assert!(report.schema.created.is_empty());
    assert_eq!(report.load.accepted, 5);
    assert_eq!(report.summary.total_trips, 5);
}

#[test]
fn test_staging_swaps_on_success_only() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());
    let mut config = config_for(dir.path());
    config.store.staging = true;

    run_pipeline(&config).unwrap();
    assert!(config.store.path.exists());
    assert!(!config.store.build_path().exists());

    // A failing rebuild leaves the live store alone
    std::fs::write(dir.path().join("taxi_zone_lookup.csv"), "broken\n").unwrap();
    let err = run_pipeline(&config).unwrap_err();
    assert_eq!(err.failed_stage(), Some(Stage::Dimensions));
    assert!(config.store.build_path().exists());

    let reader = Store::open_read_only(&config.store.path).unwrap();
    assert_eq!(reader.count_rows(FACT_TRIP).unwrap(), 5);
}

#[test]
fn test_invalid_config_rejected_before_opening() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_for(dir.path());
    config.filters.fare_max = -1.0;

    let err = run_pipeline(&config).unwrap_err();
    assert!(matches!(err, Error::InvalidConfigValue { .. }));
    assert!(!config.store.path.exists());
}
