//! Schema tests

use super::*;
use pretty_assertions::assert_eq;

#[test]
fn test_create_schema_fresh() {
    let store = Store::in_memory().unwrap();
    let report = create_schema(&store, false).unwrap();

    assert_eq!(report.created.len(), TABLES.len());
    assert!(report.existing.is_empty());
    for table in &TABLES {
        assert!(store.table_exists(table.name).unwrap(), "{}", table.name);
    }
}

#[test]
fn test_create_schema_is_idempotent() {
    let store = Store::in_memory().unwrap();
    create_schema(&store, false).unwrap();
    store
        .execute_batch("INSERT INTO dim_vendor VALUES (1, 'Creative Mobile Technologies', 'CMT')")
        .unwrap();

    let report = create_schema(&store, false).unwrap();

    assert!(report.created.is_empty());
    assert_eq!(report.existing.len(), TABLES.len());
    // Existing data survives a second run
    assert_eq!(store.count_rows(DIM_VENDOR).unwrap(), 1);
}

#[test]
fn test_rebuild_drops_existing_data() {
    let store = Store::in_memory().unwrap();
    create_schema(&store, false).unwrap();
    store
        .execute_batch(
            "INSERT INTO dim_vendor VALUES (1, 'Creative Mobile Technologies', 'CMT');
             CREATE TABLE mv_zone_pickup AS SELECT 1 AS location_id;
             CREATE TABLE summary_statistics AS SELECT 'overall' AS metric_type;",
        )
        .unwrap();

    let report = create_schema(&store, true).unwrap();

    assert!(report.rebuilt);
    assert_eq!(report.created.len(), TABLES.len());
    assert_eq!(store.count_rows(DIM_VENDOR).unwrap(), 0);
    assert!(!store.table_exists(MV_ZONE_PICKUP).unwrap());
    assert!(!store.table_exists(SUMMARY_STATISTICS).unwrap());
}

#[test]
fn test_fact_table_enforces_unique_trip_id() {
    let store = Store::in_memory().unwrap();
    create_schema(&store, false).unwrap();

    let insert = "INSERT INTO fact_trip (trip_id, pu_location_id, do_location_id,
            pickup_datetime, dropoff_datetime, pickup_date, pickup_hour,
            pickup_day_of_week, is_weekend, passenger_count, trip_distance,
            trip_duration_seconds, fare_amount)
        VALUES (1, 4, 4, TIMESTAMP '2025-01-01 10:00:00', TIMESTAMP '2025-01-01 10:10:00',
            DATE '2025-01-01', 10, 3, false, 1, 1.5, 600, 9.5)";

    store.execute_batch(insert).unwrap();
    assert!(store.execute_batch(insert).is_err());
}

#[test]
fn test_cbd_fee_defaults_to_zero() {
    let store = Store::in_memory().unwrap();
    create_schema(&store, false).unwrap();
    store
        .execute_batch(
            "INSERT INTO fact_trip (trip_id, pu_location_id, do_location_id,
                pickup_datetime, dropoff_datetime, pickup_date, pickup_hour,
                pickup_day_of_week, is_weekend, passenger_count, trip_distance,
                trip_duration_seconds, fare_amount)
            VALUES (1, 4, 4, TIMESTAMP '2025-01-01 10:00:00', TIMESTAMP '2025-01-01 10:10:00',
                DATE '2025-01-01', 10, 3, false, 1, 1.5, 600, 9.5)",
        )
        .unwrap();

    let fee: f64 = store
        .connection()
        .query_row(
            "SELECT CAST(cbd_congestion_fee AS DOUBLE) FROM fact_trip",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(fee, 0.0);
}
