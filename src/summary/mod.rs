//! Summary builder
//!
//! One row of global totals over `fact_trip`, stored in `summary_statistics`.

use crate::error::{Error, Result};
use crate::schema::{FACT_TRIP, SUMMARY_STATISTICS};
use crate::store::{timestamp_to_naive, Store};
use chrono::NaiveDateTime;
use serde::Serialize;

/// The global summary row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStatistics {
    pub total_trips: i64,
    pub total_fare_amount: f64,
    pub total_tips: f64,
    pub total_revenue: f64,
    pub avg_fare: f64,
    pub avg_distance: f64,
    /// Seconds
    pub avg_duration: f64,
    pub avg_passengers: f64,
    pub first_trip_date: Option<NaiveDateTime>,
    pub last_trip_date: Option<NaiveDateTime>,
}

/// Recreate `summary_statistics` and read it back
pub fn build_summary(store: &Store) -> Result<SummaryStatistics> {
    store
        .execute_batch(&format!(
            "CREATE OR REPLACE TABLE {SUMMARY_STATISTICS} AS
SELECT
    'overall' AS metric_type,
    COUNT(*) AS total_trips,
    SUM(fare_amount) AS total_fare_amount,
    SUM(tip_amount) AS total_tips,
    SUM(total_amount) AS total_revenue,
    AVG(fare_amount) AS avg_fare,
    AVG(trip_distance) AS avg_distance,
    AVG(trip_duration_seconds) AS avg_duration,
    AVG(passenger_count) AS avg_passengers,
    MIN(pickup_datetime) AS first_trip_date,
    MAX(pickup_datetime) AS last_trip_date
FROM {FACT_TRIP}
WHERE fare_amount > 0"
        ))
        .map_err(|e| Error::summary(e.to_string()))?;

    let stats = read_summary(store)?;
    tracing::info!(
        total_trips = stats.total_trips,
        total_revenue = format!("{:.2}", stats.total_revenue),
        avg_fare = format!("{:.2}", stats.avg_fare),
        first = ?stats.first_trip_date,
        last = ?stats.last_trip_date,
        "Summary built"
    );
    Ok(stats)
}

/// Read the stored summary row
///
/// Aggregates over an empty fact table come back as zero and no date range.
pub fn read_summary(store: &Store) -> Result<SummaryStatistics> {
    store
        .connection()
        .query_row(
            &format!(
                "SELECT
    CAST(total_trips AS BIGINT),
    CAST(COALESCE(total_fare_amount, 0) AS DOUBLE),
    CAST(COALESCE(total_tips, 0) AS DOUBLE),
    CAST(COALESCE(total_revenue, 0) AS DOUBLE),
    CAST(COALESCE(avg_fare, 0) AS DOUBLE),
    CAST(COALESCE(avg_distance, 0) AS DOUBLE),
    CAST(COALESCE(avg_duration, 0) AS DOUBLE),
    CAST(COALESCE(avg_passengers, 0) AS DOUBLE),
    first_trip_date,
    last_trip_date
FROM {SUMMARY_STATISTICS}
LIMIT 1"
            ),
            [],
            |row| {
                Ok(SummaryStatistics {
                    total_trips: row.get(0)?,
                    total_fare_amount: row.get(1)?,
                    total_tips: row.get(2)?,
                    total_revenue: row.get(3)?,
                    avg_fare: row.get(4)?,
                    avg_distance: row.get(5)?,
                    avg_duration: row.get(6)?,
                    avg_passengers: row.get(7)?,
                    first_trip_date: timestamp_to_naive(row.get(8)?),
                    last_trip_date: timestamp_to_naive(row.get(9)?),
                })
            },
        )
        .map_err(|e| Error::summary(e.to_string()))
}
