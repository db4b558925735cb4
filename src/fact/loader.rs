//! Batch insert
//!
//! Each batch is one `INSERT ... SELECT` over `read_parquet`, so a batch
//! either lands completely or not at all.

use super::batch::inspect_batch;
use super::filter::AcceptanceFilter;
use super::types::{BatchFile, BatchOutcome, BatchReport, LoadReport};
use crate::error::{Error, Result};
use crate::index::drop_indexes;
use crate::schema::FACT_TRIP;
use crate::store::{sql_string_literal, Store};
use std::time::Instant;

/// Streams batches into `fact_trip`, assigning contiguous trip ids
pub struct FactLoader<'a> {
    store: &'a Store,
    filter: AcceptanceFilter,
    /// Rows accepted so far; the next trip id is `offset + 1`
    offset: i64,
}

impl<'a> FactLoader<'a> {
    /// Create a loader; call [`FactLoader::reset`] before the first batch
    pub fn new(store: &'a Store, filter: AcceptanceFilter) -> Self {
        Self {
            store,
            filter,
            offset: 0,
        }
    }

    /// Drop fact indexes and delete every fact row
    pub fn reset(&mut self) -> Result<()> {
        drop_indexes(self.store)?;
        let deleted = self
            .store
            .execute(&format!("DELETE FROM {FACT_TRIP}"))
            .map_err(|e| Error::store(format!("failed to clear {FACT_TRIP}: {e}")))?;
        if deleted > 0 {
            tracing::info!(deleted, "Cleared previous trips");
        }
        self.offset = 0;
        Ok(())
    }

    /// Load every batch, continuing past failures
    pub fn load_all(&mut self, batches: &[BatchFile]) -> LoadReport {
        let start = Instant::now();
        let mut report = LoadReport::default();

        for (idx, batch) in batches.iter().enumerate() {
            tracing::info!(
                batch = %batch.name,
                position = idx + 1,
                total = batches.len(),
                "Loading batch"
            );
            report.push(self.load_batch(batch));
        }

        report.elapsed = start.elapsed();
        report
    }

    /// Load one batch
    ///
    /// Failures are captured in the outcome and the offset is left untouched.
    pub fn load_batch(&mut self, batch: &BatchFile) -> BatchOutcome {
        match self.try_load_batch(batch) {
            Ok(report) => {
                tracing::info!(
                    batch = %report.batch,
                    source = report.source_rows,
                    accepted = report.accepted,
                    rejected = report.rejected,
                    filter_rate = format!("{:.1}%", report.filter_rate()),
                    rows_per_sec = report.rows_per_sec() as u64,
                    elapsed_ms = report.elapsed.as_millis() as u64,
                    "Batch loaded"
                );
                BatchOutcome::Loaded(report)
            }
            Err(error) => {
                tracing::warn!(batch = %batch.name, error = %error, "Batch failed, skipping");
                BatchOutcome::Failed {
                    batch: batch.name.clone(),
                    error,
                }
            }
        }
    }

    fn try_load_batch(&mut self, batch: &BatchFile) -> Result<BatchReport> {
        let start = Instant::now();
        let inspection = inspect_batch(batch)?;

        let sql = insert_sql(batch, &self.filter, self.offset);
        let accepted = self
            .store
            .execute(&sql)
            .map_err(|e| Error::batch(&batch.name, e.to_string()))? as u64;

        let first = self.offset + 1;
        self.offset += accepted as i64;

        Ok(BatchReport {
            batch: batch.name.clone(),
            source_rows: inspection.source_rows,
            accepted,
            rejected: inspection.source_rows.saturating_sub(accepted),
            first_trip_id: (accepted > 0).then_some(first),
            last_trip_id: (accepted > 0).then_some(self.offset),
            elapsed: start.elapsed(),
        })
    }
}

/// Build the INSERT statement for one batch
///
/// The innermost select types and rounds the raw columns, the middle one
/// derives the whole-second duration, and the filter runs on those typed
/// values. Passenger count is filtered on the raw value before rounding.
pub fn insert_sql(batch: &BatchFile, filter: &AcceptanceFilter, offset: i64) -> String {
    let source = sql_string_literal(&batch.path.to_string_lossy());
    format!(
        "INSERT INTO {FACT_TRIP} (
    trip_id, vendor_id, pu_location_id, do_location_id, payment_type_id, rate_code_id,
    pickup_datetime, dropoff_datetime, pickup_date, pickup_hour, pickup_day_of_week, is_weekend,
    passenger_count, trip_distance, trip_duration_seconds,
    fare_amount, extra, mta_tax, tip_amount, tolls_amount, improvement_surcharge,
    total_amount, congestion_surcharge, airport_fee, cbd_congestion_fee, store_and_fwd_flag
)
SELECT
    ROW_NUMBER() OVER (ORDER BY file_row_number) + {offset},
    vendor_id, pu_location_id, do_location_id, payment_type_id, rate_code_id,
    pickup_datetime,
    dropoff_datetime,
    CAST(pickup_datetime AS DATE),
    CAST(hour(pickup_datetime) AS TINYINT),
    CAST(dayofweek(pickup_datetime) AS TINYINT),
    dayofweek(pickup_datetime) IN (0, 6),
    passenger_count,
    trip_distance,
    duration_secs,
    fare_amount, extra, mta_tax, tip_amount, tolls_amount, improvement_surcharge,
    total_amount, congestion_surcharge, airport_fee,
    0,
    store_and_fwd_flag
FROM (
    SELECT
        *,
        TRY_CAST(FLOOR(EXTRACT(EPOCH FROM (dropoff_datetime - pickup_datetime))) AS INTEGER)
            AS duration_secs
    FROM (
        SELECT
            file_row_number,
            TRY_CAST(VendorID AS INTEGER) AS vendor_id,
            TRY_CAST(PULocationID AS INTEGER) AS pu_location_id,
            TRY_CAST(DOLocationID AS INTEGER) AS do_location_id,
            TRY_CAST(payment_type AS INTEGER) AS payment_type_id,
            TRY_CAST(RatecodeID AS INTEGER) AS rate_code_id,
            CAST(tpep_pickup_datetime AS TIMESTAMP) AS pickup_datetime,
            CAST(tpep_dropoff_datetime AS TIMESTAMP) AS dropoff_datetime,
            TRY_CAST(passenger_count AS DOUBLE) AS raw_passenger_count,
            TRY_CAST(passenger_count AS TINYINT) AS passenger_count,
            TRY_CAST(trip_distance AS DECIMAL(10, 2)) AS trip_distance,
            TRY_CAST(fare_amount AS DECIMAL(10, 2)) AS fare_amount,
            TRY_CAST(extra AS DECIMAL(10, 2)) AS extra,
            TRY_CAST(mta_tax AS DECIMAL(10, 2)) AS mta_tax,
            TRY_CAST(tip_amount AS DECIMAL(10, 2)) AS tip_amount,
            TRY_CAST(tolls_amount AS DECIMAL(10, 2)) AS tolls_amount,
            TRY_CAST(improvement_surcharge AS DECIMAL(10, 2)) AS improvement_surcharge,
            TRY_CAST(total_amount AS DECIMAL(10, 2)) AS total_amount,
            TRY_CAST(congestion_surcharge AS DECIMAL(10, 2)) AS congestion_surcharge,
            TRY_CAST(Airport_fee AS DECIMAL(10, 2)) AS airport_fee,
            CAST(store_and_fwd_flag AS VARCHAR(1)) AS store_and_fwd_flag
        FROM read_parquet({source}, file_row_number = true)
    ) AS typed
) AS derived
WHERE {predicate}",
        predicate = filter.predicate()
    )
}
