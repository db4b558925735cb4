//! Aggregate table definitions
//!
//! Each rollup is a `CREATE OR REPLACE TABLE ... ORDER BY <group keys>`.
//! Averages run over DECIMAL or integer inputs so a rebuild over the same
//! facts yields the same values regardless of thread scheduling.

use crate::config::{AggregateSettings, FilterBounds};
use crate::schema::{
    FACT_TRIP, MV_HOURLY_DEMAND, MV_OD_FLOWS, MV_PAYMENT_PATTERNS, MV_VENDOR_PERFORMANCE,
    MV_ZONE_DROPOFF, MV_ZONE_PICKUP,
};

/// A materialized rollup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateDef {
    pub table: &'static str,
    pub select: String,
}

impl AggregateDef {
    pub fn create_sql(&self) -> String {
        format!("CREATE OR REPLACE TABLE {} AS\n{}", self.table, self.select)
    }
}

/// All six rollups, in build order
pub fn aggregate_definitions(
    bounds: &FilterBounds,
    settings: &AggregateSettings,
) -> Vec<AggregateDef> {
    let fare_range = bounds.fare_range_sql("fare_amount");

    vec![
        AggregateDef {
            table: MV_ZONE_PICKUP,
            select: format!(
                "SELECT
    pu_location_id AS location_id,
    COUNT(*) AS pickup_count,
    AVG(fare_amount) AS avg_fare,
    AVG(trip_distance) AS avg_distance,
    AVG(trip_duration_seconds) AS avg_duration,
    PERCENTILE_CONT(0.5) WITHIN GROUP (ORDER BY fare_amount) AS median_fare
FROM {FACT_TRIP}
WHERE {fare_range} AND trip_distance > 0
GROUP BY pu_location_id
ORDER BY location_id"
            ),
        },
        AggregateDef {
            table: MV_ZONE_DROPOFF,
            select: format!(
                "SELECT
    do_location_id AS location_id,
    COUNT(*) AS dropoff_count,
    AVG(fare_amount) AS avg_fare,
    AVG(trip_distance) AS avg_distance
FROM {FACT_TRIP}
WHERE {fare_range} AND trip_distance > 0
GROUP BY do_location_id
ORDER BY location_id"
            ),
        },
        AggregateDef {
            table: MV_HOURLY_DEMAND,
            select: format!(
                "SELECT
    pickup_date,
    pickup_hour,
    pickup_day_of_week,
    is_weekend,
    COUNT(*) AS trip_count,
    AVG(fare_amount) AS avg_fare,
    SUM(total_amount) AS total_revenue,
    AVG(trip_distance) AS avg_distance,
    AVG(passenger_count) AS avg_passengers
FROM {FACT_TRIP}
WHERE fare_amount > 0
GROUP BY pickup_date, pickup_hour, pickup_day_of_week, is_weekend
ORDER BY pickup_date, pickup_hour"
            ),
        },
        AggregateDef {
            table: MV_OD_FLOWS,
            select: format!(
                "SELECT
    pu_location_id,
    do_location_id,
    COUNT(*) AS trip_count,
    AVG(fare_amount) AS avg_fare,
    AVG(trip_distance) AS avg_distance,
    AVG(trip_duration_seconds) AS avg_duration_sec,
    PERCENTILE_CONT(0.5) WITHIN GROUP (ORDER BY fare_amount) AS median_fare,
    PERCENTILE_CONT(0.9) WITHIN GROUP (ORDER BY fare_amount) AS p90_fare
FROM {FACT_TRIP}
WHERE {fare_range} AND trip_distance > 0
GROUP BY pu_location_id, do_location_id
HAVING COUNT(*) >= {min_trips}
ORDER BY pu_location_id, do_location_id",
                min_trips = settings.od_min_trips
            ),
        },
        AggregateDef {
            table: MV_VENDOR_PERFORMANCE,
            select: format!(
                "SELECT
    vendor_id,
    COUNT(*) AS trip_count,
    AVG(fare_amount) AS avg_fare,
    AVG(tip_amount) AS avg_tip,
    AVG(trip_distance) AS avg_distance,
    AVG(trip_duration_seconds) AS avg_duration_sec,
    SUM(CASE WHEN store_and_fwd_flag = 'Y' THEN 1 ELSE 0 END) AS store_fwd_count,
    AVG(passenger_count) AS avg_passengers
FROM {FACT_TRIP}
WHERE fare_amount > 0
GROUP BY vendor_id
ORDER BY vendor_id"
            ),
        },
        AggregateDef {
            table: MV_PAYMENT_PATTERNS,
            // Per-row tip percentage is fixed to 6 places before averaging
            select: format!(
                "SELECT
    payment_type_id,
    pickup_hour,
    is_weekend,
    COUNT(*) AS trip_count,
    AVG(tip_amount) AS avg_tip,
    AVG(fare_amount) AS avg_fare,
    AVG(CASE WHEN fare_amount > 0
        THEN CAST(tip_amount * 100 / fare_amount AS DECIMAL(18, 6))
        ELSE NULL END) AS avg_tip_pct,
    SUM(CASE WHEN tip_amount > 0 THEN 1 ELSE 0 END) AS trips_with_tip,
    COUNT(*) - SUM(CASE WHEN tip_amount > 0 THEN 1 ELSE 0 END) AS trips_no_tip
FROM {FACT_TRIP}
WHERE {fare_range}
GROUP BY payment_type_id, pickup_hour, is_weekend
ORDER BY payment_type_id, pickup_hour, is_weekend"
            ),
        },
    ]
}
