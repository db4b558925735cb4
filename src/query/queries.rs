//! Read queries behind the API endpoints
//!
//! Every query is fixed text. The only interpolated values are a validated
//! [`Limit`], numeric thresholds from configuration, and borough names from
//! configuration rendered as escaped literals.

use super::limit::Limit;
use super::types::*;
use crate::config::{AnomalySettings, FilterBounds, PipelineConfig};
use crate::dimension::{borough_list, reference};
use crate::error::{Error, Result};
use crate::store::Store;
use crate::summary::read_summary;

const DAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// Operator settings the queries depend on
#[derive(Debug, Clone, Default)]
pub struct QueryContext {
    pub filters: FilterBounds,
    pub anomalies: AnomalySettings,
}

impl QueryContext {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            filters: config.filters.clone(),
            anomalies: config.anomalies.clone(),
        }
    }

    /// Restrict `alias.borough` to the configured boroughs
    fn borough_filter(&self, alias: &str) -> String {
        if self.filters.boroughs.is_empty() {
            "TRUE".to_string()
        } else {
            format!("{alias}.borough IN ({})", borough_list(&self.filters.boroughs))
        }
    }
}

/// Global totals from `summary_statistics`
pub fn summary(store: &Store) -> Result<StatsOverview> {
    let stats = read_summary(store)?;
    Ok(StatsOverview {
        total_trips: stats.total_trips,
        total_revenue: round2(stats.total_revenue),
        avg_fare: round2(stats.avg_fare),
        avg_distance: round2(stats.avg_distance),
        avg_duration_min: (stats.avg_duration / 6.0).round() / 10.0,
        date_range: DateRange {
            start: stats.first_trip_date.map(|d| d.to_string()),
            end: stats.last_trip_date.map(|d| d.to_string()),
        },
    })
}

// ============================================================================
// Zones
// ============================================================================

pub fn top_pickup_zones(
    store: &Store,
    ctx: &QueryContext,
    limit: Limit,
) -> Result<Vec<PickupZoneRow>> {
    let sql = format!(
        "SELECT
    l.zone,
    l.borough,
    z.pickup_count,
    CAST(ROUND(z.avg_fare, 2) AS DOUBLE),
    CAST(ROUND(z.avg_distance, 2) AS DOUBLE),
    CAST(ROUND(z.median_fare, 2) AS DOUBLE)
FROM mv_zone_pickup z
JOIN dim_location l ON z.location_id = l.location_id
WHERE {boroughs}
ORDER BY z.pickup_count DESC, z.location_id
LIMIT {limit}",
        boroughs = ctx.borough_filter("l")
    );
    store.query_rows(&sql, |row| {
        Ok(PickupZoneRow {
            zone: row.get(0)?,
            borough: row.get(1)?,
            pickup_count: row.get(2)?,
            avg_fare: row.get(3)?,
            avg_distance: row.get(4)?,
            median_fare: row.get(5)?,
        })
    })
}

pub fn top_dropoff_zones(
    store: &Store,
    ctx: &QueryContext,
    limit: Limit,
) -> Result<Vec<DropoffZoneRow>> {
    let sql = format!(
        "SELECT
    l.zone,
    l.borough,
    z.dropoff_count,
    CAST(ROUND(z.avg_fare, 2) AS DOUBLE),
    CAST(ROUND(z.avg_distance, 2) AS DOUBLE)
FROM mv_zone_dropoff z
JOIN dim_location l ON z.location_id = l.location_id
WHERE {boroughs}
ORDER BY z.dropoff_count DESC, z.location_id
LIMIT {limit}",
        boroughs = ctx.borough_filter("l")
    );
    store.query_rows(&sql, |row| {
        Ok(DropoffZoneRow {
            zone: row.get(0)?,
            borough: row.get(1)?,
            dropoff_count: row.get(2)?,
            avg_fare: row.get(3)?,
            avg_distance: row.get(4)?,
        })
    })
}

// ============================================================================
// Temporal
// ============================================================================

pub fn hourly_demand(store: &Store) -> Result<Vec<HourlyDemandRow>> {
    store.query_rows(
        "SELECT
    CAST(pickup_hour AS INTEGER),
    CAST(SUM(trip_count) AS BIGINT),
    CAST(ROUND(AVG(avg_fare), 2) AS DOUBLE),
    CAST(ROUND(SUM(total_revenue), 2) AS DOUBLE)
FROM mv_hourly_demand
GROUP BY pickup_hour
ORDER BY pickup_hour",
        |row| {
            Ok(HourlyDemandRow {
                hour: row.get(0)?,
                total_trips: row.get(1)?,
                avg_fare: row.get(2)?,
                total_revenue: row.get(3)?,
            })
        },
    )
}

pub fn day_of_week_demand(store: &Store) -> Result<Vec<DayOfWeekRow>> {
    store.query_rows(
        "SELECT
    CAST(pickup_day_of_week AS INTEGER),
    is_weekend,
    CAST(SUM(trip_count) AS BIGINT),
    CAST(ROUND(AVG(avg_fare), 2) AS DOUBLE)
FROM mv_hourly_demand
GROUP BY pickup_day_of_week, is_weekend
ORDER BY pickup_day_of_week",
        |row| {
            let day_number: i32 = row.get(0)?;
            Ok(DayOfWeekRow {
                day_number,
                day_name: usize::try_from(day_number)
                    .ok()
                    .and_then(|d| DAY_NAMES.get(d))
                    .copied()
                    .unwrap_or("Unknown"),
                is_weekend: row.get(1)?,
                total_trips: row.get(2)?,
                avg_fare: row.get(3)?,
            })
        },
    )
}

pub fn temporal_heatmap(store: &Store) -> Result<Vec<HeatmapCell>> {
    store.query_rows(
        "SELECT
    CAST(pickup_day_of_week AS INTEGER),
    CAST(pickup_hour AS INTEGER),
    CAST(SUM(trip_count) AS BIGINT)
FROM mv_hourly_demand
GROUP BY pickup_day_of_week, pickup_hour
ORDER BY pickup_day_of_week, pickup_hour",
        |row| {
            Ok(HeatmapCell {
                day: row.get(0)?,
                hour: row.get(1)?,
                trips: row.get(2)?,
            })
        },
    )
}

// ============================================================================
// Fare structure
// ============================================================================

pub fn fare_breakdown(store: &Store, ctx: &QueryContext) -> Result<FareBreakdown> {
    let sql = format!(
        "SELECT
    COUNT(*),
    CAST(ROUND(AVG(fare_amount), 2) AS DOUBLE),
    CAST(ROUND(AVG(extra), 2) AS DOUBLE),
    CAST(ROUND(AVG(mta_tax), 2) AS DOUBLE),
    CAST(ROUND(AVG(tip_amount), 2) AS DOUBLE),
    CAST(ROUND(AVG(tolls_amount), 2) AS DOUBLE),
    CAST(ROUND(AVG(improvement_surcharge), 2) AS DOUBLE),
    CAST(ROUND(AVG(congestion_surcharge), 2) AS DOUBLE),
    CAST(ROUND(AVG(airport_fee), 2) AS DOUBLE),
    CAST(ROUND(AVG(total_amount), 2) AS DOUBLE),
    CAST(ROUND(AVG(tip_amount / NULLIF(total_amount, 0) * 100), 2) AS DOUBLE)
FROM fact_trip
WHERE {fare_range}",
        fare_range = ctx.filters.fare_range_sql("fare_amount")
    );
    let mut rows = store.query_rows(&sql, |row| {
        Ok(FareBreakdown {
            total_trips: row.get(0)?,
            components: FareComponents {
                base_fare: row.get(1)?,
                extra: row.get(2)?,
                mta_tax: row.get(3)?,
                tip: row.get(4)?,
                tolls: row.get(5)?,
                improvement_surcharge: row.get(6)?,
                congestion_surcharge: row.get(7)?,
                airport_fee: row.get(8)?,
                total: row.get(9)?,
            },
            tip_percentage_of_total: row.get(10)?,
        })
    })?;
    rows.pop()
        .ok_or_else(|| Error::store("fare breakdown returned no row"))
}

pub fn surcharge_frequency(store: &Store, ctx: &QueryContext) -> Result<SurchargeFrequency> {
    let sql = format!(
        "SELECT
    COUNT(*),
    COUNT(*) FILTER (WHERE congestion_surcharge > 0),
    COUNT(*) FILTER (WHERE airport_fee > 0),
    COUNT(*) FILTER (WHERE tolls_amount > 0)
FROM fact_trip
WHERE {fare_range}",
        fare_range = ctx.filters.fare_range_sql("fare_amount")
    );
    let mut rows = store.query_rows(&sql, |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, i64>(1)?,
            row.get::<_, i64>(2)?,
            row.get::<_, i64>(3)?,
        ))
    })?;
    let (total, congestion, airport_fee, tolls) = rows
        .pop()
        .ok_or_else(|| Error::store("surcharge frequency returned no row"))?;

    Ok(SurchargeFrequency {
        total_trips: total,
        surcharge_counts: SurchargeCounts {
            congestion,
            airport_fee,
            tolls,
        },
        surcharge_percentages: SurchargePercentages {
            congestion: AnomalyCount::of(congestion, total).percentage,
            airport_fee: AnomalyCount::of(airport_fee, total).percentage,
            tolls: AnomalyCount::of(tolls, total).percentage,
        },
    })
}

// ============================================================================
// Airport
// ============================================================================

/// Comma-separated airport rate code ids
fn airport_rate_code_ids() -> String {
    reference::airport_rate_codes()
        .map(|r| r.id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn airport_comparison(store: &Store, ctx: &QueryContext) -> Result<Vec<AirportComparisonRow>> {
    let airport_cases: String = reference::airport_rate_codes()
        .map(|r| format!("WHEN rate_code_id = {} THEN '{} Airport' ", r.id, r.name))
        .collect();
    let sql = format!(
        "SELECT
    CASE {airport_cases}WHEN airport_fee > 0 THEN 'Other Airport' ELSE 'Regular Trip' END AS trip_type,
    COUNT(*) AS trip_count,
    CAST(ROUND(AVG(fare_amount), 2) AS DOUBLE),
    CAST(ROUND(AVG(trip_distance), 2) AS DOUBLE),
    CAST(ROUND(AVG(trip_duration_seconds / 60.0), 1) AS DOUBLE),
    CAST(ROUND(AVG(tip_amount), 2) AS DOUBLE)
FROM fact_trip
WHERE fare_amount > 0 AND fare_amount < {ceiling}
GROUP BY trip_type
ORDER BY trip_count DESC, trip_type",
        ceiling = ctx.anomalies.fare_ceiling
    );
    store.query_rows(&sql, |row| {
        Ok(AirportComparisonRow {
            trip_type: row.get(0)?,
            trip_count: row.get(1)?,
            avg_fare: row.get(2)?,
            avg_distance: row.get(3)?,
            avg_duration_min: row.get(4)?,
            avg_tip: row.get(5)?,
        })
    })
}

pub fn top_airport_origins(
    store: &Store,
    ctx: &QueryContext,
    limit: Limit,
) -> Result<Vec<AirportOriginRow>> {
    let sql = format!(
        "SELECT
    l.zone,
    COUNT(*) AS airport_trip_count,
    CAST(ROUND(AVG(t.fare_amount), 2) AS DOUBLE),
    CAST(ROUND(AVG(t.trip_distance), 2) AS DOUBLE)
FROM fact_trip t
JOIN dim_location l ON t.pu_location_id = l.location_id
WHERE {boroughs}
  AND (t.rate_code_id IN ({rate_codes}) OR t.airport_fee > 0)
  AND t.fare_amount > 0
GROUP BY l.zone
HAVING COUNT(*) >= {min_trips}
ORDER BY airport_trip_count DESC, l.zone
LIMIT {limit}",
        boroughs = ctx.borough_filter("l"),
        rate_codes = airport_rate_code_ids(),
        min_trips = ctx.anomalies.airport_min_trips
    );
    store.query_rows(&sql, |row| {
        Ok(AirportOriginRow {
            zone: row.get(0)?,
            trip_count: row.get(1)?,
            avg_fare: row.get(2)?,
            avg_distance: row.get(3)?,
        })
    })
}

// ============================================================================
// Flows, vendors, payments
// ============================================================================

pub fn top_routes(store: &Store, ctx: &QueryContext, limit: Limit) -> Result<Vec<RouteRow>> {
    let sql = format!(
        "SELECT
    pu.zone,
    dropoff.zone,
    od.trip_count,
    CAST(ROUND(od.avg_fare, 2) AS DOUBLE),
    CAST(ROUND(od.avg_distance, 2) AS DOUBLE),
    CAST(ROUND(od.avg_duration_sec / 60.0, 1) AS DOUBLE)
FROM mv_od_flows od
JOIN dim_location pu ON od.pu_location_id = pu.location_id
JOIN dim_location dropoff ON od.do_location_id = dropoff.location_id
WHERE {pu_boroughs} AND {do_boroughs}
ORDER BY od.trip_count DESC, od.pu_location_id, od.do_location_id
LIMIT {limit}",
        pu_boroughs = ctx.borough_filter("pu"),
        do_boroughs = ctx.borough_filter("dropoff")
    );
    store.query_rows(&sql, |row| {
        Ok(RouteRow {
            origin: row.get(0)?,
            destination: row.get(1)?,
            trip_count: row.get(2)?,
            avg_fare: row.get(3)?,
            avg_distance: row.get(4)?,
            avg_duration_min: row.get(5)?,
        })
    })
}

pub fn vendor_performance(store: &Store) -> Result<Vec<VendorRow>> {
    store.query_rows(
        "SELECT
    v.vendor_name,
    v.vendor_short_name,
    vp.trip_count,
    CAST(ROUND(vp.trip_count * 100.0 / SUM(vp.trip_count) OVER (), 2) AS DOUBLE),
    CAST(ROUND(vp.avg_fare, 2) AS DOUBLE),
    CAST(ROUND(vp.avg_tip, 2) AS DOUBLE),
    CAST(ROUND(vp.avg_distance, 2) AS DOUBLE),
    CAST(ROUND(vp.avg_duration_sec / 60.0, 1) AS DOUBLE)
FROM mv_vendor_performance vp
JOIN dim_vendor v ON vp.vendor_id = v.vendor_id
ORDER BY vp.trip_count DESC, vp.vendor_id",
        |row| {
            Ok(VendorRow {
                vendor_name: row.get(0)?,
                vendor_short: row.get(1)?,
                trip_count: row.get(2)?,
                market_share_pct: row.get(3)?,
                avg_fare: row.get(4)?,
                avg_tip: row.get(5)?,
                avg_distance: row.get(6)?,
                avg_duration_min: row.get(7)?,
            })
        },
    )
}

pub fn tipping_by_payment_type(
    store: &Store,
    ctx: &QueryContext,
) -> Result<Vec<PaymentTippingRow>> {
    let sql = format!(
        "SELECT
    pt.payment_type_name,
    pt.is_card_payment,
    pt.allows_tip,
    COUNT(*) AS trip_count,
    CAST(ROUND(COUNT(*) * 100.0 / SUM(COUNT(*)) OVER (), 2) AS DOUBLE),
    CAST(ROUND(AVG(t.tip_amount), 2) AS DOUBLE),
    CAST(ROUND(AVG(t.fare_amount), 2) AS DOUBLE),
    CAST(ROUND(AVG(CASE WHEN t.fare_amount > 0
        THEN t.tip_amount * 100 / t.fare_amount ELSE NULL END), 2) AS DOUBLE),
    CAST(ROUND(COUNT(*) FILTER (WHERE t.tip_amount > 0) * 100.0 / COUNT(*), 2) AS DOUBLE)
FROM fact_trip t
JOIN dim_payment_type pt ON t.payment_type_id = pt.payment_type_id
WHERE {fare_range}
GROUP BY pt.payment_type_name, pt.is_card_payment, pt.allows_tip
ORDER BY trip_count DESC, pt.payment_type_name",
        fare_range = ctx.filters.fare_range_sql("t.fare_amount")
    );
    store.query_rows(&sql, |row| {
        Ok(PaymentTippingRow {
            payment_type: row.get(0)?,
            is_card: row.get(1)?,
            allows_tip: row.get(2)?,
            trip_count: row.get(3)?,
            pct_of_trips: row.get(4)?,
            avg_tip: row.get(5)?,
            avg_fare: row.get(6)?,
            avg_tip_pct: row.get(7)?,
            tipping_frequency_pct: row.get(8)?,
        })
    })
}

// ============================================================================
// Anomalies
// ============================================================================

pub fn high_fare_per_mile(
    store: &Store,
    ctx: &QueryContext,
    limit: Limit,
) -> Result<Vec<FarePerMileAnomaly>> {
    let a = &ctx.anomalies;
    let sql = format!(
        "SELECT
    t.trip_id,
    CAST(t.pickup_datetime AS VARCHAR),
    pu.zone,
    dropoff.zone,
    CAST(t.fare_amount AS DOUBLE),
    CAST(t.trip_distance AS DOUBLE),
    CAST(ROUND(t.fare_amount / NULLIF(t.trip_distance, 0), 2) AS DOUBLE) AS fare_per_mile,
    CAST(ROUND(t.trip_duration_seconds / 60.0, 1) AS DOUBLE)
FROM fact_trip t
JOIN dim_location pu ON t.pu_location_id = pu.location_id
JOIN dim_location dropoff ON t.do_location_id = dropoff.location_id
WHERE t.trip_distance > 0
  AND t.trip_distance < {distance_ceiling}
  AND t.fare_amount / t.trip_distance > {fare_per_mile}
  AND t.fare_amount < {fare_ceiling}
ORDER BY fare_per_mile DESC, t.trip_id
LIMIT {limit}",
        distance_ceiling = a.distance_ceiling,
        fare_per_mile = a.fare_per_mile,
        fare_ceiling = a.fare_ceiling
    );
    store.query_rows(&sql, |row| {
        Ok(FarePerMileAnomaly {
            trip_id: row.get(0)?,
            pickup_datetime: row.get(1)?,
            pickup_zone: row.get(2)?,
            dropoff_zone: row.get(3)?,
            fare_amount: row.get(4)?,
            trip_distance: row.get(5)?,
            fare_per_mile: row.get(6)?,
            duration_min: row.get(7)?,
        })
    })
}

pub fn anomaly_summary(store: &Store, ctx: &QueryContext) -> Result<AnomalySummary> {
    let a = &ctx.anomalies;
    let high_fare = store.query_i64(&format!(
        "SELECT COUNT(*)
FROM fact_trip
WHERE trip_distance > 0
  AND fare_amount / trip_distance > {}
  AND fare_amount < {}",
        a.fare_per_mile, a.fare_ceiling
    ))?;
    let no_tip = store.query_i64(&format!(
        "SELECT COUNT(*)
FROM fact_trip t
JOIN dim_payment_type pt ON t.payment_type_id = pt.payment_type_id
WHERE t.fare_amount > {}
  AND t.tip_amount = 0
  AND pt.allows_tip",
        a.expensive_fare
    ))?;
    let total = store.count_rows("fact_trip")?;

    Ok(AnomalySummary {
        total_trips: total,
        anomalies: AnomalyCounts {
            high_fare_per_mile: AnomalyCount::of(high_fare, total),
            no_tip_expensive: AnomalyCount::of(no_tip, total),
        },
    })
}
