//! Query result rows
//!
//! Field names are the JSON keys the API returns.

use serde::Serialize;

/// `/stats`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsOverview {
    pub total_trips: i64,
    pub total_revenue: f64,
    pub avg_fare: f64,
    pub avg_distance: f64,
    pub avg_duration_min: f64,
    pub date_range: DateRange,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateRange {
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PickupZoneRow {
    pub zone: String,
    pub borough: String,
    pub pickup_count: i64,
    pub avg_fare: f64,
    pub avg_distance: f64,
    pub median_fare: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DropoffZoneRow {
    pub zone: String,
    pub borough: String,
    pub dropoff_count: i64,
    pub avg_fare: f64,
    pub avg_distance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyDemandRow {
    pub hour: i32,
    pub total_trips: i64,
    pub avg_fare: f64,
    pub total_revenue: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayOfWeekRow {
    pub day_number: i32,
    pub day_name: &'static str,
    pub is_weekend: bool,
    pub total_trips: i64,
    pub avg_fare: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapCell {
    pub day: i32,
    pub hour: i32,
    pub trips: i64,
}

/// Average of each fare component
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FareComponents {
    pub base_fare: Option<f64>,
    pub extra: Option<f64>,
    pub mta_tax: Option<f64>,
    pub tip: Option<f64>,
    pub tolls: Option<f64>,
    pub improvement_surcharge: Option<f64>,
    pub congestion_surcharge: Option<f64>,
    pub airport_fee: Option<f64>,
    pub total: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FareBreakdown {
    pub total_trips: i64,
    pub components: FareComponents,
    pub tip_percentage_of_total: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurchargeCounts {
    pub congestion: i64,
    pub airport_fee: i64,
    pub tolls: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurchargePercentages {
    pub congestion: f64,
    pub airport_fee: f64,
    pub tolls: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurchargeFrequency {
    pub total_trips: i64,
    pub surcharge_counts: SurchargeCounts,
    pub surcharge_percentages: SurchargePercentages,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AirportComparisonRow {
    pub trip_type: String,
    pub trip_count: i64,
    pub avg_fare: f64,
    pub avg_distance: f64,
    pub avg_duration_min: f64,
    pub avg_tip: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AirportOriginRow {
    pub zone: String,
    pub trip_count: i64,
    pub avg_fare: f64,
    pub avg_distance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteRow {
    pub origin: String,
    pub destination: String,
    pub trip_count: i64,
    pub avg_fare: f64,
    pub avg_distance: f64,
    pub avg_duration_min: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VendorRow {
    pub vendor_name: String,
    pub vendor_short: String,
    pub trip_count: i64,
    pub market_share_pct: f64,
    pub avg_fare: f64,
    pub avg_tip: Option<f64>,
    pub avg_distance: f64,
    pub avg_duration_min: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentTippingRow {
    pub payment_type: String,
    pub is_card: bool,
    pub allows_tip: bool,
    pub trip_count: i64,
    pub pct_of_trips: f64,
    pub avg_tip: Option<f64>,
    pub avg_fare: f64,
    pub avg_tip_pct: Option<f64>,
    pub tipping_frequency_pct: f64,
}

/// A trip with an outlying fare per mile
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FarePerMileAnomaly {
    pub trip_id: i64,
    pub pickup_datetime: String,
    pub pickup_zone: String,
    pub dropoff_zone: String,
    pub fare_amount: f64,
    pub trip_distance: f64,
    pub fare_per_mile: f64,
    pub duration_min: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnomalyCount {
    pub count: i64,
    pub percentage: f64,
}

impl AnomalyCount {
    /// Count with its share of `total`, 0% when there are no trips
    pub fn of(count: i64, total: i64) -> Self {
        let percentage = if total > 0 {
            round2(count as f64 * 100.0 / total as f64)
        } else {
            0.0
        };
        Self { count, percentage }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyCounts {
    pub high_fare_per_mile: AnomalyCount,
    pub no_tip_expensive: AnomalyCount,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalySummary {
    pub total_trips: i64,
    pub anomalies: AnomalyCounts,
}

/// Round to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
