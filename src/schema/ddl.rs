//! Table definitions for the dimensional model

// ============================================================================
// Table Names
// ============================================================================

pub const DIM_LOCATION: &str = "dim_location";
pub const DIM_VENDOR: &str = "dim_vendor";
pub const DIM_PAYMENT_TYPE: &str = "dim_payment_type";
pub const DIM_RATE_CODE: &str = "dim_rate_code";
pub const FACT_TRIP: &str = "fact_trip";

pub const MV_ZONE_PICKUP: &str = "mv_zone_pickup";
pub const MV_ZONE_DROPOFF: &str = "mv_zone_dropoff";
pub const MV_HOURLY_DEMAND: &str = "mv_hourly_demand";
pub const MV_OD_FLOWS: &str = "mv_od_flows";
pub const MV_VENDOR_PERFORMANCE: &str = "mv_vendor_performance";
pub const MV_PAYMENT_PATTERNS: &str = "mv_payment_patterns";

pub const SUMMARY_STATISTICS: &str = "summary_statistics";

/// Materialized aggregate tables, in build order
pub const AGGREGATE_TABLES: [&str; 6] = [
    MV_ZONE_PICKUP,
    MV_ZONE_DROPOFF,
    MV_HOURLY_DEMAND,
    MV_OD_FLOWS,
    MV_VENDOR_PERFORMANCE,
    MV_PAYMENT_PATTERNS,
];

/// Every table the pipeline produces, facts first
pub const ALL_TABLES: [&str; 12] = [
    FACT_TRIP,
    DIM_LOCATION,
    DIM_VENDOR,
    DIM_PAYMENT_TYPE,
    DIM_RATE_CODE,
    MV_ZONE_PICKUP,
    MV_ZONE_DROPOFF,
    MV_HOURLY_DEMAND,
    MV_OD_FLOWS,
    MV_VENDOR_PERFORMANCE,
    MV_PAYMENT_PATTERNS,
    SUMMARY_STATISTICS,
];

// ============================================================================
// DDL
// ============================================================================

/// A table created by the schema stage
#[derive(Debug, Clone, Copy)]
pub struct TableDef {
    /// Table name
    pub name: &'static str,
    /// CREATE statement (idempotent)
    pub ddl: &'static str,
}

/// Dimension and fact tables, in creation order
pub const TABLES: [TableDef; 5] = [
    TableDef {
        name: DIM_LOCATION,
        ddl: "CREATE TABLE IF NOT EXISTS dim_location (
            location_id INTEGER PRIMARY KEY,
            borough VARCHAR NOT NULL,
            zone VARCHAR NOT NULL,
            service_zone VARCHAR NOT NULL
        )",
    },
    TableDef {
        name: DIM_VENDOR,
        ddl: "CREATE TABLE IF NOT EXISTS dim_vendor (
            vendor_id INTEGER PRIMARY KEY,
            vendor_name VARCHAR NOT NULL,
            vendor_short_name VARCHAR NOT NULL
        )",
    },
    TableDef {
        name: DIM_PAYMENT_TYPE,
        ddl: "CREATE TABLE IF NOT EXISTS dim_payment_type (
            payment_type_id INTEGER PRIMARY KEY,
            payment_type_name VARCHAR NOT NULL,
            is_card_payment BOOLEAN NOT NULL,
            allows_tip BOOLEAN NOT NULL
        )",
    },
    TableDef {
        name: DIM_RATE_CODE,
        ddl: "CREATE TABLE IF NOT EXISTS dim_rate_code (
            rate_code_id INTEGER PRIMARY KEY,
            rate_code_name VARCHAR NOT NULL,
            is_airport BOOLEAN NOT NULL,
            is_standard BOOLEAN NOT NULL
        )",
    },
    TableDef {
        name: FACT_TRIP,
        ddl: "CREATE TABLE IF NOT EXISTS fact_trip (
            trip_id BIGINT PRIMARY KEY,
            vendor_id INTEGER,
            pu_location_id INTEGER NOT NULL,
            do_location_id INTEGER NOT NULL,
            payment_type_id INTEGER,
            rate_code_id INTEGER,
            pickup_datetime TIMESTAMP NOT NULL,
            dropoff_datetime TIMESTAMP NOT NULL,
            pickup_date DATE NOT NULL,
            pickup_hour TINYINT NOT NULL,
            pickup_day_of_week TINYINT NOT NULL,
            is_weekend BOOLEAN NOT NULL,
            passenger_count TINYINT NOT NULL,
            trip_distance DECIMAL(10, 2) NOT NULL,
            trip_duration_seconds INTEGER NOT NULL,
            fare_amount DECIMAL(10, 2) NOT NULL,
            extra DECIMAL(10, 2),
            mta_tax DECIMAL(10, 2),
            tip_amount DECIMAL(10, 2),
            tolls_amount DECIMAL(10, 2),
            improvement_surcharge DECIMAL(10, 2),
            total_amount DECIMAL(10, 2),
            congestion_surcharge DECIMAL(10, 2),
            airport_fee DECIMAL(10, 2),
            cbd_congestion_fee DECIMAL(10, 2) NOT NULL DEFAULT 0,
            store_and_fwd_flag VARCHAR(1)
        )",
    },
];
