//! Fixtures shared by unit tests
//!
//! Batches are written with DuckDB's own `COPY ... (FORMAT PARQUET)` so the
//! unit tests exercise the same column layout the loader reads.

use crate::config::{FilterBounds, InputSettings};
use crate::dimension::load_dimensions;
use crate::fact::{load_facts, AcceptanceFilter, BatchFile, LoadReport};
use crate::schema::create_schema;
use crate::store::{sql_string_literal, Store};
use std::path::{Path, PathBuf};

pub const ZONES_CSV: &str = "\"LocationID\",\"Borough\",\"Zone\",\"service_zone\"
1,\"EWR\",\"Newark Airport\",\"EWR\"
4,\"Manhattan\",\"Alphabet City\",\"Yellow Zone\"
13,\"Manhattan\",\"Battery Park City\",\"Yellow Zone\"
14,\"Brooklyn\",\"Bay Ridge\",\"Boro Zone\"
43,\"Manhattan\",\"Central Park\",\"Yellow Zone\"
132,\"Queens\",\"JFK Airport\",\"Airports\"
";

/// One raw trip as it appears in a batch file
#[derive(Debug, Clone)]
pub struct TripRow {
    pub vendor: i32,
    pub pickup: String,
    pub duration_micros: i64,
    pub passengers: f64,
    pub distance: f64,
    pub rate_code: f64,
    pub store_and_fwd: &'static str,
    pub pu: i32,
    pub dropoff: i32,
    pub payment: i64,
    pub fare: f64,
    pub tip: f64,
    pub tolls: f64,
    pub congestion: f64,
    pub airport_fee: f64,
}

impl TripRow {
    /// A trip that passes the default filter for Manhattan zones
    pub fn valid(pu: i32, dropoff: i32) -> Self {
        Self {
            vendor: 2,
            pickup: "2025-01-06 08:15:00".to_string(),
            duration_micros: 900_000_000,
            passengers: 1.0,
            distance: 2.5,
            rate_code: 1.0,
            store_and_fwd: "N",
            pu,
            dropoff,
            payment: 1,
            fare: 15.0,
            tip: 3.0,
            tolls: 0.0,
            congestion: 2.5,
            airport_fee: 0.0,
        }
    }

    pub fn fare(mut self, fare: f64) -> Self {
        self.fare = fare;
        self
    }

    pub fn distance(mut self, distance: f64) -> Self {
        self.distance = distance;
        self
    }

    pub fn passengers(mut self, passengers: f64) -> Self {
        self.passengers = passengers;
        self
    }

    pub fn pickup(mut self, pickup: &str) -> Self {
        self.pickup = pickup.to_string();
        self
    }

    pub fn duration(mut self, secs: i64) -> Self {
        self.duration_micros = secs * 1_000_000;
        self
    }

    pub fn duration_micros(mut self, micros: i64) -> Self {
        self.duration_micros = micros;
        self
    }

    pub fn vendor(mut self, vendor: i32) -> Self {
        self.vendor = vendor;
        self
    }

    pub fn payment(mut self, payment: i64) -> Self {
        self.payment = payment;
        self
    }

    pub fn tip(mut self, tip: f64) -> Self {
        self.tip = tip;
        self
    }

    pub fn rate_code(mut self, rate_code: f64) -> Self {
        self.rate_code = rate_code;
        self
    }

    fn total(&self) -> f64 {
        self.fare + 1.0 + 0.5 + self.tip + self.tolls + 1.0 + self.congestion + self.airport_fee
    }

    fn values_sql(&self) -> String {
        format!(
            "({vendor}, TIMESTAMP '{pickup}', TIMESTAMP '{pickup}' + INTERVAL '{dur} microseconds', \
             {pass}::DOUBLE, {dist}::DOUBLE, {rate}::DOUBLE, '{fwd}', {pu}, {dropoff}, \
             {payment}::BIGINT, {fare}::DOUBLE, 1.0::DOUBLE, 0.5::DOUBLE, {tip}::DOUBLE, \
             {tolls}::DOUBLE, 1.0::DOUBLE, {total}::DOUBLE, {cong}::DOUBLE, {airport}::DOUBLE)",
            vendor = self.vendor,
            pickup = self.pickup,
            dur = self.duration_micros,
            pass = self.passengers,
            dist = self.distance,
            rate = self.rate_code,
            fwd = self.store_and_fwd,
            pu = self.pu,
            dropoff = self.dropoff,
            payment = self.payment,
            fare = self.fare,
            tip = self.tip,
            tolls = self.tolls,
            total = self.total(),
            cong = self.congestion,
            airport = self.airport_fee,
        )
    }
}

const BATCH_COLUMNS: &str = "VendorID, tpep_pickup_datetime, tpep_dropoff_datetime, \
    passenger_count, trip_distance, RatecodeID, store_and_fwd_flag, PULocationID, DOLocationID, \
    payment_type, fare_amount, extra, mta_tax, tip_amount, tolls_amount, improvement_surcharge, \
    total_amount, congestion_surcharge, Airport_fee";

/// Write trips to a Parquet batch file
pub fn write_batch(path: &Path, trips: &[TripRow]) -> BatchFile {
    let writer = Store::in_memory().unwrap();
    let rows = if trips.is_empty() {
        // Typed placeholder row, filtered out below
        TripRow::valid(4, 4).values_sql()
    } else {
        trips
            .iter()
            .map(TripRow::values_sql)
            .collect::<Vec<_>>()
            .join(",\n")
    };
    let limit = if trips.is_empty() { " LIMIT 0" } else { "" };
    writer
        .execute_batch(&format!(
            "COPY (SELECT * FROM (VALUES {rows}) AS t({BATCH_COLUMNS}){limit}) \
             TO {} (FORMAT PARQUET)",
            sql_string_literal(&path.to_string_lossy())
        ))
        .unwrap();
    BatchFile::new(path)
}

/// Write the zone lookup into `dir`
pub fn write_zones(dir: &Path) -> PathBuf {
    let path = dir.join("taxi_zone_lookup.csv");
    std::fs::write(&path, ZONES_CSV).unwrap();
    path
}

/// Input settings pointing at `dir`
pub fn input_for(dir: &Path) -> InputSettings {
    InputSettings {
        batch_dir: dir.to_path_buf(),
        zone_lookup: dir.join("taxi_zone_lookup.csv"),
        ..InputSettings::default()
    }
}

/// In-memory store with schema, dimensions and the given batches loaded
pub fn loaded_store(dir: &Path, batches: &[Vec<TripRow>]) -> (Store, LoadReport) {
    let zones = write_zones(dir);
    for (idx, trips) in batches.iter().enumerate() {
        write_batch(
            &dir.join(format!("yellow_tripdata_2025-{:02}.parquet", idx + 1)),
            trips,
        );
    }

    let store = Store::in_memory().unwrap();
    create_schema(&store, false).unwrap();
    let bounds = FilterBounds::default();
    let dims = load_dimensions(&store, &zones, &bounds.boroughs).unwrap();
    let filter = AcceptanceFilter::new(bounds, dims.accepted_locations);
    let report = load_facts(&store, &input_for(dir), filter).unwrap();
    (store, report)
}
