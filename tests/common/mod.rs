//! Shared fixtures for integration tests
//!
//! Batches are written with arrow's `ArrowWriter` using the column names and
//! types of the published yellow-taxi files.

#![allow(dead_code)]

use arrow::array::{ArrayRef, Float64Array, Int32Array, Int64Array, StringArray, TimestampMicrosecondArray};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDateTime;
use parquet::arrow::ArrowWriter;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use taxi_analytics::PipelineConfig;

pub const ZONES_CSV: &str = "\"LocationID\",\"Borough\",\"Zone\",\"service_zone\"
4,\"Manhattan\",\"Alphabet City\",\"Yellow Zone\"
13,\"Manhattan\",\"Battery Park City\",\"Yellow Zone\"
43,\"Manhattan\",\"Central Park\",\"Yellow Zone\"
132,\"Queens\",\"JFK Airport\",\"Airports\"
";

/// One raw trip
#[derive(Debug, Clone)]
pub struct Trip {
    pub pickup: String,
    pub duration_secs: i64,
    pub pu: i32,
    pub dropoff: i32,
    pub fare: f64,
    pub distance: f64,
    pub tip: f64,
    pub payment: i64,
}

impl Trip {
    pub fn new(pu: i32, dropoff: i32) -> Self {
        Self {
            pickup: "2025-01-07 17:30:00".to_string(),
            duration_secs: 1200,
            pu,
            dropoff,
            fare: 18.0,
            distance: 3.0,
            tip: 4.0,
            payment: 1,
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

    pub fn pickup(mut self, pickup: &str) -> Self {
        self.pickup = pickup.to_string();
        self
    }

    fn pickup_micros(&self) -> i64 {
        NaiveDateTime::parse_from_str(&self.pickup, "%Y-%m-%d %H:%M:%S")
            .unwrap()
            .and_utc()
            .timestamp_micros()
    }
}

fn batch_schema() -> Arc<Schema> {
    let ts = || DataType::Timestamp(TimeUnit::Microsecond, None);
    let money = |name: &str| Field::new(name, DataType::Float64, true);
    Arc::new(Schema::new(vec![
        Field::new("VendorID", DataType::Int32, true),
        Field::new("tpep_pickup_datetime", ts(), true),
        Field::new("tpep_dropoff_datetime", ts(), true),
        Field::new("passenger_count", DataType::Int64, true),
        Field::new("trip_distance", DataType::Float64, true),
        Field::new("RatecodeID", DataType::Int64, true),
        Field::new("store_and_fwd_flag", DataType::Utf8, true),
        Field::new("PULocationID", DataType::Int32, true),
        Field::new("DOLocationID", DataType::Int32, true),
        Field::new("payment_type", DataType::Int64, true),
        money("fare_amount"),
        money("extra"),
        money("mta_tax"),
        money("tip_amount"),
        money("tolls_amount"),
        money("improvement_surcharge"),
        money("total_amount"),
        money("congestion_surcharge"),
        money("Airport_fee"),
    ]))
}

/// Write trips to a Parquet batch file
pub fn write_batch(path: &Path, trips: &[Trip]) -> PathBuf {
    let n = trips.len();
    let constant = |v: f64| -> ArrayRef { Arc::new(Float64Array::from(vec![v; n])) };
    let pickups: Vec<i64> = trips.iter().map(Trip::pickup_micros).collect();
    let dropoffs: Vec<i64> = trips
        .iter()
        .map(|t| t.pickup_micros() + t.duration_secs * 1_000_000)
        .collect();

    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int32Array::from(vec![2; n])),
        Arc::new(TimestampMicrosecondArray::from(pickups)),
        Arc::new(TimestampMicrosecondArray::from(dropoffs)),
        Arc::new(Int64Array::from(vec![1; n])),
        Arc::new(Float64Array::from_iter_values(trips.iter().map(|t| t.distance))),
        Arc::new(Int64Array::from(vec![1; n])),
        Arc::new(StringArray::from(vec!["N"; n])),
        Arc::new(Int32Array::from_iter_values(trips.iter().map(|t| t.pu))),
        Arc::new(Int32Array::from_iter_values(trips.iter().map(|t| t.dropoff))),
        Arc::new(Int64Array::from_iter_values(trips.iter().map(|t| t.payment))),
        Arc::new(Float64Array::from_iter_values(trips.iter().map(|t| t.fare))),
        constant(1.0),
        constant(0.5),
        Arc::new(Float64Array::from_iter_values(trips.iter().map(|t| t.tip))),
        constant(0.0),
        constant(1.0),
        Arc::new(Float64Array::from_iter_values(
            trips.iter().map(|t| t.fare + t.tip + 5.0),
        )),
        constant(2.5),
        constant(0.0),
    ];

    let schema = batch_schema();
    let batch = RecordBatch::try_new(schema.clone(), columns).unwrap();
    let file = File::create(path).unwrap();
    let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();
    path.to_path_buf()
}

/// Write the zone lookup CSV into `dir`
pub fn write_zones(dir: &Path) -> PathBuf {
    let path = dir.join("taxi_zone_lookup.csv");
    std::fs::write(&path, ZONES_CSV).unwrap();
    path
}

/// Pipeline config that reads from and writes into `dir`
pub fn config_for(dir: &Path) -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.store.path = dir.join("taxi.duckdb");
    config.store.memory_limit = "1GB".to_string();
    config.store.threads = 2;
    config.input.batch_dir = dir.to_path_buf();
    config.input.zone_lookup = dir.join("taxi_zone_lookup.csv");
    config
}
