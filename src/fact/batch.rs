//! Batch discovery and footer inspection

use super::types::BatchFile;
use crate::config::InputSettings;
use crate::error::{Error, Result};
use arrow::datatypes::{DataType, Schema};
use parquet::arrow::parquet_to_arrow_schema;
use parquet::file::reader::{FileReader, SerializedFileReader};
use std::fs::File;

/// Columns every batch must carry (matched case-insensitively)
pub const REQUIRED_COLUMNS: [&str; 19] = [
    "VendorID",
    "tpep_pickup_datetime",
    "tpep_dropoff_datetime",
    "passenger_count",
    "trip_distance",
    "RatecodeID",
    "store_and_fwd_flag",
    "PULocationID",
    "DOLocationID",
    "payment_type",
    "fare_amount",
    "extra",
    "mta_tax",
    "tip_amount",
    "tolls_amount",
    "improvement_surcharge",
    "total_amount",
    "congestion_surcharge",
    "Airport_fee",
];

const TIMESTAMP_COLUMNS: [&str; 2] = ["tpep_pickup_datetime", "tpep_dropoff_datetime"];

/// Find the batches to load
///
/// An explicit `batches` list wins and keeps its order. Otherwise every file
/// in `batch_dir` matching `batch_pattern` is returned, sorted by name.
pub fn discover_batches(input: &InputSettings) -> Result<Vec<BatchFile>> {
    if !input.batches.is_empty() {
        return Ok(input.batches.iter().map(BatchFile::new).collect());
    }

    if !input.batch_dir.is_dir() {
        return Err(Error::config(format!(
            "batch directory '{}' does not exist",
            input.batch_dir.display()
        )));
    }

    let pattern = input.batch_regex()?;
    let mut batches = Vec::new();
    for entry in std::fs::read_dir(&input.batch_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if pattern.is_match(&name) {
            batches.push(BatchFile {
                name,
                path: entry.path(),
            });
        }
    }
    batches.sort_by(|a, b| a.name.cmp(&b.name));

    tracing::debug!(
        dir = %input.batch_dir.display(),
        pattern = %input.batch_pattern,
        found = batches.len(),
        "Discovered batches"
    );
    Ok(batches)
}

/// What the footer says about a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchInspection {
    /// Rows in the file
    pub source_rows: u64,
}

/// Read a batch's Parquet footer and check its columns
///
/// Every failure is reported as `Error::Batch` so the loader can skip the
/// file and keep going.
pub fn inspect_batch(batch: &BatchFile) -> Result<BatchInspection> {
    let fail = |message: String| Error::batch(&batch.name, message);

    let file = File::open(&batch.path)
        .map_err(|e| fail(format!("cannot open '{}': {e}", batch.path.display())))?;
    let reader =
        SerializedFileReader::new(file).map_err(|e| fail(format!("unreadable parquet: {e}")))?;

    let metadata = reader.metadata().file_metadata();
    let schema = parquet_to_arrow_schema(metadata.schema_descr(), metadata.key_value_metadata())
        .map_err(|e| fail(format!("unsupported parquet schema: {e}")))?;

    let missing = missing_columns(&schema);
    if !missing.is_empty() {
        return Err(fail(format!("missing columns: {}", missing.join(", "))));
    }

    for name in TIMESTAMP_COLUMNS {
        if let Some(field) = find_field(&schema, name) {
            if !matches!(field.data_type(), DataType::Timestamp(_, _)) {
                return Err(fail(format!(
                    "column '{}' has type {}, expected a timestamp",
                    field.name(),
                    field.data_type()
                )));
            }
        }
    }

    let source_rows = u64::try_from(metadata.num_rows())
        .map_err(|_| fail(format!("negative row count {}", metadata.num_rows())))?;
    Ok(BatchInspection { source_rows })
}

/// Required columns absent from a schema
pub fn missing_columns(schema: &Schema) -> Vec<&'static str> {
    REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|name| find_field(schema, name).is_none())
        .collect()
}

fn find_field<'a>(schema: &'a Schema, name: &str) -> Option<&'a arrow::datatypes::Field> {
    schema
        .fields()
        .iter()
        .map(|f| f.as_ref())
        .find(|f| f.name().eq_ignore_ascii_case(name))
}
