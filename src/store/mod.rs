//! Analytical store backed by DuckDB
//!
//! This module wraps the single DuckDB database every stage reads and writes.
//! DuckDB does the heavy lifting (Parquet scans, GROUP BY, percentiles); the
//! pipeline only sequences SQL statements against it.

mod engine;

pub use engine::{sql_string_literal, timestamp_to_naive, Store};
