//! Schema module
//!
//! Declares the dimensional model: four dimension tables and the trip fact
//! table. Creation is idempotent; tables are only dropped when the caller
//! asks for a rebuild.
//!
//! # Overview
//!
//! - `create_schema` - Create missing tables, optionally dropping everything first
//! - `drop_all` - Drop every table the pipeline owns
//! - Table name constants shared by the other stages

mod ddl;

pub use ddl::{
    TableDef, AGGREGATE_TABLES, ALL_TABLES, DIM_LOCATION, DIM_PAYMENT_TYPE, DIM_RATE_CODE,
    DIM_VENDOR, FACT_TRIP, MV_HOURLY_DEMAND, MV_OD_FLOWS, MV_PAYMENT_PATTERNS,
    MV_VENDOR_PERFORMANCE, MV_ZONE_DROPOFF, MV_ZONE_PICKUP, SUMMARY_STATISTICS, TABLES,
};

use crate::error::{Error, Result};
use crate::store::Store;

/// Result of the schema stage
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaReport {
    /// Tables created by this run
    pub created: Vec<&'static str>,
    /// Tables that already existed and were left alone
    pub existing: Vec<&'static str>,
    /// Whether existing tables were dropped first
    pub rebuilt: bool,
}

/// Create the dimension and fact tables
///
/// With `rebuild` set, every pipeline-owned table is dropped first.
/// Any failing statement aborts with the name of the table it was creating.
pub fn create_schema(store: &Store, rebuild: bool) -> Result<SchemaReport> {
    let mut report = SchemaReport {
        rebuilt: rebuild,
        ..SchemaReport::default()
    };

    if rebuild {
        drop_all(store)?;
    }

    for table in &TABLES {
        let existed = store
            .table_exists(table.name)
            .map_err(|e| Error::schema(table.name, e.to_string()))?;

        store
            .execute_batch(table.ddl)
            .map_err(|e| Error::schema(table.name, e.to_string()))?;

        if existed {
            report.existing.push(table.name);
        } else {
            report.created.push(table.name);
        }
    }

    tracing::info!(
        created = report.created.len(),
        existing = report.existing.len(),
        rebuilt = report.rebuilt,
        "Schema ready"
    );
    Ok(report)
}

/// Drop every table the pipeline owns, dependents first
pub fn drop_all(store: &Store) -> Result<()> {
    let dependents = std::iter::once(SUMMARY_STATISTICS).chain(AGGREGATE_TABLES);
    let owned = TABLES.iter().rev().map(|t| t.name);

    for table in dependents.chain(owned) {
        store
            .execute_batch(&format!("DROP TABLE IF EXISTS {table}"))
            .map_err(|e| Error::schema(table, format!("drop failed: {e}")))?;
    }

    tracing::info!("Dropped existing tables for rebuild");
    Ok(())
}

#[cfg(test)]
mod tests;
