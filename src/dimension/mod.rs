//! Dimension loader
//!
//! Populates the location dimension from the zone lookup file and the
//! vendor, payment-type and rate-code dimensions from fixed enumerations.
//! Must complete before facts load: the fact filter needs the accepted
//! location ids computed here.
//!
//! # Overview
//!
//! - `load_dimensions` - Replace all four dimension tables
//! - `accepted_locations` - Location ids inside the configured boroughs
//! - `reference` - Static vendor/payment/rate-code tables

mod location;
pub mod reference;

pub use location::{
    parse_locations, read_locations, LocationRecord, LocationTable, UNKNOWN_SERVICE_ZONE,
};
pub use reference::{PaymentTypeRecord, RateCodeRecord, VendorRecord};

use crate::error::{Error, Result};
use crate::schema::{DIM_LOCATION, DIM_PAYMENT_TYPE, DIM_RATE_CODE, DIM_VENDOR};
use crate::store::{sql_string_literal, Store};
use duckdb::params;
use reference::{PAYMENT_TYPES, RATE_CODES, VENDORS};
use std::path::Path;

/// Result of the dimension stage
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DimensionReport {
    /// Location rows written
    pub locations_loaded: usize,
    /// Location rows dropped for missing fields
    pub locations_dropped: usize,
    /// Vendor rows written
    pub vendors: usize,
    /// Payment type rows written
    pub payment_types: usize,
    /// Rate code rows written
    pub rate_codes: usize,
    /// Location ids accepted by the borough filter, ascending
    pub accepted_locations: Vec<i32>,
}

/// Load every dimension table
///
/// Each table is cleared and re-filled, so the stage can be re-run against
/// an existing store. Any failure is returned as `Error::DimensionLoad`.
pub fn load_dimensions(
    store: &Store,
    zone_lookup: &Path,
    boroughs: &[String],
) -> Result<DimensionReport> {
    tracing::info!(path = %zone_lookup.display(), "Loading taxi zones");
    let locations = read_locations(zone_lookup)?;
    if locations.dropped > 0 {
        tracing::warn!(
            dropped = locations.dropped,
            "Filtered zones with missing id, borough or zone"
        );
    }

    let mut report = DimensionReport {
        locations_loaded: load_locations(store, &locations.records)?,
        locations_dropped: locations.dropped,
        ..DimensionReport::default()
    };

    report.vendors = load_vendors(store)?;
    report.payment_types = load_payment_types(store)?;
    report.rate_codes = load_rate_codes(store)?;
    report.accepted_locations = accepted_locations(store, boroughs)?;

    tracing::info!(
        zones = report.locations_loaded,
        accepted = report.accepted_locations.len(),
        boroughs = ?boroughs,
        vendors = report.vendors,
        payment_types = report.payment_types,
        rate_codes = report.rate_codes,
        "Dimensions loaded"
    );

    if report.accepted_locations.is_empty() {
        tracing::warn!(
            boroughs = ?boroughs,
            "No zones match the borough filter; every trip will be rejected"
        );
    }

    Ok(report)
}

/// Write location records into `dim_location`
pub fn load_locations(store: &Store, records: &[LocationRecord]) -> Result<usize> {
    let fail = |e: duckdb::Error| Error::dimension(DIM_LOCATION, e.to_string());

    clear(store, DIM_LOCATION)?;
    let mut stmt = store
        .connection()
        .prepare("INSERT INTO dim_location VALUES (?, ?, ?, ?)")
        .map_err(fail)?;

    let mut seen = std::collections::HashSet::new();
    for record in records {
        if !seen.insert(record.location_id) {
            return Err(Error::dimension(
                DIM_LOCATION,
                format!("duplicate location id {}", record.location_id),
            ));
        }
        stmt.execute(params![
            record.location_id,
            record.borough,
            record.zone,
            record.service_zone
        ])
        .map_err(fail)?;
    }

    Ok(records.len())
}

fn load_vendors(store: &Store) -> Result<usize> {
    let fail = |e: duckdb::Error| Error::dimension(DIM_VENDOR, e.to_string());

    clear(store, DIM_VENDOR)?;
    let mut stmt = store
        .connection()
        .prepare("INSERT INTO dim_vendor VALUES (?, ?, ?)")
        .map_err(fail)?;
    for vendor in VENDORS {
        stmt.execute(params![vendor.id, vendor.name, vendor.short_name])
            .map_err(fail)?;
    }
    Ok(VENDORS.len())
}

fn load_payment_types(store: &Store) -> Result<usize> {
    let fail = |e: duckdb::Error| Error::dimension(DIM_PAYMENT_TYPE, e.to_string());

    clear(store, DIM_PAYMENT_TYPE)?;
    let mut stmt = store
        .connection()
        .prepare("INSERT INTO dim_payment_type VALUES (?, ?, ?, ?)")
        .map_err(fail)?;
    for payment in PAYMENT_TYPES {
        stmt.execute(params![
            payment.id,
            payment.name,
            payment.is_card_payment,
            payment.allows_tip
        ])
        .map_err(fail)?;
    }
    Ok(PAYMENT_TYPES.len())
}

fn load_rate_codes(store: &Store) -> Result<usize> {
    let fail = |e: duckdb::Error| Error::dimension(DIM_RATE_CODE, e.to_string());

    clear(store, DIM_RATE_CODE)?;
    let mut stmt = store
        .connection()
        .prepare("INSERT INTO dim_rate_code VALUES (?, ?, ?, ?)")
        .map_err(fail)?;
    for rate in RATE_CODES {
        stmt.execute(params![rate.id, rate.name, rate.is_airport, rate.is_standard])
            .map_err(fail)?;
    }
    Ok(RATE_CODES.len())
}

fn clear(store: &Store, table: &str) -> Result<()> {
    store
        .execute_batch(&format!("DELETE FROM {table}"))
        .map_err(|e| Error::dimension(table, format!("failed to clear: {e}")))
}

/// Location ids whose borough is in `boroughs` (all ids when empty)
pub fn accepted_locations(store: &Store, boroughs: &[String]) -> Result<Vec<i32>> {
    let sql = if boroughs.is_empty() {
        "SELECT location_id FROM dim_location ORDER BY location_id".to_string()
    } else {
        format!(
            "SELECT location_id FROM dim_location WHERE borough IN ({}) ORDER BY location_id",
            borough_list(boroughs)
        )
    };

    let fail = |e: duckdb::Error| Error::dimension(DIM_LOCATION, e.to_string());
    let mut stmt = store.connection().prepare(&sql).map_err(fail)?;
    let ids = stmt
        .query_map([], |row| row.get::<_, i32>(0))
        .map_err(fail)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(fail)?;
    Ok(ids)
}

/// Render boroughs as a comma-separated list of SQL literals
pub fn borough_list(boroughs: &[String]) -> String {
    boroughs
        .iter()
        .map(|b| sql_string_literal(b))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests;
