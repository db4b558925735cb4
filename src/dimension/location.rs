//! Zone lookup parsing
//!
//! Reads the `LocationID,Borough,Zone,service_zone` reference CSV. Header
//! names are matched case-insensitively; rows without an id, borough or zone
//! are dropped and counted. "N/A" style placeholders count as missing.

use crate::error::{Error, Result};
use crate::schema::DIM_LOCATION;
use serde::Serialize;
use std::io::Read;
use std::path::Path;

/// Service zone recorded when the reference file leaves it blank
pub const UNKNOWN_SERVICE_ZONE: &str = "Unknown";

/// One geographic zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationRecord {
    pub location_id: i32,
    pub borough: String,
    pub zone: String,
    pub service_zone: String,
}

/// Parsed zone lookup
#[derive(Debug, Clone, Default)]
pub struct LocationTable {
    /// Rows that passed validation
    pub records: Vec<LocationRecord>,
    /// Rows dropped for a missing id, borough or zone
    pub dropped: usize,
}

/// Read the zone lookup CSV from a file
pub fn read_locations(path: &Path) -> Result<LocationTable> {
    let file = std::fs::File::open(path).map_err(|e| {
        Error::dimension(
            DIM_LOCATION,
            format!("cannot open zone lookup '{}': {e}", path.display()),
        )
    })?;
    parse_locations(file)
}

/// Parse zone lookup CSV content
pub fn parse_locations<R: Read>(reader: R) -> Result<LocationTable> {
    let mut csv = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = csv.headers()?.iter().map(normalize_header).collect();
    let column = |name: &str| headers.iter().position(|h| h == name);

    let (Some(id_col), Some(borough_col), Some(zone_col)) =
        (column("location_id"), column("borough"), column("zone"))
    else {
        return Err(Error::dimension(
            DIM_LOCATION,
            format!(
                "zone lookup needs location_id, borough and zone columns, found [{}]",
                headers.join(", ")
            ),
        ));
    };
    let service_col = column("service_zone");

    let mut table = LocationTable::default();
    for row in csv.records() {
        let row = row?;
        let field = |idx: usize| row.get(idx).map(str::trim).filter(|v| !is_missing(v));

        let id = field(id_col).and_then(parse_location_id);
        let borough = field(borough_col);
        let zone = field(zone_col);

        match (id, borough, zone) {
            (Some(location_id), Some(borough), Some(zone)) => {
                let service_zone = service_col
                    .and_then(field)
                    .unwrap_or(UNKNOWN_SERVICE_ZONE);
                table.records.push(LocationRecord {
                    location_id,
                    borough: borough.to_string(),
                    zone: zone.to_string(),
                    service_zone: service_zone.to_string(),
                });
            }
            _ => table.dropped += 1,
        }
    }

    Ok(table)
}

/// Placeholders the reference file uses for "no value"
const MISSING_MARKERS: [&str; 6] = ["", "n/a", "na", "nan", "null", "none"];

fn is_missing(value: &str) -> bool {
    MISSING_MARKERS.contains(&value.to_lowercase().as_str())
}

/// Lowercase a header and map the feed's `LocationID` to `location_id`
fn normalize_header(header: &str) -> String {
    let name = header.trim_start_matches('\u{feff}').trim().to_lowercase();
    match name.as_str() {
        "locationid" => "location_id".to_string(),
        _ => name,
    }
}

/// Ids occasionally arrive as floats ("12.0")
fn parse_location_id(raw: &str) -> Option<i32> {
    raw.parse::<i32>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.fract() == 0.0 && *v >= f64::from(i32::MIN) && *v <= f64::from(i32::MAX))
            .map(|v| v as i32)
    })
}
