//! Dimension loader tests

use super::*;
use crate::schema::create_schema;
use pretty_assertions::assert_eq;
use std::io::Write;

const ZONES_CSV: &str = "\"LocationID\",\"Borough\",\"Zone\",\"service_zone\"
1,\"EWR\",\"Newark Airport\",\"EWR\"
4,\"Manhattan\",\"Alphabet City\",\"Yellow Zone\"
13,\"Manhattan\",\"Battery Park City\",\"Yellow Zone\"
14,\"Brooklyn\",\"Bay Ridge\",\"Boro Zone\"
43,\"Manhattan\",\"Central Park\",
264,\"Unknown\",\"N/A\",\"N/A\"
265,\"N/A\",\"Outside of NYC\",\"N/A\"
,\"Manhattan\",\"No Id\",\"Yellow Zone\"
";

fn store_with_schema() -> Store {
    let store = Store::in_memory().unwrap();
    create_schema(&store, false).unwrap();
    store
}

fn write_zones(dir: &tempfile::TempDir) -> std::path::PathBuf {
    let path = dir.path().join("taxi_zone_lookup.csv");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(ZONES_CSV.as_bytes()).unwrap();
    path
}

#[test]
fn test_parse_normalizes_and_drops() {
    let table = parse_locations(ZONES_CSV.as_bytes()).unwrap();

    assert_eq!(table.records.len(), 5);
    assert_eq!(table.dropped, 3);
    assert_eq!(
        table.records[1],
        LocationRecord {
            location_id: 4,
            borough: "Manhattan".to_string(),
            zone: "Alphabet City".to_string(),
            service_zone: "Yellow Zone".to_string(),
        }
    );
}

#[test]
fn test_missing_service_zone_defaults_to_unknown() {
    let table = parse_locations(ZONES_CSV.as_bytes()).unwrap();
    let central_park = table
        .records
        .iter()
        .find(|r| r.location_id == 43)
        .unwrap();
    assert_eq!(central_park.service_zone, UNKNOWN_SERVICE_ZONE);
}

#[test]
fn test_parse_accepts_float_ids_and_lowercase_headers() {
    let csv = "locationid,borough,zone\n7.0,Queens,Astoria\n";
    let table = parse_locations(csv.as_bytes()).unwrap();
    assert_eq!(table.records[0].location_id, 7);
    assert_eq!(table.records[0].service_zone, UNKNOWN_SERVICE_ZONE);
}

#[test]
fn test_parse_rejects_missing_columns() {
    let csv = "id,name\n1,foo\n";
    let err = parse_locations(csv.as_bytes()).unwrap_err();
    assert!(matches!(err, Error::DimensionLoad { .. }));
    assert!(err.to_string().contains("location_id"));
}

#[test]
fn test_load_dimensions_populates_tables() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_zones(&dir);
    let store = store_with_schema();

    let report = load_dimensions(&store, &path, &["Manhattan".to_string()]).unwrap();

    assert_eq!(report.locations_loaded, 5);
    assert_eq!(report.locations_dropped, 3);
    assert_eq!(report.vendors, 4);
    assert_eq!(report.payment_types, 6);
    assert_eq!(report.rate_codes, 7);
    assert_eq!(report.accepted_locations, vec![4, 13, 43]);

    assert_eq!(store.count_rows(DIM_LOCATION).unwrap(), 5);
    assert_eq!(store.count_rows(DIM_VENDOR).unwrap(), 4);
    assert_eq!(store.count_rows(DIM_PAYMENT_TYPE).unwrap(), 6);
    assert_eq!(store.count_rows(DIM_RATE_CODE).unwrap(), 7);
}

#[test]
fn test_load_dimensions_can_rerun() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_zones(&dir);
    let store = store_with_schema();

    load_dimensions(&store, &path, &[]).unwrap();
    let report = load_dimensions(&store, &path, &[]).unwrap();

    assert_eq!(store.count_rows(DIM_LOCATION).unwrap(), 5);
    assert_eq!(store.count_rows(DIM_VENDOR).unwrap(), 4);
    // Empty borough filter accepts every zone
    assert_eq!(report.accepted_locations, vec![1, 4, 13, 14, 43]);
}

#[test]
fn test_missing_zone_file_is_dimension_error() {
    let store = store_with_schema();
    let err = load_dimensions(&store, Path::new("/nonexistent/zones.csv"), &[]).unwrap_err();
    assert!(matches!(err, Error::DimensionLoad { .. }));
}

#[test]
fn test_duplicate_location_ids_rejected() {
    let store = store_with_schema();
    let records = vec![
        LocationRecord {
            location_id: 4,
            borough: "Manhattan".to_string(),
            zone: "Alphabet City".to_string(),
            service_zone: "Yellow Zone".to_string(),
        },
        LocationRecord {
            location_id: 4,
            borough: "Manhattan".to_string(),
            zone: "Alphabet City again".to_string(),
            service_zone: "Yellow Zone".to_string(),
        },
    ];
    let err = load_locations(&store, &records).unwrap_err();
    assert!(err.to_string().contains("duplicate location id 4"));
}

#[test]
fn test_reference_lookups() {
    assert_eq!(reference::vendor(2).unwrap().short_name, "VTS");
    assert!(reference::payment_type(1).unwrap().allows_tip);
    assert!(!reference::payment_type(2).unwrap().allows_tip);
    assert!(reference::rate_code(2).unwrap().is_airport);
    assert!(reference::rate_code(42).is_none());

    let airports: Vec<i32> = reference::airport_rate_codes().map(|r| r.id).collect();
    assert_eq!(airports, vec![2, 3]);
}

#[test]
fn test_borough_list_quotes_names() {
    let list = borough_list(&["Manhattan".to_string(), "Staten Island".to_string()]);
    assert_eq!(list, "'Manhattan', 'Staten Island'");
}
