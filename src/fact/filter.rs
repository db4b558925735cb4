//! Acceptance filter
//!
//! Renders the row filter as a SQL predicate over the typed columns the
//! loader projects (`pu_location_id`, `fare_amount`, `duration_secs`, ...).
//! Money and distance are compared after rounding to `DECIMAL(10,2)` and the
//! duration in whole seconds, so every stored value satisfies the bounds.
//! Passenger count is compared on the raw value.

use crate::config::FilterBounds;

/// Row filter for one run
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptanceFilter {
    bounds: FilterBounds,
    locations: Vec<i32>,
}

impl AcceptanceFilter {
    /// Build a filter from bounds and the accepted location ids
    pub fn new(bounds: FilterBounds, mut locations: Vec<i32>) -> Self {
        locations.sort_unstable();
        locations.dedup();
        Self { bounds, locations }
    }

    /// Accepted location ids, ascending
    pub fn locations(&self) -> &[i32] {
        &self.locations
    }

    /// SQL predicate a row must satisfy to be inserted
    pub fn predicate(&self) -> String {
        let b = &self.bounds;
        [
            self.location_predicate("pu_location_id"),
            self.location_predicate("do_location_id"),
            b.fare_range_sql("fare_amount"),
            format!("trip_distance > 0 AND trip_distance < {}", b.distance_max),
            format!(
                "raw_passenger_count BETWEEN {} AND {}",
                b.passengers_min, b.passengers_max
            ),
            "pickup_datetime < dropoff_datetime".to_string(),
            format!("duration_secs < {}", b.duration_max_secs),
        ]
        .join("\n  AND ")
    }

    /// `column IN (...)`, or FALSE when no location is accepted
    fn location_predicate(&self, column: &str) -> String {
        if self.locations.is_empty() {
            return "FALSE".to_string();
        }
        let ids = self
            .locations
            .iter()
            .map(i32::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        format!("{column} IN ({ids})")
    }
}

impl FilterBounds {
    /// `0 < column < fare_max`
    pub fn fare_range_sql(&self, column: &str) -> String {
        format!("{column} > 0 AND {column} < {}", self.fare_max)
    }
}
