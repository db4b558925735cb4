//! Index builder
//!
//! Secondary indexes over `fact_trip`. Every index is best-effort: a failure
//! is logged, recorded in the report, and the next index is attempted.

use crate::error::{Error, Result};
use crate::schema::FACT_TRIP;
use crate::store::Store;
use std::time::{Duration, Instant};

/// One secondary index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexDef {
    pub name: &'static str,
    pub columns: &'static str,
}

impl IndexDef {
    fn create_sql(&self) -> String {
        format!(
            "CREATE INDEX IF NOT EXISTS {} ON {FACT_TRIP} ({})",
            self.name, self.columns
        )
    }
}

/// Indexes built after the fact load, in build order
pub const INDEXES: [IndexDef; 7] = [
    IndexDef {
        name: "idx_pickup_datetime_btree",
        columns: "pickup_datetime",
    },
    IndexDef {
        name: "idx_pu_location",
        columns: "pu_location_id",
    },
    IndexDef {
        name: "idx_do_location",
        columns: "do_location_id",
    },
    IndexDef {
        name: "idx_od_pair_covering",
        columns: "pu_location_id, do_location_id",
    },
    IndexDef {
        name: "idx_vendor_analysis",
        columns: "vendor_id",
    },
    IndexDef {
        name: "idx_payment_tipping",
        columns: "payment_type_id, tip_amount",
    },
    IndexDef {
        name: "idx_zone_temporal",
        columns: "pu_location_id, pickup_date, pickup_hour",
    },
];

/// What happened to one index
#[derive(Debug)]
pub enum IndexOutcome {
    Built { name: &'static str, elapsed: Duration },
    Failed { name: &'static str, error: Error },
}

impl IndexOutcome {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Built { name, .. } | Self::Failed { name, .. } => name,
        }
    }

    pub fn is_built(&self) -> bool {
        matches!(self, Self::Built { .. })
    }
}

/// Result of the index stage
#[derive(Debug, Default)]
pub struct IndexReport {
    pub outcomes: Vec<IndexOutcome>,
    pub elapsed: Duration,
}

impl IndexReport {
    /// Number of indexes built
    pub fn built(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_built()).count()
    }

    /// Number of indexes that failed
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.built()
    }
}

/// Build every index in [`INDEXES`]
pub fn build_indexes(store: &Store) -> IndexReport {
    build_index_set(store, &INDEXES)
}

/// Build the given indexes, continuing past failures
pub fn build_index_set(store: &Store, indexes: &[IndexDef]) -> IndexReport {
    let start = Instant::now();
    let mut report = IndexReport::default();

    for index in indexes {
        let index_start = Instant::now();
        let outcome = match store.execute_batch(&index.create_sql()) {
            Ok(()) => {
                let elapsed = index_start.elapsed();
                tracing::info!(
                    index = index.name,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Index built"
                );
                IndexOutcome::Built {
                    name: index.name,
                    elapsed,
                }
            }
            Err(e) => {
                let error = Error::index(index.name, e.to_string());
                tracing::warn!(index = index.name, error = %error, "Index failed, continuing");
                IndexOutcome::Failed {
                    name: index.name,
                    error,
                }
            }
        };
        report.outcomes.push(outcome);
    }

    report.elapsed = start.elapsed();
    tracing::info!(
        built = report.built(),
        failed = report.failed(),
        elapsed_ms = report.elapsed.as_millis() as u64,
        "Indexes complete"
    );
    report
}

/// Drop every fact index (used before a reload)
pub fn drop_indexes(store: &Store) -> Result<()> {
    for index in &INDEXES {
        store
            .execute_batch(&format!("DROP INDEX IF EXISTS {}", index.name))
            .map_err(|e| Error::index(index.name, format!("drop failed: {e}")))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::create_schema;

    fn store() -> Store {
        let store = Store::in_memory().unwrap();
        create_schema(&store, false).unwrap();
        store
    }

    fn index_count(store: &Store) -> i64 {
        store
            .query_i64("SELECT COUNT(*) FROM duckdb_indexes() WHERE table_name = 'fact_trip'")
            .unwrap()
    }

    #[test]
    fn test_build_all_indexes() {
        let store = store();
        let report = build_indexes(&store);

        assert_eq!(report.built(), 7);
        assert_eq!(report.failed(), 0);
        assert_eq!(index_count(&store), 7);
    }

    #[test]
    fn test_build_is_idempotent() {
        let store = store();
        build_indexes(&store);
        let report = build_indexes(&store);
        assert_eq!(report.built(), 7);
        assert_eq!(index_count(&store), 7);
    }

    #[test]
    fn test_failure_is_recorded_and_skipped() {
        let store = store();
        let indexes = [
            IndexDef {
                name: "idx_bogus",
                columns: "no_such_column",
            },
            INDEXES[1],
        ];

        let report = build_index_set(&store, &indexes);

        assert_eq!(report.failed(), 1);
        assert_eq!(report.built(), 1);
        assert_eq!(report.outcomes[0].name(), "idx_bogus");
        assert!(matches!(
            &report.outcomes[0],
            IndexOutcome::Failed {
                error: Error::Index { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_drop_indexes() {
        let store = store();
        build_indexes(&store);
        drop_indexes(&store).unwrap();
        assert_eq!(index_count(&store), 0);
        // Dropping again is a no-op
        drop_indexes(&store).unwrap();
    }
}
