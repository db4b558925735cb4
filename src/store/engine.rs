//! DuckDB connection wrapper
//!
//! The pipeline opens one read-write connection for the whole run; the query
//! server opens a fresh read-only connection per request.

use crate::config::StoreSettings;
use crate::error::{Error, Result};
use chrono::NaiveDateTime;
use duckdb::types::{TimeUnit, Value};
use duckdb::{AccessMode, Config, Connection};
use std::path::{Path, PathBuf};

/// Handle to the analytical store
pub struct Store {
    /// DuckDB connection
    conn: Connection,
    /// Database file (None for in-memory stores)
    path: Option<PathBuf>,
    /// Whether the connection was opened read-only
    read_only: bool,
}

impl Store {
    /// Open (or create) a store file for writing
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path).map_err(|e| {
            Error::store(format!(
                "Failed to open DuckDB store '{}': {e}",
                path.display()
            ))
        })?;

        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
            read_only: false,
        })
    }

    /// Open an existing store file read-only
    pub fn open_read_only(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::store(format!(
                "Store '{}' does not exist; run the pipeline first",
                path.display()
            )));
        }

        let config = Config::default()
            .access_mode(AccessMode::ReadOnly)
            .map_err(|e| Error::store(format!("Failed to build read-only config: {e}")))?;

        let conn = Connection::open_with_flags(path, config).map_err(|e| {
            Error::store(format!(
                "Failed to open DuckDB store '{}' read-only: {e}",
                path.display()
            ))
        })?;

        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
            read_only: true,
        })
    }

    /// Create an in-memory store
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::store(format!("Failed to create DuckDB connection: {e}")))?;

        Ok(Self {
            conn,
            path: None,
            read_only: false,
        })
    }

    /// Apply engine tuning from settings
    pub fn configure(&self, settings: &StoreSettings) -> Result<()> {
        let sql = format!(
            "SET memory_limit = '{}'; SET threads = {}; SET preserve_insertion_order = false;",
            settings.memory_limit, settings.threads
        );
        self.conn
            .execute_batch(&sql)
            .map_err(|e| Error::store(format!("Failed to configure DuckDB: {e}")))?;

        tracing::info!(
            memory_limit = %settings.memory_limit,
            threads = settings.threads,
            "Store configured"
        );
        Ok(())
    }

    /// Underlying DuckDB connection
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Database file path, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Whether this handle is read-only
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Run one or more statements that return no rows
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        tracing::debug!("Executing: {}", sql);
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    /// Run a single statement and return the number of affected rows
    pub fn execute(&self, sql: &str) -> Result<usize> {
        tracing::debug!("Executing: {}", sql);
        Ok(self.conn.execute(sql, [])?)
    }

    /// Run a query returning a single integer
    pub fn query_i64(&self, sql: &str) -> Result<i64> {
        Ok(self.conn.query_row(sql, [], |row| row.get(0))?)
    }

    /// Run a query and map every row
    pub fn query_rows<T, F>(&self, sql: &str, map: F) -> Result<Vec<T>>
    where
        F: FnMut(&duckdb::Row<'_>) -> duckdb::Result<T>,
    {
        tracing::debug!("Querying: {}", sql);
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map([], map)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Count the rows of a table
    pub fn count_rows(&self, table: &str) -> Result<i64> {
        self.query_i64(&format!("SELECT COUNT(*) FROM {table}"))
    }

    /// Check whether a table exists in the main schema
    pub fn table_exists(&self, table: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_schema = 'main' AND table_name = ?",
            [table],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Row counts for the given tables (None when a table is missing)
    pub fn table_row_counts(&self, tables: &[&str]) -> Vec<(String, Option<i64>)> {
        tables
            .iter()
            .map(|table| {
                let count = match self.table_exists(table) {
                    Ok(true) => self.count_rows(table).ok(),
                    _ => None,
                };
                ((*table).to_string(), count)
            })
            .collect()
    }

    /// Refresh optimizer statistics
    pub fn analyze(&self) -> Result<()> {
        self.conn
            .execute_batch("ANALYZE;")
            .map_err(|e| Error::store(format!("ANALYZE failed: {e}")))
    }

    /// Flush the write-ahead log into the database file
    pub fn checkpoint(&self) -> Result<()> {
        self.conn
            .execute_batch("CHECKPOINT;")
            .map_err(|e| Error::store(format!("CHECKPOINT failed: {e}")))
    }

    /// Close the connection, surfacing any error DuckDB reports
    pub fn close(self) -> Result<()> {
        self.conn
            .close()
            .map_err(|(_, e)| Error::store(format!("Failed to close store: {e}")))
    }
}

/// Quote a string as a SQL literal
pub fn sql_string_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Convert a DuckDB timestamp value to a naive datetime
pub fn timestamp_to_naive(value: Value) -> Option<NaiveDateTime> {
    match value {
        Value::Timestamp(unit, v) => {
            let micros = match unit {
                TimeUnit::Second => v.checked_mul(1_000_000)?,
                TimeUnit::Millisecond => v.checked_mul(1_000)?,
                TimeUnit::Microsecond => v,
                TimeUnit::Nanosecond => v / 1_000,
            };
            chrono::DateTime::from_timestamp_micros(micros).map(|dt| dt.naive_utc())
        }
        Value::Text(s) => NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S").ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_roundtrip() {
        let store = Store::in_memory().unwrap();
        store
            .execute_batch("CREATE TABLE t (id INTEGER); INSERT INTO t VALUES (1), (2), (3);")
            .unwrap();

        assert_eq!(store.count_rows("t").unwrap(), 3);
        assert!(store.table_exists("t").unwrap());
        assert!(!store.table_exists("missing").unwrap());
        assert!(store.path().is_none());
        assert!(!store.is_read_only());
    }

    #[test]
    fn test_execute_returns_affected_rows() {
        let store = Store::in_memory().unwrap();
        store.execute_batch("CREATE TABLE t (id INTEGER);").unwrap();
        let inserted = store
            .execute("INSERT INTO t SELECT * FROM range(5)")
            .unwrap();
        assert_eq!(inserted, 5);
    }

    #[test]
    fn test_table_row_counts_reports_missing() {
        let store = Store::in_memory().unwrap();
        store.execute_batch("CREATE TABLE present (id INTEGER);").unwrap();

        let counts = store.table_row_counts(&["present", "absent"]);
        assert_eq!(counts[0], ("present".to_string(), Some(0)));
        assert_eq!(counts[1], ("absent".to_string(), None));
    }

    #[test]
    fn test_configure_applies_settings() {
        let store = Store::in_memory().unwrap();
        let settings = StoreSettings {
            memory_limit: "1GB".to_string(),
            threads: 2,
            ..StoreSettings::default()
        };
        store.configure(&settings).unwrap();
        let threads = store
            .query_i64("SELECT current_setting('threads')::BIGINT")
            .unwrap();
        assert_eq!(threads, 2);
    }

    #[test]
    fn test_read_only_rejects_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = Store::open_read_only(dir.path().join("nope.duckdb"));
        assert!(matches!(result, Err(Error::Store { .. })));
    }

    #[test]
    fn test_read_only_cannot_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.duckdb");
        {
            let store = Store::open(&path).unwrap();
            store.execute_batch("CREATE TABLE t (id INTEGER);").unwrap();
            store.close().unwrap();
        }

        let reader = Store::open_read_only(&path).unwrap();
        assert!(reader.is_read_only());
        assert_eq!(reader.count_rows("t").unwrap(), 0);
        assert!(reader.execute_batch("INSERT INTO t VALUES (1);").is_err());
    }

    #[test]
    fn test_sql_string_literal_escapes_quotes() {
        assert_eq!(sql_string_literal("Manhattan"), "'Manhattan'");
        assert_eq!(sql_string_literal("O'Hare"), "'O''Hare'");
    }

    #[test]
    fn test_timestamp_to_naive() {
        let ts = timestamp_to_naive(Value::Timestamp(TimeUnit::Microsecond, 1_735_689_600_000_000))
            .unwrap();
        assert_eq!(ts.to_string(), "2025-01-01 00:00:00");
        assert!(timestamp_to_naive(Value::Null).is_none());
    }
}
