//! Pipeline types
//!
//! Stage identifiers, per-stage timings and the final run report.

use crate::aggregate::AggregateReport;
use crate::dimension::DimensionReport;
use crate::fact::LoadReport;
use crate::index::IndexReport;
use crate::schema::SchemaReport;
use crate::summary::SummaryStatistics;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// A step of the pipeline, in run order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Schema,
    Dimensions,
    Facts,
    Indexes,
    Aggregates,
    Summary,
    Analyze,
    Statistics,
}

impl Stage {
    /// Every stage, in run order
    pub const ALL: [Stage; 8] = [
        Stage::Schema,
        Stage::Dimensions,
        Stage::Facts,
        Stage::Indexes,
        Stage::Aggregates,
        Stage::Summary,
        Stage::Analyze,
        Stage::Statistics,
    ];

    /// Lowercase stage name
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Schema => "schema",
            Stage::Dimensions => "dimensions",
            Stage::Facts => "facts",
            Stage::Indexes => "indexes",
            Stage::Aggregates => "aggregates",
            Stage::Summary => "summary",
            Stage::Analyze => "analyze",
            Stage::Statistics => "statistics",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wall-clock time spent in one stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageTiming {
    pub stage: Stage,
    pub elapsed: Duration,
}

/// Everything a successful run produced
#[derive(Debug)]
pub struct PipelineReport {
    /// Final store location
    pub store_path: PathBuf,
    pub timings: Vec<StageTiming>,
    pub schema: SchemaReport,
    pub dimensions: DimensionReport,
    pub load: LoadReport,
    pub indexes: IndexReport,
    pub aggregates: AggregateReport,
    pub summary: SummaryStatistics,
    /// Whether ANALYZE succeeded
    pub analyzed: bool,
    /// Row count per known table (None when the table is missing)
    pub table_counts: Vec<(String, Option<i64>)>,
    pub elapsed: Duration,
}

impl PipelineReport {
    /// True when the summary agrees with the fact table row count
    pub fn passed(&self) -> bool {
        let facts = self
            .table_counts
            .iter()
            .find(|(table, _)| table == crate::schema::FACT_TRIP)
            .and_then(|(_, count)| *count);
        facts.map_or(true, |count| count == self.summary.total_trips)
    }
}

impl fmt::Display for PipelineReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(70);
        writeln!(f, "{rule}")?;
        writeln!(f, " TAXI ANALYTICS PIPELINE REPORT")?;
        writeln!(f, "{rule}")?;

        writeln!(f, "Stages:")?;
        for timing in &self.timings {
            writeln!(
                f,
                "  {:<12} {:>10.1}s",
                timing.stage.as_str(),
                timing.elapsed.as_secs_f64()
            )?;
        }

        writeln!(f, "Load:")?;
        writeln!(
            f,
            "  batches:   {} loaded, {} failed",
            self.load.loaded_batches(),
            self.load.failed_batches().count()
        )?;
        for (batch, error) in self.load.failed_batches() {
            writeln!(f, "    {batch}: {error}")?;
        }
        writeln!(f, "  accepted:  {}", self.load.accepted)?;
        writeln!(
            f,
            "  filtered:  {} ({:.1}%)",
            self.load.rejected,
            self.load.filter_rate()
        )?;
        writeln!(f, "  rows/sec:  {:.0}", self.load.rows_per_sec())?;
        writeln!(
            f,
            "  indexes:   {} built, {} failed",
            self.indexes.built(),
            self.indexes.failed()
        )?;

        writeln!(f, "Tables:")?;
        for (table, count) in &self.table_counts {
            match count {
                Some(rows) => writeln!(f, "  {table:<24} {rows:>12} rows")?,
                None => writeln!(f, "  {table:<24} {:>12}", "not found")?,
            }
        }

        writeln!(f, "Summary:")?;
        writeln!(f, "  total trips:   {}", self.summary.total_trips)?;
        writeln!(f, "  total revenue: ${:.2}", self.summary.total_revenue)?;
        writeln!(f, "  avg fare:      ${:.2}", self.summary.avg_fare)?;
        writeln!(f, "  avg distance:  {:.2} mi", self.summary.avg_distance)?;
        writeln!(f, "  avg duration:  {:.1} min", self.summary.avg_duration / 60.0)?;
        if let (Some(first), Some(last)) =
            (self.summary.first_trip_date, self.summary.last_trip_date)
        {
            writeln!(f, "  date range:    {first} to {last}")?;
        }
        if !self.analyzed {
            writeln!(f, "  note: ANALYZE unavailable, optimizer statistics not refreshed")?;
        }

        writeln!(f, "{rule}")?;
        writeln!(
            f,
            " {} in {:.1} minutes ({:.0} seconds)",
            if self.passed() { "PASS" } else { "FAIL" },
            self.elapsed.as_secs_f64() / 60.0,
            self.elapsed.as_secs_f64()
        )?;
        writeln!(f, " Store: {}", self.store_path.display())?;
        write!(f, "{rule}")
    }
}
