// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # Taxi Analytics
//!
//! Batch ETL of taxi trip Parquet files into a DuckDB star schema, with
//! precomputed aggregate tables and a read-only JSON query API.
//!
//! ## Features
//!
//! - **Star schema**: location, vendor, payment type and rate code dimensions around one trip fact
//! - **Filtered bulk load**: each Parquet batch is one atomic insert with contiguous trip ids
//! - **Per-batch isolation**: a broken batch is reported and skipped, the run continues
//! - **Aggregates**: zone, hourly, origin-destination, vendor and payment rollups
//! - **Staging swap**: optionally build into a side file and rename on success
//! - **Query server**: axum endpoints over a read-only connection
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use taxi_analytics::{config::PipelineConfig, pipeline::run_pipeline, Result};
//!
//! fn main() -> Result<()> {
//!     let config = PipelineConfig::load("config/pipeline.yaml")?;
//!     let report = run_pipeline(&config)?;
//!     println!("{report}");
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                          Pipeline                                │
//! │  schema → dimensions → facts → indexes → aggregates → summary    │
//! │  → analyze → validate                                            │
//! └──────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────┬───────────┬───────┴───────┬────────────┬──────────────┐
//! │  Config  │   Store   │     Fact      │ Aggregate  │    Query     │
//! ├──────────┼───────────┼───────────────┼────────────┼──────────────┤
//! │ YAML     │ DuckDB    │ Parquet batch │ mv_* CTAS  │ Read-only    │
//! │ Defaults │ Staging   │ Filter        │ Summary    │ axum API     │
//! └──────────┴───────────┴───────────────┴────────────┴──────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Pipeline configuration
pub mod config;

/// DuckDB store handle
pub mod store;

/// Star schema DDL
pub mod schema;

/// Dimension loading
pub mod dimension;

/// Filtered fact loading from Parquet batches
pub mod fact;

/// Secondary indexes on the fact table
pub mod index;

/// Precomputed aggregate tables
pub mod aggregate;

/// Single-row summary statistics
pub mod summary;

/// Stage orchestration
pub mod pipeline;

/// Read-only analytical queries
pub mod query;

/// Command-line interface
pub mod cli;

#[cfg(test)]
mod test_support;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::PipelineConfig;
pub use error::{Error, Result};
pub use pipeline::{run_pipeline, PipelineReport, Stage};
pub use store::Store;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
