//! CLI module
//!
//! Command-line interface for building and serving the analytical store.
//!
//! # Commands
//!
//! - `run` - Execute the pipeline and print the report
//! - `serve` - Start the read-only query API
//! - `stats` - Print table row counts of an existing store

mod commands;
mod runner;
mod server;

pub use commands::{Cli, Commands};
pub use runner::Runner;
pub use server::{router, serve, ServerConfig};
