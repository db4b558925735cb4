//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Taxi trip analytics pipeline and query server
#[derive(Parser, Debug)]
#[command(name = "taxi-analytics")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Pipeline configuration file (YAML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the analytical store from raw batches
    Run {
        /// Store file to build (overrides store.path)
        #[arg(long)]
        db: Option<PathBuf>,

        /// Directory containing trip batches (overrides input.batch_dir)
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Zone lookup CSV (overrides input.zone_lookup)
        #[arg(long)]
        zone_lookup: Option<PathBuf>,

        /// Drop and re-create every table first
        #[arg(long)]
        rebuild: bool,

        /// Build into a staging file and swap it in on success
        #[arg(long)]
        staging: bool,
    },

    /// Start the read-only query API
    Serve {
        /// Port to listen on (overrides server.port)
        #[arg(short, long)]
        port: Option<u16>,

        /// Store file to query (overrides store.path)
        #[arg(long)]
        db: Option<PathBuf>,
    },

    /// Print row counts for every table in an existing store
    Stats {
        /// Store file to inspect (overrides store.path)
        #[arg(long)]
        db: Option<PathBuf>,
    },
}
