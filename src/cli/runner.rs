//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands};
use crate::cli::server::{serve, ServerConfig};
use crate::config::PipelineConfig;
use crate::error::{Error, Result, ResultExt};
use crate::pipeline::run_pipeline;
use crate::schema::ALL_TABLES;
use crate::store::Store;
use crate::summary::read_summary;
use std::path::Path;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let config = self.config()?;
        match &self.cli.command {
            Commands::Run { .. } => self.run_pipeline(config).await,
            Commands::Serve { .. } => serve(ServerConfig::from_pipeline(&config)).await,
            Commands::Stats { .. } => self.stats(&config.store.path),
        }
    }

    /// Load the configuration file (or defaults) and apply command-line overrides
    pub fn config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.cli.config {
            Some(path) => PipelineConfig::load(path)?,
            None => PipelineConfig::default(),
        };

        match &self.cli.command {
            Commands::Run {
                db,
                data_dir,
                zone_lookup,
                rebuild,
                staging,
            } => {
                if let Some(db) = db {
                    config.store.path.clone_from(db);
                }
                if let Some(dir) = data_dir {
                    config.input.batch_dir.clone_from(dir);
                }
                if let Some(zones) = zone_lookup {
                    config.input.zone_lookup.clone_from(zones);
                }
                config.store.rebuild |= *rebuild;
                config.store.staging |= *staging;
            }
            Commands::Serve { port, db } => {
                if let Some(port) = port {
                    config.server.port = *port;
                }
                if let Some(db) = db {
                    config.store.path.clone_from(db);
                }
            }
            Commands::Stats { db } => {
                if let Some(db) = db {
                    config.store.path.clone_from(db);
                }
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Run the pipeline on a blocking thread and print the report
    async fn run_pipeline(&self, config: PipelineConfig) -> Result<()> {
        tracing::info!(
            store = %config.store.path.display(),
            batches = %config.input.batch_dir.display(),
            zones = %config.input.zone_lookup.display(),
            rebuild = config.store.rebuild,
            staging = config.store.staging,
            "Starting pipeline"
        );

        let result = tokio::task::spawn_blocking(move || run_pipeline(&config))
            .await
            .map_err(|e| Error::Other(format!("Pipeline task failed: {e}")))?;

        match result {
            Ok(report) => {
                println!("{report}");
                if report.passed() {
                    Ok(())
                } else {
                    Err(Error::Other(
                        "summary row count does not match the fact table".to_string(),
                    ))
                }
            }
            Err(e) => {
                let rule = "=".repeat(70);
                println!("{rule}\n FAIL\n Error: {e}\n{rule}");
                Err(e)
            }
        }
    }

    /// Print row counts and the summary of an existing store
    fn stats(&self, path: &Path) -> Result<()> {
        let store = Store::open_read_only(path)?;

        println!("Store: {}", path.display());
        for (table, count) in store.table_row_counts(&ALL_TABLES) {
            match count {
                Some(rows) => println!("  {table:<24} {rows:>12} rows"),
                None => println!("  {table:<24} {:>12}", "not found"),
            }
        }

        match read_summary(&store) {
            Ok(summary) => println!(
                "{}",
                serde_json::to_string_pretty(&summary).context("Failed to render summary")?
            ),
            Err(e) => tracing::warn!(error = %e, "No summary available"),
        }
        Ok(())
    }
}
