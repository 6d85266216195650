//! Command-line interface for worktable.
//!
//! # Available Commands
//!
//! - `generate` - Harvest the time entries of a period and write the report workbook
//! - `columns` - Show the columns a template defines, without contacting the server
//!
//! # Global Options
//!
//! All commands support these global options:
//! - `--verbose` - Enable debug output
//! - `--quiet` - Suppress all output except errors
//! - `--no-progress` - Disable progress bars and spinners
//! - `--config` - Path to a custom config file (default `~/.worktable/config.toml`)
//!
//! # Example
//!
//! ```bash
//! # March of the current year, merged project cells
//! worktable generate --url https://redmine.example.com --key $KEY --month 3 --merge
//!
//! # Explicit range, limited to one project tree, one row per task
//! worktable generate -u alice -p secret --from 2024-03-01 --to 2024-03-15 \
//!     --project platform --layout by-task
//!
//! # Inspect a template
//! worktable columns --template reports/template.toml
//! ```

mod columns;
mod generate;


use crate::constants::NO_PROGRESS_ENV;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Runtime configuration for CLI execution.
///
/// Holds what the global flags decide, so tests and programmatic callers can run
/// commands without touching the process environment.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Default log filter when `WORKTABLE_LOG` is unset (`debug`, `warn` or `error`).
    pub log_level: Option<String>,

    /// Whether progress bars are hidden. Applied as `WORKTABLE_NO_PROGRESS=1`.
    pub no_progress: bool,

    /// Custom path to the global configuration file.
    pub config_path: Option<PathBuf>,
}

impl CliConfig {
    /// Create a new CLI configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply this configuration to the process environment.
    ///
    /// Only the progress switch lives in the environment; it is read wherever a
    /// progress bar is created. Call once, before any other thread starts.
    pub fn apply_to_env(&self) {
        if self.no_progress {
            // SAFETY: called from the main task before any worker thread reads the
            // environment
            unsafe {
                std::env::set_var(NO_PROGRESS_ENV, "1");
            }
        }
    }
}

/// Generate work-time spreadsheets from Redmine time entries.
#[derive(Parser, Debug)]
#[command(
    name = "worktable",
    about = "Generate merged-cell work-time spreadsheets from Redmine time entries",
    version,
    long_about = "worktable pages through the time entries of a period, groups them by project \
                  and user (or project and task), and renders one table row per group through \
                  a column template into an .xlsx workbook."
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output (debug logging).
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to a custom global configuration file.
    ///
    /// Defaults to `~/.worktable/config.toml`. A missing file means default settings.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Disable progress bars and spinners.
    #[arg(long, global = true)]
    no_progress: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate the report workbook for a period.
    ///
    /// See [`generate::GenerateCommand`] for options.
    Generate(generate::GenerateCommand),

    /// List the columns defined by a template.
    Columns(columns::ColumnsCommand),
}

impl Cli {
    /// Execute the CLI with the configuration its flags describe.
    ///
    /// # Errors
    ///
    /// Returns the failure of the selected command.
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(config).await
    }

    /// Build a [`CliConfig`] from the parsed flags.
    ///
    /// `--verbose` maps to `debug`, `--quiet` to `error` (and hides progress bars),
    /// anything else to `warn`.
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "warn"
        };

        CliConfig {
            log_level: Some(log_level.to_string()),
            no_progress: self.no_progress || self.quiet,
            config_path: self.config.clone(),
        }
    }

    /// Execute the CLI with an injected configuration.
    ///
    /// # Errors
    ///
    /// Returns the failure of the selected command.
    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        config.apply_to_env();

        match self.command {
            Commands::Generate(cmd) => cmd.execute(config.config_path, self.quiet).await,
            Commands::Columns(cmd) => cmd.execute(config.config_path).await,
        }
    }
}
