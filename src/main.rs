//! worktable CLI entry point
//!
//! Parses the command line, installs logging, runs the selected command and turns any
//! failure into a friendly message with exit status 1.
//!
//! Logging goes to stderr. `WORKTABLE_LOG` takes an `EnvFilter` directive such as
//! `worktable=debug`; without it `--verbose`/`--quiet` pick the level.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use worktable::cli;
use worktable::constants::LOG_ENV;
use worktable::core::user_friendly_error;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    let config = cli.build_config();

    let default_level = config.log_level.clone().unwrap_or_else(|| "warn".to_string());
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute_with_config(config).await {
        Ok(()) => Ok(()),
        Err(e) => {
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}
