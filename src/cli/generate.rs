//! `worktable generate`: write the report workbook for a period.

use crate::config::{GlobalConfig, Layout, ReportPeriod};
use crate::core::ReportError;
use crate::report::{self, ReportConfig, ReportOutcome};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use tracing::debug;

/// Harvest the time entries of a period and render them into a workbook.
///
/// Connection settings, paths and table knobs default to the global configuration;
/// every flag given here overrides the file.
#[derive(Args, Debug, Default)]
pub struct GenerateCommand {
    /// Redmine server URL, e.g. `https://redmine.example.com`
    #[arg(long, env = "WORKTABLE_URL")]
    url: Option<String>,

    /// API access key (disables project scoping)
    #[arg(long, env = "WORKTABLE_KEY", hide_env_values = true)]
    key: Option<String>,

    /// Login name for basic auth and the scoping session
    #[arg(short, long)]
    username: Option<String>,

    /// Password for `--username`
    #[arg(short, long, env = "WORKTABLE_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Month to report, 1-12
    #[arg(short, long, required_unless_present = "from", conflicts_with = "from")]
    month: Option<u32>,

    /// Year of `--month`; 0 or omitted means the current year
    #[arg(short, long, requires = "month")]
    year: Option<i32>,

    /// First day of an explicit range, YYYY-MM-DD
    #[arg(long, requires = "to")]
    from: Option<String>,

    /// Last day of an explicit range, YYYY-MM-DD
    #[arg(long, requires = "from")]
    to: Option<String>,

    /// Limit the report to this project (identifier or id) and its sub-projects
    #[arg(long)]
    project: Option<String>,

    /// Template document
    #[arg(short, long)]
    template: Option<PathBuf>,

    /// Directory receiving the workbook
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Row grouping
    #[arg(long, value_enum)]
    layout: Option<Layout>,

    /// Merge runs of equal values in `merge` columns
    #[arg(long, alias = "enable-merge-cells")]
    merge: bool,

    /// Time entries requested per page
    #[arg(long)]
    page_size: Option<usize>,

    /// First sheet row of the table body
    #[arg(long)]
    start_row: Option<u32>,

    /// Sheet column of the first template column
    #[arg(long)]
    start_column: Option<u32>,
}

impl GenerateCommand {
    /// Run the command.
    ///
    /// # Errors
    ///
    /// Fails on an invalid period or a missing server URL before any request is sent,
    /// and otherwise with the failure of the report run.
    pub async fn execute(self, config_path: Option<PathBuf>, quiet: bool) -> Result<()> {
        let period = self.period()?;
        let mut global = GlobalConfig::load_with_optional(config_path).await?;
        self.apply_overrides(&mut global);

        if global.url.as_deref().is_none_or(str::is_empty) {
            return Err(ReportError::ConfigError {
                message: "No server URL; pass --url or set `url` in the config file".to_string(),
            }
            .into());
        }

        let mut config = ReportConfig::from_global(&global, period)?;
        config.scope = self.project;
        debug!("Report settings: {config:?}");

        let outcome = report::generate(&global, config).await?;
        if !quiet {
            print_outcome(&outcome);
        }
        Ok(())
    }

    /// Reporting period from `--month`/`--year` or `--from`/`--to`.
    fn period(&self) -> Result<ReportPeriod, ReportError> {
        match (&self.from, &self.to, self.month) {
            (Some(from), Some(to), _) => ReportPeriod::parse(from, to),
            (_, _, Some(month)) => ReportPeriod::month(self.year.unwrap_or(0), month),
            _ => Err(ReportError::InvalidPeriod {
                reason: "Pass --month or both --from and --to".to_string(),
            }),
        }
    }

    fn apply_overrides(&self, global: &mut GlobalConfig) {
        let strings = [
            (&self.url, &mut global.url),
            (&self.key, &mut global.key),
            (&self.username, &mut global.username),
            (&self.password, &mut global.password),
        ];
        for (flag, field) in strings {
            if flag.is_some() {
                field.clone_from(flag);
            }
        }

        if let Some(template) = &self.template {
            global.template.clone_from(template);
        }
        if let Some(output_dir) = &self.output_dir {
            global.output_dir.clone_from(output_dir);
        }
        if let Some(layout) = self.layout {
            global.layout = layout;
        }
        if let Some(page_size) = self.page_size {
            global.page_size = page_size;
        }
        if let Some(start_row) = self.start_row {
            global.start_row = start_row;
        }
        if let Some(start_column) = self.start_column {
            global.start_column = start_column;
        }
        global.merge_cells |= self.merge;
    }
}

fn print_outcome(outcome: &ReportOutcome) {
    println!("{} {}", "✓".green(), outcome.path.display().to_string().bold());
    println!(
        "  {} time entries, {} rows over {} projects, {} merged ranges",
        outcome.harvest.ingested, outcome.render.rows, outcome.projects, outcome.render.merges
    );
    if outcome.harvest.skipped > 0 {
        let note = format!(
            "{} entries without project, user or issue were not counted",
            outcome.harvest.skipped
        );
        println!("  {}", note.yellow());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    fn command() -> GenerateCommand {
        GenerateCommand::default()
    }

    #[test]
    fn test_period_from_month() {
        let cmd = GenerateCommand {
            month: Some(2),
            year: Some(2024),
            ..command()
        };
        let period = cmd.period().unwrap();
        assert_eq!(period.to_string(), "2024-02-01--2024-02-29");
    }

    #[test]
    fn test_period_from_range() {
        let cmd = GenerateCommand {
            from: Some("2024-03-01".to_string()),
            to: Some("2024-03-15".to_string()),
            ..command()
        };
        assert_eq!(cmd.period().unwrap().to_string(), "2024-03-01--2024-03-15");
    }

    #[test]
    fn test_period_rejects_bad_month() {
        let cmd = GenerateCommand {
            month: Some(13),
            ..command()
        };
        assert!(matches!(cmd.period(), Err(ReportError::InvalidPeriod { .. })));
    }

    #[test]
    fn test_flags_override_config() {
        let mut global = GlobalConfig {
            url: Some("https://file.example.com".to_string()),
            key: Some("from-file".to_string()),
            ..GlobalConfig::default()
        };
        let cmd = GenerateCommand {
            url: Some("https://flag.example.com".to_string()),
            layout: Some(Layout::ByTask),
            merge: true,
            start_row: Some(3),
            ..command()
        };

        cmd.apply_overrides(&mut global);
        assert_eq!(global.url.as_deref(), Some("https://flag.example.com"));
        assert_eq!(global.key.as_deref(), Some("from-file"));
        assert_eq!(global.layout, Layout::ByTask);
        assert!(global.merge_cells);
        assert_eq!(global.start_row, 3);
        assert_eq!(global.start_column, 1);
    }

    #[test]
    fn test_parse_generate_flags() {
        use crate::cli::{Cli, Commands};
        use clap::Parser;

        let cli = Cli::try_parse_from([
            "worktable",
            "generate",
            "--month",
            "3",
            "--layout",
            "by-task",
            "--enable-merge-cells",
            "--project",
            "platform",
        ])
        .unwrap();
        let Commands::Generate(cmd) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(cmd.layout, Some(Layout::ByTask));
        assert!(cmd.merge);
        assert_eq!(cmd.project.as_deref(), Some("platform"));
        assert_eq!(cmd.period().unwrap().from_date().month(), 3);
    }

    #[tokio::test]
    async fn test_missing_url_fails_before_network() {
        let temp = tempfile::TempDir::new().unwrap();
        let cmd = GenerateCommand {
            month: Some(3),
            ..command()
        };
        let err = cmd.execute(Some(temp.path().join("absent.toml")), true).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ReportError>(),
            Some(ReportError::ConfigError { .. })
        ));
    }
}
