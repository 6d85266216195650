//! Report pipeline.
//!
//! A run has two phases that never overlap:
//!
//! 1. **Harvest**: every time entry of the period is paged into a [`ResourceGraph`],
//!    which is then optionally cut down to a project scope.
//! 2. **Render**: the template's columns are evaluated for each row path of the graph
//!    and written into a [`Sheet`] seeded from the template.
//!
//! Everything that can be validated up front (period, template, column templates,
//! scope project) is checked before the first time entry is requested. The output
//! document is written exactly once, after rendering succeeded; a failed run leaves
//! the output directory untouched.

use crate::config::{GlobalConfig, Layout, ReportPeriod, WorkloadConfig};
use crate::constants::OUTPUT_TIMESTAMP_FORMAT;
use crate::core::{ReportError, ResourceKind};
use crate::document::Sheet;
use crate::graph::{KindTable, ResourceGraph};
use crate::harvest::{HarvestOptions, HarvestSummary, Harvester, ProjectScope};
use crate::remote::{
    Credentials, ProjectTreeSource, RecordFetcher, RecordSource, RedmineClient, RemoteRecord,
};
use crate::table::{RenderOptions, RenderSummary, ReportInfo, TableRenderer, parse_columns};
use crate::utils::fs::atomic_write;
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Everything a single run needs, resolved from configuration and flags.
#[derive(Debug, Clone)]
pub struct ReportConfig {
    /// Reporting period
    pub period: ReportPeriod,
    /// Project identifier to limit the report to, with its sub-projects
    pub scope: Option<String>,
    /// Template document
    pub template: PathBuf,
    /// Directory receiving the output document
    pub output_dir: PathBuf,
    /// Tree shape and page size
    pub harvest: HarvestOptions,
    /// Cell placement and merging
    pub render: RenderOptions,
    /// User workload normalization
    pub workload: WorkloadConfig,
    /// Custom-field name tables per kind
    pub custom_fields: BTreeMap<ResourceKind, BTreeMap<String, String>>,
    /// Full name recorded as `report.author`
    pub author: Option<String>,
}

impl ReportConfig {
    /// Run settings from the global configuration.
    ///
    /// # Errors
    ///
    /// Fails when the template or output path cannot be expanded.
    pub fn from_global(config: &GlobalConfig, period: ReportPeriod) -> Result<Self> {
        Ok(Self {
            period,
            scope: None,
            template: config.template_path()?,
            output_dir: config.output_path()?,
            harvest: HarvestOptions {
                page_size: config.page_size,
                layout: config.layout,
            },
            render: RenderOptions {
                start_row: config.start_row,
                start_column: config.start_column,
                enable_merge: config.merge_cells,
            },
            workload: config.workload,
            custom_fields: config.custom_fields.clone(),
            author: None,
        })
    }

    /// Layout of the table.
    #[must_use]
    pub fn layout(&self) -> Layout {
        self.harvest.layout
    }
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOutcome {
    /// Path of the written document
    pub path: PathBuf,
    /// Harvest counters
    pub harvest: HarvestSummary,
    /// Render counters
    pub render: RenderSummary,
    /// Projects in the final table
    pub projects: usize,
}

/// File name of the output document.
#[must_use]
pub fn output_file_name(period: &ReportPeriod, created: &DateTime<Local>) -> String {
    format!("{period} created on {}.xlsx", created.format(OUTPUT_TIMESTAMP_FORMAT))
}

/// Run the pipeline against any remote source.
///
/// # Errors
///
/// Every failure is terminal and leaves no output document:
/// - template, column template and scope errors, before harvesting
/// - page fetch failures while harvesting
/// - [`ReportError::NoRowsRendered`] and [`ReportError::RenderAborted`] while rendering
/// - write failures while persisting
pub async fn run_report<S>(source: &S, config: &ReportConfig) -> Result<ReportOutcome>
where
    S: RecordSource + RecordFetcher + ProjectTreeSource,
{
    let created = Local::now();

    let mut sheet = Sheet::load_template(&config.template).await?;
    let columns = parse_columns(&sheet);
    if columns.is_empty() {
        return Err(ReportError::TemplateParseError {
            file: config.template.display().to_string(),
            reason: "row 1 has no column labels".to_string(),
        }
        .into());
    }
    debug!("Template defines {} columns", columns.len());

    let report = ReportInfo {
        from_date: config.period.from_date().to_string(),
        to_date: config.period.to_date().to_string(),
        generated_at: created.format("%Y-%m-%d %H:%M:%S").to_string(),
        author: config.author.clone(),
    };
    let renderer = TableRenderer::new(columns, report, config.render)?;

    let scope = match config.scope.as_deref() {
        Some(identifier) => Some(ProjectScope::resolve(source, identifier).await?),
        None => None,
    };

    let mut graph = ResourceGraph::new(KindTable::new(&config.custom_fields), config.workload);
    let harvest = Harvester::new(source, &config.period, config.harvest).run(&mut graph).await?;

    if let Some(scope) = &scope {
        scope.apply(&mut graph);
    }

    let rows = graph.rows(config.layout());
    info!("Rendering {} rows ({} layout)", rows.len(), config.layout());
    let render = renderer.render(&mut sheet, &mut graph, &rows, source).await?;

    let path = config.output_dir.join(output_file_name(&config.period, &created));
    persist(&sheet, &path)?;
    info!("Wrote {}", path.display());

    Ok(ReportOutcome {
        path,
        harvest,
        render,
        projects: graph.projects().count(),
    })
}

/// Run the pipeline against the configured Redmine server.
///
/// Opens a login session when a project scope is requested; without one the scope
/// cannot be walked and the report covers every project.
///
/// # Errors
///
/// See [`run_report`]; also fails when no server URL is configured.
pub async fn generate(global: &GlobalConfig, mut config: ReportConfig) -> Result<ReportOutcome> {
    let url = global.url.as_deref().unwrap_or_default();
    let mut client = RedmineClient::new(url, Credentials::from_config(global))?;

    if config.scope.is_some() && !client.open_session().await {
        warn!("Project scope ignored; reporting every project");
        config.scope = None;
    }

    if config.author.is_none() {
        config.author = match client.current_user().await {
            Ok(user) => user.as_ref().and_then(author_name),
            Err(e) => {
                warn!("Could not look up the current user: {e:#}");
                None
            }
        };
    }

    run_report(&client, &config).await
}

/// `lastname` + `firstname`, falling back to `login`.
fn author_name(user: &RemoteRecord) -> Option<String> {
    let text = |field: &str| user.field(field).and_then(|v| v.as_str()).unwrap_or_default();
    let fullname = format!("{}{}", text("lastname"), text("firstname"));
    if fullname.is_empty() {
        user.field("login").and_then(|v| v.as_str()).map(str::to_string)
    } else {
        Some(fullname)
    }
}

fn persist(sheet: &Sheet, path: &Path) -> Result<()> {
    let bytes = sheet.to_xlsx()?;
    atomic_write(path, &bytes)
        .with_context(|| format!("Failed to save report to {}", path.display()))
}
