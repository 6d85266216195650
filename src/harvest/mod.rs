//! Harvesting time entries into the resource graph.
//!
//! The harvester drives pagination against a [`RecordSource`] and feeds every record
//! into the [`ResourceGraph`] through `get_or_create`, so the tree for the chosen
//! [`Layout`] grows one record at a time:
//!
//! ```text
//! by-user:  project ─ user ─ task ─ work entry
//! by-task:  project ─ [parent task ─] task ─ work entry
//! ```
//!
//! Pagination starts with a one-record probe to learn the total, then works through an
//! explicit offset worklist: each page pushes the next offset while fewer records than
//! the total have been ingested. Records are visited exactly once, and the order in
//! which they arrive decides row order in the final table.

pub mod scope;

pub use scope::{ProjectScope, descendant_projects};

use crate::config::{Layout, ReportPeriod};
use crate::constants::DEFAULT_PAGE_SIZE;
use crate::core::ResourceKind;
use crate::graph::{NodeId, ResourceGraph};
use crate::remote::{RecordFetcher, RecordSource, RemoteRecord};
use crate::utils::progress::ProgressBar;
use anyhow::{Context, Result};
use tracing::{debug, info, warn};

/// Harvest settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HarvestOptions {
    /// Records requested per page
    pub page_size: usize,
    /// Tree shape to build
    pub layout: Layout,
}

impl Default for HarvestOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            layout: Layout::default(),
        }
    }
}

/// Counters reported after a harvest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HarvestSummary {
    /// Total announced by the last page
    pub total: usize,
    /// Records received
    pub ingested: usize,
    /// Records that produced a work-entry node
    pub attached: usize,
    /// Records skipped for missing project, user or issue
    pub skipped: usize,
}

/// Drives pagination and graph construction for one run.
pub struct Harvester<'a, S> {
    source: &'a S,
    period: &'a ReportPeriod,
    options: HarvestOptions,
}

impl<'a, S> Harvester<'a, S>
where
    S: RecordSource + RecordFetcher,
{
    /// Harvester reading entries within `period` from `source`.
    pub fn new(source: &'a S, period: &'a ReportPeriod, options: HarvestOptions) -> Self {
        Self {
            source,
            period,
            options,
        }
    }

    /// Fetch every page and ingest its records into `graph`.
    ///
    /// # Errors
    ///
    /// Any page fetch failure is terminal; so are full-record lookup failures in the
    /// by-task layout.
    pub async fn run(&self, graph: &mut ResourceGraph) -> Result<HarvestSummary> {
        let page_size = self.options.page_size.max(1);
        let probe = self
            .source
            .fetch_page(0, 1, self.period)
            .await
            .context("Failed to query time entries")?;

        let mut summary = HarvestSummary {
            total: probe.total_count,
            ..HarvestSummary::default()
        };
        info!("{} time entries between {}", summary.total, self.period);

        let progress = ProgressBar::new(summary.total as u64);
        progress.set_prefix("Downloading");

        let mut worklist = vec![0usize];
        while let Some(offset) = worklist.pop() {
            let page = self
                .source
                .fetch_page(offset, page_size, self.period)
                .await
                .with_context(|| format!("Failed to fetch time entries at offset {offset}"))?;

            if page.total_count != summary.total {
                debug!("Total changed from {} to {}", summary.total, page.total_count);
                summary.total = page.total_count;
                progress.set_length(summary.total as u64);
            }

            if page.records.is_empty() {
                if summary.ingested < summary.total {
                    warn!(
                        "Empty page at offset {offset} after {} of {} records; stopping",
                        summary.ingested, summary.total
                    );
                }
                break;
            }

            for record in &page.records {
                if self.ingest(graph, record).await? {
                    summary.attached += 1;
                } else {
                    summary.skipped += 1;
                }
            }

            summary.ingested += page.records.len();
            progress.inc(page.records.len() as u64);

            if summary.ingested < summary.total {
                worklist.push(summary.ingested);
            }
        }

        progress.finish_with_message(format!("{} time entries", summary.ingested));
        info!(
            "Harvested {} records ({} attached, {} skipped)",
            summary.ingested, summary.attached, summary.skipped
        );
        Ok(summary)
    }

    /// Place one time entry in the graph. Returns whether a work-entry node was
    /// attached.
    async fn ingest(&self, graph: &mut ResourceGraph, record: &RemoteRecord) -> Result<bool> {
        let Some(project) = record.nested("project") else {
            warn!("Time entry {} has no project; skipped", record.id);
            return Ok(false);
        };
        let project = graph.get_or_create(None, &project, ResourceKind::Project);

        let leaf = match self.options.layout {
            Layout::ByUser => {
                let Some(user) = record.nested("user") else {
                    warn!("Time entry {} has no user; skipped", record.id);
                    return Ok(false);
                };
                let user = graph.get_or_create(Some(project), &user, ResourceKind::User);
                let Some(issue) = record.nested("issue") else {
                    warn!("Time entry {} has no issue; not counted", record.id);
                    return Ok(false);
                };
                graph.get_or_create(Some(user), &issue, ResourceKind::Task)
            }
            Layout::ByTask => {
                let Some(issue) = record.nested("issue") else {
                    warn!("Time entry {} has no issue; not counted", record.id);
                    return Ok(false);
                };
                self.task_node(graph, project, &issue).await?
            }
        };

        graph.get_or_create(Some(leaf), record, ResourceKind::WorkEntry);
        Ok(true)
    }

    /// Task node for `issue` under `project`, nested below its parent task when the
    /// full issue names one.
    async fn task_node(
        &self,
        graph: &mut ResourceGraph,
        project: NodeId,
        issue: &RemoteRecord,
    ) -> Result<NodeId> {
        let parent = graph
            .full_record(ResourceKind::Task, issue.id, self.source)
            .await
            .with_context(|| format!("Failed to fetch issue {}", issue.id))?
            .and_then(|full| full.nested("parent"));

        Ok(match parent {
            Some(parent) => {
                let parent = graph.get_or_create(Some(project), &parent, ResourceKind::Task);
                graph.get_or_create(Some(parent), issue, ResourceKind::Task)
            }
            None => graph.get_or_create(Some(project), issue, ResourceKind::Task),
        })
    }
}
