//! Template-driven table rendering.
//!
//! For every row path of the graph, each column is either copied literally (plain
//! text body) or rendered with Tera. Rendered values of `merge` columns go through a
//! per-column [`RunCompactor`] when merging is enabled; everything else is written
//! straight to the document.
//!
//! The row cursor starts at `start_row` and advances one row per path; the column
//! cursor restarts at `start_column` for every row.

use super::columns::ColumnSpec;
use super::compaction::{Flush, RunCompactor};
use super::context::{ContextBuilder, ReportInfo};
use crate::constants::{BODY_ROW, DEFAULT_START_COLUMN, DEFAULT_START_ROW};
use crate::core::ReportError;
use crate::document::DocumentAdapter;
use crate::graph::{ResourceGraph, RowPath};
use crate::remote::RecordFetcher;
use crate::utils::progress::ProgressBar;
use anyhow::Result;
use std::collections::{BTreeMap, HashMap};
use tera::{Tera, Value};
use tracing::{debug, warn};

/// Placement and merging settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// First sheet row written
    pub start_row: u32,
    /// Sheet column of the first template column
    pub start_column: u32,
    /// Whether `merge` columns are compacted into merged cells
    pub enable_merge: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            start_row: DEFAULT_START_ROW,
            start_column: DEFAULT_START_COLUMN,
            enable_merge: false,
        }
    }
}

/// Counters reported after rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderSummary {
    /// Table rows written
    pub rows: usize,
    /// Merged ranges created
    pub merges: usize,
}

/// Renders the cross-product rows of a graph into a document.
pub struct TableRenderer {
    columns: Vec<ColumnSpec>,
    tera: Tera,
    contexts: ContextBuilder,
    options: RenderOptions,
}

impl TableRenderer {
    /// Compile the column templates.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::TemplateRenderError`] for a column whose template does not
    /// compile.
    pub fn new(columns: Vec<ColumnSpec>, report: ReportInfo, options: RenderOptions) -> Result<Self> {
        let mut tera = Tera::default();
        tera.register_filter("merge", merge_filter);

        for (index, column) in columns.iter().enumerate() {
            if !column.is_renderable() {
                continue;
            }
            for root in column.opaque_roots() {
                warn!(
                    "Column {} uses `{root}` without `{root}.<attribute>`; such attributes render empty",
                    column.position()
                );
            }
            tera.add_raw_template(&template_name(index), column.body_spec()).map_err(|e| {
                ReportError::TemplateRenderError {
                    column: column.position(),
                    reason: tera_error_chain(&e),
                }
            })?;
        }

        let contexts = ContextBuilder::new(&columns, report);
        Ok(Self {
            columns,
            tera,
            contexts,
            options,
        })
    }

    /// Column definitions in table order.
    #[must_use]
    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    /// Render `rows` into `document`.
    ///
    /// # Errors
    ///
    /// - [`ReportError::NoRowsRendered`] when `rows` is empty
    /// - [`ReportError::RenderAborted`] (wrapping the cause) when a row fails; the
    ///   remaining rows are skipped and every open merge run is flushed first
    pub async fn render<D, F>(
        &self,
        document: &mut D,
        graph: &mut ResourceGraph,
        rows: &[RowPath],
        fetcher: &F,
    ) -> Result<RenderSummary>
    where
        D: DocumentAdapter,
        F: RecordFetcher,
    {
        if rows.is_empty() {
            return Err(ReportError::NoRowsRendered.into());
        }

        self.clear_stale_bodies(document);

        let mut compactors: BTreeMap<usize, RunCompactor> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, column)| self.options.enable_merge && column.is_mergeable())
            .map(|(index, _)| (index, RunCompactor::default()))
            .collect();
        let mut summary = RenderSummary::default();

        let progress = ProgressBar::new(rows.len() as u64);
        progress.set_prefix("Rendering");

        for (offset, row) in rows.iter().enumerate() {
            let sheet_row = self.options.start_row + offset as u32;
            let rendered =
                self.render_row(document, graph, row, sheet_row, fetcher, &mut compactors, &mut summary)
                    .await;

            if let Err(error) = rendered {
                if let Err(flush_error) = self.flush_all(document, &mut compactors, &mut summary) {
                    warn!("Failed to flush merge runs after render failure: {flush_error:#}");
                }
                progress.finish_and_clear();
                let reason = format!("{error:#}");
                return Err(error.context(ReportError::RenderAborted {
                    row: sheet_row,
                    reason,
                }));
            }
            summary.rows += 1;
            progress.inc(1);
        }

        self.flush_all(document, &mut compactors, &mut summary)?;
        progress.finish_with_message(format!("{} rows", summary.rows));
        debug!("Rendered {} rows with {} merged ranges", summary.rows, summary.merges);
        Ok(summary)
    }

    #[allow(clippy::too_many_arguments)]
    async fn render_row<D, F>(
        &self,
        document: &mut D,
        graph: &mut ResourceGraph,
        row: &RowPath,
        sheet_row: u32,
        fetcher: &F,
        compactors: &mut BTreeMap<usize, RunCompactor>,
        summary: &mut RenderSummary,
    ) -> Result<()>
    where
        D: DocumentAdapter,
        F: RecordFetcher,
    {
        let context = self.contexts.build(graph, row, fetcher).await?;

        for (index, column) in self.columns.iter().enumerate() {
            let sheet_column = self.column_at(index);

            if !column.is_renderable() {
                document.set_text(column.body_spec(), sheet_row, sheet_column);
                continue;
            }

            let value = self.tera.render(&template_name(index), &context).map_err(|e| {
                ReportError::TemplateRenderError {
                    column: column.position(),
                    reason: tera_error_chain(&e),
                }
            })?;

            match compactors.get_mut(&index) {
                Some(compactor) => {
                    if let Some(flush) = compactor.push(sheet_row, value) {
                        count_merge(&flush, summary);
                        flush.apply(document, sheet_column)?;
                    }
                }
                None => document.set_text(&value, sheet_row, sheet_column),
            }
        }
        Ok(())
    }

    fn flush_all<D: DocumentAdapter>(
        &self,
        document: &mut D,
        compactors: &mut BTreeMap<usize, RunCompactor>,
        summary: &mut RenderSummary,
    ) -> Result<()> {
        for (index, compactor) in compactors.iter_mut() {
            if let Some(flush) = compactor.finish() {
                count_merge(&flush, summary);
                flush.apply(document, self.column_at(*index))?;
            }
        }
        Ok(())
    }

    /// Blank the template body cells that the rendered table does not overwrite.
    ///
    /// Columns are placed contiguously from `start_column`, so with gaps in the
    /// header row some body cells would otherwise survive as raw template text.
    fn clear_stale_bodies<D: DocumentAdapter>(&self, document: &mut D) {
        let first = self.options.start_column;
        let last = self.column_at(self.columns.len().saturating_sub(1));
        for column in &self.columns {
            let position = column.position();
            let covered = self.options.start_row == BODY_ROW && (first..=last).contains(&position);
            if !covered && document.get_text(BODY_ROW, position).is_some() {
                debug!("Clearing template body of column {position}");
                document.set_text("", BODY_ROW, position);
            }
        }
    }

    fn column_at(&self, index: usize) -> u32 {
        self.options.start_column + index as u32
    }
}

fn count_merge(flush: &Flush, summary: &mut RenderSummary) {
    if matches!(flush, Flush::Merged { .. }) {
        summary.merges += 1;
    }
}

fn template_name(index: usize) -> String {
    format!("column_{index}")
}

/// Identity filter: `merge` in a template only marks the column for merging.
fn merge_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    Ok(value.clone())
}

/// Tera error message with its causes, which carry the useful detail.
fn tera_error_chain(error: &tera::Error) -> String {
    let mut message = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
