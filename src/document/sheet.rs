//! In-memory worksheet backed by a TOML template and saved as `.xlsx`.
//!
//! # Template format
//!
//! ```toml
//! name = "Work time"            # sheet name, optional
//! rows = [
//!   ["Project", "Member", "Days"],                                   # labels
//!   ["{{ project.name | merge }}", "{{ user.fullname }}", "{{ user.spent_time }}"],
//! ]
//! ```
//!
//! Row 1 holds the column labels and row 2 the cell templates; any further rows are
//! copied to the sheet verbatim.

use super::{CellRange, DocumentAdapter};
use crate::core::ReportError;
use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, FormatAlign, Workbook, XlsxError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

const DEFAULT_SHEET_NAME: &str = "Sheet1";

/// On-disk template document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateFile {
    /// Worksheet name
    #[serde(default)]
    pub name: Option<String>,
    /// Cell text, row by row
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
}

/// A worksheet: sparse cell text plus merged ranges.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sheet {
    name: String,
    cells: BTreeMap<(u32, u32), String>,
    merges: Vec<CellRange>,
}

impl Sheet {
    /// Empty sheet called `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: BTreeMap::new(),
            merges: Vec::new(),
        }
    }

    /// Sheet seeded with the cells of a template.
    #[must_use]
    pub fn from_template(template: &TemplateFile) -> Self {
        let mut sheet = Self::new(template.name.as_deref().unwrap_or(DEFAULT_SHEET_NAME));
        for (row, cells) in (1u32..).zip(&template.rows) {
            for (column, text) in (1u32..).zip(cells) {
                sheet.set_text(text, row, column);
            }
        }
        sheet
    }

    /// Read and parse a template document.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::TemplateNotFound`] when the file does not exist and
    /// [`ReportError::TemplateParseError`] when it is not a valid template.
    pub async fn load_template(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ReportError::TemplateNotFound {
                path: path.display().to_string(),
            }
            .into());
        }
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read template {}", path.display()))?;
        let template: TemplateFile =
            toml::from_str(&content).map_err(|e| ReportError::TemplateParseError {
                file: path.display().to_string(),
                reason: e.to_string(),
            })?;
        debug!("Loaded template {} with {} rows", path.display(), template.rows.len());
        Ok(Self::from_template(&template))
    }

    /// Worksheet name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Merged ranges in the order they were added.
    #[must_use]
    pub fn merges(&self) -> &[CellRange] {
        &self.merges
    }

    /// Serialize the sheet to `.xlsx` bytes.
    ///
    /// Cells covered by a merge other than its top-left are not written.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::DocumentError`] when the writer rejects the sheet name,
    /// a coordinate or a range.
    pub fn to_xlsx(&self) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        let merged = Format::new().set_align(FormatAlign::VerticalCenter);
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&self.name).map_err(|e| xlsx_error("set sheet name", &e))?;

        for ((row, column), text) in &self.cells {
            if self.merges.iter().any(|m| {
                m.contains(*row, *column) && (m.first_row, m.first_column) != (*row, *column)
            }) {
                continue;
            }
            let (r, c) = zero_based(*row, *column)?;
            worksheet.write_string(r, c, text).map_err(|e| xlsx_error("write cell", &e))?;
        }

        for range in &self.merges {
            let (first_row, first_column) = zero_based(range.first_row, range.first_column)?;
            let (last_row, last_column) = zero_based(range.last_row, range.last_column)?;
            let text = self.get_text(range.first_row, range.first_column).unwrap_or_default();
            worksheet
                .merge_range(first_row, first_column, last_row, last_column, text, &merged)
                .map_err(|e| xlsx_error("merge cells", &e))?;
        }

        let buffer = workbook.save_to_buffer().map_err(|e| xlsx_error("serialize workbook", &e))?;
        Ok(buffer)
    }
}

impl DocumentAdapter for Sheet {
    fn get_text(&self, row: u32, column: u32) -> Option<&str> {
        self.cells.get(&(row, column)).map(String::as_str).filter(|text| !text.is_empty())
    }

    fn set_text(&mut self, value: &str, row: u32, column: u32) {
        if value.is_empty() {
            self.cells.remove(&(row, column));
        } else {
            self.cells.insert((row, column), value.to_string());
        }
    }

    fn merge(&mut self, range: CellRange) -> Result<()> {
        if range.first_row == 0
            || range.first_column == 0
            || range.last_row < range.first_row
            || range.last_column < range.first_column
            || !range.is_multi_cell()
        {
            return Err(ReportError::DocumentError {
                operation: format!("merge {range}"),
                reason: "a merge needs at least two cells in 1-based order".to_string(),
            }
            .into());
        }
        if let Some(existing) = self.merges.iter().find(|m| m.overlaps(&range)) {
            return Err(ReportError::DocumentError {
                operation: format!("merge {range}"),
                reason: format!("overlaps existing merge {existing}"),
            }
            .into());
        }
        self.merges.push(range);
        Ok(())
    }

    fn nonempty_cells(&self, row: u32, max_column: u32) -> Vec<u32> {
        if max_column == 0 {
            return Vec::new();
        }
        self.cells
            .range((row, 1)..=(row, max_column))
            .filter(|(_, text)| !text.is_empty())
            .map(|((_, column), _)| *column)
            .collect()
    }
}

fn zero_based(row: u32, column: u32) -> Result<(u32, u16), ReportError> {
    let column = column
        .checked_sub(1)
        .and_then(|c| u16::try_from(c).ok())
        .ok_or_else(|| ReportError::DocumentError {
            operation: "address cell".to_string(),
            reason: format!("column {column} is outside the worksheet"),
        })?;
    let row = row.checked_sub(1).ok_or_else(|| ReportError::DocumentError {
        operation: "address cell".to_string(),
        reason: "row 0 is outside the worksheet".to_string(),
    })?;
    Ok((row, column))
}

fn xlsx_error(operation: &str, error: &XlsxError) -> ReportError {
    ReportError::DocumentError {
        operation: operation.to_string(),
        reason: error.to_string(),
    }
}
