//! Recording document for renderer tests.

use crate::document::{CellRange, DocumentAdapter};
use anyhow::{Result, bail};
use std::collections::BTreeMap;

/// One call made against a [`RecordingDocument`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedOp {
    /// `set_text`
    SetText {
        /// Written text
        value: String,
        /// Sheet row
        row: u32,
        /// Sheet column
        column: u32,
    },
    /// `merge`
    Merge {
        /// Merged range
        range: CellRange,
    },
}

/// In-memory [`DocumentAdapter`] that logs every operation in call order.
#[derive(Debug, Clone, Default)]
pub struct RecordingDocument {
    cells: BTreeMap<(u32, u32), String>,
    ops: Vec<RecordedOp>,
}

impl RecordingDocument {
    /// Document pre-filled with `cells`, without logging them.
    #[must_use]
    pub fn with_cells(cells: &[(u32, u32, &str)]) -> Self {
        Self {
            cells: cells.iter().map(|(row, column, text)| ((*row, *column), text.to_string())).collect(),
            ops: Vec::new(),
        }
    }

    /// Current text of a cell.
    #[must_use]
    pub fn text(&self, row: u32, column: u32) -> Option<&str> {
        self.cells.get(&(row, column)).map(String::as_str)
    }

    /// Every operation so far.
    #[must_use]
    pub fn ops(&self) -> &[RecordedOp] {
        &self.ops
    }

    /// Merged ranges, in merge order.
    #[must_use]
    pub fn merges(&self) -> Vec<CellRange> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                RecordedOp::Merge {
                    range,
                } => Some(*range),
                RecordedOp::SetText { .. } => None,
            })
            .collect()
    }
}

impl DocumentAdapter for RecordingDocument {
    fn get_text(&self, row: u32, column: u32) -> Option<&str> {
        self.text(row, column).filter(|text| !text.is_empty())
    }

    fn set_text(&mut self, value: &str, row: u32, column: u32) {
        self.cells.insert((row, column), value.to_string());
        self.ops.push(RecordedOp::SetText {
            value: value.to_string(),
            row,
            column,
        });
    }

    fn merge(&mut self, range: CellRange) -> Result<()> {
        if !range.is_multi_cell() {
            bail!("Cannot merge single cell {range}");
        }
        self.ops.push(RecordedOp::Merge {
            range,
        });
        Ok(())
    }

    fn nonempty_cells(&self, row: u32, max_column: u32) -> Vec<u32> {
        self.cells
            .range((row, 1)..=(row, max_column.max(1)))
            .filter(|(_, text)| !text.is_empty())
            .map(|((_, column), _)| *column)
            .filter(|column| *column <= max_column)
            .collect()
    }
}
