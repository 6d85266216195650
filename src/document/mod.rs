//! Tabular documents.
//!
//! The renderer only needs four operations from the output document, captured by
//! [`DocumentAdapter`]: read a cell, write a cell, merge a rectangular range, and list
//! the non-empty cells of a row. [`Sheet`] is the concrete implementation: an
//! in-memory grid seeded from a TOML template and saved as `.xlsx`.
//!
//! All coordinates are 1-based `(row, column)`, as they appear in a spreadsheet UI.

mod sheet;

pub use sheet::{Sheet, TemplateFile};

use anyhow::Result;
use std::fmt;

/// Inclusive rectangular cell range, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRange {
    /// Top row
    pub first_row: u32,
    /// Left column
    pub first_column: u32,
    /// Bottom row
    pub last_row: u32,
    /// Right column
    pub last_column: u32,
}

impl CellRange {
    /// Range spanning rows `first_row..=last_row` of a single column.
    #[must_use]
    pub const fn column_span(column: u32, first_row: u32, last_row: u32) -> Self {
        Self {
            first_row,
            first_column: column,
            last_row,
            last_column: column,
        }
    }

    /// Whether `(row, column)` lies inside the range.
    #[must_use]
    pub const fn contains(&self, row: u32, column: u32) -> bool {
        row >= self.first_row
            && row <= self.last_row
            && column >= self.first_column
            && column <= self.last_column
    }

    /// Whether the two ranges share at least one cell.
    #[must_use]
    pub const fn overlaps(&self, other: &CellRange) -> bool {
        self.first_row <= other.last_row
            && other.first_row <= self.last_row
            && self.first_column <= other.last_column
            && other.first_column <= self.last_column
    }

    /// Whether the range covers more than one cell.
    #[must_use]
    pub const fn is_multi_cell(&self) -> bool {
        self.last_row > self.first_row || self.last_column > self.first_column
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "R{}C{}:R{}C{}",
            self.first_row, self.first_column, self.last_row, self.last_column
        )
    }
}

/// Cell-level access to an output document.
pub trait DocumentAdapter {
    /// Text of a cell, `None` when the cell is empty.
    fn get_text(&self, row: u32, column: u32) -> Option<&str>;

    /// Replace the text of a cell.
    fn set_text(&mut self, value: &str, row: u32, column: u32);

    /// Merge a rectangular range. The top-left cell's text becomes the merged value.
    ///
    /// # Errors
    ///
    /// Fails for ranges the document cannot represent (single cells, reversed or
    /// overlapping ranges).
    fn merge(&mut self, range: CellRange) -> Result<()>;

    /// Columns `1..=max_column` of `row` holding non-empty text, left to right.
    fn nonempty_cells(&self, row: u32, max_column: u32) -> Vec<u32>;
}
