//! Run-length compaction of a column into merged cells.
//!
//! A [`RunCompactor`] watches the values written to one column, row after row. While
//! the value repeats it only extends the open run; when the value changes (or the
//! table ends) the run is flushed: a single row becomes a plain cell write, two or
//! more rows become the value at the first cell plus a merge down to the last.

use crate::document::{CellRange, DocumentAdapter};
use anyhow::Result;

/// Output of a closed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flush {
    /// Run of one row
    Single {
        /// Sheet row
        row: u32,
        /// Cell text
        value: String,
    },
    /// Run of two or more rows
    Merged {
        /// First sheet row of the run
        first_row: u32,
        /// Last sheet row of the run
        last_row: u32,
        /// Shared cell text
        value: String,
    },
}

impl Flush {
    /// Write the run into `column` of `document`.
    ///
    /// # Errors
    ///
    /// Propagates merge failures from the document.
    pub fn apply<D: DocumentAdapter>(self, document: &mut D, column: u32) -> Result<()> {
        match self {
            Self::Single {
                row,
                value,
            } => {
                document.set_text(&value, row, column);
                Ok(())
            }
            Self::Merged {
                first_row,
                last_row,
                value,
            } => {
                document.set_text(&value, first_row, column);
                document.merge(CellRange::column_span(column, first_row, last_row))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Run {
    first_row: u32,
    last_row: u32,
    value: String,
}

impl Run {
    fn close(self) -> Flush {
        if self.last_row > self.first_row {
            Flush::Merged {
                first_row: self.first_row,
                last_row: self.last_row,
                value: self.value,
            }
        } else {
            Flush::Single {
                row: self.first_row,
                value: self.value,
            }
        }
    }
}

/// Run tracker for one column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunCompactor {
    run: Option<Run>,
}

impl RunCompactor {
    /// Feed the value rendered for `row`.
    ///
    /// Returns the previous run when this value closes it. Values are compared by
    /// exact string equality, and a gap in row numbers also closes the run.
    pub fn push(&mut self, row: u32, value: String) -> Option<Flush> {
        if let Some(run) = self.run.as_mut()
            && run.value == value
            && run.last_row + 1 == row
        {
            run.last_row = row;
            return None;
        }

        let closed = self.run.take().map(Run::close);
        self.run = Some(Run {
            first_row: row,
            last_row: row,
            value,
        });
        closed
    }

    /// Close the open run, if any.
    pub fn finish(&mut self) -> Option<Flush> {
        self.run.take().map(Run::close)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compact(values: &[&str]) -> Vec<Flush> {
        let mut compactor = RunCompactor::default();
        let mut flushes: Vec<Flush> = (1u32..)
            .zip(values)
            .filter_map(|(row, value)| compactor.push(row, value.to_string()))
            .collect();
        flushes.extend(compactor.finish());
        flushes
    }

    #[test]
    fn test_runs_merge_and_single() {
        assert_eq!(
            compact(&["a", "a", "a", "b", "b", "c"]),
            vec![
                Flush::Merged {
                    first_row: 1,
                    last_row: 3,
                    value: "a".to_string()
                },
                Flush::Merged {
                    first_row: 4,
                    last_row: 5,
                    value: "b".to_string()
                },
                Flush::Single {
                    row: 6,
                    value: "c".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_distinct_values_write_single_cells() {
        let flushes = compact(&["a", "b", "c"]);
        assert_eq!(flushes.len(), 3);
        assert!(flushes.iter().all(|f| matches!(f, Flush::Single { .. })));
    }

    #[test]
    fn test_equality_is_exact() {
        let flushes = compact(&["a", "a ", "A"]);
        assert_eq!(flushes.len(), 3);
    }

    #[test]
    fn test_row_gap_closes_run() {
        let mut compactor = RunCompactor::default();
        assert!(compactor.push(2, "x".to_string()).is_none());
        assert_eq!(
            compactor.push(4, "x".to_string()),
            Some(Flush::Single {
                row: 2,
                value: "x".to_string()
            })
        );
    }

    #[test]
    fn test_finish_empties_compactor() {
        let mut compactor = RunCompactor::default();
        assert!(compactor.finish().is_none());
        compactor.push(1, "x".to_string());
        assert!(compactor.finish().is_some());
        assert!(compactor.finish().is_none());
    }
}
