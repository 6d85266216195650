//! Template-driven table rendering.
//!
//! - [`columns`] reads the column definitions from the template's first two rows
//! - [`context`] resolves the attributes each row's templates reference
//! - [`compaction`] turns runs of equal values into merged cells
//! - [`renderer`] walks the rows and writes the document

pub mod columns;
pub mod compaction;
pub mod context;
pub mod renderer;

pub use columns::{AttributeRef, ColumnSpec, ContextRoot, parse_columns};
pub use compaction::{Flush, RunCompactor};
pub use context::{ContextBuilder, ReportInfo};
pub use renderer::{RenderOptions, RenderSummary, TableRenderer};
