//! Global constants used throughout the worktable codebase.
//!
//! Defaults for configuration values, template markers and layout limits live here so
//! that the config loader, the CLI and the renderer agree on them.

/// Number of time entries requested per page when harvesting.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// First sheet row written by the renderer (row 1 holds labels, row 2 the templates,
/// which the first rendered row overwrites).
pub const DEFAULT_START_ROW: u32 = 2;

/// First sheet column written by the renderer.
pub const DEFAULT_START_COLUMN: u32 = 1;

/// Rightmost column scanned when reading the template header row.
pub const MAX_HEADER_COLUMN: u32 = 99;

/// Row holding the column labels in a template document.
pub const HEADER_ROW: u32 = 1;

/// Row holding the per-column body templates in a template document.
pub const BODY_ROW: u32 = 2;

/// Substring marking a column body as a template.
pub const TEMPLATE_MARKER: &str = "{{";

/// Substring marking a template column as eligible for run merging.
pub const MERGE_MARKER: &str = "merge";

/// Default directory that receives generated reports.
pub const DEFAULT_OUTPUT_DIR: &str = "work tables";

/// Default template document, relative to the working directory.
pub const DEFAULT_TEMPLATE: &str = "template.toml";

/// Timestamp format used in output file names.
pub const OUTPUT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Environment variable that disables progress bars when set.
pub const NO_PROGRESS_ENV: &str = "WORKTABLE_NO_PROGRESS";

/// Environment variable holding a `tracing` filter directive.
pub const LOG_ENV: &str = "WORKTABLE_LOG";
