//! worktable - Redmine work-time spreadsheets
//!
//! Pulls the time entries of a reporting period from Redmine, rebuilds them into a
//! project hierarchy, and renders one spreadsheet row per group through a column
//! template, merging runs of repeated values into spanning cells.
//!
//! # Architecture Overview
//!
//! A run has two strictly ordered phases:
//!
//! 1. **Harvest**: [`harvest::Harvester`] pages through the time entries and feeds each
//!    one into a [`graph::ResourceGraph`], building `Project → User → Task → WorkEntry`
//!    (by-user layout) or `Project → Task → Subtask → WorkEntry` (by-task layout). The
//!    graph resolves partial records into full ones only when a template asks for an
//!    attribute the partial record lacks, and maps Redmine custom fields to attribute
//!    names per resource kind.
//! 2. **Render**: [`table::TableRenderer`] reads the column definitions from a
//!    template, evaluates each column's Tera template per row, and compacts repeated
//!    values of `merge` columns into merged cells. The [`document::Sheet`] is saved as
//!    `.xlsx` once rendering succeeded.
//!
//! Remote access goes through three traits in [`remote`], so the pipeline can run
//! against the Redmine client or in-memory fixtures.
//!
//! # Core Modules
//!
//! - [`cli`] - Command-line interface (`generate`, `columns`)
//! - [`config`] - Global configuration (`~/.worktable/config.toml`) and reporting periods
//! - [`core`] - Error types and resource kinds
//! - [`remote`] - Remote record traits and the Redmine client
//! - [`graph`] - Hierarchical resource cache with lazy attribute resolution
//! - [`harvest`] - Pagination, graph construction and project scoping
//! - [`table`] - Column parsing, row contexts, rendering and merge compaction
//! - [`document`] - Document adapter trait and the `.xlsx` sheet
//! - [`report`] - End-to-end pipeline and output naming
//! - [`utils`] - File writes and progress bars
//!
//! # Template Format
//!
//! ```toml
//! name = "Work time"
//! rows = [
//!     ["Project", "Member", "Hours"],
//!     ["{{ project.name | merge }}", "{{ user.fullname }}", "{{ user.spent_time }}"],
//! ]
//! ```
//!
//! # Command-Line Usage
//!
//! ```bash
//! worktable generate --url https://redmine.example.com --key $KEY --month 3 --merge
//! worktable columns --template template.toml
//! ```

// Core functionality modules
pub mod cli;
pub mod config;
pub mod constants;
pub mod core;

// Remote data and the resource cache
pub mod graph;
pub mod harvest;
pub mod remote;

// Output
pub mod document;
pub mod report;
pub mod table;

// Supporting modules
pub mod utils;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
