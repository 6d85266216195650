//! Configuration management for worktable
//!
//! Two kinds of configuration feed a report run:
//!
//! 1. **Global Configuration** (`~/.worktable/config.toml`) - connection settings,
//!    template and output locations, layout knobs. See [`GlobalConfig`].
//! 2. **Reporting period** - a calendar month or an explicit date range chosen on the
//!    command line. See [`ReportPeriod`].
//!
//! Command-line flags override file values; the merged result is validated before the
//! first network request.

mod global;
mod period;

pub use global::{GlobalConfig, Layout, WorkloadConfig};
pub use period::ReportPeriod;
