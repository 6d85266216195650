//! Utility modules for worktable
//!
//! - [`fs`] - directory creation and atomic file writes for the output document
//! - [`progress`] - progress bars that respect `--no-progress`

pub mod fs;
pub mod progress;

pub use fs::{atomic_write, ensure_dir};
pub use progress::ProgressBar;
