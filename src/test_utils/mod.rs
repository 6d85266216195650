//! Test utilities for worktable
//!
//! In-memory stand-ins for the two outside dependencies of a report run:
//!
//! - [`FixtureSource`] implements every remote trait over canned records, counting
//!   full-record fetches so tests can assert memoization
//! - [`RecordingDocument`] implements [`DocumentAdapter`](crate::document::DocumentAdapter)
//!   and keeps an ordered log of every write and merge
//!
//! # Example
//!
//! ```rust,no_run
//! use serde_json::json;
//! use worktable::test_utils::{FixtureSource, time_entry};
//!
//! let source = FixtureSource::new(vec![
//!     time_entry(1, (10, "Alpha"), (3, "Li"), Some(100), json!(1.5)),
//! ])
//! .with_issue(100, None);
//! ```

mod document;
mod fixtures;

pub use document::{RecordedOp, RecordingDocument};
pub use fixtures::{FixtureSource, time_entry};

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Uses `level` when given, otherwise `RUST_LOG`; with neither, logging stays off.
///
/// ```bash
/// RUST_LOG=worktable=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}
