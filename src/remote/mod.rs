//! Remote record sources
//!
//! The report pipeline talks to the project-management service through three small
//! traits so the harvesting and rendering logic never depends on HTTP details:
//!
//! - [`RecordSource`] - paginated time-entry queries
//! - [`RecordFetcher`] - single full-record lookups (custom fields live here)
//! - [`ProjectTreeSource`] - project lookup and child-project links for scoping
//!
//! [`redmine::RedmineClient`] implements all three against a Redmine server. Tests use
//! the in-memory fixture from `test_utils`.
//!
//! Every call is awaited sequentially by the pipeline; implementations never need to
//! be shared across tasks.

pub mod record;
pub mod redmine;
mod session;

pub use record::{Page, RemoteRecord, RemoteRef};
pub use redmine::{Credentials, RedmineClient};

use crate::config::ReportPeriod;
use crate::core::ResourceKind;
use anyhow::Result;

/// Paginated query interface over time entries.
#[allow(async_fn_in_trait)]
pub trait RecordSource {
    /// Fetch up to `limit` time entries starting at `offset` within `period`.
    ///
    /// The returned [`Page`] carries the total number of records matching the query,
    /// not just the number on this page.
    async fn fetch_page(&self, offset: usize, limit: usize, period: &ReportPeriod)
    -> Result<Page>;
}

/// Single-record lookup used to resolve partial records into full ones.
#[allow(async_fn_in_trait)]
pub trait RecordFetcher {
    /// Fetch the full record of `kind` with remote id `id`.
    ///
    /// Returns `Ok(None)` when the service has no such record or does not expose it
    /// to the current credentials. Transport failures are errors.
    async fn fetch_full(&self, kind: ResourceKind, id: u64) -> Result<Option<RemoteRecord>>;
}

/// Project hierarchy queries used to scope a report to one project and its
/// descendants.
#[allow(async_fn_in_trait)]
pub trait ProjectTreeSource {
    /// Locate a project by numeric id or string identifier.
    async fn find_project(&self, identifier: &str) -> Result<Option<RemoteRef>>;

    /// Direct children of a project.
    async fn children(&self, project_id: u64) -> Result<Vec<RemoteRef>>;
}
