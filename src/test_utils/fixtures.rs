//! Canned remote data.

use crate::config::ReportPeriod;
use crate::core::{ReportError, ResourceKind};
use crate::remote::{Page, ProjectTreeSource, RecordFetcher, RecordSource, RemoteRecord, RemoteRef};
use anyhow::Result;
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// A time entry as Redmine lists it.
///
/// `project` and `user` are `(id, name)`; `issue` is only an id, as in list responses.
#[must_use]
pub fn time_entry(
    id: u64,
    project: (u64, &str),
    user: (u64, &str),
    issue: Option<u64>,
    hours: Value,
) -> RemoteRecord {
    let mut record = RemoteRecord::new(id)
        .with_field("project", json!({"id": project.0, "name": project.1}))
        .with_field("user", json!({"id": user.0, "name": user.1}))
        .with_field("hours", hours)
        .with_field("spent_on", "2024-03-01");
    if let Some(issue) = issue {
        record = record.with_field("issue", json!({"id": issue}));
    }
    record
}

/// In-memory remote service.
///
/// Pages are sliced from the record list in order; `total_count` is the list length
/// unless overridden with [`with_reported_total`](Self::with_reported_total). Full
/// records are only known for ids registered through the builders, anything else is
/// reported as missing.
#[derive(Debug, Default)]
pub struct FixtureSource {
    records: Vec<RemoteRecord>,
    reported_total: Option<usize>,
    failing_pages: bool,
    full: HashMap<(ResourceKind, u64), RemoteRecord>,
    projects: Vec<(String, RemoteRef)>,
    children: HashMap<u64, Vec<RemoteRef>>,
    failing_children: HashSet<u64>,
    full_fetches: Mutex<HashMap<(ResourceKind, u64), usize>>,
    page_requests: Mutex<Vec<(usize, usize)>>,
}

impl FixtureSource {
    /// Source listing `records` as time entries.
    #[must_use]
    pub fn new(records: Vec<RemoteRecord>) -> Self {
        Self {
            records,
            ..Self::default()
        }
    }

    /// Announce `total` records regardless of how many exist.
    #[must_use]
    pub fn with_reported_total(mut self, total: usize) -> Self {
        self.reported_total = Some(total);
        self
    }

    /// Fail every page request.
    #[must_use]
    pub fn failing_pages(mut self) -> Self {
        self.failing_pages = true;
        self
    }

    /// Register the full record of `kind`.
    #[must_use]
    pub fn with_full(mut self, kind: ResourceKind, record: RemoteRecord) -> Self {
        self.full.insert((kind, record.id), record);
        self
    }

    /// Register a full issue with an optional parent issue.
    #[must_use]
    pub fn with_issue(self, id: u64, parent: Option<u64>) -> Self {
        let mut issue = RemoteRecord::new(id).with_field("subject", format!("Issue {id}"));
        if let Some(parent) = parent {
            issue = issue.with_field("parent", json!({"id": parent}));
        }
        self.with_full(ResourceKind::Task, issue)
    }

    /// Register a project reachable by `identifier` or by its id.
    #[must_use]
    pub fn with_project(mut self, id: u64, identifier: &str, name: &str) -> Self {
        self.projects.push((
            identifier.to_string(),
            RemoteRef {
                id,
                name: Some(name.to_string()),
            },
        ));
        self
    }

    /// Set the direct children of project `id`.
    #[must_use]
    pub fn with_children(mut self, id: u64, children: &[(u64, &str)]) -> Self {
        let refs = children
            .iter()
            .map(|(child, name)| RemoteRef {
                id: *child,
                name: Some((*name).to_string()),
            })
            .collect();
        self.children.insert(id, refs);
        self
    }

    /// Fail child listing for project `id`.
    #[must_use]
    pub fn with_failing_children(mut self, id: u64) -> Self {
        self.failing_children.insert(id);
        self
    }

    /// How many times the full record of `kind`/`id` was requested.
    #[must_use]
    pub fn full_fetches(&self, kind: ResourceKind, id: u64) -> usize {
        self.full_fetches
            .lock()
            .map(|counts| counts.get(&(kind, id)).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// `(offset, limit)` of every page request, in order.
    #[must_use]
    pub fn page_requests(&self) -> Vec<(usize, usize)> {
        self.page_requests.lock().map(|requests| requests.clone()).unwrap_or_default()
    }
}

impl RecordSource for FixtureSource {
    async fn fetch_page(
        &self,
        offset: usize,
        limit: usize,
        _period: &ReportPeriod,
    ) -> Result<Page> {
        if let Ok(mut requests) = self.page_requests.lock() {
            requests.push((offset, limit));
        }
        if self.failing_pages {
            return Err(ReportError::NetworkError {
                operation: "fetch time entries".to_string(),
                reason: "connection refused".to_string(),
            }
            .into());
        }

        let records = self.records.iter().skip(offset).take(limit).cloned().collect();
        Ok(Page {
            records,
            total_count: self.reported_total.unwrap_or(self.records.len()),
        })
    }
}

impl RecordFetcher for FixtureSource {
    async fn fetch_full(&self, kind: ResourceKind, id: u64) -> Result<Option<RemoteRecord>> {
        if let Ok(mut counts) = self.full_fetches.lock() {
            *counts.entry((kind, id)).or_default() += 1;
        }
        Ok(self.full.get(&(kind, id)).cloned())
    }
}

impl ProjectTreeSource for FixtureSource {
    async fn find_project(&self, identifier: &str) -> Result<Option<RemoteRef>> {
        Ok(self
            .projects
            .iter()
            .find(|(name, project)| name == identifier || project.id.to_string() == identifier)
            .map(|(_, project)| project.clone()))
    }

    async fn children(&self, project_id: u64) -> Result<Vec<RemoteRef>> {
        if self.failing_children.contains(&project_id) {
            return Err(ReportError::RemoteStatus {
                operation: format!("list children of project {project_id}"),
                status: 500,
            }
            .into());
        }
        Ok(self.children.get(&project_id).cloned().unwrap_or_default())
    }
}
