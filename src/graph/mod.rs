//! Incremental hierarchical resource cache.
//!
//! The harvester turns a flat stream of time entries into a tree:
//!
//! ```text
//! by-user:  Project → User → Task → WorkEntry
//! by-task:  Project → Task → (Subtask) → WorkEntry
//! ```
//!
//! Nodes live in an arena owned by [`ResourceGraph`] and are addressed by [`NodeId`].
//! There is a single construction entry point, [`ResourceGraph::get_or_create`], used
//! at every level: it returns the existing child for `(kind, id)` or registers a new
//! one, so re-ingesting a record never duplicates a node or loses what it cached.
//!
//! # Attribute resolution
//!
//! [`ResourceGraph::resolve`] looks an attribute up through an ordered list of tiers,
//! first hit wins and the result (including a miss) is cached on the node:
//!
//! 1. computed attributes (`id`, `name`, `spent_time`, `fullname`, `parent_id`)
//! 2. the partial record the node was created from
//! 3. the full remote record, fetched lazily
//! 4. a custom field of the full record, via the kind's custom-field table
//!
//! Full records are memoized graph-wide by `(ResourceKind, id)`, so each remote
//! object is fetched at most once per run no matter how many nodes point at it.

mod aggregate;
mod kind;
mod node;

pub use aggregate::hours_value;
pub use kind::{KindConfig, KindTable};
pub use node::{ChildKey, NodeId, ResourceNode};

use crate::config::{Layout, WorkloadConfig};
use crate::core::ResourceKind;
use crate::remote::{RecordFetcher, RemoteRecord};
use anyhow::Result;
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// Resolution tiers after the computed attributes, in lookup order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tier {
    Partial,
    Full,
    CustomField,
}

impl Tier {
    const ORDER: [Tier; 3] = [Tier::Partial, Tier::Full, Tier::CustomField];
}

/// One table row: a leaf path through the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowPath {
    /// `(project, user)` in the by-user layout
    ByUser {
        /// Project node
        project: NodeId,
        /// User node under the project
        user: NodeId,
    },
    /// `(project, parent task or none, task)` in the by-task layout
    ByTask {
        /// Project node
        project: NodeId,
        /// Parent task when `task` is a sub-task
        parent: Option<NodeId>,
        /// Leaf task
        task: NodeId,
    },
}

impl RowPath {
    /// Project node of the row.
    #[must_use]
    pub fn project(&self) -> NodeId {
        match self {
            Self::ByUser {
                project, ..
            }
            | Self::ByTask {
                project, ..
            } => *project,
        }
    }
}

/// Arena of resource nodes plus the graph-wide full-record store.
#[derive(Debug, Default)]
pub struct ResourceGraph {
    nodes: Vec<ResourceNode>,
    roots: IndexMap<ChildKey, NodeId>,
    full_records: HashMap<(ResourceKind, u64), Option<RemoteRecord>>,
    kinds: KindTable,
    workload: WorkloadConfig,
}

impl ResourceGraph {
    /// Empty graph using `kinds` for custom-field lookups and `workload` for user
    /// totals.
    #[must_use]
    pub fn new(kinds: KindTable, workload: WorkloadConfig) -> Self {
        Self {
            nodes: Vec::new(),
            roots: IndexMap::new(),
            full_records: HashMap::new(),
            kinds,
            workload,
        }
    }

    /// Return the child of `parent` (or the root when `None`) for `record`, creating
    /// it on first sight.
    ///
    /// Idempotent: a second call with the same `(parent, kind, record.id)` returns the
    /// same node untouched, except that a missing display name is filled in.
    pub fn get_or_create(
        &mut self,
        parent: Option<NodeId>,
        record: &RemoteRecord,
        kind: ResourceKind,
    ) -> NodeId {
        let key = (kind, record.id);
        let existing = match parent {
            Some(parent) => self.nodes[parent.0].children.get(&key).copied(),
            None => self.roots.get(&key).copied(),
        };

        if let Some(id) = existing {
            let node = &mut self.nodes[id.0];
            if node.name.is_none() {
                node.name = record.name().map(str::to_string);
            }
            return id;
        }

        let id = NodeId(self.nodes.len());
        self.nodes.push(ResourceNode::new(kind, record));
        match parent {
            Some(parent) => {
                self.nodes[parent.0].children.insert(key, id);
            }
            None => {
                self.roots.insert(key, id);
            }
        }
        debug!("Created {kind} node {} ({:?})", record.id, id);
        id
    }

    /// Node stored at `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not produced by this graph.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &ResourceNode {
        &self.nodes[id.0]
    }

    /// Project nodes in discovery order (or scope order after
    /// [`retain_projects`](Self::retain_projects)).
    pub fn projects(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.roots.values().copied()
    }

    /// Root-level project with remote id `uid`.
    #[must_use]
    pub fn project(&self, uid: u64) -> Option<NodeId> {
        self.roots.get(&(ResourceKind::Project, uid)).copied()
    }

    /// Children of `parent` with the given kind, in discovery order.
    pub fn children_of(
        &self,
        parent: NodeId,
        kind: ResourceKind,
    ) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes[parent.0]
            .children
            .iter()
            .filter(move |((child_kind, _), _)| *child_kind == kind)
            .map(|(_, id)| *id)
    }

    /// Child of `parent` with the given kind and remote id.
    #[must_use]
    pub fn child(&self, parent: NodeId, kind: ResourceKind, uid: u64) -> Option<NodeId> {
        self.nodes[parent.0].children.get(&(kind, uid)).copied()
    }

    /// Total number of nodes ever created.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether no node was created.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Keep only the listed projects at the root, in the order given.
    ///
    /// Ids that were never harvested are ignored.
    pub fn retain_projects(&mut self, ids: &[u64]) {
        let mut roots = IndexMap::new();
        for uid in ids {
            let key = (ResourceKind::Project, *uid);
            if let Some(id) = self.roots.get(&key) {
                roots.insert(key, *id);
            }
        }
        debug!("Scoped {} projects down to {}", self.roots.len(), roots.len());
        self.roots = roots;
    }

    /// Leaf paths for `layout`, depth-first in discovery order.
    #[must_use]
    pub fn rows(&self, layout: Layout) -> Vec<RowPath> {
        let mut rows = Vec::new();
        for project in self.projects() {
            match layout {
                Layout::ByUser => {
                    rows.extend(self.children_of(project, ResourceKind::User).map(|user| {
                        RowPath::ByUser {
                            project,
                            user,
                        }
                    }));
                }
                Layout::ByTask => {
                    for task in self.children_of(project, ResourceKind::Task) {
                        let mut subtasks = self.children_of(task, ResourceKind::Task).peekable();
                        // A parent with its own entries keeps a row of its own
                        let own_entries =
                            self.children_of(task, ResourceKind::WorkEntry).next().is_some();
                        if subtasks.peek().is_none() || own_entries {
                            rows.push(RowPath::ByTask {
                                project,
                                parent: None,
                                task,
                            });
                        }
                        rows.extend(subtasks.map(|subtask| RowPath::ByTask {
                            project,
                            parent: Some(task),
                            task: subtask,
                        }));
                    }
                }
            }
        }
        rows
    }

    /// Full record of `(kind, id)`, fetched at most once per graph.
    ///
    /// A record the fetcher reports as absent is remembered as absent. Transport
    /// errors are returned and not remembered.
    ///
    /// # Errors
    ///
    /// Propagates fetcher errors.
    pub async fn full_record<F: RecordFetcher>(
        &mut self,
        kind: ResourceKind,
        id: u64,
        fetcher: &F,
    ) -> Result<Option<&RemoteRecord>> {
        let key = (kind, id);
        if !self.full_records.contains_key(&key) {
            let record = fetcher.fetch_full(kind, id).await?;
            if record.is_none() {
                debug!("{kind} {id} has no full record");
            }
            self.full_records.insert(key, record);
        }
        Ok(self.full_records.get(&key).and_then(Option::as_ref))
    }

    /// Resolve `attribute` on `node`.
    ///
    /// Returns `Ok(None)` when no tier knows the attribute; that answer is cached like
    /// any other.
    ///
    /// # Errors
    ///
    /// Propagates fetcher errors raised while loading the full record.
    pub async fn resolve<F: RecordFetcher>(
        &mut self,
        node: NodeId,
        attribute: &str,
        fetcher: &F,
    ) -> Result<Option<Value>> {
        if let Some(cached) = self.node(node).cached_attribute(attribute) {
            return Ok(cached.cloned());
        }

        let value = match self.computed(node, attribute, fetcher).await? {
            Some(value) => Some(value),
            None => self.resolve_tiers(node, attribute, fetcher).await?,
        };

        self.nodes[node.0].attributes.insert(attribute.to_string(), value.clone());
        Ok(value)
    }

    async fn computed<F: RecordFetcher>(
        &mut self,
        node: NodeId,
        attribute: &str,
        fetcher: &F,
    ) -> Result<Option<Value>> {
        let kind = self.nodes[node.0].kind;
        let value = match (kind, attribute) {
            (_, "id") => Some(Value::from(self.nodes[node.0].uid)),
            (ResourceKind::Task, "name") => match self.nodes[node.0].name.clone() {
                Some(name) => Some(Value::from(name)),
                None => self.resolve_tiers(node, "subject", fetcher).await?,
            },
            (_, "name") => self.nodes[node.0].name.clone().map(Value::from),
            (ResourceKind::Task, "spent_time") => number(self.task_hours(node)),
            (ResourceKind::User, "spent_time") => number(self.user_workload(node)),
            (ResourceKind::User, "fullname") => {
                let lastname = self.resolve_tiers(node, "lastname", fetcher).await?;
                let firstname = self.resolve_tiers(node, "firstname", fetcher).await?;
                if lastname.is_none() && firstname.is_none() {
                    None
                } else {
                    Some(Value::from(format!("{}{}", text(lastname), text(firstname))))
                }
            }
            (ResourceKind::Project, "parent_id") => self
                .resolve_tiers(node, "parent", fetcher)
                .await?
                .and_then(|parent| parent.get("id").cloned()),
            _ => None,
        };
        Ok(value)
    }

    async fn resolve_tiers<F: RecordFetcher>(
        &mut self,
        node: NodeId,
        attribute: &str,
        fetcher: &F,
    ) -> Result<Option<Value>> {
        let (kind, uid) = (self.nodes[node.0].kind, self.nodes[node.0].uid);

        for tier in Tier::ORDER {
            let value = match tier {
                Tier::Partial => self.nodes[node.0].partial.field(attribute).cloned(),
                Tier::Full => self
                    .full_record(kind, uid, fetcher)
                    .await?
                    .and_then(|record| record.field(attribute).cloned()),
                Tier::CustomField => {
                    let Some(field) = self.kinds.custom_field(kind, attribute).map(str::to_string)
                    else {
                        continue;
                    };
                    self.full_record(kind, uid, fetcher)
                        .await?
                        .and_then(|record| record.custom_field(&field).cloned())
                }
            };
            if value.is_some() {
                return Ok(value);
            }
        }
        Ok(None)
    }
}

fn number(value: f64) -> Option<Value> {
    serde_json::Number::from_f64(value).map(Value::Number)
}

fn text(value: Option<Value>) -> String {
    match value {
        Some(Value::String(s)) => s,
        Some(other) => other.to_string(),
        None => String::new(),
    }
}
