//! Per-row template contexts.
//!
//! Tera renders synchronously, but attribute resolution may need a remote fetch. So
//! before each row is rendered, every attribute the column templates reference is
//! resolved through the graph and the results are placed in a [`tera::Context`]:
//!
//! ```text
//! project  { id, <referenced attributes> }
//! user     { ... }      also available as current_user
//! task     { ... }
//! parent   { ... }      attributes are null when the task has no parent
//! report   { from_date, to_date, generated_at, author }
//! ```
//!
//! An attribute that resolves to nothing is inserted as `null`, so templates can test
//! for it with `{% if %}` or the `default` filter instead of failing on a missing key.
//!
//! Only dotted `root.attribute` references are found. Index syntax
//! (`project["custom_num"]`) and aliases (`{% set p = project %}{{ p.custom_num }}`)
//! read attributes that were never resolved and render empty; the renderer warns
//! about such columns when it compiles them.

use super::columns::{ColumnSpec, ContextRoot};
use crate::graph::{NodeId, ResourceGraph, RowPath};
use crate::remote::RecordFetcher;
use anyhow::Result;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

/// Report-wide values available to every row as `report.*`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportInfo {
    /// First day of the period, `YYYY-MM-DD`
    pub from_date: String,
    /// Last day of the period, `YYYY-MM-DD`
    pub to_date: String,
    /// Generation time, `YYYY-MM-DD HH:MM:SS`
    pub generated_at: String,
    /// Full name of the account that generated the report
    pub author: Option<String>,
}

/// Builds the template context for each row.
#[derive(Debug, Clone)]
pub struct ContextBuilder {
    references: BTreeMap<ContextRoot, BTreeSet<String>>,
    report: ReportInfo,
}

impl ContextBuilder {
    /// Builder resolving the attributes referenced by `columns`.
    #[must_use]
    pub fn new(columns: &[ColumnSpec], report: ReportInfo) -> Self {
        let mut references: BTreeMap<ContextRoot, BTreeSet<String>> = BTreeMap::new();
        for reference in columns.iter().flat_map(ColumnSpec::references) {
            references.entry(reference.root).or_default().insert(reference.attribute.clone());
        }
        Self {
            references,
            report,
        }
    }

    /// Context for one row.
    ///
    /// # Errors
    ///
    /// Propagates fetch failures raised while resolving attributes.
    pub async fn build<F: RecordFetcher>(
        &self,
        graph: &mut ResourceGraph,
        row: &RowPath,
        fetcher: &F,
    ) -> Result<tera::Context> {
        let mut context = tera::Context::new();

        for root in ContextRoot::ALL {
            let object = match node_for(row, root) {
                Some(node) => self.resolve_object(graph, node, root, fetcher).await?,
                None => self.null_object(root),
            };
            let object = Value::Object(object);
            if root == ContextRoot::User {
                context.insert("current_user", &object);
            }
            context.insert(root.variable(), &object);
        }

        context.insert("report", &self.report);
        Ok(context)
    }

    fn attributes(&self, root: ContextRoot) -> impl Iterator<Item = &String> {
        self.references.get(&root).into_iter().flatten()
    }

    async fn resolve_object<F: RecordFetcher>(
        &self,
        graph: &mut ResourceGraph,
        node: NodeId,
        root: ContextRoot,
        fetcher: &F,
    ) -> Result<Map<String, Value>> {
        let mut object = Map::new();
        object.insert("id".to_string(), Value::from(graph.node(node).uid()));
        for attribute in self.attributes(root) {
            let value = graph.resolve(node, attribute, fetcher).await?;
            object.insert(attribute.clone(), value.unwrap_or(Value::Null));
        }
        Ok(object)
    }

    fn null_object(&self, root: ContextRoot) -> Map<String, Value> {
        let mut object = Map::new();
        object.insert("id".to_string(), Value::Null);
        for attribute in self.attributes(root) {
            object.insert(attribute.clone(), Value::Null);
        }
        object
    }
}

fn node_for(row: &RowPath, root: ContextRoot) -> Option<NodeId> {
    match (row, root) {
        (_, ContextRoot::Project) => Some(row.project()),
        (
            RowPath::ByUser {
                user, ..
            },
            ContextRoot::User,
        ) => Some(*user),
        (
            RowPath::ByTask {
                task, ..
            },
            ContextRoot::Task,
        ) => Some(*task),
        (
            RowPath::ByTask {
                parent, ..
            },
            ContextRoot::Parent,
        ) => *parent,
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ResourceKind;
    use crate::remote::RemoteRecord;
    use crate::test_utils::FixtureSource;
    use serde_json::json;

    #[tokio::test]
    async fn test_context_resolves_only_referenced_attributes() {
        let fetcher = FixtureSource::new(Vec::new()).with_full(
            ResourceKind::User,
            RemoteRecord::from_value(&json!({"id": 3, "lastname": "Li", "firstname": "Lei"}))
                .unwrap(),
        );
        let mut graph = ResourceGraph::default();
        let project = graph.get_or_create(
            None,
            &RemoteRecord::new(1).with_field("name", "Alpha"),
            ResourceKind::Project,
        );
        let user = graph.get_or_create(Some(project), &RemoteRecord::new(3), ResourceKind::User);

        let columns = vec![
            ColumnSpec::new(1, "Project", "{{ project.name }}"),
            ColumnSpec::new(2, "Member", "{{ current_user.fullname }}"),
        ];
        let builder = ContextBuilder::new(
            &columns,
            ReportInfo {
                from_date: "2024-03-01".to_string(),
                ..ReportInfo::default()
            },
        );

        let context = builder
            .build(
                &mut graph,
                &RowPath::ByUser {
                    project,
                    user,
                },
                &fetcher,
            )
            .await
            .unwrap();
        let json = context.into_json();

        assert_eq!(json["project"]["name"], json!("Alpha"));
        assert_eq!(json["user"]["fullname"], json!("LiLei"));
        assert_eq!(json["current_user"]["fullname"], json!("LiLei"));
        assert_eq!(json["report"]["from_date"], json!("2024-03-01"));
        // Project was never fetched: name came from the partial record
        assert_eq!(fetcher.full_fetches(ResourceKind::Project, 1), 0);
    }

    #[tokio::test]
    async fn test_missing_parent_yields_nulls() {
        let fetcher = FixtureSource::new(Vec::new());
        let mut graph = ResourceGraph::default();
        let project = graph.get_or_create(None, &RemoteRecord::new(1), ResourceKind::Project);
        let task = graph.get_or_create(
            Some(project),
            &RemoteRecord::new(5).with_field("name", "Docs"),
            ResourceKind::Task,
        );

        let columns = vec![ColumnSpec::new(1, "Parent", "{{ parent.name }}/{{ task.name }}")];
        let builder = ContextBuilder::new(&columns, ReportInfo::default());
        let json = builder
            .build(
                &mut graph,
                &RowPath::ByTask {
                    project,
                    parent: None,
                    task,
                },
                &fetcher,
            )
            .await
            .unwrap()
            .into_json();

        assert_eq!(json["parent"]["name"], Value::Null);
        assert_eq!(json["task"]["name"], json!("Docs"));
        assert_eq!(json["user"]["id"], Value::Null);
    }
}
