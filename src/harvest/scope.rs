//! Sub-project scoping.
//!
//! A report can be limited to one project and all of its descendants, found by
//! walking `children` links depth-first with an explicit stack. The set is resolved into a [`ProjectScope`] before harvesting, and the
//! harvested graph is then cut down to it with [`ResourceGraph::retain_projects`].

use crate::core::ReportError;
use crate::graph::ResourceGraph;
use crate::remote::{ProjectTreeSource, RemoteRef};
use crate::utils::progress::ProgressBar;
use anyhow::Result;
use std::collections::HashSet;
use tracing::{info, warn};

/// Project `identifier` and its descendants, pre-order.
///
/// Each project appears once even if the hierarchy links back to it. A failing
/// `children` query is logged and treated as "no children".
///
/// # Errors
///
/// Returns [`ReportError::ProjectNotFound`] when the identifier does not resolve to a
/// project, and propagates lookup transport failures.
pub async fn descendant_projects<T: ProjectTreeSource>(
    tree: &T,
    identifier: &str,
) -> Result<Vec<RemoteRef>> {
    let root = tree.find_project(identifier).await?.ok_or_else(|| {
        ReportError::ProjectNotFound {
            identifier: identifier.to_string(),
        }
    })?;
    info!("Located project {} ({})", root.name.as_deref().unwrap_or("unnamed"), root.id);

    let progress = ProgressBar::new_spinner();
    progress.set_prefix("Scoping");

    let mut visited = HashSet::new();
    let mut ordered = Vec::new();
    let mut stack = vec![root];

    while let Some(project) = stack.pop() {
        if !visited.insert(project.id) {
            continue;
        }
        progress.set_message(project.name.clone().unwrap_or_else(|| project.id.to_string()));

        let children = match tree.children(project.id).await {
            Ok(children) => children,
            Err(e) => {
                warn!("Failed to list children of project {}: {e:#}", project.id);
                Vec::new()
            }
        };
        ordered.push(project);
        // Reversed so the first child is visited first
        stack.extend(children.into_iter().rev().filter(|child| !visited.contains(&child.id)));
    }

    progress.finish_and_clear();
    Ok(ordered)
}

/// The set of projects a scoped report covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectScope {
    identifier: String,
    projects: Vec<RemoteRef>,
}

impl ProjectScope {
    /// Look up project `identifier` and collect its descendants.
    ///
    /// Runs before harvesting so an unknown project fails the run early.
    ///
    /// # Errors
    ///
    /// See [`descendant_projects`].
    pub async fn resolve<T: ProjectTreeSource>(tree: &T, identifier: &str) -> Result<Self> {
        let projects = descendant_projects(tree, identifier).await?;
        Ok(Self {
            identifier: identifier.to_string(),
            projects,
        })
    }

    /// Projects in scope, pre-order.
    #[must_use]
    pub fn projects(&self) -> &[RemoteRef] {
        &self.projects
    }

    /// Cut `graph` down to the projects in scope. Returns the number kept.
    pub fn apply(&self, graph: &mut ResourceGraph) -> usize {
        let ids: Vec<u64> = self.projects.iter().map(|project| project.id).collect();
        graph.retain_projects(&ids);

        let kept = graph.projects().count();
        info!(
            "Scope {}: {} projects in hierarchy, {kept} with time entries",
            self.identifier,
            ids.len()
        );
        kept
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ResourceKind;
    use crate::remote::RemoteRecord;
    use crate::test_utils::FixtureSource;

    fn tree() -> FixtureSource {
        FixtureSource::new(Vec::new())
            .with_project(1, "root", "Root")
            .with_project(5, "other", "Other")
            .with_children(1, &[(2, "A"), (3, "B")])
            .with_children(2, &[(4, "A1"), (1, "Root")])
            .with_children(3, &[(4, "A1")])
    }

    #[tokio::test]
    async fn test_descendants_pre_order_without_repeats() {
        let ids: Vec<u64> = descendant_projects(&tree(), "root")
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![1, 2, 4, 3]);
    }

    #[tokio::test]
    async fn test_lookup_by_numeric_id() {
        let projects = descendant_projects(&tree(), "5").await.unwrap();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].name.as_deref(), Some("Other"));
    }

    #[tokio::test]
    async fn test_unknown_project_fails() {
        let err = descendant_projects(&tree(), "missing").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ReportError>(),
            Some(ReportError::ProjectNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_failing_children_degrade_to_none() {
        let tree = tree().with_failing_children(2);
        let ids: Vec<u64> =
            descendant_projects(&tree, "1").await.unwrap().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_scope_intersects_graph() {
        let mut graph = ResourceGraph::default();
        for id in [5, 3, 1, 9] {
            graph.get_or_create(None, &RemoteRecord::new(id), ResourceKind::Project);
        }

        let scope = ProjectScope::resolve(&tree(), "root").await.unwrap();
        assert_eq!(scope.projects().len(), 4);
        let kept = scope.apply(&mut graph);
        assert_eq!(kept, 2);
        let uids: Vec<u64> = graph.projects().map(|p| graph.node(p).uid()).collect();
        assert_eq!(uids, vec![1, 3]);
    }
}
