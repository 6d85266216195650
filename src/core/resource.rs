//! Resource kinds stored in the resource graph
//!
//! The graph holds four kinds of entity, each backed by a remote Redmine resource:
//! - **Project**: a Redmine project (`/projects/{id}.json`)
//! - **User**: a Redmine user (`/users/{id}.json`)
//! - **Task**: a Redmine issue (`/issues/{id}.json`)
//! - **WorkEntry**: a Redmine time entry (`/time_entries/{id}.json`)
//!
//! # Examples
//!
//! ```rust
//! use worktable::core::ResourceKind;
//!
//! let kind: ResourceKind = "issue".parse().unwrap();
//! assert_eq!(kind, ResourceKind::Task);
//! assert_eq!(kind.collection(), "issues");
//! assert_eq!(kind.to_string(), "task");
//! ```

use serde::{Deserialize, Serialize};

/// Enumeration of the entity kinds the resource graph stores.
///
/// `ResourceKind` serializes in lowercase snake case (`"project"`, `"work_entry"`)
/// so it can key configuration tables such as `[custom_fields.project]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// A remote project, top level of every layout
    Project,
    /// A remote user who logged time in a project
    User,
    /// A remote issue; also used for sub-tasks in the by-task layout
    Task,
    /// A single time entry, leaf of the graph
    WorkEntry,
}

impl ResourceKind {
    /// All kinds, in graph depth order.
    pub const ALL: [ResourceKind; 4] =
        [ResourceKind::Project, ResourceKind::User, ResourceKind::Task, ResourceKind::WorkEntry];

    /// REST collection name used to fetch a single full record.
    ///
    /// - [`Project`](ResourceKind::Project) → `"projects"`
    /// - [`User`](ResourceKind::User) → `"users"`
    /// - [`Task`](ResourceKind::Task) → `"issues"`
    /// - [`WorkEntry`](ResourceKind::WorkEntry) → `"time_entries"`
    #[must_use]
    pub const fn collection(&self) -> &'static str {
        match self {
            ResourceKind::Project => "projects",
            ResourceKind::User => "users",
            ResourceKind::Task => "issues",
            ResourceKind::WorkEntry => "time_entries",
        }
    }

    /// Key wrapping the record in a single-item response (`{"issue": {...}}`).
    #[must_use]
    pub const fn envelope(&self) -> &'static str {
        match self {
            ResourceKind::Project => "project",
            ResourceKind::User => "user",
            ResourceKind::Task => "issue",
            ResourceKind::WorkEntry => "time_entry",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::Project => write!(f, "project"),
            ResourceKind::User => write!(f, "user"),
            ResourceKind::Task => write!(f, "task"),
            ResourceKind::WorkEntry => write!(f, "work_entry"),
        }
    }
}

impl std::str::FromStr for ResourceKind {
    type Err = crate::core::ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "project" | "projects" => Ok(ResourceKind::Project),
            "user" | "users" => Ok(ResourceKind::User),
            "task" | "issue" | "issues" => Ok(ResourceKind::Task),
            "work_entry" | "work-entry" | "time_entry" | "time_entries" => {
                Ok(ResourceKind::WorkEntry)
            }
            _ => Err(crate::core::ReportError::ConfigError {
                message: format!("unknown resource kind `{s}`"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parsing() {
        assert_eq!("Project".parse::<ResourceKind>().unwrap(), ResourceKind::Project);
        assert_eq!("time_entry".parse::<ResourceKind>().unwrap(), ResourceKind::WorkEntry);
        assert!("agent".parse::<ResourceKind>().is_err());
    }

    #[test]
    fn test_kind_serde_matches_display() {
        for kind in ResourceKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{kind}\""));
        }
    }
}
