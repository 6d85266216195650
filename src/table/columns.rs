//! Column definitions read from a template document.
//!
//! Row 1 of the template holds column labels and row 2 the cell template for each
//! labelled column. A body containing `{{` is rendered with Tera for every table row;
//! one that also contains the word `merge` takes part in run merging.

use crate::constants::{BODY_ROW, HEADER_ROW, MAX_HEADER_COLUMN, MERGE_MARKER, TEMPLATE_MARKER};
use crate::document::DocumentAdapter;
use regex::Regex;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

static ATTRIBUTE_REF: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"\b(project|current_user|user|task|parent)\.([A-Za-z_][A-Za-z0-9_]*)").ok()
});

static ROOT_USE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"\b(project|current_user|user|task|parent)\b(\s*\.\s*[A-Za-z_])?").ok()
});

/// Variable roots a column template can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContextRoot {
    /// The row's project
    Project,
    /// The row's user (by-user layout); also reachable as `current_user`
    User,
    /// The row's leaf task (by-task layout)
    Task,
    /// The leaf task's parent (by-task layout)
    Parent,
}

impl ContextRoot {
    /// All roots, in context insertion order.
    pub const ALL: [ContextRoot; 4] =
        [ContextRoot::Project, ContextRoot::User, ContextRoot::Task, ContextRoot::Parent];

    /// Variable name in templates.
    #[must_use]
    pub const fn variable(&self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::User => "user",
            Self::Task => "task",
            Self::Parent => "parent",
        }
    }

    fn from_variable(name: &str) -> Option<Self> {
        match name {
            "project" => Some(Self::Project),
            "user" | "current_user" => Some(Self::User),
            "task" => Some(Self::Task),
            "parent" => Some(Self::Parent),
            _ => None,
        }
    }
}

impl fmt::Display for ContextRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.variable())
    }
}

/// An attribute a template reads, such as `project.custom_num`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttributeRef {
    /// Variable root
    pub root: ContextRoot,
    /// Attribute name on the root
    pub attribute: String,
}

/// Attribute references appearing in a template body.
#[must_use]
pub fn attribute_refs(body: &str) -> BTreeSet<AttributeRef> {
    let Some(pattern) = ATTRIBUTE_REF.as_ref() else {
        return BTreeSet::new();
    };
    pattern
        .captures_iter(body)
        .filter_map(|caps| {
            Some(AttributeRef {
                root: ContextRoot::from_variable(caps.get(1)?.as_str())?,
                attribute: caps.get(2)?.as_str().to_string(),
            })
        })
        .collect()
}

/// Roots a template body uses other than through `root.attribute`, for example
/// `project["custom_num"]` or `{% set p = project %}`.
///
/// Attributes read that way are never resolved and render as nothing.
#[must_use]
pub fn opaque_root_uses(body: &str) -> BTreeSet<ContextRoot> {
    let Some(pattern) = ROOT_USE.as_ref() else {
        return BTreeSet::new();
    };
    pattern
        .captures_iter(body)
        .filter(|caps| caps.get(2).is_none())
        .filter_map(|caps| ContextRoot::from_variable(caps.get(1)?.as_str()))
        .collect()
}

/// One column of the report table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    position: u32,
    header_label: String,
    body_spec: String,
    references: BTreeSet<AttributeRef>,
}

impl ColumnSpec {
    /// Column at 1-based `position` with its label and body template.
    #[must_use]
    pub fn new(position: u32, header_label: impl Into<String>, body_spec: impl Into<String>) -> Self {
        let body_spec = body_spec.into();
        let references = if body_spec.contains(TEMPLATE_MARKER) {
            attribute_refs(&body_spec)
        } else {
            BTreeSet::new()
        };
        Self {
            position,
            header_label: header_label.into(),
            body_spec,
            references,
        }
    }

    /// 1-based column in the template document.
    #[must_use]
    pub fn position(&self) -> u32 {
        self.position
    }

    /// Label from the header row.
    #[must_use]
    pub fn header_label(&self) -> &str {
        &self.header_label
    }

    /// Body template (or literal text) from the second row.
    #[must_use]
    pub fn body_spec(&self) -> &str {
        &self.body_spec
    }

    /// Whether the body is a template.
    #[must_use]
    pub fn is_renderable(&self) -> bool {
        self.body_spec.contains(TEMPLATE_MARKER)
    }

    /// Whether rendered values of this column take part in run merging.
    #[must_use]
    pub fn is_mergeable(&self) -> bool {
        self.is_renderable() && self.body_spec.contains(MERGE_MARKER)
    }

    /// Attributes the template reads.
    pub fn references(&self) -> impl Iterator<Item = &AttributeRef> {
        self.references.iter()
    }

    /// Roots the template uses in a way attribute pre-resolution cannot follow.
    #[must_use]
    pub fn opaque_roots(&self) -> BTreeSet<ContextRoot> {
        if self.is_renderable() {
            opaque_root_uses(&self.body_spec)
        } else {
            BTreeSet::new()
        }
    }
}

/// Read the column definitions from a template document.
///
/// Scans the header row from column 1 to 99; every non-empty label yields a column
/// whose body is the cell below it (empty when missing).
#[must_use]
pub fn parse_columns<D: DocumentAdapter>(document: &D) -> Vec<ColumnSpec> {
    document
        .nonempty_cells(HEADER_ROW, MAX_HEADER_COLUMN)
        .into_iter()
        .map(|column| {
            let label = document.get_text(HEADER_ROW, column).unwrap_or_default();
            let body = document.get_text(BODY_ROW, column).unwrap_or_default();
            ColumnSpec::new(column, label, body)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Sheet, TemplateFile};

    fn sheet(rows: &[&[&str]]) -> Sheet {
        Sheet::from_template(&TemplateFile {
            name: None,
            rows: rows.iter().map(|r| r.iter().map(|c| c.to_string()).collect()).collect(),
        })
    }

    #[test]
    fn test_parse_columns_flags() {
        let sheet = sheet(&[
            &["No.", "Project", "Member", "Days"],
            &["1", "{{ project.name | merge }}", "{{ user.fullname }}", "{{ user.spent_time }}"],
        ]);

        let columns = parse_columns(&sheet);
        assert_eq!(columns.len(), 4);

        assert!(!columns[0].is_renderable());
        assert!(columns[1].is_renderable() && columns[1].is_mergeable());
        assert!(columns[2].is_renderable() && !columns[2].is_mergeable());
        assert_eq!(columns[3].header_label(), "Days");
    }

    #[test]
    fn test_parse_columns_gaps_and_missing_body() {
        let sheet = sheet(&[&["A", "", "C", "D"], &["{{ project.id }}", "", "x"]]);

        let columns = parse_columns(&sheet);
        let positions: Vec<u32> = columns.iter().map(ColumnSpec::position).collect();
        assert_eq!(positions, vec![1, 3, 4]);
        assert_eq!(columns[1].body_spec(), "x");
        assert_eq!(columns[2].body_spec(), "");
    }

    #[test]
    fn test_opaque_root_uses() {
        let indexed = ColumnSpec::new(1, "No.", r#"{{ project["custom_num"] }}"#);
        assert_eq!(indexed.references().count(), 0);
        assert_eq!(indexed.opaque_roots(), BTreeSet::from([ContextRoot::Project]));

        let aliased = ColumnSpec::new(2, "Who", "{% set u = current_user %}{{ u.fullname }}");
        assert_eq!(aliased.opaque_roots(), BTreeSet::from([ContextRoot::User]));

        let dotted = ColumnSpec::new(3, "Task", "{{ parent.name | default(value=task . name) }}");
        assert!(dotted.opaque_roots().is_empty());

        let literal = ColumnSpec::new(4, "Note", "project");
        assert!(literal.opaque_roots().is_empty());
    }

    #[test]
    fn test_merge_marker_without_template_is_literal() {
        let column = ColumnSpec::new(1, "Note", "merge me");
        assert!(!column.is_renderable());
        assert!(!column.is_mergeable());
        assert_eq!(column.references().count(), 0);
    }

    #[test]
    fn test_attribute_refs() {
        let refs = attribute_refs(
            "{{ project.custom_num }}-{{ current_user.fullname }} {{ parent.name | default(value=task.name) }} {{ report.from_date }}",
        );
        let found: Vec<(ContextRoot, &str)> =
            refs.iter().map(|r| (r.root, r.attribute.as_str())).collect();
        assert_eq!(
            found,
            vec![
                (ContextRoot::Project, "custom_num"),
                (ContextRoot::User, "fullname"),
                (ContextRoot::Task, "name"),
                (ContextRoot::Parent, "name"),
            ]
        );
    }
}
