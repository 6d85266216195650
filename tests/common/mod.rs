//! Shared helpers for the integration tests.
//!
//! [`TestWorkspace`] owns a temporary directory holding a template and an output
//! directory, and builds [`ReportConfig`]s pointing at them.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use tempfile::TempDir;
use worktable::config::{Layout, ReportPeriod, WorkloadConfig};
use worktable::harvest::HarvestOptions;
use worktable::report::ReportConfig;
use worktable::table::RenderOptions;

/// Template used by most tests: project (merged), member, hours.
pub const BY_USER_TEMPLATE: &str = r#"
name = "Work time"
rows = [
    ["Project", "Member", "Hours"],
    ["{{ project.name | merge }}", "{{ user.name }}", "{{ user.spent_time }}"],
]
"#;

/// Temporary template and output locations.
pub struct TestWorkspace {
    temp: TempDir,
}

impl TestWorkspace {
    /// Workspace with [`BY_USER_TEMPLATE`].
    pub fn new() -> Self {
        Self::with_template(BY_USER_TEMPLATE)
    }

    /// Workspace with a custom template body.
    pub fn with_template(template: &str) -> Self {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("template.toml"), template).unwrap();
        Self {
            temp,
        }
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    pub fn template_path(&self) -> PathBuf {
        self.root().join("template.toml")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root().join("work tables")
    }

    /// Files written to the output directory, sorted by name.
    pub fn outputs(&self) -> Vec<PathBuf> {
        let Ok(entries) = std::fs::read_dir(self.output_dir()) else {
            return Vec::new();
        };
        let mut files: Vec<PathBuf> = entries.map(|entry| entry.unwrap().path()).collect();
        files.sort();
        files
    }

    /// Run settings for March 2024 with merging enabled.
    pub fn config(&self, layout: Layout) -> ReportConfig {
        ReportConfig {
            period: ReportPeriod::month(2024, 3).unwrap(),
            scope: None,
            template: self.template_path(),
            output_dir: self.output_dir(),
            harvest: HarvestOptions {
                page_size: 2,
                layout,
            },
            render: RenderOptions {
                start_row: 2,
                start_column: 1,
                enable_merge: true,
            },
            workload: WorkloadConfig::default(),
            custom_fields: Default::default(),
            author: Some("LiLei".to_string()),
        }
    }
}
