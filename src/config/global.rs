//! Global configuration for worktable.
//!
//! This module handles the user configuration file (`~/.worktable/config.toml`) which
//! stores the Redmine connection settings, the template and output locations, and the
//! table layout knobs. Every field has a default, so a missing file is equivalent to
//! an empty one, and command-line flags override whatever the file says.
//!
//! # File Format
//!
//! ```toml
//! url = "https://redmine.example.com"
//! key = "0123456789abcdef"          # or username/password
//! page_size = 20
//! template = "~/reports/template.toml"
//! output_dir = "work tables"
//! layout = "by-user"                # or "by-task"
//! start_row = 2
//! start_column = 1
//! merge_cells = true
//!
//! [workload]
//! divisor = 8.0
//! round_digits = 2
//!
//! [custom_fields.project]
//! custom_num = "Project number"
//! ```
//!
//! # Credentials
//!
//! When `key` is set, requests authenticate with the `X-Redmine-API-Key` header and no
//! browser session is opened, so sub-project scoping is unavailable. Without a key the
//! client uses HTTP basic authentication with `username`/`password` and additionally
//! performs a form login to obtain a session for the child-project endpoint.

use crate::constants::{
    DEFAULT_OUTPUT_DIR, DEFAULT_PAGE_SIZE, DEFAULT_START_COLUMN, DEFAULT_START_ROW,
    DEFAULT_TEMPLATE,
};
use crate::core::ResourceKind;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Shape of the resource tree built from the harvested time entries.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum Layout {
    /// Project → User → Task → WorkEntry, one row per `(project, user)`
    #[default]
    ByUser,
    /// Project → Task → Subtask → WorkEntry, one row per leaf task
    ByTask,
}

impl std::fmt::Display for Layout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ByUser => write!(f, "by-user"),
            Self::ByTask => write!(f, "by-task"),
        }
    }
}

/// Normalization applied to a user's summed hours.
///
/// With both fields unset the workload is the raw hour sum.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WorkloadConfig {
    /// Hours are divided by this value (for example 8.0 to report person-days).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub divisor: Option<f64>,

    /// Number of decimal digits kept after division.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round_digits: Option<u32>,
}

impl WorkloadConfig {
    /// Apply the configured normalization to a raw hour sum.
    ///
    /// A zero divisor is ignored rather than producing infinities.
    #[must_use]
    pub fn apply(&self, hours: f64) -> f64 {
        let value = match self.divisor {
            Some(divisor) if divisor != 0.0 => hours / divisor,
            _ => hours,
        };

        match self.round_digits {
            Some(digits) => {
                let factor = 10f64.powi(digits.min(15) as i32);
                (value * factor).round() / factor
            }
            None => value,
        }
    }
}

/// User configuration loaded from `~/.worktable/config.toml`.
///
/// # Examples
///
/// ```rust
/// use worktable::config::{GlobalConfig, Layout};
///
/// let config: GlobalConfig = toml::from_str(r#"
///     url = "https://redmine.example.com"
///     layout = "by-task"
/// "#).unwrap();
///
/// assert_eq!(config.layout, Layout::ByTask);
/// assert_eq!(config.page_size, 20);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Base URL of the Redmine server.
    pub url: Option<String>,

    /// REST API key. Takes precedence over username/password.
    pub key: Option<String>,

    /// Login name for basic authentication and the form login.
    pub username: Option<String>,

    /// Password for basic authentication and the form login.
    pub password: Option<String>,

    /// Time entries requested per page.
    pub page_size: usize,

    /// Template document describing the report columns.
    pub template: PathBuf,

    /// Directory receiving generated reports; created when missing.
    pub output_dir: PathBuf,

    /// Resource tree layout.
    pub layout: Layout,

    /// First sheet row written by the renderer.
    pub start_row: u32,

    /// First sheet column written by the renderer.
    pub start_column: u32,

    /// Whether runs of equal values in `merge` columns become merged cells.
    pub merge_cells: bool,

    /// Normalization of per-user workload.
    pub workload: WorkloadConfig,

    /// Extra custom-field tables, attribute name → remote custom-field name, per kind.
    ///
    /// Entries here extend and override the built-in tables.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_fields: BTreeMap<ResourceKind, BTreeMap<String, String>>,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            url: None,
            key: None,
            username: None,
            password: None,
            page_size: DEFAULT_PAGE_SIZE,
            template: PathBuf::from(DEFAULT_TEMPLATE),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            layout: Layout::default(),
            start_row: DEFAULT_START_ROW,
            start_column: DEFAULT_START_COLUMN,
            merge_cells: false,
            workload: WorkloadConfig::default(),
            custom_fields: BTreeMap::new(),
        }
    }
}

impl GlobalConfig {
    /// Load configuration from the default location, or defaults if no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The default path cannot be determined
    /// - The file exists but cannot be read
    /// - The file contains invalid TOML syntax
    pub async fn load() -> Result<Self> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from(&path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an optional path.
    ///
    /// If a path is provided, loads from that path. Otherwise, loads from the default
    /// location (`~/.worktable/config.toml`).
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None => return Self::load().await,
        };
        if path.exists() {
            Self::load_from(&path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read (permissions, not found, etc.)
    /// - The file contains invalid TOML syntax
    /// - The TOML structure doesn't match the expected schema
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Get the default file path for the configuration: `~/.worktable/config.toml`.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Unable to determine home directory"))?
            .join(".worktable");

        Ok(config_dir.join("config.toml"))
    }

    /// Template path with `~` and environment variables expanded.
    ///
    /// # Errors
    ///
    /// Returns an error if the path references an undefined environment variable.
    pub fn template_path(&self) -> Result<PathBuf> {
        expand_path(&self.template)
    }

    /// Output directory with `~` and environment variables expanded.
    ///
    /// # Errors
    ///
    /// Returns an error if the path references an undefined environment variable.
    pub fn output_path(&self) -> Result<PathBuf> {
        expand_path(&self.output_dir)
    }
}

fn expand_path(path: &Path) -> Result<PathBuf> {
    let raw = path.to_string_lossy();
    let expanded = shellexpand::full(&raw)
        .with_context(|| format!("Failed to expand environment variables in path: {raw}"))?;
    Ok(PathBuf::from(expanded.into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_global_config_default() {
        let config = GlobalConfig::default();
        assert_eq!(config.page_size, 20);
        assert_eq!(config.start_row, 2);
        assert_eq!(config.start_column, 1);
        assert_eq!(config.output_dir, PathBuf::from("work tables"));
        assert_eq!(config.layout, Layout::ByUser);
        assert!(!config.merge_cells);
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("config.toml");
        tokio::fs::write(
            &config_path,
            r#"
url = "https://redmine.example.com"
key = "secret"
page_size = 50
merge_cells = true

[workload]
divisor = 8.0

[custom_fields.project]
custom_num = "Number"
"#,
        )
        .await
        .unwrap();

        let config = GlobalConfig::load_from(&config_path).await.unwrap();
        assert_eq!(config.url.as_deref(), Some("https://redmine.example.com"));
        assert_eq!(config.page_size, 50);
        assert!(config.merge_cells);
        assert_eq!(config.workload.divisor, Some(8.0));
        assert_eq!(
            config.custom_fields[&ResourceKind::Project].get("custom_num").map(String::as_str),
            Some("Number")
        );
        // Unspecified fields keep their defaults
        assert_eq!(config.start_row, 2);
    }

    #[tokio::test]
    async fn test_load_with_optional_missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let config =
            GlobalConfig::load_with_optional(Some(temp.path().join("absent.toml"))).await.unwrap();
        assert_eq!(config.page_size, 20);
    }

    #[tokio::test]
    async fn test_load_invalid_toml() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("config.toml");
        tokio::fs::write(&config_path, "page_size = [").await.unwrap();

        let result = GlobalConfig::load_from(&config_path).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_workload_normalization() {
        let raw = WorkloadConfig::default();
        assert_eq!(raw.apply(12.5), 12.5);

        let days = WorkloadConfig {
            divisor: Some(8.0),
            round_digits: Some(2),
        };
        assert_eq!(days.apply(10.0), 1.25);
        assert_eq!(days.apply(1.0), 0.13);

        let zero = WorkloadConfig {
            divisor: Some(0.0),
            round_digits: None,
        };
        assert_eq!(zero.apply(3.0), 3.0);
    }

    #[test]
    fn test_expand_path_plain() {
        let config = GlobalConfig::default();
        assert_eq!(config.template_path().unwrap(), PathBuf::from("template.toml"));
    }
}
