//! Binary-level tests that never reach a server.

use crate::common::TestWorkspace;
use assert_cmd::Command;
use predicates::prelude::*;

fn worktable(workspace: &TestWorkspace) -> Command {
    let mut cmd = Command::cargo_bin("worktable").unwrap();
    cmd.current_dir(workspace.root())
        .env("HOME", workspace.root())
        .env("WORKTABLE_NO_PROGRESS", "1")
        .env("NO_COLOR", "1")
        .env_remove("WORKTABLE_URL")
        .env_remove("WORKTABLE_KEY")
        .env_remove("WORKTABLE_PASSWORD")
        .env_remove("WORKTABLE_LOG");
    cmd
}

#[test]
fn test_help_lists_commands() {
    let workspace = TestWorkspace::new();
    worktable(&workspace)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("generate"))
        .stdout(predicate::str::contains("columns"));
}

#[test]
fn test_columns_table() {
    let workspace = TestWorkspace::new();
    worktable(&workspace)
        .arg("columns")
        .arg("--template")
        .arg(workspace.template_path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Project"))
        .stdout(predicate::str::contains("merge"))
        .stdout(predicate::str::contains("3 columns"));
}

#[test]
fn test_columns_json() {
    let workspace = TestWorkspace::new();
    let output = worktable(&workspace)
        .args(["columns", "--json", "--template"])
        .arg(workspace.template_path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let columns: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(columns.as_array().unwrap().len(), 3);
    assert_eq!(columns[0]["kind"], "merge");
    assert_eq!(columns[0]["references"][0], "project.name");
    assert_eq!(columns[2]["label"], "Hours");
}

#[test]
fn test_columns_missing_template() {
    let workspace = TestWorkspace::new();
    worktable(&workspace)
        .args(["columns", "--template", "absent.toml"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Template file not found"));
}

#[test]
fn test_generate_rejects_bad_month() {
    let workspace = TestWorkspace::new();
    worktable(&workspace)
        .args(["generate", "--url", "http://127.0.0.1:9", "--month", "13"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Invalid reporting period"));
    assert!(workspace.outputs().is_empty());
}

#[test]
fn test_generate_requires_url() {
    let workspace = TestWorkspace::new();
    worktable(&workspace)
        .args(["generate", "--month", "3", "--config"])
        .arg(workspace.root().join("absent.toml"))
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("No server URL"));
}

#[test]
fn test_generate_requires_period() {
    let workspace = TestWorkspace::new();
    worktable(&workspace)
        .args(["generate", "--url", "http://127.0.0.1:9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--month"));
}

#[test]
fn test_bundled_templates_parse() {
    let workspace = TestWorkspace::new();
    let demos = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("demos");
    for (file, count) in [("template.toml", 7), ("by-task.toml", 4)] {
        let output = worktable(&workspace)
            .args(["columns", "--json", "--template"])
            .arg(demos.join(file))
            .output()
            .unwrap();
        assert!(output.status.success(), "{file}");
        let columns: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(columns.as_array().unwrap().len(), count, "{file}");
    }
}
