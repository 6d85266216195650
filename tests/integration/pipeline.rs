//! End-to-end report runs against in-memory fixtures.

use crate::common::TestWorkspace;
use serde_json::json;
use worktable::config::Layout;
use worktable::core::{ReportError, ResourceKind};
use worktable::report::run_report;
use worktable::test_utils::{FixtureSource, init_test_logging, time_entry};

fn march_entries() -> Vec<worktable::remote::RemoteRecord> {
    vec![
        time_entry(1, (10, "Alpha"), (3, "Li"), Some(100), json!(2.5)),
        time_entry(2, (10, "Alpha"), (4, "Han"), Some(101), json!(1.0)),
        time_entry(3, (10, "Alpha"), (3, "Li"), Some(102), json!("n/a")),
        time_entry(4, (11, "Beta"), (3, "Li"), Some(103), json!(4.0)),
        time_entry(5, (10, "Alpha"), (3, "Li"), Some(100), json!(1.0)),
    ]
}

#[tokio::test]
async fn test_report_written_once_with_expected_name() {
    init_test_logging(None);
    let workspace = TestWorkspace::new();
    let source = FixtureSource::new(march_entries());

    let outcome = run_report(&source, &workspace.config(Layout::ByUser)).await.unwrap();

    assert_eq!(outcome.harvest.ingested, 5);
    assert_eq!(outcome.render.rows, 3);
    assert_eq!(outcome.render.merges, 1);
    assert_eq!(outcome.projects, 2);

    let outputs = workspace.outputs();
    assert_eq!(outputs, vec![outcome.path.clone()]);
    let name = outcome.path.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("2024-03-01--2024-03-31 created on "), "{name}");
    assert!(name.ends_with(".xlsx"));

    // xlsx is a zip container
    let bytes = std::fs::read(&outcome.path).unwrap();
    assert_eq!(&bytes[..2], b"PK");
}

#[tokio::test]
async fn test_pages_requested_until_total_reached() {
    let workspace = TestWorkspace::new();
    let source = FixtureSource::new(march_entries());

    run_report(&source, &workspace.config(Layout::ByUser)).await.unwrap();

    assert_eq!(source.page_requests(), vec![(0, 1), (0, 2), (2, 2), (4, 2)]);
}

#[tokio::test]
async fn test_no_entries_fails_without_output() {
    let workspace = TestWorkspace::new();
    let source = FixtureSource::new(Vec::new());

    let err = run_report(&source, &workspace.config(Layout::ByUser)).await.unwrap_err();

    assert!(matches!(err.downcast_ref::<ReportError>(), Some(ReportError::NoRowsRendered)));
    assert!(workspace.outputs().is_empty());
}

#[tokio::test]
async fn test_render_failure_leaves_no_output() {
    let workspace = TestWorkspace::with_template(
        r#"
rows = [
    ["Project", "Check"],
    ["{{ project.name | merge }}", "{% if project.name == \"Beta\" %}{{ no_such_value }}{% endif %}ok"],
]
"#,
    );
    let source = FixtureSource::new(march_entries());

    let err = run_report(&source, &workspace.config(Layout::ByUser)).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ReportError>(),
        Some(ReportError::RenderAborted { row: 4, .. })
    ));
    assert!(workspace.outputs().is_empty());
}

#[tokio::test]
async fn test_unknown_scope_fails_before_harvest() {
    let workspace = TestWorkspace::new();
    let source = FixtureSource::new(march_entries()).with_project(10, "alpha", "Alpha");
    let mut config = workspace.config(Layout::ByUser);
    config.scope = Some("missing".to_string());

    let err = run_report(&source, &config).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ReportError>(),
        Some(ReportError::ProjectNotFound { .. })
    ));
    assert!(source.page_requests().is_empty());
}

#[tokio::test]
async fn test_scope_limits_projects() {
    let workspace = TestWorkspace::new();
    let source = FixtureSource::new(march_entries())
        .with_project(11, "beta", "Beta")
        .with_children(11, &[(12, "Beta tools")]);
    let mut config = workspace.config(Layout::ByUser);
    config.scope = Some("beta".to_string());

    let outcome = run_report(&source, &config).await.unwrap();

    assert_eq!(outcome.projects, 1);
    assert_eq!(outcome.render.rows, 1);
    assert_eq!(outcome.render.merges, 0);
}

#[tokio::test]
async fn test_by_task_layout_rows() {
    let workspace = TestWorkspace::with_template(
        r#"
rows = [
    ["Project", "Parent", "Task", "Hours"],
    ["{{ project.name | merge }}", "{{ parent.name | default(value='') }}", "{{ task.name }}", "{{ task.spent_time }}"],
]
"#,
    );
    let source = FixtureSource::new(march_entries())
        .with_issue(100, Some(90))
        .with_issue(101, Some(90))
        .with_issue(102, None)
        .with_issue(103, None)
        .with_full(
            ResourceKind::Task,
            worktable::remote::RemoteRecord::new(90).with_field("subject", "Release"),
        );

    let outcome = run_report(&source, &workspace.config(Layout::ByTask)).await.unwrap();

    // Alpha: 90/100, 90/101, 102; Beta: 103
    assert_eq!(outcome.render.rows, 4);
    assert_eq!(source.full_fetches(ResourceKind::Task, 100), 1);
    assert_eq!(workspace.outputs().len(), 1);
}

#[tokio::test]
async fn test_missing_template_fails_before_harvest() {
    let workspace = TestWorkspace::new();
    std::fs::remove_file(workspace.template_path()).unwrap();
    let source = FixtureSource::new(march_entries());

    let err = run_report(&source, &workspace.config(Layout::ByUser)).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ReportError>(),
        Some(ReportError::TemplateNotFound { .. })
    ));
    assert!(source.page_requests().is_empty());
}

#[tokio::test]
async fn test_page_failure_is_terminal() {
    let workspace = TestWorkspace::new();
    let source = FixtureSource::new(march_entries()).failing_pages();

    let err = run_report(&source, &workspace.config(Layout::ByUser)).await.unwrap_err();

    assert!(err.chain().any(|e| e.to_string().contains("Network error")));
    assert!(workspace.outputs().is_empty());
}
