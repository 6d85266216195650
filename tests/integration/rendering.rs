//! Harvest and render into a recording document, checking cell values.

use serde_json::json;
use std::collections::BTreeMap;
use worktable::config::{Layout, ReportPeriod, WorkloadConfig};
use worktable::core::ResourceKind;
use worktable::document::CellRange;
use worktable::graph::{KindTable, ResourceGraph};
use worktable::harvest::{HarvestOptions, Harvester};
use worktable::remote::RemoteRecord;
use worktable::table::{ColumnSpec, RenderOptions, ReportInfo, TableRenderer};
use worktable::test_utils::{FixtureSource, RecordingDocument, time_entry};

async fn render(
    source: &FixtureSource,
    graph: &mut ResourceGraph,
    bodies: &[&str],
) -> RecordingDocument {
    let period = ReportPeriod::month(2024, 3).unwrap();
    let options = HarvestOptions {
        page_size: 3,
        layout: Layout::ByUser,
    };
    Harvester::new(source, &period, options).run(graph).await.unwrap();

    let columns = bodies
        .iter()
        .enumerate()
        .map(|(i, body)| ColumnSpec::new(i as u32 + 1, format!("C{}", i + 1), *body))
        .collect();
    let renderer = TableRenderer::new(
        columns,
        ReportInfo::default(),
        RenderOptions {
            enable_merge: true,
            ..RenderOptions::default()
        },
    )
    .unwrap();

    let mut document = RecordingDocument::default();
    let rows = graph.rows(Layout::ByUser);
    renderer.render(&mut document, graph, &rows, source).await.unwrap();
    document
}

#[tokio::test]
async fn test_custom_fields_and_fullname() {
    let source = FixtureSource::new(vec![
        time_entry(1, (10, "Alpha"), (3, "Li"), Some(100), json!(2.0)),
        time_entry(2, (10, "Alpha"), (4, "Han"), Some(101), json!(1.5)),
    ])
    .with_full(
        ResourceKind::Project,
        RemoteRecord::from_value(&json!({
            "id": 10,
            "name": "Alpha",
            "custom_fields": [
                {"id": 1, "name": "项目编号", "value": "P-001"},
                {"id": 2, "name": "项目负责人", "value": null},
            ],
        }))
        .unwrap(),
    )
    .with_full(
        ResourceKind::User,
        RemoteRecord::from_value(&json!({"id": 3, "lastname": "Li", "firstname": "Lei"})).unwrap(),
    );
    let mut graph = ResourceGraph::default();

    let document = render(
        &source,
        &mut graph,
        &[
            "{{ project.custom_num | merge }}",
            "{{ project.custom_leader }}",
            "{{ user.fullname }}",
        ],
    )
    .await;

    assert_eq!(document.text(2, 1), Some("P-001"));
    assert!(document.merges().contains(&CellRange::column_span(1, 2, 3)));
    // null custom field renders empty
    assert_eq!(document.text(2, 2), Some(""));
    assert_eq!(document.text(2, 3), Some("LiLei"));
    // Han has no full record: fullname is null
    assert_eq!(document.text(3, 3), Some(""));
    // Project full record fetched once for both rows and both attributes
    assert_eq!(source.full_fetches(ResourceKind::Project, 10), 1);
}

#[tokio::test]
async fn test_workload_per_project() {
    let source = FixtureSource::new(vec![
        time_entry(1, (10, "Alpha"), (3, "Li"), Some(100), json!(2.5)),
        time_entry(2, (10, "Alpha"), (3, "Li"), Some(101), json!("n/a")),
        time_entry(3, (10, "Alpha"), (3, "Li"), Some(100), json!(1.0)),
        time_entry(4, (11, "Beta"), (3, "Li"), Some(200), json!(4.0)),
    ]);
    let workload = WorkloadConfig {
        divisor: Some(0.5),
        round_digits: None,
    };
    let mut graph = ResourceGraph::new(KindTable::new(&BTreeMap::new()), workload);

    let document = render(&source, &mut graph, &["{{ project.name }}", "{{ user.spent_time }}"]).await;

    // 3.5 hours in Alpha, 4 in Beta, each divided by 0.5
    assert_eq!(document.text(2, 1), Some("Alpha"));
    assert_eq!(document.text(2, 2), Some("7"));
    assert_eq!(document.text(3, 1), Some("Beta"));
    assert_eq!(document.text(3, 2), Some("8"));
}

#[tokio::test]
async fn test_literal_columns_and_gaps() {
    let source = FixtureSource::new(vec![
        time_entry(1, (10, "Alpha"), (3, "Li"), Some(100), json!(1.5)),
        time_entry(2, (10, "Alpha"), (4, "Han"), Some(101), json!(1.5)),
    ]);
    let mut graph = ResourceGraph::default();

    let document = render(&source, &mut graph, &["Dev", "{{ user.spent_time | merge }}"]).await;

    assert_eq!(document.text(2, 1), Some("Dev"));
    assert_eq!(document.text(3, 1), Some("Dev"));
    assert!(document.merges().contains(&CellRange::column_span(2, 2, 3)));
    assert_eq!(document.text(3, 2), None);
}
