use super::*;
use crate::plan::timeline::{ParsedOperation, TOTAL_EXECUTION_LABEL, parse_plan_text};
use pretty_assertions::assert_eq;

fn op(label: &str, start_ms: f64, end_ms: f64, rows: u64, loops: u64) -> ParsedOperation {
    ParsedOperation {
        label: label.to_string(),
        start_ms,
        end_ms,
        row_count: rows,
        loop_count: loops,
        sort_annotation: None,
    }
}

fn summary_with_total() -> PlanSummary {
    let total = op(TOTAL_EXECUTION_LABEL, 0.0, 60.0, 0, 1);
    let mut sort = op("Sort", 40.0, 50.0, 2500, 1);
    sort.sort_annotation = Some("quicksort Memory\n25 kB".to_string());

    PlanSummary {
        planning_time_ms: Some(1.234),
        execution_time_ms: Some(60.0),
        operations: vec![total, op("Seq Scan on orders", 0.5, 30.0, 10000, 2), sort],
        ..PlanSummary::default()
    }
}

#[test]
fn wrap_label_breaks_on_words() {
    assert_eq!(
        wrap_label("Bitmap Heap Scan on customers c", 20),
        "Bitmap Heap Scan on\ncustomers c"
    );
    assert_eq!(wrap_label("Sort", 20), "Sort");
    assert_eq!(wrap_label("", 20), "");
}

#[test]
fn wrap_label_splits_long_words() {
    assert_eq!(
        wrap_label("customers_active_idx_long", 10),
        "customers_\nactive_idx\n_long"
    );
    assert_eq!(wrap_label("ab cd", 0), "a\nb\nc\nd");
}

#[test]
fn rows_carry_derived_values() {
    let report = build_timeline_report(&summary_with_total(), &RenderOptions::default());

    assert_eq!(report.rows.len(), 3);

    let scan = &report.rows[1];
    assert_eq!(scan.index, 1);
    assert_eq!(scan.color_index, 1);
    assert_eq!(scan.mid_ms, 15.25);
    assert_eq!(scan.bubble_size, 1000.0);
    assert_eq!(scan.bubble_text, "rows: 10,000\nloops: 2");
    assert!(scan.plotted);

    let sort = &report.rows[2];
    assert_eq!(sort.bubble_size, 250.0);
    assert_eq!(sort.bubble_text, "Total rows: 10,000");
    assert_eq!(sort.sort_annotation.as_deref(), Some("quicksort Memory\n25 kB"));
}

#[test]
fn leading_total_is_not_plotted() {
    let report = build_timeline_report(&summary_with_total(), &RenderOptions::default());

    assert!(!report.rows[0].plotted);
    assert_eq!(report.legend, vec!["Sort".to_string(), "Seq Scan on orders".to_string()]);
}

#[test]
fn markers_and_axis() {
    let report = build_timeline_report(&summary_with_total(), &RenderOptions::default());

    assert_eq!(
        report.markers,
        vec![
            MarkerView {
                kind: MarkerKind::PlanningTime,
                at_ms: 1.234,
                y: 2,
                text: "Planning Time:\n1.23 ms".to_string(),
            },
            MarkerView {
                kind: MarkerKind::ExecutionTime,
                at_ms: 60.0,
                y: 2,
                text: "Total Execution Time:\n60.00 ms".to_string(),
            },
        ]
    );
    assert_eq!(report.x_max_ms, 160.0);
    assert_eq!(report.title, DEFAULT_TITLE);
    assert!(report.warnings.is_empty());
}

#[test]
fn missing_times_become_warnings() {
    let summary = PlanSummary {
        operations: vec![op("Seq Scan on t", 0.0, 1.0, 0, 1)],
        ..PlanSummary::default()
    };
    let report = build_timeline_report(&summary, &RenderOptions::default());

    assert!(report.markers.is_empty());
    assert_eq!(
        report.warnings,
        vec![
            "no Planning Time line found".to_string(),
            "no Execution Time line found".to_string(),
        ]
    );
    // Every row count is zero.
    assert_eq!(report.rows[0].bubble_size, 0.0);
    assert_eq!(report.rows[0].bubble_text, "Total rows: 0");
}

#[test]
fn empty_summary_still_builds() {
    let report = build_timeline_report(&PlanSummary::default(), &RenderOptions::default());

    assert!(report.rows.is_empty());
    assert!(report.legend.is_empty());
    assert_eq!(report.x_max_ms, X_PADDING_MS);
    assert_eq!(report.warnings.len(), 3);
}

#[test]
fn options_flow_into_report() {
    let options = RenderOptions {
        title: "orders by date".to_string(),
        wrap_width: 8,
    };
    let summary = parse_plan_text(
        "Seq Scan on orders  (cost=0.00..1.00 rows=5 width=4) (actual time=0.01..0.02 rows=5 loops=1)",
    )
    .expect("parse");
    let report = build_timeline_report(&summary, &options);

    assert_eq!(report.title, "orders by date");
    assert_eq!(report.rows[0].wrapped_label, "Seq Scan\non\norders");
}

#[test]
fn colors_cycle_through_palette() {
    let summary = PlanSummary {
        operations: (0..12).map(|i| op(&format!("node {i}"), 0.0, 1.0, 1, 1)).collect(),
        ..PlanSummary::default()
    };
    let report = build_timeline_report(&summary, &RenderOptions::default());

    let colors: Vec<usize> = report.rows.iter().map(|r| r.color_index).collect();
    assert_eq!(colors, vec![0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 0, 1]);
}
