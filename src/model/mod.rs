//! View model: turn a [`PlanSummary`] into everything the timeline page draws.
//!
//! The HTML template does no arithmetic of its own beyond mapping
//! milliseconds and row indices to pixels.

use crate::diagnostics;
use crate::plan::{PlanSummary, group_thousands};

use serde::Serialize;

pub const DEFAULT_TITLE: &str = "PostgreSQL EXPLAIN ANALYZE output visualization";
pub const DEFAULT_WRAP_WIDTH: usize = 20;

/// Number of colors in the page palette; rows cycle through it.
pub const PALETTE_SIZE: usize = 10;
/// Marker area of the row with the most rows.
pub const BUBBLE_SCALE: f64 = 1000.0;
/// Extra room to the right of the longest bar.
pub const X_PADDING_MS: f64 = 100.0;

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub title: String,
    pub wrap_width: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            wrap_width: DEFAULT_WRAP_WIDTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineRowView {
    /// y position, same as the index in `PlanSummary::operations`.
    pub index: usize,
    pub label: String,
    /// Label with `\n` inserted for the y axis.
    pub wrapped_label: String,
    pub color_index: usize,
    pub start_ms: f64,
    pub end_ms: f64,
    pub mid_ms: f64,
    pub row_count: u64,
    pub loop_count: u64,
    pub bubble_size: f64,
    pub bubble_text: String,
    pub sort_annotation: Option<String>,
    /// False for a leading synthesized total; it still takes a y slot.
    pub plotted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    PlanningTime,
    ExecutionTime,
}

/// Callout arrow pointing at a time on the top row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerView {
    pub kind: MarkerKind,
    pub at_ms: f64,
    pub y: usize,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TotalsView {
    pub operations: usize,
    pub max_row_count: u64,
    pub planning_time_ms: Option<f64>,
    pub execution_time_ms: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineReport {
    pub title: String,
    pub rows: Vec<TimelineRowView>,
    /// Labels of plotted rows, top of the chart first.
    pub legend: Vec<String>,
    pub markers: Vec<MarkerView>,
    pub x_max_ms: f64,
    pub totals: TotalsView,
    pub warnings: Vec<String>,
}

/// Build the timeline view for a parsed report.
pub fn build_timeline_report(summary: &PlanSummary, options: &RenderOptions) -> TimelineReport {
    let ops = &summary.operations;
    let count = ops.len();
    let max_rows = summary.max_row_count();

    let mut rows = Vec::with_capacity(count);
    for (i, op) in ops.iter().enumerate() {
        let bubble_size = if max_rows == 0 {
            0.0
        } else {
            BUBBLE_SCALE * (op.row_count as f64 / max_rows as f64)
        };

        // The last row is the plan's root node; it reports the row count of
        // the node just beneath it as the query total.
        let bubble_text = if i + 1 < count {
            format!(
                "rows: {}\nloops: {}",
                group_thousands(op.row_count),
                group_thousands(op.loop_count)
            )
        } else {
            let total_rows = ops[count.saturating_sub(2)].row_count;
            format!("Total rows: {}", group_thousands(total_rows))
        };

        rows.push(TimelineRowView {
            index: i,
            label: op.label.clone(),
            wrapped_label: wrap_label(&op.label, options.wrap_width),
            color_index: i % PALETTE_SIZE,
            start_ms: op.start_ms,
            end_ms: op.end_ms,
            mid_ms: (op.start_ms + op.end_ms) / 2.0,
            row_count: op.row_count,
            loop_count: op.loop_count,
            bubble_size,
            bubble_text,
            sort_annotation: op.sort_annotation.clone(),
            plotted: !(i == 0 && op.is_total_execution()),
        });
    }

    let legend: Vec<String> = rows
        .iter()
        .rev()
        .filter(|r| r.plotted)
        .map(|r| r.label.clone())
        .collect();

    let mut warnings = Vec::new();
    let mut markers = Vec::new();
    let top = count.saturating_sub(1);

    match summary.planning_time_ms {
        Some(ms) => markers.push(MarkerView {
            kind: MarkerKind::PlanningTime,
            at_ms: ms,
            y: top,
            text: format!("Planning Time:\n{:.2} ms", ms),
        }),
        None => warnings.push("no Planning Time line found".to_string()),
    }
    match summary.execution_time_ms {
        Some(ms) => markers.push(MarkerView {
            kind: MarkerKind::ExecutionTime,
            at_ms: ms,
            y: top,
            text: format!("Total Execution Time:\n{:.2} ms", ms),
        }),
        None => warnings.push("no Execution Time line found".to_string()),
    }
    if count == 0 {
        warnings.push("no operations with actual timing found".to_string());
    }
    for w in &warnings {
        diagnostics::warn(w);
    }

    TimelineReport {
        title: options.title.clone(),
        rows,
        legend,
        markers,
        x_max_ms: summary.max_end_ms().unwrap_or(0.0) + X_PADDING_MS,
        totals: TotalsView {
            operations: count,
            max_row_count: max_rows,
            planning_time_ms: summary.planning_time_ms,
            execution_time_ms: summary.execution_time_ms,
        },
        warnings,
    }
}

/// Greedy word wrap; words longer than `width` are split.
pub fn wrap_label(text: &str, width: usize) -> String {
    let width = width.max(1);
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word = word;
        while !word.is_empty() {
            let cur_len = current.chars().count();
            let word_len = word.chars().count();
            let needed = if current.is_empty() {
                word_len
            } else {
                cur_len + 1 + word_len
            };

            if needed <= width {
                if !current.is_empty() {
                    current.push(' ');
                }
                current.push_str(word);
                break;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
                continue;
            }

            let split = word
                .char_indices()
                .nth(width)
                .map_or(word.len(), |(idx, _)| idx);
            lines.push(word[..split].to_string());
            word = &word[split..];
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests;
