//! Accumulate classified lines into a [`PlanSummary`].
//!
//! The report is scanned bottom-up. Consequences worth knowing when reading
//! the output:
//! - `operations` lists plan nodes from the last printed node to the first;
//! - `Execution Time` sits at the bottom of a report, so the synthesized
//!   total usually comes first;
//! - a `Sort Method` line is printed *below* its sort node, so in the
//!   reversed scan it is seen just before that node and is attached to the
//!   next operation the scan meets. A sort line with no operation above it
//!   falls back to the operation printed directly below it.

use crate::Result;
use crate::diagnostics;
use crate::plan::line::{LineClassifier, OperationLine, PlanLine, clean_line};

use anyhow::{Context, bail};
use serde::Serialize;
use std::fmt::Write;
use std::fs;

/// Label of the operation synthesized from the `Execution Time` line.
pub const TOTAL_EXECUTION_LABEL: &str = "Total Execution Time";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedOperation {
    pub label: String,
    pub start_ms: f64,
    pub end_ms: f64,
    pub row_count: u64,
    pub loop_count: u64,
    pub sort_annotation: Option<String>,
}

impl ParsedOperation {
    fn total_execution(execution_ms: f64) -> Self {
        Self {
            label: TOTAL_EXECUTION_LABEL.to_string(),
            start_ms: 0.0,
            end_ms: execution_ms,
            row_count: 0,
            loop_count: 1,
            sort_annotation: None,
        }
    }

    pub fn is_total_execution(&self) -> bool {
        self.label == TOTAL_EXECUTION_LABEL
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlanSummary {
    pub planning_time_ms: Option<f64>,
    pub execution_time_ms: Option<f64>,
    /// In reverse-scan order, see the module docs.
    pub operations: Vec<ParsedOperation>,
    /// `Buffers:` payloads, in scan order.
    pub buffers: Vec<String>,
    /// `Heap Blocks: exact=` counts, in scan order.
    pub heap_blocks: Vec<u64>,
}

impl PlanSummary {
    pub fn max_row_count(&self) -> u64 {
        self.operations.iter().map(|op| op.row_count).max().unwrap_or(0)
    }

    pub fn max_end_ms(&self) -> Option<f64> {
        self.operations.iter().map(|op| op.end_ms).reduce(f64::max)
    }

    /// Plain-text dump for the console.
    pub fn describe(&self) -> String {
        let fmt_ms =
            |ms: Option<f64>| ms.map_or_else(|| "n/a".to_string(), |v| format!("{} ms", v));

        // Writing into a String cannot fail.
        let mut out = String::new();
        let _ = writeln!(out, "planning_time: {}", fmt_ms(self.planning_time_ms));
        let _ = writeln!(out, "execution_time: {}", fmt_ms(self.execution_time_ms));
        out.push_str("parts:\n");
        for (i, op) in self.operations.iter().enumerate() {
            let _ = writeln!(
                out,
                "  [{}] {} ({}..{} ms, rows={}, loops={})",
                i, op.label, op.start_ms, op.end_ms, op.row_count, op.loop_count
            );
            if let Some(sort) = &op.sort_annotation {
                let _ = writeln!(out, "      sort: {}", sort.replace('\n', ", "));
            }
        }
        out
    }
}

#[derive(Debug)]
struct PendingSort {
    annotation: String,
    /// Index of the operation printed directly below the sort line.
    below: Option<usize>,
}

/// Single-pass accumulator. The only state carried between lines is the
/// pending sort annotation.
#[derive(Debug, Default)]
pub struct TimelineBuilder {
    pending_sort: Option<PendingSort>,
    summary: PlanSummary,
}

impl TimelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, line: PlanLine) {
        match line {
            PlanLine::Operation(op) => self.push_operation(op),
            PlanLine::SortMethod(sort) => {
                let below = self
                    .summary
                    .operations
                    .len()
                    .checked_sub(1)
                    .filter(|&idx| !self.summary.operations[idx].is_total_execution());
                let replaced = self.pending_sort.replace(PendingSort {
                    annotation: sort.annotation(),
                    below,
                });
                if let Some(old) = replaced {
                    tracing::debug!(
                        annotation = %old.annotation,
                        "sort method overwritten before use"
                    );
                }
            }
            PlanLine::PlanningTime(ms) => {
                self.summary.planning_time_ms = Some(ms);
            }
            PlanLine::ExecutionTime(ms) => {
                self.summary.execution_time_ms = Some(ms);
                self.summary
                    .operations
                    .push(ParsedOperation::total_execution(ms));
            }
            PlanLine::Buffers(raw) => self.summary.buffers.push(raw),
            PlanLine::HeapBlocks(n) => self.summary.heap_blocks.push(n),
        }
    }

    fn push_operation(&mut self, op: OperationLine) {
        if op.start_ms > op.end_ms {
            diagnostics::warn(format!(
                "operation '{}' starts after it ends ({} > {} ms)",
                op.label, op.start_ms, op.end_ms
            ));
        }

        self.summary.operations.push(ParsedOperation {
            label: op.label,
            start_ms: op.start_ms,
            end_ms: op.end_ms,
            row_count: op.row_count,
            loop_count: op.loop_count,
            sort_annotation: self.pending_sort.take().map(|p| p.annotation),
        });
    }

    pub fn finish(mut self) -> PlanSummary {
        if let Some(orphan) = self.pending_sort.take() {
            let target = match orphan.below {
                Some(idx) => self.summary.operations.get_mut(idx),
                None => None,
            };
            match target {
                Some(op) if op.sort_annotation.is_none() => {
                    op.sort_annotation = Some(orphan.annotation);
                }
                _ => {
                    tracing::debug!(
                        annotation = %orphan.annotation,
                        "sort method without an operation"
                    );
                }
            }
        }
        self.summary
    }
}

/// Walk the report bottom-up, yielding 1-based line numbers with each line.
pub fn reverse_scan(text: &str) -> impl Iterator<Item = (usize, &str)> {
    let lines: Vec<&str> = text.lines().collect();
    lines
        .into_iter()
        .enumerate()
        .rev()
        .map(|(idx, line)| (idx + 1, line))
}

/// Parse a whole report held in memory.
pub fn parse_plan_text(text: &str) -> Result<PlanSummary> {
    let classifier = LineClassifier::new()?;
    let mut builder = TimelineBuilder::new();

    for (lno, raw) in reverse_scan(text) {
        let line = clean_line(raw);
        match classifier.classify(line) {
            Ok(Some(parsed)) => {
                tracing::debug!(line = lno, kind = %parsed.kind(), "matched");
                builder.apply(parsed);
            }
            Ok(None) => {
                tracing::trace!(line = lno, "skipped");
            }
            Err(err) => {
                bail!(
                    "{}",
                    diagnostics::error_message(format!("plan parse error at line {}: {}", lno, err))
                );
            }
        }
    }

    Ok(builder.finish())
}

/// Read and parse a report file.
pub fn parse_plan_file(path: &str) -> Result<PlanSummary> {
    let text = fs::read_to_string(path)
        .with_context(|| diagnostics::error_message(format!("cannot read file: {}", path)))?;

    parse_plan_text(&text).with_context(|| format!("parse {}", path))
}
