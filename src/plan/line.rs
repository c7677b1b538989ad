//! Classification of single `EXPLAIN ANALYZE` report lines.
//!
//! Each line is tried against an ordered table of patterns; the first one
//! that matches decides what the line is. Lines that match nothing are not
//! errors, they are simply not interesting (cost-only nodes, filters,
//! `Rows Removed by Filter`, blank lines, stray parentheses, ...).

use crate::plan::size::format_size;
use regex::{Captures, Regex};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Which pattern a line matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    Operation,
    Buffers,
    HeapBlocks,
    PlanningTime,
    ExecutionTime,
    SortMethod,
}

impl PatternKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PatternKind::Operation => "operation",
            PatternKind::Buffers => "buffers",
            PatternKind::HeapBlocks => "heap blocks",
            PatternKind::PlanningTime => "planning time",
            PatternKind::ExecutionTime => "execution time",
            PatternKind::SortMethod => "sort method",
        }
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a sort spilled to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SortTarget {
    Memory,
    Disk,
}

impl fmt::Display for SortTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortTarget::Memory => f.write_str("Memory"),
            SortTarget::Disk => f.write_str("Disk"),
        }
    }
}

/// `Sort Method: external merge  Disk: 4096kB`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SortMethod {
    pub method: String,
    pub target: SortTarget,
    /// Raw size as printed, e.g. `4096kB`.
    pub size: String,
}

impl SortMethod {
    /// Annotation text attached to the operation that owns this sort.
    pub fn annotation(&self) -> String {
        format!("{} {}\n{}", self.method, self.target, format_size(&self.size))
    }
}

/// A plan node with its measured timing.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationLine {
    pub label: String,
    pub start_ms: f64,
    pub end_ms: f64,
    pub row_count: u64,
    pub loop_count: u64,
}

/// Structured content of one matched line.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanLine {
    Operation(OperationLine),
    Buffers(String),
    HeapBlocks(u64),
    PlanningTime(f64),
    ExecutionTime(f64),
    SortMethod(SortMethod),
}

impl PlanLine {
    pub fn kind(&self) -> PatternKind {
        match self {
            PlanLine::Operation(_) => PatternKind::Operation,
            PlanLine::Buffers(_) => PatternKind::Buffers,
            PlanLine::HeapBlocks(_) => PatternKind::HeapBlocks,
            PlanLine::PlanningTime(_) => PatternKind::PlanningTime,
            PlanLine::ExecutionTime(_) => PatternKind::ExecutionTime,
            PlanLine::SortMethod(_) => PatternKind::SortMethod,
        }
    }
}

/// A line matched a pattern but its captures could not be converted.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LineError {
    #[error("{kind} line has malformed number {text:?}")]
    BadNumber { kind: PatternKind, text: String },

    #[error("{kind} line has unknown sort target {text:?}")]
    BadSortTarget { kind: PatternKind, text: String },

    #[error("{kind} line is missing capture group {group}")]
    MissingGroup { kind: PatternKind, group: usize },
}

type Extractor = fn(PatternKind, &Captures<'_>) -> Result<PlanLine, LineError>;

struct LinePattern {
    kind: PatternKind,
    re: Regex,
    extract: Extractor,
}

// Capture:
// 1) label: everything up to the cost parentheses, no '(' or ')'
// 2) actual start time
// 3) actual end time
// 4) rows
// 5) loops
const OPERATION_RE: &str = r"^\s*(?:->\s*)?([^()]+)\s+\(.*?\)\s+\(actual time=(\d+\.\d+)\.\.(\d+\.\d+) rows=(\d+) loops=(\d+)";
const BUFFERS_RE: &str = r"^Buffers: (.+)";
const HEAP_BLOCKS_RE: &str = r"^Heap Blocks: exact=(\d+)";
const PLANNING_TIME_RE: &str = r"^Planning Time: ([\d.]+) ms";
const EXECUTION_TIME_RE: &str = r"^Execution Time: ([\d.]+) ms";
const SORT_METHOD_RE: &str = r"^Sort Method: (\w+(?: \w+)?) .*(Memory|Disk): (\d+\w+)";

/// Ordered pattern table. The order is the match priority.
pub struct LineClassifier {
    patterns: Vec<LinePattern>,
}

impl LineClassifier {
    pub fn new() -> anyhow::Result<Self> {
        let table: [(PatternKind, &str, Extractor); 6] = [
            (PatternKind::Operation, OPERATION_RE, extract_operation),
            (PatternKind::Buffers, BUFFERS_RE, extract_buffers),
            (PatternKind::HeapBlocks, HEAP_BLOCKS_RE, extract_heap_blocks),
            (PatternKind::PlanningTime, PLANNING_TIME_RE, extract_planning_time),
            (PatternKind::ExecutionTime, EXECUTION_TIME_RE, extract_execution_time),
            (PatternKind::SortMethod, SORT_METHOD_RE, extract_sort_method),
        ];

        let mut patterns = Vec::with_capacity(table.len());
        for (kind, re, extract) in table {
            patterns.push(LinePattern {
                kind,
                re: Regex::new(re)?,
                extract,
            });
        }
        Ok(Self { patterns })
    }

    /// Classify an already cleaned line. `Ok(None)` means no pattern applies.
    pub fn classify(&self, line: &str) -> Result<Option<PlanLine>, LineError> {
        for pattern in &self.patterns {
            if let Some(caps) = pattern.re.captures(line) {
                return (pattern.extract)(pattern.kind, &caps).map(Some);
            }
        }
        Ok(None)
    }
}

/// Strip the `('` / `("` wrapping that tuple-printing clients put around
/// each plan row, then surrounding whitespace.
pub fn clean_line(line: &str) -> &str {
    line.trim_start_matches(['(', '\''])
        .trim_start_matches(['(', '"'])
        .trim()
}

fn group<'t>(kind: PatternKind, caps: &Captures<'t>, idx: usize) -> Result<&'t str, LineError> {
    caps.get(idx)
        .map(|m| m.as_str())
        .ok_or(LineError::MissingGroup { kind, group: idx })
}

fn number<T: FromStr>(kind: PatternKind, caps: &Captures<'_>, idx: usize) -> Result<T, LineError> {
    let text = group(kind, caps, idx)?;
    text.parse().map_err(|_| LineError::BadNumber {
        kind,
        text: text.to_string(),
    })
}

fn extract_operation(kind: PatternKind, caps: &Captures<'_>) -> Result<PlanLine, LineError> {
    Ok(PlanLine::Operation(OperationLine {
        label: group(kind, caps, 1)?.trim_end().to_string(),
        start_ms: number(kind, caps, 2)?,
        end_ms: number(kind, caps, 3)?,
        row_count: number(kind, caps, 4)?,
        loop_count: number(kind, caps, 5)?,
    }))
}

fn extract_buffers(kind: PatternKind, caps: &Captures<'_>) -> Result<PlanLine, LineError> {
    Ok(PlanLine::Buffers(group(kind, caps, 1)?.to_string()))
}

fn extract_heap_blocks(kind: PatternKind, caps: &Captures<'_>) -> Result<PlanLine, LineError> {
    Ok(PlanLine::HeapBlocks(number(kind, caps, 1)?))
}

fn extract_planning_time(kind: PatternKind, caps: &Captures<'_>) -> Result<PlanLine, LineError> {
    Ok(PlanLine::PlanningTime(number(kind, caps, 1)?))
}

fn extract_execution_time(kind: PatternKind, caps: &Captures<'_>) -> Result<PlanLine, LineError> {
    Ok(PlanLine::ExecutionTime(number(kind, caps, 1)?))
}

fn extract_sort_method(kind: PatternKind, caps: &Captures<'_>) -> Result<PlanLine, LineError> {
    let target = match group(kind, caps, 2)? {
        "Memory" => SortTarget::Memory,
        "Disk" => SortTarget::Disk,
        other => {
            return Err(LineError::BadSortTarget {
                kind,
                text: other.to_string(),
            });
        }
    };

    Ok(PlanLine::SortMethod(SortMethod {
        method: group(kind, caps, 1)?.to_string(),
        target,
        size: group(kind, caps, 3)?.to_string(),
    }))
}
