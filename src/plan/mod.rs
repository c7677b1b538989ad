//! Parsing of PostgreSQL `EXPLAIN ANALYZE` text output.
//!
//! - `line`: per-line pattern table and typed captures
//! - `size`: `format_size` and digit grouping
//! - `timeline`: reverse scan + accumulation into a `PlanSummary`

pub mod line;
pub mod size;
pub mod timeline;

pub use size::group_thousands;
pub use timeline::{PlanSummary, parse_plan_file};
