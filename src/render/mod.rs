//! Output renderers for a [`TimelineReport`](crate::model::TimelineReport).

pub mod html;

pub use html::render_html_report;
