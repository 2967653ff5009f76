//! Rendering of one tagging compliance report: summary aggregation,
//! HTML document, and CSV attachments.

pub mod csv;
pub mod html;
pub mod summary;

pub use csv::result_to_csv;
pub use html::{escape_html, render_report};
pub use summary::ReportSummary;
