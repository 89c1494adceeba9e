pub mod json_report;
pub mod summary;

pub use json_report::{JsonReportFormatter, REPORT_FILE_NAME};
pub use summary::{SummaryFormatter, SUMMARY_FILE_NAME};
