use anyhow::Result;
use std::fs;
use std::path::Path;

use crate::core::ScanResult;

pub const REPORT_FILE_NAME: &str = "api_usage_report.json";

/// Writes the `ScanResult` as JSON for the review tooling.
pub struct JsonReportFormatter {
    pretty: bool,
}

impl JsonReportFormatter {
    pub fn new() -> Self {
        Self { pretty: true }
    }

    pub fn compact() -> Self {
        Self { pretty: false }
    }

    pub fn format_to_file(&self, result: &ScanResult, output_path: &Path) -> Result<()> {
        let json_content = self.format_result(result)?;
        fs::write(output_path, json_content)?;
        Ok(())
    }

    pub fn format_result(&self, result: &ScanResult) -> Result<String> {
        let text = if self.pretty {
            serde_json::to_string_pretty(result)?
        } else {
            serde_json::to_string(result)?
        };
        Ok(text)
    }
}

impl Default for JsonReportFormatter {
    fn default() -> Self {
        Self::new()
    }
}
