use anyhow::Result;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::core::ScanOutcome;

pub const SUMMARY_FILE_NAME: &str = "api_usage_summary.txt";

/// Plain-text totals and per-function frequencies.
pub struct SummaryFormatter;

impl SummaryFormatter {
    pub fn new() -> Self {
        Self
    }

    pub fn format_to_file(&self, outcome: &ScanOutcome, output_path: &Path) -> Result<()> {
        fs::write(output_path, self.format_outcome(outcome)?)?;
        Ok(())
    }

    pub fn format_outcome(&self, outcome: &ScanOutcome) -> Result<String> {
        let mut out = String::new();
        writeln!(out, "Total files analyzed: {}", outcome.result.total_files_analyzed)?;
        writeln!(out, "Total API call matches: {}", outcome.result.total_matches)?;
        writeln!(out, "Files skipped: {}", outcome.files_skipped())?;
        writeln!(out, "Ambiguous call sites: {}", outcome.ambiguous_call_sites)?;
        writeln!(out)?;

        writeln!(out, "Functions used:")?;
        for (name, count) in outcome.frequencies.rows() {
            writeln!(out, "{name}: {count} occurrences")?;
        }

        if !outcome.diagnostics.is_empty() {
            writeln!(out)?;
            writeln!(out, "Skipped files:")?;
            for diagnostic in &outcome.diagnostics {
                writeln!(out, "  {}: {}", diagnostic.file.display(), diagnostic.message)?;
            }
        }

        Ok(out)
    }
}

impl Default for SummaryFormatter {
    fn default() -> Self {
        Self::new()
    }
}
