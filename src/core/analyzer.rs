use anyhow::{anyhow, Result};
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::catalog::Catalog;
use super::config::ScanConfig;
use super::error::{FileDiagnostic, FileError};
use super::redactor::Redactor;
use super::report::{FrequencyTable, Match, ScanOutcome, ScanResult};
use super::resolver::{CallSiteExtractor, FileAnalysis};
use super::scanner::FileScanner;
use crate::parsers::PythonParser;

/// Scan coordinator: fans files out over a bounded worker pool and merges the
/// per-file results into one deterministic report.
pub struct UsageAnalyzer<'c> {
    catalog: &'c Catalog,
    file_scanner: FileScanner,
    config: ScanConfig,
}

impl<'c> UsageAnalyzer<'c> {
    pub fn new(catalog: &'c Catalog) -> Self {
        Self {
            catalog,
            file_scanner: FileScanner::new(),
            config: ScanConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ScanConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_scanner(mut self, file_scanner: FileScanner) -> Self {
        self.file_scanner = file_scanner;
        self
    }

    pub fn analyze_directory(&self, root_path: &Path) -> Result<ScanOutcome> {
        let files = self.file_scanner.scan_directory(root_path)?;
        info!(root = %root_path.display(), files = files.len(), "collected Python files");
        self.analyze(&files)
    }

    /// Per-file failures are recorded and skipped; only pool or parser setup
    /// failures abort the scan.
    pub fn analyze(&self, files: &[PathBuf]) -> Result<ScanOutcome> {
        let mut seen = HashSet::with_capacity(files.len());
        let files: Vec<&PathBuf> = files.iter().filter(|path| seen.insert(*path)).collect();

        info!(
            files = files.len(),
            workers = self.config.workers,
            catalog_entries = self.catalog.len(),
            "scanning"
        );

        let extractor = CallSiteExtractor::new(
            self.catalog,
            self.config.tie_break,
            Redactor::new(self.config.context_lines)?,
        );
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.workers.max(1))
            .build()?;

        let analyses: Vec<Result<FileAnalysis, FileError>> = pool.install(|| {
            files
                .par_iter()
                .map_init(PythonParser::new, |parser, path| -> Result<Result<FileAnalysis, FileError>> {
                    let parser = parser
                        .as_mut()
                        .map_err(|err| anyhow!("failed to initialise Python parser: {err}"))?;
                    Ok(parser.analyze_file(path, &extractor))
                })
                .collect::<Result<Vec<_>>>()
        })?;

        Ok(self.merge(analyses))
    }

    fn merge(&self, analyses: Vec<Result<FileAnalysis, FileError>>) -> ScanOutcome {
        let mut matches: Vec<Match> = Vec::new();
        let mut diagnostics: Vec<FileDiagnostic> = Vec::new();
        let mut analyzed = 0usize;
        let mut ambiguous = 0usize;

        for analysis in analyses {
            match analysis {
                Ok(analysis) => {
                    analyzed += 1;
                    ambiguous += analysis.ambiguous_call_sites;
                    matches.extend(analysis.matches);
                }
                Err(err) => {
                    warn!(file = %err.path().display(), error = %err, "skipping file");
                    diagnostics.push(err.into());
                }
            }
        }

        let result = ScanResult::from_matches(analyzed, matches);
        let frequencies = FrequencyTable::from_matches(&result.matches, self.config.granularity);

        info!(
            analyzed,
            skipped = diagnostics.len(),
            matches = result.total_matches,
            ambiguous,
            "scan complete"
        );

        ScanOutcome {
            result,
            frequencies,
            diagnostics,
            ambiguous_call_sites: ambiguous,
        }
    }
}
