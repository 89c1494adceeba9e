use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::PathBuf;

use super::error::FileDiagnostic;

/// Coarse shape of an argument; the literal value is never recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArgKind {
    String,
    Number,
    Identifier,
    CallResult,
    Other,
}

/// One attributed, redacted call site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Match {
    pub function: String,
    pub module: String,
    pub file: PathBuf,
    pub line: usize,
    pub column: usize,
    pub context: String,
    pub args: Vec<ArgKind>,
}

impl Match {
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.module, self.function)
    }

    /// Report order: file path, then position.
    pub fn report_order(&self, other: &Self) -> Ordering {
        self.file
            .cmp(&other.file)
            .then(self.line.cmp(&other.line))
            .then(self.column.cmp(&other.column))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ScanResult {
    pub total_files_analyzed: usize,
    pub total_matches: usize,
    pub matches: Vec<Match>,
}

impl ScanResult {
    /// Sorting is stable, so calls sharing a position (a chain and its
    /// receiver) keep their emission order: innermost first.
    pub fn from_matches(total_files_analyzed: usize, mut matches: Vec<Match>) -> Self {
        matches.sort_by(Match::report_order);
        Self {
            total_files_analyzed,
            total_matches: matches.len(),
            matches,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Granularity {
    /// Group by `module.function`.
    #[default]
    Qualified,
    /// Group by bare function name across modules.
    Function,
}

/// Match counts, sorted by descending count then name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FrequencyTable {
    rows: Vec<(String, usize)>,
}

impl FrequencyTable {
    pub fn from_matches(matches: &[Match], granularity: Granularity) -> Self {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for m in matches {
            let key = match granularity {
                Granularity::Qualified => m.qualified_name(),
                Granularity::Function => m.function.clone(),
            };
            *counts.entry(key).or_insert(0) += 1;
        }

        let mut rows: Vec<(String, usize)> = counts.into_iter().collect();
        rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Self { rows }
    }

    pub fn rows(&self) -> &[(String, usize)] {
        &self.rows
    }

    pub fn get(&self, name: &str) -> Option<usize> {
        self.rows
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, count)| *count)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// Written as a map in row order rather than key order.
impl Serialize for FrequencyTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.rows.len()))?;
        for (name, count) in &self.rows {
            map.serialize_entry(name, count)?;
        }
        map.end()
    }
}

/// Everything a scan hands to the report writers.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanOutcome {
    pub result: ScanResult,
    pub frequencies: FrequencyTable,
    pub diagnostics: Vec<FileDiagnostic>,
    pub ambiguous_call_sites: usize,
}

impl ScanOutcome {
    pub fn files_skipped(&self) -> usize {
        self.diagnostics.len()
    }
}
