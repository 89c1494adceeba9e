use anyhow::Result;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::{DirEntry, WalkDir};

const PYTHON_EXTENSION: &str = "py";

/// Virtual environments and tool caches: never project code.
const EXCLUDED_DIRS: &[&str] = &[
    "venv",
    ".venv",
    "env",
    "virtualenv",
    "site-packages",
    "__pycache__",
    ".git",
    ".tox",
    ".nox",
    ".mypy_cache",
    ".pytest_cache",
    "node_modules",
];

const TEST_DIRS: &[&str] = &["test", "tests", "testing"];

/// Collects the Python files of a project tree.
#[derive(Debug, Clone)]
pub struct FileScanner {
    extra_excludes: HashSet<String>,
    include_tests: bool,
}

impl FileScanner {
    pub fn new() -> Self {
        Self {
            extra_excludes: HashSet::new(),
            include_tests: false,
        }
    }

    pub fn with_excludes<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_excludes.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn include_tests(mut self, include_tests: bool) -> Self {
        self.include_tests = include_tests;
        self
    }

    /// Sorted so the file list, and everything derived from it, is stable.
    pub fn scan_directory(&self, root_path: &Path) -> Result<Vec<PathBuf>> {
        if !root_path.is_dir() {
            anyhow::bail!("{} is not a directory", root_path.display());
        }

        let mut files = Vec::new();
        let walker = WalkDir::new(root_path)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !self.is_excluded_dir(entry));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(error = %err, "skipping unreadable path");
                    continue;
                }
            };
            if entry.file_type().is_file() && self.is_candidate_file(entry.path()) {
                files.push(entry.into_path());
            }
        }

        files.sort();
        Ok(files)
    }

    fn is_excluded_dir(&self, entry: &DirEntry) -> bool {
        if !entry.file_type().is_dir() {
            return false;
        }
        let name = entry.file_name().to_string_lossy();
        EXCLUDED_DIRS.contains(&name.as_ref())
            || self.extra_excludes.contains(name.as_ref())
            || (!self.include_tests && TEST_DIRS.contains(&name.as_ref()))
            || entry.path().join("pyvenv.cfg").is_file()
    }

    fn is_candidate_file(&self, path: &Path) -> bool {
        let is_python = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map_or(false, |ext| ext == PYTHON_EXTENSION);
        if !is_python {
            return false;
        }
        if self.include_tests {
            return true;
        }

        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
        !(name == "conftest.py" || stem.starts_with("test_") || stem.ends_with("_test"))
    }
}

impl Default for FileScanner {
    fn default() -> Self {
        Self::new()
    }
}
