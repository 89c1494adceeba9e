use anyhow::Result;
use std::path::Path;
use tree_sitter::Tree;

use super::common::{first_error_row, read_source, TreeSitterParser};
use crate::core::error::FileError;
use crate::core::resolver::{CallSiteExtractor, FileAnalysis};

/// Per-worker Python front end: read, parse, reject broken syntax, then hand
/// the tree to the shared extractor.
pub struct PythonParser {
    parser: TreeSitterParser,
}

impl PythonParser {
    pub fn new() -> Result<Self> {
        let parser = TreeSitterParser::new(tree_sitter_python::language())?;
        Ok(Self { parser })
    }

    pub fn analyze_file(
        &mut self,
        file_path: &Path,
        extractor: &CallSiteExtractor<'_>,
    ) -> Result<FileAnalysis, FileError> {
        let source = read_source(file_path).map_err(|source| FileError::Io {
            path: file_path.to_path_buf(),
            source,
        })?;
        self.analyze_source(file_path, &source, extractor)
    }

    pub fn analyze_source(
        &mut self,
        file_path: &Path,
        source: &str,
        extractor: &CallSiteExtractor<'_>,
    ) -> Result<FileAnalysis, FileError> {
        let tree = self.parse_source(file_path, source)?;
        Ok(extractor.extract_from_ast(&tree.root_node(), source.as_bytes(), file_path))
    }

    /// A tree with any ERROR or MISSING node counts as a syntax error.
    pub fn parse_source(&mut self, file_path: &Path, source: &str) -> Result<Tree, FileError> {
        let tree = self.parser.parse(source).ok_or_else(|| FileError::Parse {
            path: file_path.to_path_buf(),
            line: 1,
        })?;

        if let Some(row) = first_error_row(&tree.root_node()) {
            return Err(FileError::Parse {
                path: file_path.to_path_buf(),
                line: row + 1,
            });
        }
        Ok(tree)
    }
}
