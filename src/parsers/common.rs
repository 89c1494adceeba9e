use anyhow::Result;
use std::fs::File;
use std::io::{BufReader, Read};
use std::ops::Range;
use std::path::Path;
use tree_sitter::{Language, Node as TSNode, Parser, Tree};

pub struct TreeSitterParser {
    parser: Parser,
}

impl TreeSitterParser {
    pub fn new(language: Language) -> Result<Self> {
        let mut parser = Parser::new();
        parser.set_language(language)?;
        Ok(Self { parser })
    }

    pub fn parse(&mut self, source: &str) -> Option<Tree> {
        self.parser.parse(source, None)
    }
}

/// Buffered read sized to the file.
pub fn read_source(file_path: &Path) -> std::io::Result<String> {
    let file = File::open(file_path)?;
    let file_size = file.metadata()?.len() as usize;

    let mut reader = BufReader::with_capacity(file_size.clamp(1, 8192), file);
    let mut content = String::with_capacity(file_size);
    reader.read_to_string(&mut content)?;
    Ok(content)
}

pub fn extract_text<'a>(node: &TSNode, source: &'a [u8]) -> &'a str {
    std::str::from_utf8(&source[node.byte_range()]).unwrap_or("")
}

/// Row of the first ERROR or MISSING node, if the tree has one.
pub fn first_error_row(node: &TSNode) -> Option<usize> {
    if node.is_error() || node.is_missing() {
        return Some(node.start_position().row);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<TSNode> = node.children(&mut cursor).collect();
    children.iter().find_map(first_error_row)
}

/// Byte offsets of line starts, for slicing whole physical lines.
#[derive(Debug, Clone)]
pub struct LineIndex {
    starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    pub fn new(source: &[u8]) -> Self {
        let mut starts = vec![0];
        starts.extend(
            source
                .iter()
                .enumerate()
                .filter(|(_, byte)| **byte == b'\n')
                .map(|(offset, _)| offset + 1),
        );
        Self {
            starts,
            len: source.len(),
        }
    }

    pub fn line_count(&self) -> usize {
        self.starts.len()
    }

    /// Byte range of a 0-based row, excluding its terminator.
    pub fn line_range(&self, row: usize, source: &[u8]) -> Range<usize> {
        let row = row.min(self.starts.len() - 1);
        let start = self.starts[row];
        let mut end = self
            .starts
            .get(row + 1)
            .map_or(self.len, |next| next - 1);
        if end > start && source.get(end - 1) == Some(&b'\r') {
            end -= 1;
        }
        start..end
    }
}
