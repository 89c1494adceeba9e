//! Privacy-safe context capture for matched call sites.
//!
//! The captured context keeps identifiers, keywords and call/attribute shape
//! but never a literal value: the arguments of the matched call become
//! [`PLACEHOLDER`], every string and numeric literal on the lines of the
//! enclosing statement does too, and comments are dropped.

use anyhow::Result;
use regex::{Captures, Regex};
use std::ops::Range;
use tree_sitter::Node as TSNode;

use super::report::ArgKind;
use crate::parsers::common::LineIndex;

pub const PLACEHOLDER: &str = "?";
pub const LINE_BREAK: &str = " ⏎ ";

const LITERAL_PATTERN: &str = r#"(?s)(?P<string>[rRbBuUfF]{0,2}(?:""".*?"""|'''.*?'''|"(?:[^"\\\n]|\\.)*"|'(?:[^'\\\n]|\\.)*'))|(?P<comment>#[^\n]*)|(?P<number>\b(?:0[xXoObB][0-9a-fA-F_]+|\d[\d_]*(?:\.\d*)?(?:[eE][+-]?\d+)?[jJ]?))"#;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redaction {
    pub context: String,
    pub args: Vec<ArgKind>,
}

#[derive(Debug, Clone)]
struct Edit {
    range: Range<usize>,
    replacement: &'static str,
}

#[derive(Debug, Clone)]
pub struct Redactor {
    context_lines: usize,
    literals: Regex,
}

impl Redactor {
    pub fn new(context_lines: usize) -> Result<Self> {
        Ok(Self {
            context_lines,
            literals: Regex::new(LITERAL_PATTERN)?,
        })
    }

    /// Redact the physical lines of the statement enclosing `call` (plus any
    /// configured surrounding lines). `root` is the tree the call belongs to.
    pub fn redact_call(
        &self,
        call: &TSNode,
        root: &TSNode,
        source: &[u8],
        lines: &LineIndex,
    ) -> Redaction {
        let (start_row, end_row) = statement_rows(call);
        let first_row = start_row.saturating_sub(self.context_lines);
        let last_row = (end_row + self.context_lines).min(lines.line_count() - 1);
        let span = lines.line_range(first_row, source).start..lines.line_range(last_row, source).end;

        let mut edits = Vec::new();
        let arguments = call.child_by_field_name("arguments");
        if let Some(arguments) = &arguments {
            collect_argument_edits(arguments, &mut edits);
        }
        collect_literal_edits(root, &span, &mut edits);

        let text = apply_edits(source, &span, edits);
        let context = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join(LINE_BREAK);

        Redaction {
            context,
            args: arguments.as_ref().map(arg_kinds).unwrap_or_default(),
        }
    }

    /// Literal-only redaction of free text. Idempotent: the output holds no
    /// string, number or comment for a second pass to replace.
    pub fn redact_text(&self, text: &str) -> String {
        self.literals
            .replace_all(text, |caps: &Captures| {
                if caps.name("comment").is_some() {
                    ""
                } else {
                    PLACEHOLDER
                }
            })
            .into_owned()
    }
}

/// Rows of the statement holding `call`. A compound statement only
/// contributes its header, up to the colon before its body.
fn statement_rows(call: &TSNode) -> (usize, usize) {
    let statement = enclosing_statement(*call);
    let start_row = statement.start_position().row.min(call.start_position().row);
    let call_end = call.end_position().row;

    let mut cursor = statement.walk();
    let header_end = statement
        .children(&mut cursor)
        .find(|child| child.kind() == "block" && child.start_byte() >= call.end_byte())
        .and_then(|body| body.prev_sibling())
        .map(|colon| colon.end_position().row);

    let end_row = match header_end {
        Some(row) => row.max(call_end),
        None => statement.end_position().row.max(call_end),
    };
    (start_row, end_row)
}

fn enclosing_statement<'tree>(call: TSNode<'tree>) -> TSNode<'tree> {
    let mut node = call;
    while let Some(parent) = node.parent() {
        if is_statement(node.kind()) || matches!(parent.kind(), "module" | "block") {
            return node;
        }
        node = parent;
    }
    node
}

fn is_statement(kind: &str) -> bool {
    kind.ends_with("_statement")
        || matches!(
            kind,
            "decorator"
                | "decorated_definition"
                | "elif_clause"
                | "else_clause"
                | "except_clause"
                | "finally_clause"
                | "case_clause"
        )
}

fn collect_argument_edits(arguments: &TSNode, edits: &mut Vec<Edit>) {
    if arguments.kind() == "generator_expression" {
        edits.push(Edit {
            range: arguments.byte_range(),
            replacement: "(?)",
        });
        return;
    }

    let mut cursor = arguments.walk();
    for arg in arguments.named_children(&mut cursor) {
        let target = match arg.kind() {
            "comment" => continue,
            "keyword_argument" => arg.child_by_field_name("value").unwrap_or(arg),
            _ => arg,
        };
        edits.push(Edit {
            range: target.byte_range(),
            replacement: PLACEHOLDER,
        });
    }
}

fn collect_literal_edits(node: &TSNode, span: &Range<usize>, edits: &mut Vec<Edit>) {
    if node.end_byte() <= span.start || node.start_byte() >= span.end {
        return;
    }

    let replacement = match node.kind() {
        "string" | "concatenated_string" | "integer" | "float" => PLACEHOLDER,
        "comment" => "",
        _ => {
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                collect_literal_edits(&child, span, edits);
            }
            return;
        }
    };

    edits.push(Edit {
        range: node.start_byte().max(span.start)..node.end_byte().min(span.end),
        replacement,
    });
}

/// Apply non-overlapping edits; an edit nested inside an earlier one is
/// already covered and dropped.
fn apply_edits(source: &[u8], span: &Range<usize>, mut edits: Vec<Edit>) -> String {
    edits.sort_by(|a, b| {
        a.range
            .start
            .cmp(&b.range.start)
            .then(b.range.end.cmp(&a.range.end))
    });

    let mut out = String::with_capacity(span.len());
    let mut cursor = span.start;
    for edit in edits {
        if edit.range.start < cursor || edit.range.start >= span.end {
            continue;
        }
        out.push_str(&String::from_utf8_lossy(&source[cursor..edit.range.start]));
        out.push_str(edit.replacement);
        cursor = edit.range.end.max(cursor);
    }
    if cursor < span.end {
        out.push_str(&String::from_utf8_lossy(&source[cursor..span.end]));
    }
    out
}

pub fn arg_kinds(arguments: &TSNode) -> Vec<ArgKind> {
    if arguments.kind() == "generator_expression" {
        return vec![ArgKind::Other];
    }
    let mut cursor = arguments.walk();
    arguments
        .named_children(&mut cursor)
        .filter(|arg| arg.kind() != "comment")
        .map(|arg| arg_kind(&arg))
        .collect()
}

pub fn arg_kind(node: &TSNode) -> ArgKind {
    match node.kind() {
        "string" | "concatenated_string" => ArgKind::String,
        "integer" | "float" => ArgKind::Number,
        "identifier" => ArgKind::Identifier,
        "call" => ArgKind::CallResult,
        "unary_operator" => match node.child_by_field_name("argument") {
            Some(operand) if matches!(operand.kind(), "integer" | "float") => ArgKind::Number,
            _ => ArgKind::Other,
        },
        "keyword_argument" | "parenthesized_expression" => node
            .child_by_field_name("value")
            .or_else(|| node.named_child(0))
            .map_or(ArgKind::Other, |inner| arg_kind(&inner)),
        _ => ArgKind::Other,
    }
}
