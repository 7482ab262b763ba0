//! Python source parsing built on tree-sitter.
//!
//! A file that fails to parse is an ordinary error branch, not an exception:
//! [`parse_module`] returns `Result<ParsedModule, ParseError>` and the caller
//! decides to skip that file and keep the batch alive.

mod python;

pub use python::{parse_module, FunctionDecl, ParsedModule};

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("syntax error at line {line}, column {column}: {message}")]
pub struct ParseError {
    pub message: String,
    /// 1-based line of the first malformed node.
    pub line: usize,
    pub column: usize,
}

/// Text of a node, empty on (impossible for our parses) invalid UTF-8 ranges.
pub(crate) fn node_text<'a>(node: tree_sitter::Node<'_>, source: &'a str) -> &'a str {
    node.utf8_text(source.as_bytes()).unwrap_or("")
}
