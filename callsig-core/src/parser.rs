//! Parser module.
//!
//! Wraps Tree-sitter and lowers its output into our expression tree.
//! Language detection is automatic based on file extension.

use crate::error::{ParseError, Result};
use crate::languages::{get_parser, LanguageParser};
use crate::node::Node;
use std::fs;
use std::path::Path;
use tracing::debug;

/// A lowered source file.
#[derive(Debug)]
pub struct ParsedSource {
    /// The `Program` node.
    pub program: Node,

    /// Where Tree-sitter had to recover from a syntax error, if anywhere.
    /// The tree is still usable; the broken region shows up as `ERROR`.
    pub first_error: Option<ParseError>,
}

/// Reads and parses a source file.
///
/// Returns the source text alongside the tree so callers can slice
/// node text out of it.
///
/// # Example
///
/// ```no_run
/// use callsig_core::parse_file;
/// use std::path::Path;
///
/// let (source, parsed) = parse_file(Path::new("src/app.js")).unwrap();
/// println!("{} bytes, clean: {}", source.len(), parsed.first_error.is_none());
/// ```
pub fn parse_file(path: &Path) -> Result<(String, ParsedSource)> {
    let source = fs::read_to_string(path).map_err(|e| ParseError::io(path, e))?;

    let parser =
        detect_language(path).ok_or_else(|| ParseError::UnsupportedLanguage(path.to_path_buf()))?;

    let parsed = parse_source(&source, parser.as_ref())?;
    Ok((source, parsed))
}

/// Parses source code directly (useful for testing or in-memory content).
///
/// You need to provide a language parser explicitly since there's no
/// file extension to detect from.
pub fn parse_source(source: &str, lang_parser: &dyn LanguageParser) -> Result<ParsedSource> {
    let mut parser = tree_sitter::Parser::new();
    parser
        .set_language(&lang_parser.language())
        .map_err(|e| ParseError::ParserError(format!("Failed to set language: {}", e)))?;

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| ParseError::ParserError("Tree-sitter returned no tree".into()))?;

    let root = tree.root_node();
    let first_error = if root.has_error() {
        let error = find_error(&root)
            .map(|node| ParseError::Syntax {
                line: node.start_position().row as u32 + 1,
                column: node.start_position().column as u32,
            })
            .unwrap_or(ParseError::Syntax { line: 1, column: 0 });
        debug!("Recovered from {}", error);
        Some(error)
    } else {
        None
    };

    Ok(ParsedSource {
        program: lang_parser.lower(&tree, source),
        first_error,
    })
}

/// Detects the language from a file path.
///
/// Returns None if we don't support the file's extension.
pub fn detect_language(path: &Path) -> Option<Box<dyn LanguageParser>> {
    let extension = path.extension()?.to_str()?;
    get_parser(extension)
}

/// Finds the first `ERROR` or missing node in document order.
fn find_error<'tree>(node: &tree_sitter::Node<'tree>) -> Option<tree_sitter::Node<'tree>> {
    if node.is_error() || node.is_missing() {
        return Some(*node);
    }

    (0..node.child_count())
        .filter_map(|i| node.child(i))
        .filter(|child| child.has_error())
        .find_map(|child| find_error(&child))
}
