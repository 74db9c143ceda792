//! Language parsers module.
//!
//! Signatures and the code they are matched against are JavaScript or
//! TypeScript. Both grammars lower into the same expression tree, so the
//! matcher never needs to know which one produced a node.

mod typescript;

use crate::node::Node;

pub use typescript::{TsxParser, TypeScriptParser};

/// Trait for grammar-specific parsing logic.
///
/// Provides the Tree-sitter language and the lowering from its concrete
/// syntax tree into our expression tree.
pub trait LanguageParser: Send + Sync {
    /// Returns the Tree-sitter language for this parser.
    fn language(&self) -> tree_sitter::Language;

    /// File extensions this parser handles.
    fn extensions(&self) -> &[&str];

    /// Lowers a parsed Tree-sitter tree into a `Program` node.
    fn lower(&self, tree: &tree_sitter::Tree, source: &str) -> Node;
}

/// Gets a parser for the given file extension.
///
/// Returns None if we don't support this extension.
pub fn get_parser(extension: &str) -> Option<Box<dyn LanguageParser>> {
    match extension.to_lowercase().as_str() {
        "ts" | "mts" | "cts" => Some(Box::new(TypeScriptParser)),

        // JavaScript may carry JSX, which the plain TypeScript grammar reads
        // as a type assertion. TSX is a superset of what JS needs.
        "tsx" | "jsx" | "js" | "mjs" | "cjs" => Some(Box::new(TsxParser)),

        _ => None,
    }
}

/// Lists all supported file extensions.
pub fn supported_extensions() -> &'static [&'static str] {
    &[
        "ts", "mts", "cts", // TypeScript
        "js", "mjs", "cjs", // JavaScript
        "tsx", "jsx", // JSX flavours
    ]
}

/// Checks if a file extension is supported.
pub fn is_supported(extension: &str) -> bool {
    get_parser(extension).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_extensions_resolve() {
        for ext in supported_extensions() {
            assert!(is_supported(ext), "{ext} should be supported");
        }
        assert!(is_supported("JS"));
        assert!(!is_supported("py"));
        assert!(!is_supported(""));
    }

    #[test]
    fn test_jsx_uses_tsx_grammar() {
        let parser = get_parser("jsx").unwrap();
        assert!(parser.extensions().contains(&"tsx"));
    }
}
