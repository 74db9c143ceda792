//! callsig core - call-signature matching
//!
//! Compiles a textual call signature such as `obj.method(a, [b])` into a
//! [`Matcher`] that recognizes calls of that shape in JavaScript and
//! TypeScript expression trees, and tells which declared parameter each
//! argument fills. Bare identifiers are mandatory parameters, identifiers
//! wrapped in a one-element array are optional.
//!
//! Source text is parsed with Tree-sitter and lowered into an
//! ESTree-shaped [`Node`] tree.
//!
//! # Example
//!
//! ```
//! use callsig_core::{languages::get_parser, search_source, Matcher};
//!
//! let matcher = Matcher::parse("obj.method(a, [b])").unwrap();
//! let parser = get_parser("js").unwrap();
//! let source = "obj.method(1, 2); other.method(1);";
//! let calls = search_source(source, "demo.js", parser.as_ref(), &matcher).unwrap();
//!
//! assert_eq!(calls.len(), 1);
//! assert_eq!(calls[0].arguments[1].parameter.as_ref().unwrap().name, "b");
//! ```

pub mod error;
pub mod languages;
pub mod matcher;
pub mod node;
pub mod parser;
pub mod search;
pub mod signature;
pub mod traversal;

pub use error::{ParseError, Result, SignatureError};
pub use languages::LanguageParser;
pub use matcher::{ArgumentSignature, Matcher, MatcherOptions, ParameterKind};
pub use node::{Edge, LiteralValue, Node, NodeKind, Span};
pub use parser::{detect_language, parse_file, parse_source, ParsedSource};
pub use search::{find_calls, search_file, search_source, CallMatch, MatchedArgument};
pub use signature::Signature;
pub use traversal::{structural_depth, walk, TraversalKeys};
