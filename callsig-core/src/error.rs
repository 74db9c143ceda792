//! Error types for parsing and signature validation.
//!
//! Only construction can fail. Once a `Matcher` exists, every query
//! answers with `false` or `None` instead of an error.

use std::path::PathBuf;
use thiserror::Error;

/// Convenience type for functions that can fail during parsing.
pub type Result<T> = std::result::Result<T, ParseError>;

/// Things that can go wrong when turning source text into a tree.
#[derive(Error, Debug)]
pub enum ParseError {
    /// Couldn't read the file from disk.
    #[error("failed to read file '{path}': {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File extension doesn't map to a supported dialect.
    #[error("unsupported language for file '{0}'")]
    UnsupportedLanguage(PathBuf),

    /// Tree-sitter could not be configured or returned no tree.
    #[error("parser error: {0}")]
    ParserError(String),

    /// The text contains a syntax error Tree-sitter had to recover from.
    #[error("syntax error at line {line}, column {column}")]
    Syntax { line: u32, column: u32 },
}

impl ParseError {
    /// Creates an IO error with the path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            source,
        }
    }
}

/// Reasons a signature string is rejected.
///
/// Validation stops at the first violation, scanning arguments left to right.
#[derive(Error, Debug)]
pub enum SignatureError {
    /// The signature text itself could not be parsed.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The text is not exactly one statement holding a bare call expression.
    #[error("signature must be a single call expression")]
    NotCallExpression,

    /// An argument is neither `name` nor `[name]`.
    #[error("argument {index} must be an identifier or a single-element array of an identifier")]
    InvalidArgumentForm { index: usize },

    /// Two arguments resolve to the same parameter name.
    #[error("duplicate argument name '{0}'")]
    DuplicateArgumentName(String),
}
