//! Finding call sites of a signature in source code.
//!
//! Walks a lowered tree, keeps every call the matcher accepts and labels
//! each of its arguments with the parameter it fills.

use crate::error::Result;
use crate::languages::LanguageParser;
use crate::matcher::{ArgumentSignature, Matcher};
use crate::node::Node;
use crate::parser::{parse_file, parse_source};
use crate::traversal::walk;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, warn};

/// A call that satisfies a signature.
#[derive(Debug, Clone, Serialize)]
pub struct CallMatch {
    /// Path of the file, as given by the caller.
    pub file: String,

    /// Starting line (1-indexed).
    pub line: u32,

    /// Starting column (0-indexed).
    pub column: u32,

    /// Byte range of the whole call.
    pub byte_start: u32,
    pub byte_end: u32,

    /// Source text of the call.
    pub text: String,

    /// Every argument, in call order.
    pub arguments: Vec<MatchedArgument>,
}

/// One argument of a matched call.
#[derive(Debug, Clone, Serialize)]
pub struct MatchedArgument {
    /// Zero-based position in the call.
    pub index: usize,

    /// Source text of the argument.
    pub text: String,

    /// The parameter this argument fills.
    pub parameter: Option<ArgumentSignature>,
}

/// Collects every call under `root` that `matcher` accepts.
///
/// `source` must be the text `root` was parsed from; it is only used to
/// slice out the text of calls and arguments.
pub fn find_calls(root: &Node, source: &str, file: &str, matcher: &Matcher) -> Vec<CallMatch> {
    let mut matches = Vec::new();

    walk(root, matcher.traversal_keys(), |node, _| {
        let Some((_, arguments)) = node.as_call() else {
            return;
        };
        if !matcher.test(node) {
            return;
        }

        let arguments = arguments
            .iter()
            .enumerate()
            .map(|(index, argument)| MatchedArgument {
                index,
                text: node_text(argument, source),
                parameter: matcher.match_argument(argument, node).cloned(),
            })
            .collect();

        matches.push(CallMatch {
            file: file.to_string(),
            line: node.span.line,
            column: node.span.column,
            byte_start: node.span.start,
            byte_end: node.span.end,
            text: node_text(node, source),
            arguments,
        });
    });

    debug!("{} matches for {} in {}", matches.len(), matcher.signature(), file);
    matches
}

/// Parses `source` and collects matching calls.
///
/// Syntax errors are tolerated: Tree-sitter recovers and the rest of the
/// file is still searched.
pub fn search_source(
    source: &str,
    file: &str,
    lang_parser: &dyn LanguageParser,
    matcher: &Matcher,
) -> Result<Vec<CallMatch>> {
    let parsed = parse_source(source, lang_parser)?;
    if let Some(error) = &parsed.first_error {
        warn!("{}: {}", file, error);
    }
    Ok(find_calls(&parsed.program, source, file, matcher))
}

/// Reads a file, detects its language from the extension and collects
/// matching calls.
pub fn search_file(path: &Path, matcher: &Matcher) -> Result<Vec<CallMatch>> {
    let (source, parsed) = parse_file(path)?;
    let file = path.display().to_string();
    if let Some(error) = &parsed.first_error {
        warn!("{}: {}", file, error);
    }
    Ok(find_calls(&parsed.program, &source, &file, matcher))
}

fn node_text(node: &Node, source: &str) -> String {
    source
        .get(node.span.start as usize..node.span.end as usize)
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;
    use crate::languages::get_parser;
    use crate::matcher::ParameterKind;
    use std::io::Write;

    #[test]
    fn test_search_source_finds_calls() {
        let source = r#"
            import { db } from "./db";

            export async function load(id) {
                const rows = await db.query("select * from users where id = ?", [id]);
                db.query("select 1");
                db.execute("delete from users");
                return rows;
            }
        "#;

        let matcher = Matcher::parse("db.query(sql, [params])").unwrap();
        let parser = get_parser("js").unwrap();
        let matches = search_source(source, "load.js", parser.as_ref(), &matcher).unwrap();

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].line, 5);
        assert_eq!(matches[1].line, 6);
        assert_eq!(matches[1].text, r#"db.query("select 1")"#);

        let first = &matches[0].arguments;
        assert_eq!(first.len(), 2);
        assert_eq!(first[1].text, "[id]");
        let parameter = first[1].parameter.as_ref().unwrap();
        assert_eq!(parameter.name, "params");
        assert_eq!(parameter.kind, ParameterKind::Optional);

        let second = &matches[1].arguments;
        assert_eq!(second[0].parameter.as_ref().unwrap().name, "sql");
    }

    #[test]
    fn test_nested_matches_are_all_reported() {
        let matcher = Matcher::parse("wrap(value)").unwrap();
        let parser = get_parser("ts").unwrap();
        let matches =
            search_source("wrap(wrap(wrap(1)));", "nested.ts", parser.as_ref(), &matcher).unwrap();

        let texts: Vec<_> = matches.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["wrap(wrap(wrap(1)))", "wrap(wrap(1))", "wrap(1)"]);
    }

    #[test]
    fn test_search_tolerates_syntax_errors() {
        let matcher = Matcher::parse("emit(event)").unwrap();
        let parser = get_parser("js").unwrap();
        let matches = search_source(
            "emit('start');\nlet = ;\nemit('stop');",
            "broken.js",
            parser.as_ref(),
            &matcher,
        )
        .unwrap();

        assert!(matches.iter().any(|m| m.text == "emit('start')"));
    }

    #[test]
    fn test_search_file() {
        let mut file = tempfile::Builder::new().suffix(".ts").tempfile().unwrap();
        writeln!(file, "logger.warn(message, [context]);").unwrap();
        writeln!(file, "logger.warn(\"disk almost full\");").unwrap();

        let matcher = Matcher::parse("logger.warn(msg, [ctx])").unwrap();
        let matches = search_file(file.path(), &matcher).unwrap();

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[1].line, 2);
        assert_eq!(matches[1].column, 0);
        assert_eq!(matches[0].file, file.path().display().to_string());

        let json = serde_json::to_value(&matches[1]).unwrap();
        assert_eq!(json["arguments"][0]["parameter"]["name"], "msg");
        assert_eq!(json["arguments"][0]["parameter"]["kind"], "mandatory");
    }

    #[test]
    fn test_search_file_unsupported() {
        let file = tempfile::Builder::new().suffix(".rb").tempfile().unwrap();
        let matcher = Matcher::parse("f(a)").unwrap();

        let err = search_file(file.path(), &matcher).unwrap_err();
        assert!(matches!(err, ParseError::UnsupportedLanguage(_)));
    }
}
