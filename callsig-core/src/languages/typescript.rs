//! TypeScript/JavaScript lowering.
//!
//! Handles TS, TSX, JS and JSX. Both grammars share the JavaScript
//! expression rules, so one lowering serves them. Expression kinds we
//! understand become ESTree-shaped nodes; everything else is kept as
//! `Other` with its named children so walks can still reach nested calls.

use crate::languages::LanguageParser;
use crate::node::{LiteralValue, Node, NodeKind, Span};
use tree_sitter::{Language, Node as TsNode, Tree};

pub struct TypeScriptParser;

impl LanguageParser for TypeScriptParser {
    fn language(&self) -> Language {
        tree_sitter_typescript::language_typescript()
    }

    fn extensions(&self) -> &[&str] {
        &["ts", "mts", "cts"]
    }

    fn lower(&self, tree: &Tree, source: &str) -> Node {
        lower_node(&tree.root_node(), source)
    }
}

pub struct TsxParser;

impl LanguageParser for TsxParser {
    fn language(&self) -> Language {
        tree_sitter_typescript::language_tsx()
    }

    fn extensions(&self) -> &[&str] {
        &["tsx", "jsx", "js", "mjs", "cjs"]
    }

    fn lower(&self, tree: &Tree, source: &str) -> Node {
        lower_node(&tree.root_node(), source)
    }
}

/// Lowers a Tree-sitter node and everything below it.
fn lower_node(node: &TsNode, source: &str) -> Node {
    // Parentheses only group; ESTree has no node for them
    if node.kind() == "parenthesized_expression" {
        if let Some(inner) = named_children(node).into_iter().next() {
            return lower_node(&inner, source);
        }
    }

    let kind = lower_kind(node, source).unwrap_or_else(|| other(node, source));
    Node::new(kind, span_of(node))
}

/// Maps the expression kinds we understand. `None` means "keep as Other",
/// either because the kind is unknown or a required field is missing.
fn lower_kind(node: &TsNode, source: &str) -> Option<NodeKind> {
    let kind = match node.kind() {
        "program" => NodeKind::Program {
            body: lower_children(node, source),
        },

        "expression_statement" => NodeKind::ExpressionStatement {
            expression: Box::new(lower_node(named_children(node).first()?, source)),
        },

        "identifier"
        | "property_identifier"
        | "shorthand_property_identifier"
        | "private_property_identifier"
        | "undefined" => NodeKind::Identifier {
            name: get_text(node, source),
        },

        "this" => NodeKind::ThisExpression,
        "super" => NodeKind::Super,

        "true" | "false" => NodeKind::Literal {
            value: LiteralValue::Boolean(node.kind() == "true"),
        },
        "null" => NodeKind::Literal {
            value: LiteralValue::Null,
        },
        "number" => NodeKind::Literal {
            value: parse_number(&get_text(node, source))?,
        },
        "string" => NodeKind::Literal {
            value: LiteralValue::String(strip_quotes(&get_text(node, source))),
        },
        "regex" => NodeKind::Literal {
            value: LiteralValue::RegExp {
                pattern: field_text(node, "pattern", source).unwrap_or_default(),
                flags: field_text(node, "flags", source).unwrap_or_default(),
            },
        },

        "array" => NodeKind::ArrayExpression {
            elements: lower_elements(node, source),
        },

        "object" => NodeKind::ObjectExpression {
            properties: named_children(node)
                .iter()
                .map(|child| lower_property(child, source))
                .collect(),
        },

        "pair" => {
            let key = node.child_by_field_name("key")?;
            let value = field(node, "value", source)?;
            let (key, computed) = if key.kind() == "computed_property_name" {
                (named_children(&key).into_iter().next()?, true)
            } else {
                (key, false)
            };
            NodeKind::Property {
                key: Box::new(lower_node(&key, source)),
                value,
                computed,
                shorthand: false,
            }
        }

        "member_expression" => NodeKind::MemberExpression {
            object: field(node, "object", source)?,
            property: field(node, "property", source)?,
            computed: false,
            optional: is_optional(node),
        },

        "subscript_expression" => NodeKind::MemberExpression {
            object: field(node, "object", source)?,
            property: field(node, "index", source)?,
            computed: true,
            optional: is_optional(node),
        },

        "call_expression" => {
            let args = node.child_by_field_name("arguments")?;
            // Tagged templates put a template string where arguments go
            if args.kind() != "arguments" {
                return None;
            }
            NodeKind::CallExpression {
                callee: field(node, "function", source)?,
                arguments: lower_children(&args, source),
                optional: is_optional(node),
            }
        }

        "new_expression" => NodeKind::NewExpression {
            callee: field(node, "constructor", source)?,
            arguments: node
                .child_by_field_name("arguments")
                .map(|args| lower_children(&args, source))
                .unwrap_or_default(),
        },

        "spread_element" => NodeKind::SpreadElement {
            argument: Box::new(lower_node(named_children(node).first()?, source)),
        },

        "await_expression" => NodeKind::AwaitExpression {
            argument: Box::new(lower_node(named_children(node).first()?, source)),
        },

        "unary_expression" => NodeKind::UnaryExpression {
            operator: field_text(node, "operator", source)?,
            argument: field(node, "argument", source)?,
        },

        "binary_expression" => {
            let operator = field_text(node, "operator", source)?;
            let left = field(node, "left", source)?;
            let right = field(node, "right", source)?;
            if matches!(operator.as_str(), "&&" | "||" | "??") {
                NodeKind::LogicalExpression {
                    operator,
                    left,
                    right,
                }
            } else {
                NodeKind::BinaryExpression {
                    operator,
                    left,
                    right,
                }
            }
        }

        "assignment_expression" => NodeKind::AssignmentExpression {
            operator: "=".to_string(),
            left: field(node, "left", source)?,
            right: field(node, "right", source)?,
        },

        "augmented_assignment_expression" => NodeKind::AssignmentExpression {
            operator: field_text(node, "operator", source)?,
            left: field(node, "left", source)?,
            right: field(node, "right", source)?,
        },

        "ternary_expression" => NodeKind::ConditionalExpression {
            test: field(node, "condition", source)?,
            consequent: field(node, "consequence", source)?,
            alternate: field(node, "alternative", source)?,
        },

        _ => return None,
    };

    Some(kind)
}

/// Object members: `{ a }` is shorthand for `{ a: a }`.
fn lower_property(node: &TsNode, source: &str) -> Node {
    if node.kind() != "shorthand_property_identifier" {
        return lower_node(node, source);
    }

    let span = span_of(node);
    let name = || {
        Box::new(Node::new(
            NodeKind::Identifier {
                name: get_text(node, source),
            },
            span,
        ))
    };

    Node::new(
        NodeKind::Property {
            key: name(),
            value: name(),
            computed: false,
            shorthand: true,
        },
        span,
    )
}

/// Array elements, with an explicit `hole` for every elision, so `[, a]`
/// has two elements and `[a, , b]` has three. A trailing comma adds none.
fn lower_elements(node: &TsNode, source: &str) -> Vec<Node> {
    let mut elements = Vec::new();
    let mut expecting = true;

    for child in (0..node.child_count()).filter_map(|i| node.child(i)) {
        if child.is_extra() {
            continue;
        }
        match child.kind() {
            "[" | "]" => {}
            "," => {
                if expecting {
                    elements.push(hole(&child));
                }
                expecting = true;
            }
            _ if child.is_named() => {
                elements.push(lower_node(&child, source));
                expecting = false;
            }
            _ => {}
        }
    }

    elements
}

/// Empty placeholder for an array elision, positioned at its comma.
fn hole(comma: &TsNode) -> Node {
    let mut span = span_of(comma);
    span.end = span.start;
    Node::new(
        NodeKind::Other {
            kind: "hole".to_string(),
            text: None,
            children: Vec::new(),
        },
        span,
    )
}

/// Fallback for kinds without a dedicated variant.
fn other(node: &TsNode, source: &str) -> NodeKind {
    let children = lower_children(node, source);
    let text = if children.is_empty() || node.kind() == "template_string" {
        Some(get_text(node, source))
    } else {
        None
    };

    NodeKind::Other {
        kind: node.kind().to_string(),
        text,
        children,
    }
}

// ============================================================================
// Helper functions
// ============================================================================

/// Named children, skipping comments and other extras.
fn named_children<'tree>(node: &TsNode<'tree>) -> Vec<TsNode<'tree>> {
    (0..node.named_child_count())
        .filter_map(|i| node.named_child(i))
        .filter(|child| !child.is_extra())
        .collect()
}

fn lower_children(node: &TsNode, source: &str) -> Vec<Node> {
    named_children(node)
        .iter()
        .map(|child| lower_node(child, source))
        .collect()
}

fn field(node: &TsNode, name: &str, source: &str) -> Option<Box<Node>> {
    node.child_by_field_name(name)
        .map(|child| Box::new(lower_node(&child, source)))
}

fn field_text(node: &TsNode, name: &str, source: &str) -> Option<String> {
    node.child_by_field_name(name)
        .map(|child| get_text(&child, source))
}

/// Gets text content of a node.
fn get_text(node: &TsNode, source: &str) -> String {
    source[node.byte_range()].to_string()
}

fn span_of(node: &TsNode) -> Span {
    Span {
        start: node.start_byte() as u32,
        end: node.end_byte() as u32,
        line: node.start_position().row as u32 + 1,
        column: node.start_position().column as u32,
    }
}

/// Checks for `?.` directly on a member or call.
fn is_optional(node: &TsNode) -> bool {
    (0..node.child_count())
        .filter_map(|i| node.child(i))
        .any(|child| matches!(child.kind(), "optional_chain" | "?."))
}

fn strip_quotes(raw: &str) -> String {
    if raw.len() >= 2 {
        raw[1..raw.len() - 1].to_string()
    } else {
        String::new()
    }
}

/// Parses a numeric literal, including radix prefixes, `_` separators
/// and BigInt suffixes.
fn parse_number(raw: &str) -> Option<LiteralValue> {
    let cleaned: String = raw.chars().filter(|c| *c != '_').collect();
    if let Some(digits) = cleaned.strip_suffix('n') {
        return Some(LiteralValue::BigInt(digits.to_string()));
    }

    let lower = cleaned.to_ascii_lowercase();
    let value = if let Some(hex) = lower.strip_prefix("0x") {
        radix_value(hex, 16)
    } else if let Some(oct) = lower.strip_prefix("0o") {
        radix_value(oct, 8)
    } else if let Some(bin) = lower.strip_prefix("0b") {
        radix_value(bin, 2)
    } else if is_legacy_octal(&lower) {
        radix_value(&lower[1..], 8)
    } else {
        lower.parse::<f64>().ok()
    }?;

    Some(LiteralValue::Number(value))
}

/// Digits in `base`, accumulated as `f64` so literals past `u64` still
/// get a value.
fn radix_value(digits: &str, base: u32) -> Option<f64> {
    if digits.is_empty() {
        return None;
    }
    digits.chars().try_fold(0.0_f64, |acc, c| {
        c.to_digit(base).map(|digit| acc * f64::from(base) + f64::from(digit))
    })
}

/// Sloppy-mode `010`: a leading zero followed only by octal digits.
/// `08` and `019` stay decimal.
fn is_legacy_octal(raw: &str) -> bool {
    raw.len() > 1 && raw.starts_with('0') && raw.bytes().all(|b| (b'0'..=b'7').contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lower_source(source: &str) -> Node {
        let mut parser = tree_sitter::Parser::new();
        parser.set_language(&TypeScriptParser.language()).unwrap();
        let tree = parser.parse(source, None).unwrap();
        TypeScriptParser.lower(&tree, source)
    }

    fn expression(source: &str) -> Node {
        let program = lower_source(source);
        let NodeKind::Program { mut body } = program.kind else {
            panic!("expected program");
        };
        match body.remove(0).kind {
            NodeKind::ExpressionStatement { expression } => *expression,
            other => panic!("expected expression statement, got {:?}", other),
        }
    }

    #[test]
    fn test_lower_signature_shape() {
        let call = expression("obj.method(a, [b])");
        let (callee, args) = call.as_call().expect("call expression");

        assert_eq!(callee.kind_name(), "MemberExpression");
        assert_eq!(args.len(), 2);
        assert_eq!(args[0].identifier_name(), Some("a"));
        let NodeKind::ArrayExpression { elements } = &args[1].kind else {
            panic!("expected array, got {:?}", args[1].kind);
        };
        assert_eq!(elements[0].identifier_name(), Some("b"));
    }

    #[test]
    fn test_lower_spans() {
        let call = expression("\n  foo(x)");
        assert_eq!(call.span.line, 2);
        assert_eq!(call.span.column, 2);
        assert_eq!(call.span.start, 3);
        assert_eq!(call.span.end, 9);
    }

    #[test]
    fn test_parentheses_and_comments_are_dropped() {
        let call = expression("(foo)(/* note */ x)");
        let (callee, args) = call.as_call().unwrap();

        assert_eq!(callee.identifier_name(), Some("foo"));
        assert_eq!(args.len(), 1);
    }

    #[test]
    fn test_subscript_is_computed_member() {
        let call = expression("a[0]()");
        let (callee, _) = call.as_call().unwrap();
        let NodeKind::MemberExpression {
            property, computed, ..
        } = &callee.kind
        else {
            panic!("expected member expression");
        };

        assert!(*computed);
        assert!(matches!(
            property.kind,
            NodeKind::Literal {
                value: LiteralValue::Number(v)
            } if v == 0.0
        ));
    }

    #[test]
    fn test_optional_chaining() {
        let call = expression("a?.b()");
        let (callee, _) = call.as_call().unwrap();
        assert!(matches!(
            callee.kind,
            NodeKind::MemberExpression { optional: true, .. }
        ));

        let plain = expression("a.b()");
        assert!(!plain.structurally_eq(&call));
    }

    #[test]
    fn test_logical_vs_binary() {
        let logical = expression("a && b");
        assert_eq!(logical.kind_name(), "LogicalExpression");

        let binary = expression("a + b");
        assert!(matches!(
            binary.kind,
            NodeKind::BinaryExpression { ref operator, .. } if operator == "+"
        ));
    }

    #[test]
    fn test_unknown_kinds_keep_children() {
        let arrow = expression("() => foo(1)");
        let NodeKind::Other { kind, children, .. } = &arrow.kind else {
            panic!("expected other, got {:?}", arrow.kind);
        };
        assert_eq!(kind, "arrow_function");
        assert!(children.iter().any(|c| c.is_call()));
    }

    #[test]
    fn test_parse_number_forms() {
        assert_eq!(parse_number("42"), Some(LiteralValue::Number(42.0)));
        assert_eq!(parse_number("1_000"), Some(LiteralValue::Number(1000.0)));
        assert_eq!(parse_number("0xff"), Some(LiteralValue::Number(255.0)));
        assert_eq!(parse_number("0b101"), Some(LiteralValue::Number(5.0)));
        assert_eq!(parse_number("0o17"), Some(LiteralValue::Number(15.0)));
        assert_eq!(parse_number("1.5e2"), Some(LiteralValue::Number(150.0)));
        assert_eq!(parse_number("10n"), Some(LiteralValue::BigInt("10".into())));
    }

    #[test]
    fn test_parse_number_legacy_octal() {
        assert_eq!(parse_number("010"), Some(LiteralValue::Number(8.0)));
        assert_eq!(parse_number("00"), Some(LiteralValue::Number(0.0)));
        assert_eq!(parse_number("0"), Some(LiteralValue::Number(0.0)));
        assert_eq!(parse_number("08"), Some(LiteralValue::Number(8.0)));
        assert_eq!(parse_number("019"), Some(LiteralValue::Number(19.0)));
        assert_eq!(parse_number("0.5"), Some(LiteralValue::Number(0.5)));
    }

    #[test]
    fn test_parse_number_beyond_u64() {
        let big = parse_number("0x1_0000_0000_0000_0000");
        assert_eq!(big, Some(LiteralValue::Number(18446744073709551616.0)));
        assert_eq!(parse_number("0x"), None);
    }

    #[test]
    fn test_array_holes_are_elements() {
        let elements = |source: &str| match expression(source).kind {
            NodeKind::ArrayExpression { elements } => elements,
            other => panic!("expected array, got {:?}", other),
        };
        let holes = |elements: &[Node]| {
            elements.iter().map(|e| e.kind_name() == "hole").collect::<Vec<_>>()
        };

        assert_eq!(holes(&elements("[, a]")), vec![true, false]);
        assert_eq!(holes(&elements("[a, , b]")), vec![false, true, false]);
        assert_eq!(holes(&elements("[a, ,]")), vec![false, true]);
        assert_eq!(holes(&elements("[a,]")), vec![false]);
        assert_eq!(holes(&elements("[,]")), vec![true]);
        assert!(elements("[]").is_empty());

        assert!(!expression("[, x]").structurally_eq(&expression("[x]")));
        assert!(!expression("[a, , b]").structurally_eq(&expression("[a, b]")));
        assert!(expression("[, x]").structurally_eq(&expression("[ , x ]")));
    }

    #[test]
    fn test_shorthand_property() {
        let object = expression("({ a, b: 1 })");
        let NodeKind::ObjectExpression { properties } = &object.kind else {
            panic!("expected object, got {:?}", object.kind);
        };
        assert!(matches!(
            properties[0].kind,
            NodeKind::Property { shorthand: true, .. }
        ));
        assert!(matches!(
            properties[1].kind,
            NodeKind::Property { shorthand: false, .. }
        ));
    }
}
