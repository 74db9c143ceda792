//! Expression tree representation.
//!
//! Tree-sitter hands us a concrete syntax tree full of punctuation and
//! grammar-specific wrappers. We lower it into this ESTree-shaped tree so
//! that matching can reason about calls, members and identifiers directly.
//! Every node carries a [`Span`]; spans are position metadata and never take
//! part in structural comparison.

use serde::Serialize;

/// Where a node sits in its source text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Span {
    /// Byte offset of the first character.
    pub start: u32,
    /// Byte offset one past the last character.
    pub end: u32,
    /// Starting line (1-indexed, like editors show).
    pub line: u32,
    /// Starting column (0-indexed, in bytes).
    pub column: u32,
}

impl Span {
    /// Whether this is the empty span left behind by [`Node::purify`].
    pub fn is_empty(&self) -> bool {
        *self == Span::default()
    }
}

/// The value of a literal node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum LiteralValue {
    /// String contents without the surrounding quotes.
    String(String),
    Number(f64),
    /// BigInt digits without the trailing `n`.
    BigInt(String),
    Boolean(bool),
    Null,
    RegExp { pattern: String, flags: String },
}

/// The kinds of expression-tree nodes we distinguish.
///
/// Names follow ESTree. Anything the matcher has no reason to look inside
/// (statements, function bodies, templates, TypeScript-only syntax) lands
/// in [`NodeKind::Other`], which still keeps its children so walks can
/// reach nested calls.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum NodeKind {
    Program {
        body: Vec<Node>,
    },
    ExpressionStatement {
        expression: Box<Node>,
    },
    Identifier {
        name: String,
    },
    Literal {
        value: LiteralValue,
    },
    ThisExpression,
    Super,
    ArrayExpression {
        elements: Vec<Node>,
    },
    ObjectExpression {
        properties: Vec<Node>,
    },
    Property {
        key: Box<Node>,
        value: Box<Node>,
        computed: bool,
        shorthand: bool,
    },
    MemberExpression {
        object: Box<Node>,
        property: Box<Node>,
        computed: bool,
        optional: bool,
    },
    CallExpression {
        callee: Box<Node>,
        arguments: Vec<Node>,
        optional: bool,
    },
    NewExpression {
        callee: Box<Node>,
        arguments: Vec<Node>,
    },
    SpreadElement {
        argument: Box<Node>,
    },
    UnaryExpression {
        operator: String,
        argument: Box<Node>,
    },
    BinaryExpression {
        operator: String,
        left: Box<Node>,
        right: Box<Node>,
    },
    LogicalExpression {
        operator: String,
        left: Box<Node>,
        right: Box<Node>,
    },
    AssignmentExpression {
        operator: String,
        left: Box<Node>,
        right: Box<Node>,
    },
    ConditionalExpression {
        test: Box<Node>,
        consequent: Box<Node>,
        alternate: Box<Node>,
    },
    AwaitExpression {
        argument: Box<Node>,
    },
    /// Any grammar construct outside the set above.
    Other {
        /// The raw Tree-sitter kind, e.g. `arrow_function`.
        kind: String,
        /// Source text for leaves and template strings.
        text: Option<String>,
        children: Vec<Node>,
    },
}

/// A child edge reached through a field name.
#[derive(Debug, Clone, Copy)]
pub enum Edge<'a> {
    Node(&'a Node),
    List(&'a [Node]),
}

/// A node of the expression tree.
#[derive(Debug, Clone, Serialize)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
}

impl Node {
    pub fn new(kind: NodeKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// The kind name used to look up traversal keys.
    ///
    /// ESTree names for the known kinds, the raw grammar kind for `Other`.
    pub fn kind_name(&self) -> &str {
        match &self.kind {
            NodeKind::Program { .. } => "Program",
            NodeKind::ExpressionStatement { .. } => "ExpressionStatement",
            NodeKind::Identifier { .. } => "Identifier",
            NodeKind::Literal { .. } => "Literal",
            NodeKind::ThisExpression => "ThisExpression",
            NodeKind::Super => "Super",
            NodeKind::ArrayExpression { .. } => "ArrayExpression",
            NodeKind::ObjectExpression { .. } => "ObjectExpression",
            NodeKind::Property { .. } => "Property",
            NodeKind::MemberExpression { .. } => "MemberExpression",
            NodeKind::CallExpression { .. } => "CallExpression",
            NodeKind::NewExpression { .. } => "NewExpression",
            NodeKind::SpreadElement { .. } => "SpreadElement",
            NodeKind::UnaryExpression { .. } => "UnaryExpression",
            NodeKind::BinaryExpression { .. } => "BinaryExpression",
            NodeKind::LogicalExpression { .. } => "LogicalExpression",
            NodeKind::AssignmentExpression { .. } => "AssignmentExpression",
            NodeKind::ConditionalExpression { .. } => "ConditionalExpression",
            NodeKind::AwaitExpression { .. } => "AwaitExpression",
            NodeKind::Other { kind, .. } => kind,
        }
    }

    pub fn is_call(&self) -> bool {
        matches!(self.kind, NodeKind::CallExpression { .. })
    }

    /// Callee and arguments, if this is a call expression.
    pub fn as_call(&self) -> Option<(&Node, &[Node])> {
        match &self.kind {
            NodeKind::CallExpression {
                callee, arguments, ..
            } => Some((callee, arguments)),
            _ => None,
        }
    }

    /// The identifier text, if this is an identifier.
    pub fn identifier_name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Identifier { name } => Some(name),
            _ => None,
        }
    }

    /// Looks up a child edge by its ESTree field name.
    ///
    /// `Other` nodes expose their children under `children`.
    pub fn edge(&self, field: &str) -> Option<Edge<'_>> {
        use NodeKind as K;

        let edge = match (&self.kind, field) {
            (K::Program { body }, "body") => Edge::List(body),
            (K::ExpressionStatement { expression }, "expression") => Edge::Node(expression),
            (K::ArrayExpression { elements }, "elements") => Edge::List(elements),
            (K::ObjectExpression { properties }, "properties") => Edge::List(properties),
            (K::Property { key, .. }, "key") => Edge::Node(key),
            (K::Property { value, .. }, "value") => Edge::Node(value),
            (K::MemberExpression { object, .. }, "object") => Edge::Node(object),
            (K::MemberExpression { property, .. }, "property") => Edge::Node(property),
            (
                K::CallExpression { callee, .. } | K::NewExpression { callee, .. },
                "callee",
            ) => Edge::Node(callee),
            (
                K::CallExpression { arguments, .. } | K::NewExpression { arguments, .. },
                "arguments",
            ) => Edge::List(arguments),
            (
                K::SpreadElement { argument }
                | K::UnaryExpression { argument, .. }
                | K::AwaitExpression { argument },
                "argument",
            ) => Edge::Node(argument),
            (
                K::BinaryExpression { left, .. }
                | K::LogicalExpression { left, .. }
                | K::AssignmentExpression { left, .. },
                "left",
            ) => Edge::Node(left),
            (
                K::BinaryExpression { right, .. }
                | K::LogicalExpression { right, .. }
                | K::AssignmentExpression { right, .. },
                "right",
            ) => Edge::Node(right),
            (K::ConditionalExpression { test, .. }, "test") => Edge::Node(test),
            (K::ConditionalExpression { consequent, .. }, "consequent") => Edge::Node(consequent),
            (K::ConditionalExpression { alternate, .. }, "alternate") => Edge::Node(alternate),
            (K::Other { children, .. }, "children") => Edge::List(children),
            _ => return None,
        };
        Some(edge)
    }

    /// Returns a deep copy with every span cleared.
    ///
    /// Two purified trees differ only where their semantics differ.
    pub fn purify(&self) -> Node {
        let mut copy = self.clone();
        copy.clear_spans();
        copy
    }

    fn clear_spans(&mut self) {
        self.span = Span::default();
        self.for_each_child_mut(&mut |child| child.clear_spans());
    }

    fn for_each_child_mut(&mut self, f: &mut impl FnMut(&mut Node)) {
        use NodeKind as K;

        match &mut self.kind {
            K::Program { body: list }
            | K::ArrayExpression { elements: list }
            | K::ObjectExpression { properties: list }
            | K::Other { children: list, .. } => list.iter_mut().for_each(f),
            K::ExpressionStatement { expression: one }
            | K::SpreadElement { argument: one }
            | K::UnaryExpression { argument: one, .. }
            | K::AwaitExpression { argument: one } => f(one),
            K::Property { key, value, .. } => {
                f(key);
                f(value);
            }
            K::MemberExpression {
                object, property, ..
            } => {
                f(object);
                f(property);
            }
            K::CallExpression {
                callee, arguments, ..
            }
            | K::NewExpression { callee, arguments } => {
                f(callee);
                arguments.iter_mut().for_each(f);
            }
            K::BinaryExpression { left, right, .. }
            | K::LogicalExpression { left, right, .. }
            | K::AssignmentExpression { left, right, .. } => {
                f(left);
                f(right);
            }
            K::ConditionalExpression {
                test,
                consequent,
                alternate,
            } => {
                f(test);
                f(consequent);
                f(alternate);
            }
            K::Identifier { .. } | K::Literal { .. } | K::ThisExpression | K::Super => {}
        }
    }

    /// Compares two subtrees by kind, semantic fields and children.
    ///
    /// Spans are ignored, so this agrees with comparing the purified forms
    /// without having to allocate them.
    pub fn structurally_eq(&self, other: &Node) -> bool {
        use NodeKind as K;

        match (&self.kind, &other.kind) {
            (K::Program { body: a }, K::Program { body: b }) => all_eq(a, b),
            (
                K::ExpressionStatement { expression: a },
                K::ExpressionStatement { expression: b },
            ) => a.structurally_eq(b),
            (K::Identifier { name: a }, K::Identifier { name: b }) => a == b,
            (K::Literal { value: a }, K::Literal { value: b }) => a == b,
            (K::ThisExpression, K::ThisExpression) | (K::Super, K::Super) => true,
            (K::ArrayExpression { elements: a }, K::ArrayExpression { elements: b }) => {
                all_eq(a, b)
            }
            (K::ObjectExpression { properties: a }, K::ObjectExpression { properties: b }) => {
                all_eq(a, b)
            }
            (
                K::Property {
                    key: k1,
                    value: v1,
                    computed: c1,
                    shorthand: s1,
                },
                K::Property {
                    key: k2,
                    value: v2,
                    computed: c2,
                    shorthand: s2,
                },
            ) => c1 == c2 && s1 == s2 && k1.structurally_eq(k2) && v1.structurally_eq(v2),
            (
                K::MemberExpression {
                    object: o1,
                    property: p1,
                    computed: c1,
                    optional: q1,
                },
                K::MemberExpression {
                    object: o2,
                    property: p2,
                    computed: c2,
                    optional: q2,
                },
            ) => c1 == c2 && q1 == q2 && o1.structurally_eq(o2) && p1.structurally_eq(p2),
            (
                K::CallExpression {
                    callee: c1,
                    arguments: a1,
                    optional: q1,
                },
                K::CallExpression {
                    callee: c2,
                    arguments: a2,
                    optional: q2,
                },
            ) => q1 == q2 && c1.structurally_eq(c2) && all_eq(a1, a2),
            (
                K::NewExpression {
                    callee: c1,
                    arguments: a1,
                },
                K::NewExpression {
                    callee: c2,
                    arguments: a2,
                },
            ) => c1.structurally_eq(c2) && all_eq(a1, a2),
            (K::SpreadElement { argument: a }, K::SpreadElement { argument: b })
            | (K::AwaitExpression { argument: a }, K::AwaitExpression { argument: b }) => {
                a.structurally_eq(b)
            }
            (
                K::UnaryExpression {
                    operator: o1,
                    argument: a,
                },
                K::UnaryExpression {
                    operator: o2,
                    argument: b,
                },
            ) => o1 == o2 && a.structurally_eq(b),
            (
                K::BinaryExpression {
                    operator: o1,
                    left: l1,
                    right: r1,
                },
                K::BinaryExpression {
                    operator: o2,
                    left: l2,
                    right: r2,
                },
            )
            | (
                K::LogicalExpression {
                    operator: o1,
                    left: l1,
                    right: r1,
                },
                K::LogicalExpression {
                    operator: o2,
                    left: l2,
                    right: r2,
                },
            )
            | (
                K::AssignmentExpression {
                    operator: o1,
                    left: l1,
                    right: r1,
                },
                K::AssignmentExpression {
                    operator: o2,
                    left: l2,
                    right: r2,
                },
            ) => o1 == o2 && l1.structurally_eq(l2) && r1.structurally_eq(r2),
            (
                K::ConditionalExpression {
                    test: t1,
                    consequent: c1,
                    alternate: a1,
                },
                K::ConditionalExpression {
                    test: t2,
                    consequent: c2,
                    alternate: a2,
                },
            ) => t1.structurally_eq(t2) && c1.structurally_eq(c2) && a1.structurally_eq(a2),
            (
                K::Other {
                    kind: k1,
                    text: t1,
                    children: c1,
                },
                K::Other {
                    kind: k2,
                    text: t2,
                    children: c2,
                },
            ) => k1 == k2 && t1 == t2 && all_eq(c1, c2),
            _ => false,
        }
    }
}

fn all_eq(a: &[Node], b: &[Node]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.structurally_eq(y))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(start: u32) -> Span {
        Span {
            start,
            end: start + 1,
            line: 1,
            column: start,
        }
    }

    fn ident(name: &str, at: u32) -> Node {
        Node::new(
            NodeKind::Identifier {
                name: name.to_string(),
            },
            span(at),
        )
    }

    fn member(object: Node, property: Node, at: u32) -> Node {
        Node::new(
            NodeKind::MemberExpression {
                object: Box::new(object),
                property: Box::new(property),
                computed: false,
                optional: false,
            },
            span(at),
        )
    }

    #[test]
    fn test_structural_eq_ignores_spans() {
        let a = member(ident("obj", 0), ident("method", 4), 0);
        let b = member(ident("obj", 20), ident("method", 24), 20);

        assert!(a.structurally_eq(&b));
    }

    #[test]
    fn test_structural_eq_compares_names_and_flags() {
        let a = member(ident("foo", 0), ident("bar", 4), 0);
        let b = member(ident("foo", 0), ident("baz", 4), 0);
        assert!(!a.structurally_eq(&b));

        let mut computed = a.clone();
        if let NodeKind::MemberExpression { computed: c, .. } = &mut computed.kind {
            *c = true;
        }
        assert!(!a.structurally_eq(&computed));
    }

    #[test]
    fn test_structural_eq_different_kinds() {
        let name = ident("this", 0);
        let this = Node::new(NodeKind::ThisExpression, span(0));
        assert!(!name.structurally_eq(&this));
    }

    #[test]
    fn test_purify_clears_every_span() {
        let node = member(member(ident("a", 0), ident("b", 2), 0), ident("c", 4), 0);
        let pure = node.purify();

        assert!(pure.span.is_empty());
        let NodeKind::MemberExpression { object, property, .. } = &pure.kind else {
            panic!("expected member expression");
        };
        assert!(object.span.is_empty());
        assert!(property.span.is_empty());
        let NodeKind::MemberExpression { object: inner, .. } = &object.kind else {
            panic!("expected nested member expression");
        };
        assert!(inner.span.is_empty());

        // The original is left alone.
        assert_eq!(node.span, span(0));
        assert!(pure.structurally_eq(&node));
    }

    #[test]
    fn test_edges_by_field_name() {
        let call = Node::new(
            NodeKind::CallExpression {
                callee: Box::new(ident("f", 0)),
                arguments: vec![ident("x", 2), ident("y", 5)],
                optional: false,
            },
            span(0),
        );

        assert!(matches!(
            call.edge("callee"),
            Some(Edge::Node(n)) if n.identifier_name() == Some("f")
        ));
        assert!(matches!(call.edge("arguments"), Some(Edge::List(args)) if args.len() == 2));
        assert!(call.edge("object").is_none());
        assert_eq!(call.kind_name(), "CallExpression");
        assert!(call.is_call());
    }

    #[test]
    fn test_literal_values_compare_by_value() {
        let one = Node::new(
            NodeKind::Literal {
                value: LiteralValue::Number(1.0),
            },
            span(0),
        );
        let same = Node::new(
            NodeKind::Literal {
                value: LiteralValue::Number(1.0),
            },
            span(9),
        );
        let text = Node::new(
            NodeKind::Literal {
                value: LiteralValue::String("1".into()),
            },
            span(0),
        );

        assert!(one.structurally_eq(&same));
        assert!(!one.structurally_eq(&text));
    }
}
