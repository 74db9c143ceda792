//! Key-driven tree traversal.
//!
//! Which child edges a walk follows is decided by a table from node kind
//! name to an ordered list of field names, the same idea as ESTree visitor
//! keys. The default table covers every kind in [`NodeKind`]; callers can
//! replace or extend it, e.g. to stop a walk from descending into some
//! kind of node.
//!
//! [`NodeKind`]: crate::node::NodeKind

use crate::node::{Edge, Node, NodeKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Canonical visitor keys for the expression-tree kinds.
const DEFAULT_KEYS: &[(&str, &[&str])] = &[
    ("Program", &["body"]),
    ("ExpressionStatement", &["expression"]),
    ("Identifier", &[]),
    ("Literal", &[]),
    ("ThisExpression", &[]),
    ("Super", &[]),
    ("ArrayExpression", &["elements"]),
    ("ObjectExpression", &["properties"]),
    ("Property", &["key", "value"]),
    ("MemberExpression", &["object", "property"]),
    ("CallExpression", &["callee", "arguments"]),
    ("NewExpression", &["callee", "arguments"]),
    ("SpreadElement", &["argument"]),
    ("UnaryExpression", &["argument"]),
    ("BinaryExpression", &["left", "right"]),
    ("LogicalExpression", &["left", "right"]),
    ("AssignmentExpression", &["left", "right"]),
    ("ConditionalExpression", &["test", "consequent", "alternate"]),
    ("AwaitExpression", &["argument"]),
];

/// Field names `Other` nodes fall back to when their kind has no entry.
const FALLBACK_FIELDS: &[&str] = &["children"];

/// Mapping from node kind name to the child fields a traversal follows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TraversalKeys {
    keys: HashMap<String, Vec<String>>,
}

impl Default for TraversalKeys {
    fn default() -> Self {
        let keys = DEFAULT_KEYS
            .iter()
            .map(|(kind, fields)| {
                let fields = fields.iter().map(|f| f.to_string()).collect();
                (kind.to_string(), fields)
            })
            .collect();
        Self { keys }
    }
}

impl TraversalKeys {
    /// A table with no entries: only `Other` nodes have children.
    pub fn empty() -> Self {
        Self {
            keys: HashMap::new(),
        }
    }

    /// Loads a table from a JSON object such as
    /// `{"CallExpression": ["callee"]}`.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Sets the fields for one kind, replacing any previous entry.
    pub fn insert(&mut self, kind: impl Into<String>, fields: Vec<String>) {
        self.keys.insert(kind.into(), fields);
    }

    /// Overlays another table on top of this one, entry by entry.
    pub fn merge(mut self, overrides: TraversalKeys) -> Self {
        self.keys.extend(overrides.keys);
        self
    }

    /// Field names configured for a kind, if any.
    pub fn fields(&self, kind: &str) -> Option<&[String]> {
        self.keys.get(kind).map(Vec::as_slice)
    }

    /// Calls `f` for each child the table says to follow, in field order.
    pub fn for_each_child<'a>(&self, node: &'a Node, mut f: impl FnMut(&'a Node)) {
        let mut visit = |field: &str| match node.edge(field) {
            Some(Edge::Node(child)) => f(child),
            Some(Edge::List(children)) => children.iter().for_each(&mut f),
            None => {}
        };

        match self.fields(node.kind_name()) {
            Some(fields) => fields.iter().for_each(|field| visit(field.as_str())),
            None if matches!(node.kind, NodeKind::Other { .. }) => {
                FALLBACK_FIELDS.iter().for_each(|field| visit(*field))
            }
            None => {}
        }
    }
}

/// The longest path from `node` down to any node reachable through `keys`.
///
/// The root sits at path length 0 and every followed edge adds one, so an
/// identifier is 0, `a.b` is 1 and `a.b.c` is 2.
pub fn structural_depth(node: &Node, keys: &TraversalKeys) -> usize {
    depth_from(node, keys, 0)
}

fn depth_from(node: &Node, keys: &TraversalKeys, depth: usize) -> usize {
    let mut deepest = depth;
    keys.for_each_child(node, |child| {
        deepest = deepest.max(depth_from(child, keys, depth + 1));
    });
    deepest
}

/// Visits `root` and every node reachable through `keys` in pre-order,
/// passing each node's immediate parent (`None` for the root).
pub fn walk<'a>(
    root: &'a Node,
    keys: &TraversalKeys,
    mut visit: impl FnMut(&'a Node, Option<&'a Node>),
) {
    walk_from(root, None, keys, &mut visit);
}

fn walk_from<'a>(
    node: &'a Node,
    parent: Option<&'a Node>,
    keys: &TraversalKeys,
    visit: &mut impl FnMut(&'a Node, Option<&'a Node>),
) {
    visit(node, parent);
    keys.for_each_child(node, |child| walk_from(child, Some(node), keys, visit));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::languages::get_parser;
    use crate::parser::parse_source;

    fn program(source: &str) -> Node {
        let parser = get_parser("js").unwrap();
        parse_source(source, parser.as_ref()).unwrap().program
    }

    fn callee_of(program: &Node) -> &Node {
        let mut found = None;
        walk(program, &TraversalKeys::default(), |node, _| {
            if found.is_none() {
                if let Some((callee, _)) = node.as_call() {
                    found = Some(callee);
                }
            }
        });
        found.expect("a call expression")
    }

    #[test]
    fn test_depth_of_member_chains() {
        let keys = TraversalKeys::default();

        let ident = program("a()");
        assert_eq!(structural_depth(callee_of(&ident), &keys), 0);

        let member = program("a.b()");
        assert_eq!(structural_depth(callee_of(&member), &keys), 1);

        let chain = program("a.b.c()");
        assert_eq!(structural_depth(callee_of(&chain), &keys), 2);
    }

    #[test]
    fn test_depth_follows_configured_keys() {
        let source = program("a.b.c()");
        let callee = callee_of(&source);

        let mut keys = TraversalKeys::default();
        keys.insert("MemberExpression", vec!["property".to_string()]);

        // Only the outer member's property is followed
        assert_eq!(structural_depth(callee, &keys), 1);
        assert_eq!(structural_depth(callee, &TraversalKeys::empty()), 0);
    }

    #[test]
    fn test_walk_yields_parents() {
        let source = program("obj.method(x, 1);");
        let mut pairs = Vec::new();
        walk(&source, &TraversalKeys::default(), |node, parent| {
            pairs.push((
                node.kind_name().to_string(),
                parent.map(|p| p.kind_name().to_string()),
            ));
        });

        assert_eq!(pairs[0], ("Program".to_string(), None));
        assert_eq!(
            pairs[1],
            ("ExpressionStatement".to_string(), Some("Program".to_string()))
        );
        assert!(pairs.contains(&("Literal".to_string(), Some("CallExpression".to_string()))));
        assert_eq!(pairs.len(), 8);
    }

    #[test]
    fn test_walk_descends_into_other_nodes() {
        let source = program("function run() { if (ok) { inner(1); } }");
        let mut calls = 0;
        walk(&source, &TraversalKeys::default(), |node, _| {
            if node.is_call() {
                calls += 1;
            }
        });
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_keys_from_json_and_merge() {
        let overrides = TraversalKeys::from_json(r#"{"CallExpression": ["callee"]}"#).unwrap();
        let keys = TraversalKeys::default().merge(overrides);

        assert_eq!(keys.fields("CallExpression").unwrap(), &["callee".to_string()]);
        assert_eq!(
            keys.fields("MemberExpression").unwrap(),
            &["object".to_string(), "property".to_string()]
        );
        assert!(TraversalKeys::from_json("[1, 2]").is_err());
    }
}
