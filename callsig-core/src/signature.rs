//! Signature extraction and validation.
//!
//! A signature is written as a call: `obj.method(a, [b])`. The callee is
//! the address to match, each bare identifier is a mandatory parameter and
//! each identifier wrapped in a one-element array is an optional one.

use crate::error::SignatureError;
use crate::languages::TypeScriptParser;
use crate::node::{Node, NodeKind};
use crate::parser::parse_source;
use std::collections::HashSet;
use std::fmt;

/// A validated call-expression signature.
///
/// Only obtainable through [`Signature::parse`] or
/// [`Signature::from_program`], so holding one means the shape rules hold.
#[derive(Debug, Clone)]
pub struct Signature {
    text: String,
    callee: Node,
    arguments: Vec<Node>,
}

impl Signature {
    /// Parses and validates a signature string.
    ///
    /// # Example
    ///
    /// ```
    /// use callsig_core::Signature;
    ///
    /// let signature = Signature::parse("obj.method(a, [b])").unwrap();
    /// assert_eq!(signature.arguments().len(), 2);
    /// ```
    pub fn parse(text: &str) -> Result<Self, SignatureError> {
        let parsed = parse_source(text, &TypeScriptParser)?;
        if let Some(error) = parsed.first_error {
            return Err(error.into());
        }
        Self::from_program(text, parsed.program)
    }

    /// Extracts the call from an already parsed program and validates it.
    ///
    /// The program must consist of exactly one expression statement whose
    /// expression is a call.
    pub fn from_program(text: &str, program: Node) -> Result<Self, SignatureError> {
        let NodeKind::Program { body } = program.kind else {
            return Err(SignatureError::NotCallExpression);
        };
        let [statement] =
            <[Node; 1]>::try_from(body).map_err(|_| SignatureError::NotCallExpression)?;
        let NodeKind::ExpressionStatement { expression } = statement.kind else {
            return Err(SignatureError::NotCallExpression);
        };
        let NodeKind::CallExpression {
            callee, arguments, ..
        } = expression.kind
        else {
            return Err(SignatureError::NotCallExpression);
        };

        validate_arguments(&arguments)?;

        Ok(Self {
            text: text.trim().to_string(),
            callee: *callee,
            arguments,
        })
    }

    /// The signature as written.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The callee subtree, with its original spans.
    pub fn callee(&self) -> &Node {
        &self.callee
    }

    /// The argument-signature nodes in declared order.
    pub fn arguments(&self) -> &[Node] {
        &self.arguments
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Parameter name and optionality of an argument-signature node.
///
/// `a` is `("a", false)`, `[a]` is `("a", true)`, anything else is `None`.
pub(crate) fn argument_shape(node: &Node) -> Option<(&str, bool)> {
    match &node.kind {
        NodeKind::Identifier { name } => Some((name.as_str(), false)),
        NodeKind::ArrayExpression { elements } => match elements.as_slice() {
            [only] => only.identifier_name().map(|name| (name, true)),
            _ => None,
        },
        _ => None,
    }
}

fn validate_arguments(arguments: &[Node]) -> Result<(), SignatureError> {
    let mut seen = HashSet::new();

    for (index, argument) in arguments.iter().enumerate() {
        let (name, _) =
            argument_shape(argument).ok_or(SignatureError::InvalidArgumentForm { index })?;
        if !seen.insert(name) {
            return Err(SignatureError::DuplicateArgumentName(name.to_string()));
        }
    }

    Ok(())
}
