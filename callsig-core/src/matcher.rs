//! The call-signature matcher.
//!
//! A [`Matcher`] is compiled once from a [`Signature`] and then answers two
//! questions about nodes of any tree lowered by this crate:
//!
//! - [`Matcher::test`]: is this call a call of the signature?
//! - [`Matcher::match_argument`]: which declared parameter does this
//!   argument fill?
//!
//! The callee must match exactly, ignoring source positions. Arguments are
//! the free variables of the signature, so only their count is checked.

use crate::error::SignatureError;
use crate::node::Node;
use crate::signature::{argument_shape, Signature};
use crate::traversal::{structural_depth, TraversalKeys};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, trace};

/// Whether a parameter has to be passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    /// Declared as a bare identifier, `a`.
    Mandatory,
    /// Declared as a one-element array, `[a]`.
    Optional,
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Mandatory => "mandatory",
            Self::Optional => "optional",
        };
        write!(f, "{}", s)
    }
}

/// A declared parameter of a signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArgumentSignature {
    pub name: String,
    pub kind: ParameterKind,
}

impl ArgumentSignature {
    pub fn is_optional(&self) -> bool {
        self.kind == ParameterKind::Optional
    }
}

/// Construction-time settings for a [`Matcher`].
#[derive(Debug, Clone, Default)]
pub struct MatcherOptions {
    /// Child edges followed when measuring callee depth.
    pub traversal_keys: TraversalKeys,
}

/// A compiled signature.
///
/// Immutable after construction; queries borrow candidate nodes and never
/// modify them, so a matcher can be shared freely between threads.
#[derive(Debug, Clone)]
pub struct Matcher {
    signature: Signature,
    /// Purified copy of the signature's callee.
    callee: Node,
    callee_depth: usize,
    parameters: Vec<ArgumentSignature>,
    min_arg_count: usize,
    max_arg_count: usize,
    keys: TraversalKeys,
}

impl Matcher {
    /// Compiles a signature with the default traversal keys.
    pub fn new(signature: Signature) -> Self {
        Self::with_options(signature, MatcherOptions::default())
    }

    /// Compiles a signature with explicit options.
    pub fn with_options(signature: Signature, options: MatcherOptions) -> Self {
        let keys = options.traversal_keys;
        let callee = signature.callee().purify();
        let callee_depth = structural_depth(&callee, &keys);

        let parameters: Vec<ArgumentSignature> = signature
            .arguments()
            .iter()
            .filter_map(argument_shape)
            .map(|(name, optional)| ArgumentSignature {
                name: name.to_string(),
                kind: if optional {
                    ParameterKind::Optional
                } else {
                    ParameterKind::Mandatory
                },
            })
            .collect();

        let max_arg_count = parameters.len();
        let min_arg_count = parameters.iter().filter(|p| !p.is_optional()).count();

        debug!(
            "Compiled signature {} (callee depth {}, {}..={} arguments)",
            signature, callee_depth, min_arg_count, max_arg_count
        );

        Self {
            signature,
            callee,
            callee_depth,
            parameters,
            min_arg_count,
            max_arg_count,
            keys,
        }
    }

    /// Parses, validates and compiles a signature string.
    ///
    /// # Example
    ///
    /// ```
    /// use callsig_core::Matcher;
    ///
    /// let matcher = Matcher::parse("obj.method(a, [b])").unwrap();
    /// assert_eq!(matcher.min_arg_count(), 1);
    /// assert_eq!(matcher.max_arg_count(), 2);
    /// ```
    pub fn parse(text: &str) -> Result<Self, SignatureError> {
        Signature::parse(text).map(Self::new)
    }

    /// Whether `node` is a call of this signature.
    ///
    /// The callee must have the same structural depth and be structurally
    /// equal to the signature's callee, and the number of arguments must
    /// fall within the mandatory..=all parameter range.
    pub fn test(&self, node: &Node) -> bool {
        let Some((callee, arguments)) = node.as_call() else {
            return false;
        };

        let depth = structural_depth(callee, &self.keys);
        if depth != self.callee_depth {
            trace!(
                "Callee depth {} differs from {} at line {}",
                depth,
                self.callee_depth,
                node.span.line
            );
            return false;
        }

        if !self.callee.structurally_eq(callee) {
            trace!("Callee differs at line {}", node.span.line);
            return false;
        }

        let count = arguments.len();
        let fits = (self.min_arg_count..=self.max_arg_count).contains(&count);
        if !fits {
            trace!(
                "{} arguments outside {}..={} at line {}",
                count,
                self.min_arg_count,
                self.max_arg_count,
                node.span.line
            );
        }
        fits
    }

    /// The parameter `argument` fills as an argument of `parent`.
    ///
    /// Optional parameters are filled in declared order once every
    /// mandatory one is present. Returns `None` when `argument` is the
    /// callee, when `parent` does not match, or when `argument` is not one
    /// of `parent`'s arguments. Nodes are compared by identity, so both
    /// must come from the same tree.
    pub fn match_argument(&self, argument: &Node, parent: &Node) -> Option<&ArgumentSignature> {
        let (callee, arguments) = parent.as_call()?;
        if std::ptr::eq(callee, argument) {
            return None;
        }

        if !self.test(parent) {
            return None;
        }

        let position = arguments.iter().position(|a| std::ptr::eq(a, argument))?;

        let mut optional_present = arguments.len() - self.min_arg_count;
        self.parameters
            .iter()
            .filter(|parameter| {
                if !parameter.is_optional() {
                    return true;
                }
                if optional_present > 0 {
                    optional_present -= 1;
                    return true;
                }
                false
            })
            .nth(position)
    }

    /// The signature this matcher was compiled from.
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Declared parameters in order.
    pub fn parameters(&self) -> &[ArgumentSignature] {
        &self.parameters
    }

    /// Structural depth of the signature's callee.
    pub fn callee_depth(&self) -> usize {
        self.callee_depth
    }

    /// Number of mandatory parameters.
    pub fn min_arg_count(&self) -> usize {
        self.min_arg_count
    }

    /// Number of declared parameters.
    pub fn max_arg_count(&self) -> usize {
        self.max_arg_count
    }

    /// Traversal keys in use.
    pub fn traversal_keys(&self) -> &TraversalKeys {
        &self.keys
    }
}
