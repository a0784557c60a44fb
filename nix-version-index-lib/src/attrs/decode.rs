use super::flatten::PATH_SEPARATOR;
use super::node::{Namespace, Node};
use core::fmt::Display;
use serde_json::Value;

/// The input is not a well-formed package tree.
///
/// Either the bytes are not valid JSON, or a value at a node position is neither the literal
/// `true` nor an object. Decoding stops at the first such problem; no partial tree is returned.
#[derive(Debug, thiserror::Error)]
pub enum MalformedTree {
    /// The bytes are not valid JSON, or nest deeper than the parser allows.
    #[error("malformed package tree: {0}")]
    Json(#[from] serde_json::Error),

    /// A value has the wrong shape for its position in the tree.
    #[error("malformed package tree at {}: {reason}", display_path(.attr_path))]
    Shape { attr_path: String, reason: String },
}

impl MalformedTree {
    pub(super) fn shape(path: &[&str], reason: impl Display) -> Self {
        Self::Shape {
            attr_path: path.join(PATH_SEPARATOR),
            reason: reason.to_string(),
        }
    }

    /// Whether the input failed to parse as JSON at all, as opposed to having the wrong shape.
    #[must_use]
    pub fn is_syntax(&self) -> bool {
        match self {
            Self::Json(source) => source.is_syntax() || source.is_eof(),
            Self::Shape { .. } => false,
        }
    }

    /// Dotted attribute path of the offending value, empty for the root.
    ///
    /// `None` when the input is not valid JSON.
    #[must_use]
    pub fn attr_path(&self) -> Option<&str> {
        match self {
            Self::Json(_) => None,
            Self::Shape { attr_path, .. } => Some(attr_path),
        }
    }
}

fn display_path(attr_path: &str) -> String {
    if attr_path.is_empty() {
        "the root".to_string()
    } else {
        format!("'{attr_path}'")
    }
}

/// Decode one JSON value into a [`Node`].
///
/// The document is parsed in a single pass, so nesting deeper than the parser's recursion
/// limit is reported as an error.
///
/// # Errors
///
/// Returns [`MalformedTree`] if the bytes are not valid JSON or any node position holds
/// something other than `true` or an object.
pub fn decode(bytes: &[u8]) -> Result<Node, MalformedTree> {
    let value: Value = serde_json::from_slice(bytes)?;
    Node::from_value(&value, &mut Vec::new())
}

/// Decode a document whose root is an attribute set.
///
/// The evaluator's top-level output is an attribute set that does not carry the recursion
/// flag itself, so the root is taken as a namespace unconditionally. Every value below it is
/// decoded as a [`Node`].
///
/// # Errors
///
/// Returns [`MalformedTree`] if the bytes are not valid JSON, the root is not an object, or any
/// value below it is malformed.
pub fn decode_namespace(bytes: &[u8]) -> Result<Namespace, MalformedTree> {
    let value: Value = serde_json::from_slice(bytes)?;
    Namespace::from_value(&value)
}
