//! Decoding and flattening of the package tree produced by `nix eval`
//!
//! The evaluator emits one JSON document per nixpkgs revision. Every value in it sits at a
//! *node position* and is one of three things:
//!
//! - a package descriptor (`{"pname": "numpy", "version": "1.26.0"}`),
//! - an attribute set to descend into, marked by `"recurseForDerivations": true`,
//! - the literal `true`, which the evaluator writes in place of subtrees it chose not to expand.
//!
//! Objects are ambiguous by shape alone: the same grammar serves both packages and attribute
//! sets. [`Node`] resolves this in two stages over a document parsed once. The first stage
//! probes each object for the `recurseForDerivations` flag, the second decodes the same object
//! into the branch the flag selects. The result is a sum type, so a node can never be half
//! package and half namespace.
//!
//! [`flatten`] then turns a decoded [`Namespace`] into a [`FlatIndex`] keyed by the dotted
//! attribute path (`python3Packages.numpy`). Attribute names are joined verbatim, so a name
//! that itself contains a `.` cannot be told apart from two nested levels.

mod decode;
mod flatten;
mod node;

pub use decode::{MalformedTree, decode, decode_namespace};
pub use flatten::{FlatIndex, flatten};
pub use node::{Namespace, Node, Package, RECURSE_FLAG};
