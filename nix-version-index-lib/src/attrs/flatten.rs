use super::node::{Namespace, Node};
use std::collections::BTreeMap;

/// Dotted attribute path to package version.
///
/// Ordered so that serialized indexes are stable across runs.
pub type FlatIndex = BTreeMap<String, String>;

pub(super) const PATH_SEPARATOR: &str = ".";

/// Flatten a namespace into a map from dotted attribute path to version.
///
/// Every package reachable through nested namespaces produces exactly one entry, including
/// packages with an empty version. Namespaces produce no entry of their own and opaque nodes
/// are skipped without descending into them.
#[must_use]
pub fn flatten(namespace: &Namespace) -> FlatIndex {
    let mut index = FlatIndex::new();
    let mut path = Vec::new();
    flatten_into(namespace, &mut path, &mut index);
    index
}

fn flatten_into<'a>(namespace: &'a Namespace, path: &mut Vec<&'a str>, index: &mut FlatIndex) {
    for (attr, node) in namespace.iter() {
        match node {
            Node::Package(package) => {
                path.push(attr);
                let _ = index.insert(path.join(PATH_SEPARATOR), package.version.clone());
                let _ = path.pop();
            }
            Node::Namespace(nested) => {
                path.push(attr);
                flatten_into(nested, path, index);
                let _ = path.pop();
            }
            Node::Opaque => {}
        }
    }
}
