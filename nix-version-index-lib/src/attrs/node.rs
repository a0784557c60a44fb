use super::decode::MalformedTree;
use super::flatten::{FlatIndex, flatten};
use rustc_hash::FxHashMap;
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Name of the flag marking an attribute set the evaluator wants traversed.
pub const RECURSE_FLAG: &str = "recurseForDerivations";

/// One position in the package tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A leaf package descriptor.
    Package(Package),

    /// An attribute set whose values are themselves nodes.
    Namespace(Namespace),

    /// A subtree the evaluator did not expand, written as a bare `true`.
    Opaque,
}

/// A leaf package descriptor. Fields missing from the document are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Package {
    #[serde(rename = "pname", default, deserialize_with = "null_as_empty")]
    pub name: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub version: String,
}

/// An attribute set: attribute name to node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Namespace(FxHashMap<String, Node>);

/// First-stage shape, used only to read the recursion flag of an object.
#[derive(Deserialize)]
struct Probe {
    #[serde(rename = "recurseForDerivations", default, deserialize_with = "null_as_false")]
    recurse: bool,
}

impl Node {
    /// Build a node from an already parsed JSON value.
    ///
    /// `path` holds the attribute names leading to `value` and is only used to locate errors.
    pub(super) fn from_value<'a>(value: &'a Value, path: &mut Vec<&'a str>) -> Result<Self, MalformedTree> {
        let object = match value {
            Value::Bool(true) => return Ok(Self::Opaque),
            Value::Object(object) => object,
            other => {
                return Err(MalformedTree::shape(
                    path,
                    format_args!("invalid type: {}, expected the literal `true` or an object", kind(other)),
                ));
            }
        };

        let probe = Probe::deserialize(value).map_err(|e| MalformedTree::shape(path.as_slice(), e))?;
        if probe.recurse {
            Namespace::from_object(object, path).map(Self::Namespace)
        } else {
            Package::deserialize(value).map(Self::Package).map_err(|e| MalformedTree::shape(path.as_slice(), e))
        }
    }

    #[must_use]
    pub const fn as_package(&self) -> Option<&Package> {
        match self {
            Self::Package(package) => Some(package),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_namespace(&self) -> Option<&Namespace> {
        match self {
            Self::Namespace(namespace) => Some(namespace),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_opaque(&self) -> bool {
        matches!(self, Self::Opaque)
    }

    /// Flatten the tree rooted at this node.
    ///
    /// Only a namespace root contributes entries. An opaque root has nothing beneath it, and a
    /// package root has no attribute path to be keyed by.
    #[must_use]
    pub fn flatten(&self) -> FlatIndex {
        match self {
            Self::Namespace(namespace) => flatten(namespace),
            Self::Package(_) | Self::Opaque => FlatIndex::new(),
        }
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value, &mut Vec::new()).map_err(D::Error::custom)
    }
}

impl Package {
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl Namespace {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a namespace from a parsed root document, which need not carry the recursion flag.
    pub(super) fn from_value(value: &Value) -> Result<Self, MalformedTree> {
        match value {
            Value::Object(object) => Self::from_object(object, &mut Vec::new()),
            other => Err(MalformedTree::shape(&[], format_args!("invalid type: {}, expected an object", kind(other)))),
        }
    }

    fn from_object<'a>(object: &'a Map<String, Value>, path: &mut Vec<&'a str>) -> Result<Self, MalformedTree> {
        let mut children = FxHashMap::with_capacity_and_hasher(object.len(), rustc_hash::FxBuildHasher);

        for (attr, child) in object {
            path.push(attr.as_str());
            let node = Node::from_value(child, path);
            let _ = path.pop();
            let _ = children.insert(attr.clone(), node?);
        }

        Ok(Self(children))
    }

    /// Insert a child, returning the node previously stored under `attr`.
    pub fn insert(&mut self, attr: impl Into<String>, node: Node) -> Option<Node> {
        self.0.insert(attr.into(), node)
    }

    #[must_use]
    pub fn get(&self, attr: &str) -> Option<&Node> {
        self.0.get(attr)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the children in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.0.iter().map(|(attr, node)| (attr.as_str(), node))
    }

    /// Count the packages reachable through nested namespaces.
    #[must_use]
    pub fn package_count(&self) -> usize {
        self.0
            .values()
            .map(|node| match node {
                Node::Package(_) => 1,
                Node::Namespace(nested) => nested.package_count(),
                Node::Opaque => 0,
            })
            .sum()
    }
}

impl<S: Into<String>> FromIterator<(S, Node)> for Namespace {
    fn from_iter<I: IntoIterator<Item = (S, Node)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(attr, node)| (attr.into(), node)).collect())
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or_default())
}

const fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean `false`",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "map",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(json: &str) -> serde_json::Result<Node> {
        serde_json::from_str(json)
    }

    #[test]
    fn test_true_is_opaque() {
        assert_eq!(node("true").unwrap(), Node::Opaque);
        assert_eq!(node("  true  ").unwrap(), Node::Opaque);
    }

    #[test]
    fn test_object_without_flag_is_package() {
        let decoded = node(r#"{"pname":"numpy","version":"1.26.0"}"#).unwrap();
        assert_eq!(decoded, Node::Package(Package::new("numpy", "1.26.0")));
    }

    #[test]
    fn test_flag_false_is_package() {
        let decoded = node(r#"{"recurseForDerivations":false,"pname":"foo","version":"1.0"}"#).unwrap();
        assert_eq!(decoded.as_package(), Some(&Package::new("foo", "1.0")));
    }

    #[test]
    fn test_flag_true_is_namespace() {
        let decoded = node(r#"{"recurseForDerivations":true,"numpy":{"pname":"numpy","version":"1.26.0"}}"#).unwrap();
        let namespace = decoded.as_namespace().unwrap();

        assert_eq!(namespace.len(), 2);
        assert_eq!(namespace.get(RECURSE_FLAG), Some(&Node::Opaque));
        assert_eq!(
            namespace.get("numpy").and_then(Node::as_package),
            Some(&Package::new("numpy", "1.26.0"))
        );
    }

    #[test]
    fn test_missing_leaf_fields_are_empty() {
        let decoded = node(r#"{"meta":{"broken":false}}"#).unwrap();
        assert_eq!(decoded, Node::Package(Package::default()));
    }

    #[test]
    fn test_null_leaf_fields_are_empty() {
        let decoded = node(r#"{"pname":null,"version":null}"#).unwrap();
        assert_eq!(decoded, Node::Package(Package::default()));
    }

    #[test]
    fn test_flag_order_does_not_matter() {
        let decoded = node(r#"{"hello":{"pname":"hello","version":"2.12"},"recurseForDerivations":true}"#).unwrap();
        assert!(decoded.as_namespace().is_some());
    }

    #[test]
    fn test_array_is_rejected() {
        let err = node("[]").unwrap_err();
        assert!(err.to_string().contains("invalid type: sequence"), "{err}");

        // would satisfy the probe positionally if sequences were let through
        let _ = node("[true]").unwrap_err();
    }

    #[test]
    fn test_scalars_are_rejected() {
        for json in ["42", "-1.5", r#""text""#, "false", "null"] {
            let _ = node(json).unwrap_err();
        }
    }

    #[test]
    fn test_null_flag_is_package() {
        let decoded = node(r#"{"recurseForDerivations":null,"pname":"a","version":"1"}"#).unwrap();
        assert_eq!(decoded, Node::Package(Package::new("a", "1")));
    }

    #[test]
    fn test_non_bool_flag_is_rejected() {
        let _ = node(r#"{"recurseForDerivations":"yes"}"#).unwrap_err();
    }

    #[test]
    fn test_bad_child_fails_whole_namespace() {
        let _ = node(r#"{"recurseForDerivations":true,"ok":true,"bad":[1,2]}"#).unwrap_err();
    }

    #[test]
    fn test_package_count() {
        let decoded = node(
            r#"{
                "recurseForDerivations": true,
                "a": {"pname": "a", "version": "1"},
                "b": true,
                "c": {
                    "recurseForDerivations": true,
                    "d": {"pname": "d", "version": "2"},
                    "e": {"version": "3"}
                }
            }"#,
        )
        .unwrap();

        assert_eq!(decoded.as_namespace().unwrap().package_count(), 3);
    }

    #[test]
    fn test_root_flatten_by_variant() {
        assert!(Node::Opaque.flatten().is_empty());
        assert!(Node::Package(Package::new("x", "1")).flatten().is_empty());

        let namespace: Namespace = [("x", Node::Package(Package::new("x", "1")))].into_iter().collect();
        let flat = Node::Namespace(namespace).flatten();
        assert_eq!(flat.get("x").map(String::as_str), Some("1"));
    }
}
