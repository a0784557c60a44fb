use crate::attrs::FlatIndex;
use serde::{Deserialize, Serialize};

/// A package whose version was introduced or changed by a revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub attr_path: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
}

impl Change {
    #[must_use]
    pub fn new(attr_path: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            attr_path: attr_path.into(),
            version: version.into(),
        }
    }
}

/// Compute the changes between two consecutive indexes, sorted by attribute path.
///
/// An attribute is reported when it is absent from `previous` or carries a different version.
/// Attributes that disappeared are not reported. Without a previous index every entry counts
/// as a change.
#[must_use]
pub fn changes(previous: Option<&FlatIndex>, current: &FlatIndex) -> Vec<Change> {
    current
        .iter()
        .filter(|(attr_path, version)| previous.and_then(|prev| prev.get(*attr_path)) != Some(*version))
        .map(|(attr_path, version)| Change::new(attr_path.as_str(), version.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(entries: &[(&str, &str)]) -> FlatIndex {
        entries.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect()
    }

    #[test]
    fn test_no_previous_reports_everything() {
        let current = index(&[("b", "2"), ("a", "1")]);
        assert_eq!(changes(None, &current), vec![Change::new("a", "1"), Change::new("b", "2")]);
    }

    #[test]
    fn test_unchanged_is_not_reported() {
        let previous = index(&[("a", "1"), ("b", "2")]);
        let current = index(&[("a", "1"), ("b", "2")]);
        assert!(changes(Some(&previous), &current).is_empty());
    }

    #[test]
    fn test_new_and_updated_are_reported() {
        let previous = index(&[("a", "1"), ("b", "2"), ("gone", "9")]);
        let current = index(&[("a", "1"), ("b", "3"), ("c", "")]);

        assert_eq!(changes(Some(&previous), &current), vec![Change::new("b", "3"), Change::new("c", "")]);
    }

    #[test]
    fn test_empty_fields_are_omitted_when_serialized() {
        let json = serde_json::to_string(&Change::new("hello", "")).unwrap();
        assert_eq!(json, r#"{"attr_path":"hello"}"#);

        let back: Change = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Change::new("hello", ""));
    }
}
