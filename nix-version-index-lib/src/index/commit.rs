use super::{Change, doc};
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A nixpkgs revision together with the package versions it introduced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub rev: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub changes: Vec<Change>,
}

/// Load a commit log written by [`save_commits`]
pub fn load_commits(path: impl AsRef<Path>) -> Result<Vec<Commit>> {
    doc::load(path, "commit log")
}

/// Save a commit log as JSON
pub fn save_commits(commits: &[Commit], path: impl AsRef<Path>) -> Result<()> {
    doc::save(&commits, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_empty_fields_are_omitted() {
        let json = serde_json::to_string(&Commit::default()).unwrap();
        assert_eq!(json, "{}");
    }

    #[test]
    fn test_serialized_shape() {
        let commit = Commit {
            rev: "6ed8a76ac64c88df0df3f01b536498983ad5ad23".to_string(),
            date: Some(Utc.with_ymd_and_hms(2023, 5, 1, 12, 0, 0).unwrap()),
            changes: vec![Change::new("hello", "2.12.1")],
        };

        insta::assert_snapshot!(serde_json::to_string(&commit).unwrap(), @r#"{"rev":"6ed8a76ac64c88df0df3f01b536498983ad5ad23","date":"2023-05-01T12:00:00Z","changes":[{"attr_path":"hello","version":"2.12.1"}]}"#);
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_save_and_load_commits() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("commits.json");

        let commits = vec![
            Commit {
                rev: "aaaa".to_string(),
                date: None,
                changes: vec![Change::new("a", "1"), Change::new("b", "2")],
            },
            Commit {
                rev: "bbbb".to_string(),
                date: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
                changes: Vec::new(),
            },
        ];

        save_commits(&commits, &path).unwrap();
        assert_eq!(load_commits(&path).unwrap(), commits);
    }
}
