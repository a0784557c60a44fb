use crate::Result;
use chrono::{DateTime, Utc};
use ohno::{IntoAppError, app_err};
use serde::{Deserialize, Serialize};

/// A commit on the tracked branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    pub rev: String,
    pub date: DateTime<Utc>,
}

impl Revision {
    /// Parse one line of `git log --format=%H%x09%cI` output.
    pub(crate) fn parse_log_line(line: &str) -> Result<Self> {
        let (rev, date) = line.split_once('\t').ok_or_else(|| app_err!("malformed git log line '{line}'"))?;

        if rev.len() < 7 || !rev.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(app_err!("malformed commit id '{rev}' in git log line"));
        }

        let date = DateTime::parse_from_rfc3339(date.trim())
            .into_app_err_with(|| format!("malformed commit date in git log line '{line}'"))?
            .with_timezone(&Utc);

        Ok(Self { rev: rev.to_string(), date })
    }
}

/// Parse the complete output of `git log --format=%H%x09%cI`, skipping blank lines.
pub(crate) fn parse_log(stdout: &str) -> Result<Vec<Revision>> {
    stdout
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(Revision::parse_log_line)
        .collect()
}
