use chrono::{NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::SyncError;

const STAMP_FORMAT: &str = "%Y-%m-%d-%H-%M-%S%.3f";
/// Length of `YYYY-MM-DD-HH-MM-SS.fff`
const STAMP_LEN: usize = 23;

/// Server-assigned identifier for one version of a topic.
///
/// Revisions are opaque to the synchronizer: two revisions are the same
/// version exactly when their strings are equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Revision(String);

impl Revision {
    pub fn new(value: impl Into<String>) -> Self {
        Revision(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse the structured `YYYY-MM-DD-HH-MM-SS.fff[-author]` form minted by
    /// the directory remote.
    pub fn stamp(&self) -> Result<RevisionStamp, SyncError> {
        let malformed = || SyncError::MalformedRevision(self.0.clone());

        let time_part = self.0.get(..STAMP_LEN).ok_or_else(malformed)?;
        let timestamp =
            NaiveDateTime::parse_from_str(time_part, STAMP_FORMAT).map_err(|_| malformed())?;

        let author = match &self.0[STAMP_LEN..] {
            "" => None,
            rest => match rest.strip_prefix('-') {
                Some(author) if !author.is_empty() => Some(author.to_string()),
                _ => return Err(malformed()),
            },
        };

        Ok(RevisionStamp { timestamp, author })
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Revision {
    fn from(value: &str) -> Self {
        Revision::new(value)
    }
}

/// Structured view of a timestamped revision.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct RevisionStamp {
    pub timestamp: NaiveDateTime,
    pub author: Option<String>,
}

impl RevisionStamp {
    /// Stamp for a commit made now by `author`, truncated to the
    /// millisecond precision a revision string carries.
    pub fn now(author: &str) -> Self {
        let now = Utc::now().naive_utc();
        let millis = now.nanosecond() / 1_000_000 * 1_000_000;
        RevisionStamp {
            timestamp: now.with_nanosecond(millis).unwrap_or(now),
            author: Some(author.to_string()),
        }
    }

    pub fn to_revision(&self) -> Revision {
        let mut value = self.timestamp.format(STAMP_FORMAT).to_string();
        if let Some(author) = &self.author {
            value.push('-');
            value.push_str(&sanitize_author(author));
        }
        Revision(value)
    }
}

/// Authors end up in file names, so path separators and other characters
/// that are not portable in file names are replaced.
fn sanitize_author(author: &str) -> String {
    let cleaned: String = author
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_whitespace() || c.is_control() => '_',
            c => c,
        })
        .collect();

    if cleaned.is_empty() {
        "anonymous".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_now_survives_revision_string() {
        let stamp = RevisionStamp::now("alice");
        assert_eq!(stamp.timestamp.nanosecond() % 1_000_000, 0);
        assert_eq!(stamp.to_revision().stamp().unwrap(), stamp);
    }

    #[test]
    fn test_parse_stamp_with_author() {
        let rev = Revision::new("2024-03-05-14-07-09.125-jane-doe");
        let stamp = rev.stamp().unwrap();
        let expected = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_milli_opt(14, 7, 9, 125)
            .unwrap();
        assert_eq!(stamp.timestamp, expected);
        assert_eq!(stamp.author.as_deref(), Some("jane-doe"));
    }

    #[test]
    fn test_parse_stamp_without_author() {
        let stamp = Revision::new("2024-03-05-14-07-09.000").stamp().unwrap();
        assert_eq!(stamp.author, None);
    }

    #[test]
    fn test_malformed_revisions() {
        for bad in ["V1", "", "2024-03-05-14-07-09.000x", "2024-13-05-14-07-09.000", "2024-03-05-14-07-09.000-"] {
            let err = Revision::new(bad).stamp().unwrap_err();
            match err {
                SyncError::MalformedRevision(value) => assert_eq!(value, bad),
                other => panic!("unexpected error {other:?}"),
            }
        }
    }

    #[test]
    fn test_stamp_renders_and_parses_back() {
        let stamp = RevisionStamp::now("Some User/Home");
        let rev = stamp.to_revision();
        assert!(rev.as_str().ends_with("-Some_User_Home"));

        let parsed = rev.stamp().unwrap();
        assert_eq!(parsed.author.as_deref(), Some("Some_User_Home"));
        assert_eq!(
            parsed.timestamp.format(STAMP_FORMAT).to_string(),
            stamp.timestamp.format(STAMP_FORMAT).to_string()
        );
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let json = serde_json::to_string(&Revision::new("V1")).unwrap();
        assert_eq!(json, r#""V1""#);
    }
}
