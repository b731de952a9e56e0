use serde::{Deserialize, Serialize};
use std::fmt;

/// Replica state of a topic, derived on demand from local and remote observables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicStatus {
    /// Tracked, but there is no file in the working tree
    NoLocalFile,
    /// Local file matches the baseline and the remote has not moved
    UpToDate,
    /// Local file was edited, remote has not moved
    LocallyModified,
    /// Local file exists but the remote has never had this topic
    LocallyAdded,
    /// Remote moved, local file untouched
    LocallyOutOfDate,
    /// Both the local file and the remote moved away from the baseline
    InConflict,
}

impl TopicStatus {
    pub fn as_str(&self) -> &str {
        match self {
            TopicStatus::NoLocalFile => "no local file",
            TopicStatus::UpToDate => "up to date",
            TopicStatus::LocallyModified => "locally modified",
            TopicStatus::LocallyAdded => "locally added",
            TopicStatus::LocallyOutOfDate => "out of date",
            TopicStatus::InConflict => "in conflict",
        }
    }

    /// Single-letter code used in compact listings
    pub fn code(&self) -> char {
        match self {
            TopicStatus::NoLocalFile => '!',
            TopicStatus::UpToDate => ' ',
            TopicStatus::LocallyModified => 'M',
            TopicStatus::LocallyAdded => 'A',
            TopicStatus::LocallyOutOfDate => 'U',
            TopicStatus::InConflict => 'C',
        }
    }

    /// Statuses `update` acts on
    pub fn needs_update(&self) -> bool {
        matches!(self, TopicStatus::LocallyOutOfDate | TopicStatus::NoLocalFile)
    }

    /// Statuses `commit` pushes
    pub fn needs_commit(&self) -> bool {
        matches!(self, TopicStatus::LocallyAdded | TopicStatus::LocallyModified)
    }
}

impl fmt::Display for TopicStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four facts a status is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    pub exists: bool,
    pub modified: bool,
    pub in_repository: bool,
    pub version_differs: bool,
}

impl Observation {
    /// Rows are checked top to bottom and the first match wins. The match is
    /// exhaustive, so every combination maps to exactly one status.
    pub fn status(&self) -> TopicStatus {
        match (
            self.exists,
            self.modified,
            self.in_repository,
            self.version_differs,
        ) {
            (false, _, _, _) => TopicStatus::NoLocalFile,
            (true, false, _, false) => TopicStatus::UpToDate,
            (true, true, true, false) => TopicStatus::LocallyModified,
            (true, _, false, _) => TopicStatus::LocallyAdded,
            (true, false, true, true) => TopicStatus::LocallyOutOfDate,
            (true, true, true, true) => TopicStatus::InConflict,
        }
    }
}
