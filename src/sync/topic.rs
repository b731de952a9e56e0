use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::checksum;
use crate::revision::Revision;

use super::status::{Observation, TopicStatus};

/// File extension of topic files in the working tree
pub const TOPIC_EXTENSION: &str = "wiki";

/// Addresses a topic inside the synchronizer's namespace arena.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TopicKey {
    pub namespace: String,
    pub name: String,
}

impl TopicKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        TopicKey {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for TopicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Replica-tracking record for one topic.
///
/// The baseline (`based_on_repository_version`, `based_on_checksum`) records
/// what the local file last agreed with. Reading a topic's status never
/// changes any of these fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalTopic {
    pub name: String,

    /// Revision seen on the remote during the latest remote scan, `None` if
    /// the remote does not have the topic
    #[serde(default)]
    pub repository_version: Option<Revision>,

    /// Revision the local file was last reconciled against, `None` if the
    /// file was never fetched from or pushed to the remote
    #[serde(default)]
    pub based_on_repository_version: Option<Revision>,

    /// Checksum of the local file when the baseline revision was last set
    #[serde(default)]
    pub based_on_checksum: u64,
}

impl LocalTopic {
    /// A topic found in the working tree that the remote has never seen.
    pub fn discovered_locally(name: impl Into<String>) -> Self {
        LocalTopic {
            name: name.into(),
            repository_version: None,
            based_on_repository_version: None,
            based_on_checksum: 0,
        }
    }

    /// A topic first seen on the remote; it starts out as `NoLocalFile`.
    pub fn discovered_remotely(name: impl Into<String>, version: Revision) -> Self {
        LocalTopic {
            name: name.into(),
            repository_version: Some(version.clone()),
            based_on_repository_version: Some(version),
            based_on_checksum: 0,
        }
    }

    /// `<namespace_dir>/<name>.wiki`
    pub fn path_in(&self, namespace_dir: &Path) -> PathBuf {
        topic_file(namespace_dir, &self.name)
    }

    /// Checksum of the file currently on disk
    pub fn checksum(&self, namespace_dir: &Path) -> Result<Option<u64>> {
        checksum::of_file(&self.path_in(namespace_dir))
    }

    pub fn observe(&self, namespace_dir: &Path) -> Result<Observation> {
        let current = self.checksum(namespace_dir)?;
        Ok(Observation {
            exists: current.is_some(),
            modified: current.is_some_and(|sum| sum != self.based_on_checksum),
            in_repository: self.repository_version.is_some(),
            version_differs: self.repository_version != self.based_on_repository_version,
        })
    }

    pub fn status(&self, namespace_dir: &Path) -> Result<TopicStatus> {
        Ok(self.observe(namespace_dir)?.status())
    }

    /// Record that the local file now matches `repository_version`.
    pub(crate) fn advance_baseline(&mut self, checksum: u64) {
        self.based_on_repository_version = self.repository_version.clone();
        self.based_on_checksum = checksum;
    }
}

pub(crate) fn topic_file(namespace_dir: &Path, name: &str) -> PathBuf {
    namespace_dir.join(format!("{name}.{TOPIC_EXTENSION}"))
}

/// Namespace and topic names become path components, so they must be a
/// single visible component.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name
            .chars()
            .any(|c| c == '/' || c == '\\' || c == '\0' || c.is_control())
}
