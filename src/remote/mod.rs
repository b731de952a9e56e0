//! Remote topic repository abstraction.
//!
//! The synchronizer only talks to the remote through [`RemoteProxy`]. Two
//! implementations ship with the crate: a directory-backed repository reached
//! through `file://` URIs, and an in-memory repository for tests and embedders.

mod directory;
mod memory;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::SyncError;
use crate::revision::Revision;

pub use directory::DirectoryRemote;
pub use memory::MemoryRemote;

/// A namespace as listed by the remote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteNamespace {
    pub namespace: String,
}

/// A topic and its current revision as listed by the remote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteTopic {
    pub namespace: String,
    pub name: String,
    pub version: Revision,
}

/// Client-facing contract of a remote topic repository.
pub trait RemoteProxy {
    /// Identity of the endpoint, persisted in the working tree state.
    fn uri(&self) -> &str;

    /// List every namespace.
    fn get_all_namespaces(&self) -> Result<Vec<RemoteNamespace>>;

    /// List every topic in `namespace` with its current revision.
    fn get_all_topics(&self, namespace: &str) -> Result<Vec<RemoteTopic>>;

    /// Text of `topic` at `topic.version`.
    fn get_text_for_topic(&self, topic: &RemoteTopic) -> Result<String>;

    /// Store a new version of a topic; the remote assigns the revision.
    ///
    /// `expected` is the revision the caller last saw (`None` if it believes
    /// the topic does not exist yet). If the remote's current revision is
    /// different the push is rejected with [`SyncError::StaleRevision`].
    fn set_text_for_topic(
        &mut self,
        namespace: &str,
        name: &str,
        content: &str,
        identity: &str,
        expected: Option<&Revision>,
    ) -> Result<()>;
}

/// Open the remote named by `uri`.
///
/// Accepts `file://` URIs and bare directory paths.
pub fn open(uri: &str) -> Result<DirectoryRemote> {
    DirectoryRemote::open(&directory_path(uri)?)
}

/// Like [`open`], creating the repository directory first if it is missing.
pub fn create(uri: &str) -> Result<DirectoryRemote> {
    DirectoryRemote::create(&directory_path(uri)?)
}

fn directory_path(uri: &str) -> Result<PathBuf, SyncError> {
    if let Some(rest) = uri.strip_prefix("file://") {
        Ok(PathBuf::from(rest))
    } else if uri.contains("://") || uri.is_empty() {
        Err(SyncError::UnsupportedRemote(uri.to_string()))
    } else {
        Ok(PathBuf::from(uri))
    }
}

pub(crate) fn stale_revision(
    namespace: &str,
    name: &str,
    expected: Option<&Revision>,
    found: Option<&Revision>,
) -> SyncError {
    let show = |rev: Option<&Revision>| {
        rev.map(|r| r.to_string())
            .unwrap_or_else(|| "<none>".to_string())
    };
    SyncError::StaleRevision {
        namespace: namespace.to_string(),
        topic: name.to_string(),
        expected: show(expected),
        found: show(found),
    }
}
