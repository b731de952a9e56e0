use std::path::PathBuf;

use thiserror::Error;

/// Domain errors raised by the synchronizer and the remote proxies.
///
/// Operations return `anyhow::Result`; callers that need to react to a specific
/// failure recover the variant with `err.downcast_ref::<SyncError>()`.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Commit refused because topics in scope are in conflict. No writes were made.
    #[error("{} topic(s) in conflict, resolve them or commit with --ignore-conflicts: {}", .topics.len(), .topics.join(", "))]
    Conflict { topics: Vec<String> },

    /// A scope path does not live under the working tree root.
    #[error("path '{}' is outside the working tree at '{}'", .path.display(), .root.display())]
    OutsideWorkingTree { path: PathBuf, root: PathBuf },

    /// A revision identifier could not be parsed into its structured form.
    #[error("malformed revision identifier '{0}'")]
    MalformedRevision(String),

    /// The remote revision moved between the pre-commit scan and the push.
    #[error("remote revision of {namespace}/{topic} changed underneath the commit (expected {expected}, found {found})")]
    StaleRevision {
        namespace: String,
        topic: String,
        expected: String,
        found: String,
    },

    #[error("namespace '{0}' is already tracked")]
    DuplicateNamespace(String),

    #[error("topic '{namespace}/{topic}' is already tracked")]
    DuplicateTopic { namespace: String, topic: String },

    #[error("unknown topic {namespace}/{topic}")]
    UnknownTopic { namespace: String, topic: String },

    /// The working tree was created against a different remote.
    #[error("working tree is bound to '{bound}', refusing to synchronize with '{requested}'")]
    RemoteMismatch { bound: String, requested: String },

    #[error("unsupported remote '{0}' (expected a file:// URI or a directory path)")]
    UnsupportedRemote(String),

    #[error("no working tree found at '{}'. Run 'wiki-sync init' first.", .0.display())]
    NotInitialized(PathBuf),
}
