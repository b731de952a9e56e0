//! # wiki-sync
//!
//! A command-line tool and library for keeping a local working tree of wiki
//! topics in sync with a remote topic repository.
//!
//! ## Overview
//!
//! A working tree is a directory with one subdirectory per namespace and one
//! `<topic>.wiki` file per topic. A small state file (`.wiki-sync.json`) at its
//! root records, for every tracked topic, the remote revision the local file
//! was last synchronized with and the checksum of the file at that moment.
//! From those two baselines and the current remote revision every topic gets
//! a [`TopicStatus`], and the operations act on that status.
//!
//! ## Key Features
//!
//! - **Update**: fetch topics that changed remotely or are missing locally
//! - **Commit**: publish local edits and additions, gated on conflicts
//! - **Resolve**: merge conflicting topics through a pluggable [`ConflictResolver`]
//! - **Scoping**: restrict any operation to files or directories of the tree
//! - **Progress**: observe every topic an operation touches
//!
//! ## Architecture
//!
//! - Replica tracking and the protocol ([`sync`])
//! - Remote repositories ([`remote`]) and their revisions ([`revision`])
//! - Conflict handling ([`conflict`], [`interactive_conflict`])
//! - User interface and reporting ([`handlers`], [`report`], [`logger`], [`config`])

/// Content fingerprints of topic files.
///
/// A checksum is the first eight bytes of the BLAKE3 hash of a file's
/// content. It only changes when the bytes change, never on timestamps.
pub mod checksum;

/// Platform-agnostic configuration directory management.
///
/// Locates `config.toml` and the log file following platform conventions
/// (XDG on Linux, Application Support on macOS, AppData on Windows) and holds
/// the user preferences of the command-line client.
pub mod config;

/// Conflict resolution policies.
///
/// Defines the [`ConflictResolver`] seam used by `resolve` and the two
/// non-interactive strategies, keep local and keep remote.
pub mod conflict;

/// Domain errors.
pub mod error;

/// Command handlers for the `wiki-sync` binary.
pub mod handlers;

/// Interactive terminal-based conflict resolution.
///
/// Prompts for each conflicting topic, with a comparison view of the local
/// and remote text before choosing.
pub mod interactive_conflict;

/// Logging configuration and utilities.
///
/// Sets up console logging (configurable via the `RUST_LOG` environment
/// variable) and an operation log file in the config directory, with
/// rotation once the file exceeds its size limit.
pub mod logger;

/// Progress notifications emitted by `update` and `commit`.
pub mod progress;

/// Remote topic repositories.
pub mod remote;

/// Status reports in console and JSON form.
pub mod report;

/// Remote revision identifiers and their structured form.
pub mod revision;

/// Replica tracking and the synchronization protocol.
///
/// Implements the main operations:
/// - **SyncToLocal / SyncToRemote**: discover topics in the working tree and on the remote
/// - **Update**: bring out-of-date and missing topics into the working tree
/// - **Commit**: publish local changes, refusing to run over conflicts
/// - **Resolve**: merge conflicting topics through a resolver
pub mod sync;

pub use conflict::{ConflictResolver, ConflictingTopic, ResolutionStrategy, ResolveOutcome};
pub use error::SyncError;
pub use progress::{ProgressEvent, ProgressKind, ProgressObserver};
pub use remote::{DirectoryRemote, MemoryRemote, RemoteProxy};
pub use revision::Revision;
pub use sync::{PersistentState, Synchronizer, TopicKey, TopicStatus};

/// How much the command-line client prints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerbosityLevel {
    /// Errors only
    Quiet,
    /// Operation summaries and one line per touched topic
    #[default]
    Normal,
    /// Everything, including revision details
    Verbose,
}

impl VerbosityLevel {
    /// Resolve the `--verbose`/`--quiet` flags; verbose wins if both are set
    pub fn from_flags(verbose: bool, quiet: bool) -> Self {
        if verbose {
            VerbosityLevel::Verbose
        } else if quiet {
            VerbosityLevel::Quiet
        } else {
            VerbosityLevel::Normal
        }
    }

    /// Console log level for this verbosity, unless `RUST_LOG` overrides it
    pub fn log_level(&self) -> log::LevelFilter {
        match self {
            VerbosityLevel::Quiet => log::LevelFilter::Error,
            VerbosityLevel::Normal => log::LevelFilter::Warn,
            VerbosityLevel::Verbose => log::LevelFilter::Debug,
        }
    }
}
