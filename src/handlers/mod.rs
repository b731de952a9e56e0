//! Command handler modules
//!
//! One handler per `wiki-sync` subcommand. Handlers locate the working tree,
//! open its remote, run the operation and print the outcome.

pub mod config;
pub mod init;
pub mod resolve;
pub mod status;
pub mod sync;

pub use config::{handle_config, handle_config_interactive};
pub use init::{handle_init, is_initialized};
pub use resolve::handle_resolve;
pub use status::handle_status;
pub use sync::{handle_commit, handle_update};

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::logger::{OperationLog, OperationRecord};
use crate::remote::{self, DirectoryRemote};
use crate::report;
use crate::sync::{calculate_base_dir, PersistentState, Synchronizer};
use crate::VerbosityLevel;

/// Open the working tree the given paths belong to, bound to its remote.
pub fn open_working_tree(
    paths: &[PathBuf],
    verbosity: VerbosityLevel,
) -> Result<Synchronizer<DirectoryRemote>> {
    let root = calculate_base_dir(paths)?;
    let state = PersistentState::load(&root)?;
    let remote = remote::open(&state.proxy_uri)
        .with_context(|| format!("Failed to open remote '{}'", state.proxy_uri))?;

    let mut sync = Synchronizer::open(&root, remote)?;
    if verbosity != VerbosityLevel::Quiet {
        sync.subscribe(report::print_event);
    }
    Ok(sync)
}

/// Append an operation summary to the operation log. Failures are only logged.
pub(crate) fn record(operation: &str, root: &Path, summary: String) {
    let record = OperationRecord {
        operation,
        root,
        summary,
    };
    if let Err(e) = OperationLog::in_config_dir().and_then(|log| log.append(&record)) {
        log::warn!("Failed to write operation log: {e:#}");
    }
}
