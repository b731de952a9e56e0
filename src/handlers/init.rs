//! Initialization handler
//!
//! Binds a directory to a remote by writing a fresh state file, then
//! registers everything the remote already has.

use anyhow::{anyhow, Context, Result};
use colored::Colorize;
use std::path::Path;

use crate::remote::{self, RemoteProxy};
use crate::sync::{PersistentState, Synchronizer};

/// Check if `dir` is already a working tree
pub fn is_initialized(dir: &Path) -> bool {
    PersistentState::exists(dir)
}

/// Handle `wiki-sync init`
///
/// With `create`, a missing remote directory is created. Each name in
/// `namespaces` is created on the remote before the first scan.
pub fn handle_init(uri: &str, dir: &Path, namespaces: &[String], create: bool) -> Result<()> {
    if is_initialized(dir) {
        return Err(anyhow!(
            "'{}' is already a working tree, remove {} to start over",
            dir.display(),
            PersistentState::file_path(dir).display()
        ));
    }

    let remote = if create {
        remote::create(uri)?
    } else {
        remote::open(uri)?
    };

    for namespace in namespaces {
        remote
            .create_namespace(namespace)
            .with_context(|| format!("Failed to create namespace '{}'", namespace))?;
    }

    println!(
        "{} {}",
        "Initializing working tree bound to".cyan(),
        remote.uri().bold()
    );

    PersistentState::new(remote.uri())
        .save(dir)
        .context("Failed to write initial sync state")?;

    let mut sync = Synchronizer::open(dir, remote)?;
    let discovered = sync.sync_to_remote()?;

    let namespace_count = sync.state().namespaces().count();
    println!(
        "{} Tracking {} topic(s) in {} namespace(s)",
        "✓".green(),
        discovered.to_string().cyan(),
        namespace_count.to_string().cyan()
    );
    if discovered > 0 {
        println!("  Run {} to fetch them", "wiki-sync update".bold());
    }

    super::record(
        "init",
        sync.root(),
        format!("bound to {}", sync.state().proxy_uri),
    );
    Ok(())
}
