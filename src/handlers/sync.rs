//! Update and commit handlers

use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;

use crate::config::SyncConfig;
use crate::progress::{ProgressEvent, ProgressKind};
use crate::VerbosityLevel;

/// Handle `wiki-sync update`
pub fn handle_update(paths: &[PathBuf], verbosity: VerbosityLevel) -> Result<()> {
    let mut sync = super::open_working_tree(paths, verbosity)?;

    if verbosity != VerbosityLevel::Quiet {
        println!("{}", "Updating working tree...".cyan());
    }
    let events = sync.update(paths)?;

    if verbosity != VerbosityLevel::Quiet {
        if events.is_empty() {
            println!("{}", "Already up to date".green());
        } else {
            println!(
                "{} Updated {} topic(s)",
                "✓".green(),
                events.len().to_string().cyan()
            );
        }
    }

    super::record("update", sync.root(), format!("{} topic(s)", events.len()));
    Ok(())
}

/// Handle `wiki-sync commit`
pub fn handle_commit(
    paths: &[PathBuf],
    author: Option<&str>,
    ignore_conflicts: bool,
    verbosity: VerbosityLevel,
) -> Result<()> {
    let identity = SyncConfig::load()?.identity_or(author);
    let mut sync = super::open_working_tree(paths, verbosity)?;

    if verbosity != VerbosityLevel::Quiet {
        println!(
            "{} {}",
            "Committing as".cyan(),
            identity.bold()
        );
    }

    let result = sync.commit(&identity, paths, ignore_conflicts);
    let events = match result {
        Ok(events) => events,
        Err(e) => {
            super::record("commit", sync.root(), format!("failed: {e}"));
            return Err(e);
        }
    };

    let (committed, skipped) = tally(&events);
    if verbosity != VerbosityLevel::Quiet {
        if committed == 0 && skipped == 0 {
            println!("{}", "Nothing to commit".green());
        } else {
            println!(
                "{} Committed {} topic(s)",
                "✓".green(),
                committed.to_string().cyan()
            );
        }
        if skipped > 0 {
            println!(
                "{} {} topic(s) skipped because of conflicts, run {} first",
                "!".yellow().bold(),
                skipped.to_string().yellow(),
                "wiki-sync update".bold()
            );
        }
    }

    super::record(
        "commit",
        sync.root(),
        format!("{committed} committed, {skipped} skipped by {identity}"),
    );
    Ok(())
}

/// Count committed and conflict-skipped events
fn tally(events: &[ProgressEvent]) -> (usize, usize) {
    events.iter().fold((0, 0), |(committed, skipped), event| match event.kind {
        ProgressKind::Committed => (committed + 1, skipped),
        ProgressKind::ConflictSkipped => (committed, skipped + 1),
        ProgressKind::UpdatedLocal => (committed, skipped),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::TopicStatus;

    fn event(kind: ProgressKind) -> ProgressEvent {
        ProgressEvent {
            kind,
            namespace: "A".to_string(),
            topic: "One".to_string(),
            old_status: TopicStatus::LocallyModified,
            new_status: TopicStatus::UpToDate,
        }
    }

    #[test]
    fn test_tally_counts_kinds() {
        let events = vec![
            event(ProgressKind::Committed),
            event(ProgressKind::ConflictSkipped),
            event(ProgressKind::Committed),
        ];
        assert_eq!(tally(&events), (2, 1));
        assert_eq!(tally(&[]), (0, 0));
    }
}
