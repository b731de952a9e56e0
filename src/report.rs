use anyhow::{Context, Result};
use colored::{ColoredString, Colorize};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::progress::{ProgressEvent, ProgressKind};
use crate::remote::RemoteProxy;
use crate::revision::Revision;
use crate::sync::{Synchronizer, TopicStatus};

/// Snapshot of the replica state of a working tree
///
/// Built after a fresh local and remote scan, so every status reflects the
/// remote as it was when the report was generated.
#[derive(Debug, Serialize)]
pub struct StatusReport {
    /// RFC 3339 time the report was generated
    pub timestamp: String,

    /// Root of the working tree
    pub root: String,

    /// URI of the remote the tree is bound to
    pub remote: String,

    /// Number of topics per status
    pub counts: BTreeMap<TopicStatus, usize>,

    /// One entry per topic in scope, ordered by namespace then name
    pub topics: Vec<TopicEntry>,
}

/// Status of a single topic
#[derive(Debug, Serialize)]
pub struct TopicEntry {
    pub namespace: String,
    pub name: String,
    pub status: TopicStatus,
    pub path: String,
    pub repository_version: Option<Revision>,
    pub based_on_repository_version: Option<Revision>,
}

impl StatusReport {
    /// Collect the status of every topic in `scope`
    pub fn collect<R: RemoteProxy>(sync: &Synchronizer<R>, scope: &[PathBuf]) -> Result<Self> {
        let mut counts = BTreeMap::new();
        let mut topics = Vec::new();

        for (key, status) in sync.statuses(scope)? {
            let topic = sync.topic(&key)?;
            *counts.entry(status).or_insert(0) += 1;
            topics.push(TopicEntry {
                path: sync.topic_path(&key).display().to_string(),
                namespace: key.namespace,
                name: key.name,
                status,
                repository_version: topic.repository_version.clone(),
                based_on_repository_version: topic.based_on_repository_version.clone(),
            });
        }

        Ok(StatusReport {
            timestamp: chrono::Utc::now().to_rfc3339(),
            root: sync.root().display().to_string(),
            remote: sync.state().proxy_uri.clone(),
            counts,
            topics,
        })
    }

    pub fn count(&self, status: TopicStatus) -> usize {
        self.counts.get(&status).copied().unwrap_or(0)
    }

    /// Generate a JSON report
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize report to JSON")
    }

    /// Print a colored console listing
    ///
    /// With `verbose`, remote revisions are shown with their commit time and
    /// author. A revision that does not have the structured form is an error.
    pub fn print_summary(&self, verbose: bool, show_up_to_date: bool) -> Result<()> {
        println!("{}", "=== Working Tree Status ===".bold().cyan());
        println!("  Root:   {}", self.root);
        println!("  Remote: {}", self.remote.cyan());
        println!();

        let mut listed = 0;
        for entry in &self.topics {
            if entry.status == TopicStatus::UpToDate && !show_up_to_date {
                continue;
            }
            listed += 1;

            println!(
                "  {} {:<18} {}/{}",
                status_code(entry.status),
                entry.status.as_str(),
                entry.namespace.bold(),
                entry.name
            );

            if verbose {
                if let Some(rev) = &entry.repository_version {
                    println!("      remote: {}", describe_revision(rev)?.dimmed());
                }
                if let Some(rev) = &entry.based_on_repository_version {
                    if entry.repository_version.as_ref() != Some(rev) {
                        println!("      based on: {}", describe_revision(rev)?.dimmed());
                    }
                }
            }
        }

        if listed == 0 {
            println!("  {}", "Nothing to do, working tree is up to date".green());
        }

        println!();
        println!(
            "  {} modified  {} added  {} out of date  {} missing  {} conflicts  {} up to date",
            self.count(TopicStatus::LocallyModified).to_string().cyan(),
            self.count(TopicStatus::LocallyAdded).to_string().green(),
            self.count(TopicStatus::LocallyOutOfDate).to_string().yellow(),
            self.count(TopicStatus::NoLocalFile).to_string().yellow(),
            self.count(TopicStatus::InConflict).to_string().red(),
            self.count(TopicStatus::UpToDate).to_string().dimmed(),
        );

        Ok(())
    }
}

/// Print a single progress event, as used by the CLI observer
pub fn print_event(event: &ProgressEvent) {
    let label = match event.kind {
        ProgressKind::Committed => "Committed".green(),
        ProgressKind::UpdatedLocal => "Updated".cyan(),
        ProgressKind::ConflictSkipped => "Skipped".yellow(),
    };
    println!(
        "  {} {}/{} ({} -> {})",
        label,
        event.namespace,
        event.topic,
        event.old_status.as_str().dimmed(),
        event.new_status.as_str()
    );
}

fn status_code(status: TopicStatus) -> ColoredString {
    let code = status.code().to_string();
    match status {
        TopicStatus::UpToDate => code.dimmed(),
        TopicStatus::LocallyModified => code.cyan().bold(),
        TopicStatus::LocallyAdded => code.green().bold(),
        TopicStatus::LocallyOutOfDate | TopicStatus::NoLocalFile => code.yellow().bold(),
        TopicStatus::InConflict => code.red().bold(),
    }
}

fn describe_revision(revision: &Revision) -> Result<String> {
    let stamp = revision.stamp()?;
    Ok(format!(
        "{} ({} by {})",
        revision,
        stamp.timestamp.format("%Y-%m-%d %H:%M:%S"),
        stamp.author.as_deref().unwrap_or("unknown")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::MemoryRemote;
    use crate::sync::TopicKey;
    use tempfile::TempDir;

    fn synced() -> (TempDir, Synchronizer<MemoryRemote>) {
        let temp = TempDir::new().unwrap();
        let mut remote = MemoryRemote::new("memory://report");
        remote.put_revision("A", "One", "2024-01-01-00-00-00.000-alice", "one");
        remote.put_revision("A", "Two", "V1", "two");
        let mut sync = Synchronizer::open(temp.path(), remote).unwrap();
        sync.update(&[]).unwrap();
        (temp, sync)
    }

    #[test]
    fn test_counts_by_status() {
        let (_temp, mut sync) = synced();
        std::fs::write(sync.topic_path(&TopicKey::new("A", "Two")), "edited").unwrap();
        sync.refresh().unwrap();

        let report = StatusReport::collect(&sync, &[]).unwrap();
        assert_eq!(report.topics.len(), 2);
        assert_eq!(report.count(TopicStatus::UpToDate), 1);
        assert_eq!(report.count(TopicStatus::LocallyModified), 1);
        assert_eq!(report.count(TopicStatus::InConflict), 0);
    }

    #[test]
    fn test_json_lists_topics() {
        let (_temp, sync) = synced();
        let json = StatusReport::collect(&sync, &[]).unwrap().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["remote"], "memory://report");
        assert_eq!(value["topics"][0]["status"], "up_to_date");
        assert_eq!(value["counts"]["up_to_date"], 2);
    }

    #[test]
    fn test_verbose_listing_rejects_malformed_revision() {
        let (_temp, sync) = synced();
        let report = StatusReport::collect(&sync, &[]).unwrap();
        // "V1" is not a structured revision
        let err = report.print_summary(true, true).unwrap_err();
        assert!(err.to_string().contains("'V1'"));
        assert!(report.print_summary(false, true).is_ok());
    }
}
