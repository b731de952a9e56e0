use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::checksum;
use crate::error::SyncError;
use crate::progress::{ProgressEvent, ProgressKind};
use crate::remote::RemoteProxy;

use super::status::TopicStatus;
use super::topic::TopicKey;
use super::Synchronizer;

impl<R: RemoteProxy> Synchronizer<R> {
    /// Push locally added and modified topics in `scope` to the remote.
    ///
    /// Unless `ignore_conflicts` is set, a single topic in conflict anywhere
    /// in the scope aborts the whole commit before anything is written. With
    /// `ignore_conflicts`, conflicting topics are skipped and reported.
    ///
    /// Every push carries the remote revision seen by the pre-commit scan; if
    /// the remote has moved on since, that topic is skipped with a
    /// `ConflictSkipped` event and the rest of the commit continues. After the
    /// pushes the remote is scanned again and the baseline of every pushed
    /// topic moves to the revision the remote now reports.
    ///
    /// Events are delivered once the post-commit refresh is done, in the
    /// order topics were processed, so `new_status` reflects the final state.
    pub fn commit(
        &mut self,
        identity: &str,
        scope: &[PathBuf],
        ignore_conflicts: bool,
    ) -> Result<Vec<ProgressEvent>> {
        self.persisting(|sync| sync.commit_topics(identity, scope, ignore_conflicts))
    }

    fn commit_topics(
        &mut self,
        identity: &str,
        scope: &[PathBuf],
        ignore_conflicts: bool,
    ) -> Result<Vec<ProgressEvent>> {
        self.scan_local()?;
        self.scan_remote()?;

        let classified = self
            .scoped(scope)?
            .into_iter()
            .map(|key| {
                let status = self.status(&key)?;
                Ok((key, status))
            })
            .collect::<Result<Vec<_>>>()?;

        if !ignore_conflicts {
            let conflicts: Vec<String> = classified
                .iter()
                .filter(|(_, status)| *status == TopicStatus::InConflict)
                .map(|(key, _)| key.to_string())
                .collect();
            if !conflicts.is_empty() {
                return Err(SyncError::Conflict { topics: conflicts }.into());
            }
        }

        let mut events = Vec::new();
        let mut pushed: Vec<(TopicKey, u64)> = Vec::new();
        let mut failure = None;

        for (key, status) in classified {
            if status.needs_commit() {
                match self.push_topic(&key, identity) {
                    Ok(sum) => {
                        events.push(event(ProgressKind::Committed, &key, status));
                        pushed.push((key, sum));
                    }
                    Err(e) if is_stale(&e) => {
                        log::warn!("Not committing {}: {}", key, e);
                        events.push(event(ProgressKind::ConflictSkipped, &key, status));
                    }
                    Err(e) => {
                        failure = Some(e.context(format!("Failed to commit {key}")));
                        break;
                    }
                }
            } else if status == TopicStatus::InConflict {
                log::info!("Skipping {} (in conflict)", key);
                events.push(event(ProgressKind::ConflictSkipped, &key, status));
            }
        }

        // Topics pushed before a failure still need their baseline moved,
        // otherwise they would show up as conflicts on the next run.
        if !pushed.is_empty() {
            if let Err(e) = self.advance_pushed(&pushed) {
                return Err(match failure {
                    Some(first) => {
                        log::error!("Failed to refresh committed topics: {e:#}");
                        first
                    }
                    None => e,
                });
            }
        }

        if let Some(e) = failure {
            return Err(e);
        }

        for event in &mut events {
            let key = TopicKey::new(&event.namespace, &event.topic);
            event.new_status = self.status(&key)?;
        }
        for event in &events {
            self.observers.notify(event);
        }

        log::info!(
            "Committed {} topic(s), skipped {}",
            pushed.len(),
            events.len() - pushed.len()
        );
        Ok(events)
    }

    /// Send the file content of `key` to the remote. Returns the checksum of
    /// what was sent.
    fn push_topic(&mut self, key: &TopicKey, identity: &str) -> Result<u64> {
        let path = self.topic_path(key);
        let content =
            fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
        let expected = self.topic(key)?.repository_version.clone();

        self.remote.set_text_for_topic(
            &key.namespace,
            &key.name,
            &content,
            identity,
            expected.as_ref(),
        )?;

        log::debug!("Pushed {} as {}", key, identity);
        Ok(checksum::of_bytes(content.as_bytes()))
    }

    fn advance_pushed(&mut self, pushed: &[(TopicKey, u64)]) -> Result<()> {
        self.scan_remote()?;
        for (key, sum) in pushed {
            self.topic_mut(key)?.advance_baseline(*sum);
        }
        Ok(())
    }
}

fn event(kind: ProgressKind, key: &TopicKey, status: TopicStatus) -> ProgressEvent {
    ProgressEvent {
        kind,
        namespace: key.namespace.clone(),
        topic: key.name.clone(),
        old_status: status,
        new_status: status,
    }
}

fn is_stale(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<SyncError>(),
        Some(SyncError::StaleRevision { .. })
    )
}
