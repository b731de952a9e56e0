use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::conflict::{ConflictResolver, ConflictingTopic, ResolveOutcome};
use crate::remote::RemoteProxy;

use super::status::TopicStatus;
use super::Synchronizer;

impl<R: RemoteProxy> Synchronizer<R> {
    /// Hand every conflicting topic in `scope` to `resolver` together with
    /// the remote text.
    ///
    /// Merged text is written to the working tree and the topic's baseline
    /// revision moves to the remote revision. The baseline checksum is left
    /// as it was, so a resolved topic reports `LocallyModified` until the
    /// merge is committed. A resolver returning `None` leaves the conflict in
    /// place.
    pub fn resolve<C>(&mut self, resolver: &mut C, scope: &[PathBuf]) -> Result<ResolveOutcome>
    where
        C: ConflictResolver + ?Sized,
    {
        self.persisting(|sync| sync.resolve_conflicts(resolver, scope))
    }

    fn resolve_conflicts<C>(&mut self, resolver: &mut C, scope: &[PathBuf]) -> Result<ResolveOutcome>
    where
        C: ConflictResolver + ?Sized,
    {
        self.scan_local()?;
        self.scan_remote()?;

        let mut outcome = ResolveOutcome::default();
        for key in self.scoped(scope)? {
            if self.status(&key)? != TopicStatus::InConflict {
                continue;
            }

            // A conflict implies the remote has the topic
            let Some(remote_topic) = self.remote_topic(&key)? else {
                continue;
            };
            let remote_text = self
                .remote
                .get_text_for_topic(&remote_topic)
                .with_context(|| format!("Failed to fetch {}@{}", key, remote_topic.version))?;

            let path = self.topic_path(&key);
            let merged = {
                let conflict = ConflictingTopic {
                    key: key.clone(),
                    topic: self.topic(&key)?,
                    path: path.clone(),
                    remote_version: remote_topic.version.clone(),
                };
                resolver.resolve(&conflict, &remote_text)?
            };

            match merged {
                Some(text) => {
                    fs::write(&path, text)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    self.topic_mut(&key)?.based_on_repository_version = Some(remote_topic.version);
                    log::info!("Resolved {}, commit it to publish the merge", key);
                    outcome.resolved.push(key);
                }
                None => {
                    log::info!("Left {} in conflict", key);
                    outcome.declined.push(key);
                }
            }
        }

        Ok(outcome)
    }
}
