use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::checksum;
use crate::progress::{ProgressEvent, ProgressKind};
use crate::remote::RemoteProxy;

use super::Synchronizer;

impl<R: RemoteProxy> Synchronizer<R> {
    /// Bring out-of-date and missing topics in `scope` up to the remote
    /// revision.
    ///
    /// Each topic that is `LocallyOutOfDate` or `NoLocalFile` gets the remote
    /// text written to its file, and its baseline moves to the remote
    /// revision and the new file checksum. Emits one `UpdatedLocal` event per
    /// topic written. The state file is flushed even if the update fails part
    /// way through.
    pub fn update(&mut self, scope: &[PathBuf]) -> Result<Vec<ProgressEvent>> {
        self.persisting(|sync| sync.update_topics(scope))
    }

    fn update_topics(&mut self, scope: &[PathBuf]) -> Result<Vec<ProgressEvent>> {
        self.scan_local()?;
        self.scan_remote()?;

        let mut events = Vec::new();
        for key in self.scoped(scope)? {
            let old_status = self.status(&key)?;
            if !old_status.needs_update() {
                continue;
            }

            let Some(remote_topic) = self.remote_topic(&key)? else {
                log::debug!("{} has no local file and no remote revision, nothing to fetch", key);
                continue;
            };

            let text = self
                .remote
                .get_text_for_topic(&remote_topic)
                .with_context(|| format!("Failed to fetch {}@{}", key, remote_topic.version))?;

            let dir = self.namespace_dir(&key.namespace);
            fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;

            let path = self.topic_path(&key);
            fs::write(&path, text).with_context(|| format!("Failed to write {}", path.display()))?;

            let written = checksum::of_file(&path)?
                .ok_or_else(|| anyhow!("{} disappeared right after it was written", path.display()))?;
            self.topic_mut(&key)?.advance_baseline(written);

            let event = ProgressEvent {
                kind: ProgressKind::UpdatedLocal,
                namespace: key.namespace.clone(),
                topic: key.name.clone(),
                old_status,
                new_status: self.status(&key)?,
            };
            self.observers.notify(&event);
            events.push(event);
        }

        log::info!("Updated {} topic(s)", events.len());
        Ok(events)
    }
}
