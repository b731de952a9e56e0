use anyhow::{anyhow, Result};
use std::collections::BTreeMap;

use crate::error::SyncError;
use crate::revision::Revision;

use super::{stale_revision, RemoteNamespace, RemoteProxy, RemoteTopic};

#[derive(Debug, Clone, Default)]
struct TopicHistory {
    /// Oldest first; the last entry is current
    revisions: Vec<(Revision, String)>,
}

impl TopicHistory {
    fn current(&self) -> Option<&Revision> {
        self.revisions.last().map(|(rev, _)| rev)
    }
}

/// In-memory topic repository.
///
/// Revisions written through [`RemoteProxy::set_text_for_topic`] are named
/// `r1`, `r2`, ... in write order. [`MemoryRemote::put_revision`] stores a
/// revision with a caller-chosen name, which is how tests simulate another
/// writer changing the remote.
#[derive(Debug, Clone)]
pub struct MemoryRemote {
    uri: String,
    namespaces: BTreeMap<String, BTreeMap<String, TopicHistory>>,
    next_revision: u64,
    writes: Vec<(String, String, String)>,
}

impl MemoryRemote {
    pub fn new(uri: impl Into<String>) -> Self {
        MemoryRemote {
            uri: uri.into(),
            namespaces: BTreeMap::new(),
            next_revision: 1,
            writes: Vec::new(),
        }
    }

    pub fn add_namespace(&mut self, namespace: &str) {
        self.namespaces.entry(namespace.to_string()).or_default();
    }

    /// Store `text` as the new current revision of a topic, bypassing the
    /// concurrency check and the write log.
    pub fn put_revision(&mut self, namespace: &str, name: &str, revision: &str, text: &str) {
        self.namespaces
            .entry(namespace.to_string())
            .or_default()
            .entry(name.to_string())
            .or_default()
            .revisions
            .push((Revision::new(revision), text.to_string()));
    }

    pub fn current_revision(&self, namespace: &str, name: &str) -> Option<&Revision> {
        self.namespaces.get(namespace)?.get(name)?.current()
    }

    pub fn current_text(&self, namespace: &str, name: &str) -> Option<&str> {
        let history = self.namespaces.get(namespace)?.get(name)?;
        history.revisions.last().map(|(_, text)| text.as_str())
    }

    /// Pushes accepted through `set_text_for_topic`, as `(namespace, topic, identity)`
    pub fn writes(&self) -> &[(String, String, String)] {
        &self.writes
    }

    pub fn write_count(&self) -> usize {
        self.writes.len()
    }
}

impl RemoteProxy for MemoryRemote {
    fn uri(&self) -> &str {
        &self.uri
    }

    fn get_all_namespaces(&self) -> Result<Vec<RemoteNamespace>> {
        Ok(self
            .namespaces
            .keys()
            .map(|namespace| RemoteNamespace {
                namespace: namespace.clone(),
            })
            .collect())
    }

    fn get_all_topics(&self, namespace: &str) -> Result<Vec<RemoteTopic>> {
        let topics = self
            .namespaces
            .get(namespace)
            .ok_or_else(|| anyhow!("Unknown namespace '{}'", namespace))?;

        Ok(topics
            .iter()
            .filter_map(|(name, history)| {
                history.current().map(|version| RemoteTopic {
                    namespace: namespace.to_string(),
                    name: name.clone(),
                    version: version.clone(),
                })
            })
            .collect())
    }

    fn get_text_for_topic(&self, topic: &RemoteTopic) -> Result<String> {
        self.namespaces
            .get(&topic.namespace)
            .and_then(|topics| topics.get(&topic.name))
            .and_then(|history| {
                history
                    .revisions
                    .iter()
                    .find(|(rev, _)| *rev == topic.version)
            })
            .map(|(_, text)| text.clone())
            .ok_or_else(|| {
                SyncError::UnknownTopic {
                    namespace: topic.namespace.clone(),
                    topic: format!("{}@{}", topic.name, topic.version),
                }
                .into()
            })
    }

    fn set_text_for_topic(
        &mut self,
        namespace: &str,
        name: &str,
        content: &str,
        identity: &str,
        expected: Option<&Revision>,
    ) -> Result<()> {
        let current = self.current_revision(namespace, name).cloned();
        if current.as_ref() != expected {
            return Err(stale_revision(namespace, name, expected, current.as_ref()).into());
        }

        let revision = format!("r{}", self.next_revision);
        self.next_revision += 1;
        self.put_revision(namespace, name, &revision, content);
        self.writes
            .push((namespace.to_string(), name.to_string(), identity.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_mint_sequential_revisions() {
        let mut remote = MemoryRemote::new("memory://test");
        remote.add_namespace("A");
        remote
            .set_text_for_topic("A", "One", "first", "alice", None)
            .unwrap();
        let r1 = remote.current_revision("A", "One").cloned();
        remote
            .set_text_for_topic("A", "One", "second", "alice", r1.as_ref())
            .unwrap();

        assert_eq!(remote.current_revision("A", "One"), Some(&Revision::new("r2")));
        assert_eq!(remote.current_text("A", "One"), Some("second"));
        assert_eq!(remote.write_count(), 2);
    }

    #[test]
    fn test_historic_text_available() {
        let mut remote = MemoryRemote::new("memory://test");
        remote.put_revision("A", "One", "V1", "old");
        remote.put_revision("A", "One", "V2", "new");

        let topic = RemoteTopic {
            namespace: "A".to_string(),
            name: "One".to_string(),
            version: Revision::new("V1"),
        };
        assert_eq!(remote.get_text_for_topic(&topic).unwrap(), "old");
        assert_eq!(
            remote.get_all_topics("A").unwrap()[0].version,
            Revision::new("V2")
        );
    }

    #[test]
    fn test_stale_expectation_rejected() {
        let mut remote = MemoryRemote::new("memory://test");
        remote.put_revision("A", "One", "V2", "theirs");
        let err = remote
            .set_text_for_topic("A", "One", "mine", "bob", Some(&Revision::new("V1")))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SyncError>(),
            Some(SyncError::StaleRevision { .. })
        ));
        assert_eq!(remote.write_count(), 0);
    }
}
