use anyhow::{anyhow, Context, Result};
use chrono::Duration;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::error::SyncError;
use crate::revision::{Revision, RevisionStamp};
use crate::sync::{is_valid_name, TOPIC_EXTENSION};

use super::{stale_revision, RemoteNamespace, RemoteProxy, RemoteTopic};

/// Topic repository stored in a local directory.
///
/// Every revision of a topic is kept as its own file:
///
/// ```text
/// <root>/<namespace>/<topic>/<revision>.wiki
/// ```
///
/// Revisions are minted from the commit time and author
/// (`YYYY-MM-DD-HH-MM-SS.fff-author`), so the newest revision of a topic is
/// the one with the latest stamp.
#[derive(Debug)]
pub struct DirectoryRemote {
    root: PathBuf,
    uri: String,
}

impl DirectoryRemote {
    /// Open an existing repository directory.
    pub fn open(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            return Err(anyhow!(
                "Remote repository '{}' does not exist or is not a directory",
                root.display()
            ));
        }

        let root = root
            .canonicalize()
            .with_context(|| format!("Failed to resolve remote path: {}", root.display()))?;
        let uri = format!("file://{}", root.display());

        Ok(DirectoryRemote { root, uri })
    }

    /// Create the repository directory if needed, then open it.
    pub fn create(root: &Path) -> Result<Self> {
        fs::create_dir_all(root)
            .with_context(|| format!("Failed to create remote repository: {}", root.display()))?;
        Self::open(root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Add an empty namespace. Existing namespaces are left alone.
    pub fn create_namespace(&self, name: &str) -> Result<()> {
        check_name(name)?;
        let dir = self.root.join(name);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create namespace: {}", dir.display()))?;
        log::info!("Created namespace '{}' in {}", name, self.uri);
        Ok(())
    }

    fn topic_dir(&self, namespace: &str, name: &str) -> PathBuf {
        self.root.join(namespace).join(name)
    }

    /// Newest revision of a topic, `None` if the topic has no revisions.
    fn latest_revision(&self, namespace: &str, name: &str) -> Result<Option<Revision>> {
        let dir = self.topic_dir(namespace, name);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to list {}", dir.display()))
            }
        };

        let mut latest: Option<(RevisionStamp, Revision)> = None;
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) != Some(TOPIC_EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let revision = Revision::new(stem);
            let stamp = revision.stamp()?;
            if latest.as_ref().map_or(true, |(best, _)| stamp > *best) {
                latest = Some((stamp, revision));
            }
        }

        Ok(latest.map(|(_, revision)| revision))
    }

    /// A stamp for `identity` that sorts after `current`.
    fn next_stamp(&self, identity: &str, current: Option<&Revision>) -> Result<RevisionStamp> {
        let mut stamp = RevisionStamp::now(identity);
        if let Some(current) = current {
            let previous = current.stamp()?;
            if stamp.timestamp <= previous.timestamp {
                stamp.timestamp = previous.timestamp + Duration::milliseconds(1);
            }
        }
        Ok(stamp)
    }
}

impl RemoteProxy for DirectoryRemote {
    fn uri(&self) -> &str {
        &self.uri
    }

    fn get_all_namespaces(&self) -> Result<Vec<RemoteNamespace>> {
        let mut namespaces: Vec<RemoteNamespace> = list_subdirs(&self.root)?
            .into_iter()
            .map(|namespace| RemoteNamespace { namespace })
            .collect();
        namespaces.sort_by(|a, b| a.namespace.cmp(&b.namespace));
        Ok(namespaces)
    }

    fn get_all_topics(&self, namespace: &str) -> Result<Vec<RemoteTopic>> {
        check_name(namespace)?;
        let mut topics = Vec::new();

        for name in list_subdirs(&self.root.join(namespace))? {
            if let Some(version) = self.latest_revision(namespace, &name)? {
                topics.push(RemoteTopic {
                    namespace: namespace.to_string(),
                    name,
                    version,
                });
            }
        }

        topics.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(topics)
    }

    fn get_text_for_topic(&self, topic: &RemoteTopic) -> Result<String> {
        check_name(&topic.namespace)?;
        check_name(&topic.name)?;

        let path = self
            .topic_dir(&topic.namespace, &topic.name)
            .join(format!("{}.{}", topic.version, TOPIC_EXTENSION));

        match fs::read_to_string(&path) {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(SyncError::UnknownTopic {
                namespace: topic.namespace.clone(),
                topic: format!("{}@{}", topic.name, topic.version),
            }
            .into()),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    fn set_text_for_topic(
        &mut self,
        namespace: &str,
        name: &str,
        content: &str,
        identity: &str,
        expected: Option<&Revision>,
    ) -> Result<()> {
        check_name(namespace)?;
        check_name(name)?;

        let current = self.latest_revision(namespace, name)?;
        if current.as_ref() != expected {
            return Err(stale_revision(namespace, name, expected, current.as_ref()).into());
        }

        let revision = self.next_stamp(identity, current.as_ref())?.to_revision();
        let dir = self.topic_dir(namespace, name);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create topic directory: {}", dir.display()))?;

        let path = dir.join(format!("{}.{}", revision, TOPIC_EXTENSION));
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .with_context(|| format!("Failed to create revision file: {}", path.display()))?;
        file.write_all(content.as_bytes())
            .with_context(|| format!("Failed to write revision file: {}", path.display()))?;

        log::info!("Stored {}/{} as revision {}", namespace, name, revision);
        Ok(())
    }
}

fn check_name(name: &str) -> Result<()> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(anyhow!("Invalid namespace or topic name '{}'", name))
    }
}

/// Names of visible subdirectories, empty if `dir` does not exist.
fn list_subdirs(dir: &Path) -> Result<Vec<String>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e).with_context(|| format!("Failed to list {}", dir.display())),
    };

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            if !name.starts_with('.') {
                names.push(name.to_string());
            }
        }
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn remote_with_namespace() -> (TempDir, DirectoryRemote) {
        let temp = TempDir::new().unwrap();
        let remote = DirectoryRemote::create(&temp.path().join("repo")).unwrap();
        remote.create_namespace("Main").unwrap();
        (temp, remote)
    }

    #[test]
    fn test_lists_namespaces_sorted() {
        let (_temp, remote) = remote_with_namespace();
        remote.create_namespace("Alpha").unwrap();
        fs::create_dir(remote.root().join(".hidden")).unwrap();

        let names: Vec<_> = remote
            .get_all_namespaces()
            .unwrap()
            .into_iter()
            .map(|n| n.namespace)
            .collect();
        assert_eq!(names, vec!["Alpha", "Main"]);
    }

    #[test]
    fn test_set_then_get_latest() {
        let (_temp, mut remote) = remote_with_namespace();
        remote
            .set_text_for_topic("Main", "Home", "v1 text", "alice", None)
            .unwrap();

        let topics = remote.get_all_topics("Main").unwrap();
        assert_eq!(topics.len(), 1);
        let first = topics[0].clone();
        assert_eq!(first.version.stamp().unwrap().author.as_deref(), Some("alice"));
        assert_eq!(remote.get_text_for_topic(&first).unwrap(), "v1 text");

        remote
            .set_text_for_topic("Main", "Home", "v2 text", "bob", Some(&first.version))
            .unwrap();
        let second = remote.get_all_topics("Main").unwrap()[0].clone();
        assert_ne!(second.version, first.version);
        assert_eq!(remote.get_text_for_topic(&second).unwrap(), "v2 text");

        // Older revisions stay readable
        assert_eq!(remote.get_text_for_topic(&first).unwrap(), "v1 text");
    }

    #[test]
    fn test_rapid_pushes_keep_last_writer_newest() {
        let (_temp, mut remote) = remote_with_namespace();
        let authors = ["zed", "mia", "amy"];
        let mut current = None;
        for (i, author) in authors.iter().enumerate() {
            let text = format!("v{i}");
            remote
                .set_text_for_topic("Main", "Home", &text, author, current.as_ref())
                .unwrap();
            let latest = remote.get_all_topics("Main").unwrap()[0].clone();
            assert_eq!(latest.version.stamp().unwrap().author.as_deref(), Some(*author));
            assert_eq!(remote.get_text_for_topic(&latest).unwrap(), text);
            current = Some(latest.version);
        }
    }

    #[test]
    fn test_stale_push_rejected() {
        let (_temp, mut remote) = remote_with_namespace();
        remote
            .set_text_for_topic("Main", "Home", "v1", "alice", None)
            .unwrap();

        let err = remote
            .set_text_for_topic("Main", "Home", "other", "bob", None)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SyncError>(),
            Some(SyncError::StaleRevision { .. })
        ));
        assert_eq!(remote.get_all_topics("Main").unwrap().len(), 1);
    }

    #[test]
    fn test_malformed_revision_file_is_fatal() {
        let (_temp, remote) = remote_with_namespace();
        let dir = remote.root().join("Main").join("Home");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("garbage.wiki"), "x").unwrap();

        let err = remote.get_all_topics("Main").unwrap_err();
        match err.downcast_ref::<SyncError>() {
            Some(SyncError::MalformedRevision(value)) => assert_eq!(value, "garbage"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_unknown_revision_text() {
        let (_temp, remote) = remote_with_namespace();
        let topic = RemoteTopic {
            namespace: "Main".to_string(),
            name: "Missing".to_string(),
            version: Revision::new("2024-01-01-00-00-00.000"),
        };
        let err = remote.get_text_for_topic(&topic).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SyncError>(),
            Some(SyncError::UnknownTopic { .. })
        ));
    }

    #[test]
    fn test_rejects_path_like_names() {
        let (_temp, mut remote) = remote_with_namespace();
        assert!(remote.create_namespace("../escape").is_err());
        assert!(remote
            .set_text_for_topic("Main", "a/b", "x", "alice", None)
            .is_err());
    }
}
