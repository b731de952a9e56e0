use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::SyncError;

use super::namespace::LocalNamespace;
use super::topic::{LocalTopic, TopicKey};

/// Name of the state file kept at the root of every working tree
pub const STATE_FILE_NAME: &str = ".wiki-sync.json";

/// Persistent snapshot of a working tree
///
/// Holds every tracked namespace and topic together with the identity of the
/// remote the tree is bound to. It is read once when a synchronizer is opened
/// and rewritten in full at the end of every public operation.
///
/// Topics are stored inside their namespace, so the topic-to-namespace
/// relationship is rebuilt by the structure itself when the file is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistentState {
    /// Identity (URI) of the remote this working tree synchronizes with
    pub proxy_uri: String,

    #[serde(default, with = "namespace_list")]
    namespaces: BTreeMap<String, LocalNamespace>,
}

impl PersistentState {
    pub fn new(proxy_uri: impl Into<String>) -> Self {
        PersistentState {
            proxy_uri: proxy_uri.into(),
            namespaces: BTreeMap::new(),
        }
    }

    pub fn file_path(root: &Path) -> PathBuf {
        root.join(STATE_FILE_NAME)
    }

    pub fn exists(root: &Path) -> bool {
        Self::file_path(root).is_file()
    }

    /// Loads the state of the working tree rooted at `root`
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::NotInitialized`] if the tree has no state file, and
    /// a contextual error if the file cannot be read or parsed (including a
    /// file that lists the same namespace or topic twice).
    pub fn load(root: &Path) -> Result<Self> {
        let path = Self::file_path(root);

        if !path.exists() {
            return Err(SyncError::NotInitialized(root.to_path_buf()).into());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read sync state: {}", path.display()))?;

        let state: PersistentState = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse sync state: {}", path.display()))?;

        Ok(state)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = Self::file_path(root);

        fs::create_dir_all(root)
            .with_context(|| format!("Failed to create working tree: {}", root.display()))?;

        let content =
            serde_json::to_string_pretty(self).context("Failed to serialize sync state")?;

        fs::write(&path, content)
            .with_context(|| format!("Failed to write sync state: {}", path.display()))?;

        log::debug!("Saved sync state to {}", path.display());
        Ok(())
    }

    pub fn add_namespace(&mut self, name: &str) -> Result<&mut LocalNamespace, SyncError> {
        use std::collections::btree_map::Entry;

        match self.namespaces.entry(name.to_string()) {
            Entry::Occupied(_) => Err(SyncError::DuplicateNamespace(name.to_string())),
            Entry::Vacant(slot) => Ok(slot.insert(LocalNamespace::new(name))),
        }
    }

    pub fn namespace(&self, name: &str) -> Option<&LocalNamespace> {
        self.namespaces.get(name)
    }

    pub fn namespace_mut(&mut self, name: &str) -> Option<&mut LocalNamespace> {
        self.namespaces.get_mut(name)
    }

    /// Namespaces in name order
    pub fn namespaces(&self) -> impl Iterator<Item = &LocalNamespace> {
        self.namespaces.values()
    }

    pub fn topic(&self, key: &TopicKey) -> Option<&LocalTopic> {
        self.namespace(&key.namespace)?.topic(&key.name)
    }

    pub fn topic_mut(&mut self, key: &TopicKey) -> Option<&mut LocalTopic> {
        self.namespace_mut(&key.namespace)?.topic_mut(&key.name)
    }

    /// Every tracked topic, ordered by namespace and then topic name
    pub fn topic_keys(&self) -> Vec<TopicKey> {
        self.namespaces()
            .flat_map(|ns| ns.topics().map(|t| TopicKey::new(&ns.name, &t.name)))
            .collect()
    }

    pub fn topic_count(&self) -> usize {
        self.namespaces().map(LocalNamespace::len).sum()
    }
}

mod namespace_list {
    use super::LocalNamespace;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S>(
        map: &BTreeMap<String, LocalNamespace>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let list: Vec<&LocalNamespace> = map.values().collect();
        list.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BTreeMap<String, LocalNamespace>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let list: Vec<LocalNamespace> = Vec::deserialize(deserializer)?;
        let mut map = BTreeMap::new();
        for ns in list {
            let name = ns.name.clone();
            if map.insert(name.clone(), ns).is_some() {
                return Err(D::Error::custom(format!("duplicate namespace '{name}'")));
            }
        }
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::revision::Revision;
    use tempfile::TempDir;

    fn sample_state() -> PersistentState {
        let mut state = PersistentState::new("file:///srv/wiki");
        let ns = state.add_namespace("A").unwrap();
        let mut topic = LocalTopic::discovered_remotely("OneTopic", Revision::new("V1"));
        topic.based_on_checksum = 1234;
        ns.add_topic(topic).unwrap();
        ns.add_topic(LocalTopic::discovered_locally("Draft")).unwrap();
        state.add_namespace("B").unwrap();
        state
    }

    #[test]
    fn test_save_and_load_preserves_fields() {
        let temp = TempDir::new().unwrap();
        let state = sample_state();
        state.save(temp.path()).unwrap();

        let loaded = PersistentState::load(temp.path()).unwrap();
        assert_eq!(loaded, state);

        let topic = loaded.topic(&TopicKey::new("A", "OneTopic")).unwrap();
        assert_eq!(topic.repository_version, Some(Revision::new("V1")));
        assert_eq!(topic.based_on_repository_version, Some(Revision::new("V1")));
        assert_eq!(topic.based_on_checksum, 1234);
        assert_eq!(loaded.proxy_uri, "file:///srv/wiki");
    }

    #[test]
    fn test_load_missing_state_is_not_initialized() {
        let temp = TempDir::new().unwrap();
        let err = PersistentState::load(temp.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SyncError>(),
            Some(SyncError::NotInitialized(_))
        ));
    }

    #[test]
    fn test_duplicate_namespace_rejected() {
        let mut state = sample_state();
        assert!(matches!(
            state.add_namespace("A"),
            Err(SyncError::DuplicateNamespace(_))
        ));

        let json = r#"{"proxy_uri":"x","namespaces":[{"name":"A"},{"name":"A"}]}"#;
        assert!(serde_json::from_str::<PersistentState>(json).is_err());
    }

    #[test]
    fn test_topic_keys_are_ordered() {
        let keys = sample_state().topic_keys();
        assert_eq!(
            keys,
            vec![TopicKey::new("A", "Draft"), TopicKey::new("A", "OneTopic")]
        );
    }
}
