use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::SyncError;

use super::topic::LocalTopic;

/// A named group of topics, mapped to `<root>/<name>` in the working tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalNamespace {
    pub name: String,

    #[serde(default, with = "topic_list")]
    topics: BTreeMap<String, LocalTopic>,
}

impl LocalNamespace {
    pub fn new(name: impl Into<String>) -> Self {
        LocalNamespace {
            name: name.into(),
            topics: BTreeMap::new(),
        }
    }

    /// Track a new topic. Names are unique within a namespace.
    pub fn add_topic(&mut self, topic: LocalTopic) -> Result<&mut LocalTopic, SyncError> {
        use std::collections::btree_map::Entry;

        match self.topics.entry(topic.name.clone()) {
            Entry::Occupied(_) => Err(SyncError::DuplicateTopic {
                namespace: self.name.clone(),
                topic: topic.name,
            }),
            Entry::Vacant(slot) => Ok(slot.insert(topic)),
        }
    }

    pub fn topic(&self, name: &str) -> Option<&LocalTopic> {
        self.topics.get(name)
    }

    pub fn topic_mut(&mut self, name: &str) -> Option<&mut LocalTopic> {
        self.topics.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.topics.contains_key(name)
    }

    /// Topics in name order
    pub fn topics(&self) -> impl Iterator<Item = &LocalTopic> {
        self.topics.values()
    }

    pub(crate) fn topics_mut(&mut self) -> impl Iterator<Item = &mut LocalTopic> {
        self.topics.values_mut()
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}

/// Stores the topic map as a plain list and refuses duplicate names on load.
mod topic_list {
    use super::LocalTopic;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S>(map: &BTreeMap<String, LocalTopic>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let list: Vec<&LocalTopic> = map.values().collect();
        list.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BTreeMap<String, LocalTopic>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let list: Vec<LocalTopic> = Vec::deserialize(deserializer)?;
        let mut map = BTreeMap::new();
        for topic in list {
            let name = topic.name.clone();
            if map.insert(name.clone(), topic).is_some() {
                return Err(D::Error::custom(format!("duplicate topic '{name}'")));
            }
        }
        Ok(map)
    }
}
