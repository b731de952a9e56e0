use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::revision::Revision;
use crate::sync::{LocalTopic, TopicKey};

/// A topic in conflict, as handed to a [`ConflictResolver`]
#[derive(Debug, Clone)]
pub struct ConflictingTopic<'a> {
    pub key: TopicKey,
    pub topic: &'a LocalTopic,
    /// Local file in the working tree
    pub path: PathBuf,
    /// Revision the remote text was fetched at
    pub remote_version: Revision,
}

impl ConflictingTopic<'_> {
    /// Current content of the local file
    pub fn local_text(&self) -> Result<String> {
        fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))
    }
}

/// Merge policy for conflicting topics.
///
/// Returns the merged text to write to the working tree, or `None` to leave
/// the conflict in place.
pub trait ConflictResolver {
    fn resolve(&mut self, conflict: &ConflictingTopic<'_>, remote_text: &str)
        -> Result<Option<String>>;
}

impl<F> ConflictResolver for F
where
    F: FnMut(&ConflictingTopic<'_>, &str) -> Result<Option<String>>,
{
    fn resolve(
        &mut self,
        conflict: &ConflictingTopic<'_>,
        remote_text: &str,
    ) -> Result<Option<String>> {
        self(conflict, remote_text)
    }
}

/// Non-interactive resolution policies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionStrategy {
    /// Keep the working tree content
    Local,
    /// Take the remote content
    Remote,
}

impl ResolutionStrategy {
    pub fn as_str(&self) -> &str {
        match self {
            ResolutionStrategy::Local => "local",
            ResolutionStrategy::Remote => "remote",
        }
    }
}

impl ConflictResolver for ResolutionStrategy {
    fn resolve(
        &mut self,
        conflict: &ConflictingTopic<'_>,
        remote_text: &str,
    ) -> Result<Option<String>> {
        let text = match self {
            ResolutionStrategy::Local => conflict.local_text()?,
            ResolutionStrategy::Remote => remote_text.to_string(),
        };
        log::debug!("Resolving {} by keeping {}", conflict.key, self.as_str());
        Ok(Some(text))
    }
}

/// Outcome of a resolve run
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ResolveOutcome {
    /// Conflicts whose merged content was written; they now need a commit
    pub resolved: Vec<TopicKey>,
    /// Conflicts the resolver declined
    pub declined: Vec<TopicKey>,
}

impl ResolveOutcome {
    pub fn total(&self) -> usize {
        self.resolved.len() + self.declined.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn conflict_in<'a>(temp: &TempDir, topic: &'a LocalTopic) -> ConflictingTopic<'a> {
        ConflictingTopic {
            key: TopicKey::new("A", &topic.name),
            topic,
            path: temp.path().join("One.wiki"),
            remote_version: Revision::new("V2"),
        }
    }

    #[test]
    fn test_keep_local_reads_working_file() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("One.wiki"), "mine").unwrap();
        let topic = LocalTopic::discovered_locally("One");

        let merged = ResolutionStrategy::Local
            .resolve(&conflict_in(&temp, &topic), "theirs")
            .unwrap();
        assert_eq!(merged.as_deref(), Some("mine"));
    }

    #[test]
    fn test_keep_remote_takes_remote_text() {
        let temp = TempDir::new().unwrap();
        let topic = LocalTopic::discovered_locally("One");

        let merged = ResolutionStrategy::Remote
            .resolve(&conflict_in(&temp, &topic), "theirs")
            .unwrap();
        assert_eq!(merged.as_deref(), Some("theirs"));
    }

    #[test]
    fn test_closure_resolver_can_decline() {
        let temp = TempDir::new().unwrap();
        let topic = LocalTopic::discovered_locally("One");
        let mut decline = |_: &ConflictingTopic<'_>, _: &str| -> Result<Option<String>> { Ok(None) };

        assert_eq!(decline.resolve(&conflict_in(&temp, &topic), "x").unwrap(), None);
    }

    #[test]
    fn test_strategy_parses_from_config() {
        #[derive(Deserialize)]
        struct Wrapper {
            strategy: ResolutionStrategy,
        }
        let parsed: Wrapper = toml::from_str("strategy = \"remote\"").unwrap();
        assert_eq!(parsed.strategy, ResolutionStrategy::Remote);
    }
}
