use anyhow::{Context, Result};
use std::collections::HashSet;
use walkdir::WalkDir;

use crate::remote::RemoteProxy;

use super::topic::{is_valid_name, LocalTopic, TOPIC_EXTENSION};
use super::Synchronizer;

impl<R: RemoteProxy> Synchronizer<R> {
    /// Register `*.wiki` files in known namespace directories that are not
    /// tracked yet. Tracked topics are never touched.
    pub(super) fn scan_local(&mut self) -> Result<usize> {
        let mut added = 0;
        let namespaces: Vec<String> = self.state.namespaces().map(|ns| ns.name.clone()).collect();

        for namespace in namespaces {
            let dir = self.namespace_dir(&namespace);
            if !dir.is_dir() {
                continue;
            }

            for entry in WalkDir::new(&dir)
                .min_depth(1)
                .max_depth(1)
                .follow_links(false)
                .sort_by_file_name()
            {
                let entry =
                    entry.with_context(|| format!("Failed to scan {}", dir.display()))?;
                let path = entry.path();

                if !entry.file_type().is_file()
                    || path.extension().and_then(|s| s.to_str()) != Some(TOPIC_EXTENSION)
                {
                    continue;
                }
                let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                    log::warn!("Skipping non UTF-8 topic file {}", path.display());
                    continue;
                };
                if !is_valid_name(name) {
                    continue;
                }

                let Some(ns) = self.state.namespace_mut(&namespace) else {
                    continue;
                };
                if ns.contains(name) {
                    continue;
                }

                ns.add_topic(LocalTopic::discovered_locally(name))?;
                log::debug!("Found new local topic {}/{}", namespace, name);
                added += 1;
            }
        }

        if added > 0 {
            log::info!("Registered {} new local topic(s)", added);
        }
        Ok(added)
    }

    /// Pull the remote catalog. New namespaces and topics are registered;
    /// tracked topics only get their remote revision refreshed, so their
    /// baseline keeps recording what the local file last agreed with.
    pub(super) fn scan_remote(&mut self) -> Result<usize> {
        let mut added = 0;

        for remote_ns in self.remote.get_all_namespaces()? {
            let namespace = remote_ns.namespace;
            if !is_valid_name(&namespace) {
                log::warn!("Ignoring remote namespace with unusable name '{}'", namespace);
                continue;
            }

            let topics = self
                .remote
                .get_all_topics(&namespace)
                .with_context(|| format!("Failed to list topics of namespace '{namespace}'"))?;

            if self.state.namespace(&namespace).is_none() {
                self.state.add_namespace(&namespace)?;
                log::debug!("Found new remote namespace {}", namespace);
            }
            let Some(ns) = self.state.namespace_mut(&namespace) else {
                continue;
            };

            let mut listed = HashSet::new();
            for remote_topic in topics {
                if !is_valid_name(&remote_topic.name) {
                    log::warn!(
                        "Ignoring remote topic with unusable name '{}/{}'",
                        namespace,
                        remote_topic.name
                    );
                    continue;
                }
                listed.insert(remote_topic.name.clone());

                match ns.topic_mut(&remote_topic.name) {
                    Some(topic) => topic.repository_version = Some(remote_topic.version),
                    None => {
                        log::debug!("Found new remote topic {}/{}", namespace, remote_topic.name);
                        ns.add_topic(LocalTopic::discovered_remotely(
                            remote_topic.name,
                            remote_topic.version,
                        ))?;
                        added += 1;
                    }
                }
            }

            for topic in ns.topics_mut() {
                if !listed.contains(&topic.name) && topic.repository_version.is_some() {
                    log::debug!("Topic {}/{} is gone from the remote", namespace, topic.name);
                    topic.repository_version = None;
                }
            }
        }

        if added > 0 {
            log::info!("Registered {} new remote topic(s)", added);
        }
        Ok(added)
    }
}
