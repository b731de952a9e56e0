//! Replica tracking and the synchronization protocol.
//!
//! A [`Synchronizer`] owns the persisted state of one working tree and a
//! [`RemoteProxy`]. Every public operation follows the same shape: scan the
//! working tree, scan the remote, resolve the requested scope, classify each
//! topic by its [`TopicStatus`] and act on it, then flush the state file,
//! whether or not the operation succeeded.

mod commit;
mod discovery;
mod namespace;
mod resolve;
mod scope;
mod state;
mod status;
mod topic;
mod update;

pub use namespace::LocalNamespace;
pub use scope::{calculate_base_dir, calculate_base_dir_from, resolve_scope};
pub use state::{PersistentState, STATE_FILE_NAME};
pub use status::{Observation, TopicStatus};
pub use topic::{is_valid_name, LocalTopic, TopicKey, TOPIC_EXTENSION};

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::error::SyncError;
use crate::progress::{Observers, ProgressObserver};
use crate::remote::{RemoteProxy, RemoteTopic};

/// Synchronizes one working tree with one remote.
pub struct Synchronizer<R: RemoteProxy> {
    root: PathBuf,
    state: PersistentState,
    remote: R,
    observers: Observers,
}

impl<R: RemoteProxy> Synchronizer<R> {
    /// Open the working tree rooted at `root`.
    ///
    /// An existing state file is loaded; it must be bound to the same remote
    /// URI. A tree without a state file starts empty and is bound to `remote`
    /// when the first operation flushes its state. A relative `root` is taken
    /// from the current directory.
    pub fn open(root: &Path, remote: R) -> Result<Self> {
        let root = std::path::absolute(root)
            .with_context(|| format!("Failed to resolve working tree {}", root.display()))?;
        let root = root.as_path();
        let state = if PersistentState::exists(root) {
            let state = PersistentState::load(root)?;
            if state.proxy_uri != remote.uri() {
                return Err(SyncError::RemoteMismatch {
                    bound: state.proxy_uri,
                    requested: remote.uri().to_string(),
                }
                .into());
            }
            state
        } else {
            log::info!("Starting new working tree at {}", root.display());
            PersistentState::new(remote.uri())
        };

        Ok(Synchronizer {
            root: root.to_path_buf(),
            state,
            remote,
            observers: Observers::default(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn state(&self) -> &PersistentState {
        &self.state
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn remote_mut(&mut self) -> &mut R {
        &mut self.remote
    }

    /// Register an observer for progress events of `update` and `commit`.
    pub fn subscribe(&mut self, observer: impl ProgressObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn namespace_dir(&self, namespace: &str) -> PathBuf {
        self.root.join(namespace)
    }

    pub fn topic_path(&self, key: &TopicKey) -> PathBuf {
        topic::topic_file(&self.namespace_dir(&key.namespace), &key.name)
    }

    pub fn topic(&self, key: &TopicKey) -> Result<&LocalTopic> {
        self.state.topic(key).ok_or_else(|| unknown(key).into())
    }

    pub(crate) fn topic_mut(&mut self, key: &TopicKey) -> Result<&mut LocalTopic> {
        self.state.topic_mut(key).ok_or_else(|| unknown(key).into())
    }

    /// Current status of a topic, derived from the file on disk and the
    /// tracked revisions. Never modifies the topic.
    pub fn status(&self, key: &TopicKey) -> Result<TopicStatus> {
        self.topic(key)?.status(&self.namespace_dir(&key.namespace))
    }

    /// Status of every topic selected by `scope`, in scope order.
    pub fn statuses(&self, scope: &[PathBuf]) -> Result<Vec<(TopicKey, TopicStatus)>> {
        self.scoped(scope)?
            .into_iter()
            .map(|key| {
                let status = self.status(&key)?;
                Ok((key, status))
            })
            .collect()
    }

    /// Write the state file.
    pub fn save(&self) -> Result<()> {
        self.state.save(&self.root)
    }

    /// Register untracked topic files found in the working tree.
    /// Returns how many topics were added.
    pub fn sync_to_local(&mut self) -> Result<usize> {
        self.persisting(|sync| sync.scan_local())
    }

    /// Register unseen remote namespaces and topics and refresh every tracked
    /// topic's remote revision. Returns how many topics were added.
    pub fn sync_to_remote(&mut self) -> Result<usize> {
        self.persisting(|sync| sync.scan_remote())
    }

    /// Both scans, as run at the start of every operation.
    pub fn refresh(&mut self) -> Result<()> {
        self.persisting(|sync| {
            sync.scan_local()?;
            sync.scan_remote()?;
            Ok(())
        })
    }

    /// Run `op`, then flush the state file even if `op` failed. The error
    /// from `op` takes precedence over a failed flush.
    fn persisting<T>(&mut self, op: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let result = op(self);
        let saved = self.save();

        match (result, saved) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(save_err)) => Err(save_err),
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(save_err)) => {
                log::error!("Failed to save sync state after error: {save_err:#}");
                Err(err)
            }
        }
    }

    fn scoped(&self, scope: &[PathBuf]) -> Result<Vec<TopicKey>> {
        let cwd = if scope.is_empty() {
            self.root.clone()
        } else {
            std::env::current_dir().context("Failed to get current directory")?
        };
        resolve_scope(&self.state, &self.root, &cwd, scope)
    }

    /// The remote side of a tracked topic at its last observed revision.
    fn remote_topic(&self, key: &TopicKey) -> Result<Option<RemoteTopic>> {
        Ok(self
            .topic(key)?
            .repository_version
            .clone()
            .map(|version| RemoteTopic {
                namespace: key.namespace.clone(),
                name: key.name.clone(),
                version,
            }))
    }
}

fn unknown(key: &TopicKey) -> SyncError {
    SyncError::UnknownTopic {
        namespace: key.namespace.clone(),
        topic: key.name.clone(),
    }
}
