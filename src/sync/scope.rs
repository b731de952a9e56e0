use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

use crate::error::SyncError;

use super::state::PersistentState;
use super::topic::{topic_file, TopicKey};

/// How many ancestors of the starting directory are searched for a state file
const MAX_ANCESTOR_LEVELS: usize = 2;

/// Find the root of the working tree that `candidates` belong to.
///
/// Starts at the first candidate (its parent if it is not a directory) or at
/// the current directory, and checks it plus at most two ancestors for a
/// state file. Falls back to the current directory.
pub fn calculate_base_dir(candidates: &[PathBuf]) -> Result<PathBuf> {
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    Ok(calculate_base_dir_from(&cwd, candidates))
}

pub fn calculate_base_dir_from(cwd: &Path, candidates: &[PathBuf]) -> PathBuf {
    let cwd = normalize(cwd);
    let start = match candidates.first() {
        Some(candidate) => {
            let path = absolute_from(&cwd, candidate);
            if path.is_dir() {
                path
            } else {
                path.parent().map(Path::to_path_buf).unwrap_or(path)
            }
        }
        None => cwd.clone(),
    };

    start
        .ancestors()
        .take(MAX_ANCESTOR_LEVELS + 1)
        .find(|dir| PersistentState::exists(dir))
        .map(Path::to_path_buf)
        .unwrap_or(cwd)
}

/// Resolve path filters to the topics they select.
///
/// An empty filter list selects every topic. Each filter selects, in order of
/// preference: the topic whose file is exactly that path; the topic whose file
/// matches ignoring the extension; every topic under that directory. Relative
/// filters, and a relative `root`, are taken relative to `cwd`.
///
/// # Errors
///
/// [`SyncError::OutsideWorkingTree`] if a filter is not under `root`.
pub fn resolve_scope(
    state: &PersistentState,
    root: &Path,
    cwd: &Path,
    filters: &[PathBuf],
) -> Result<Vec<TopicKey>> {
    let all = state.topic_keys();
    if filters.is_empty() {
        return Ok(all);
    }

    let cwd = normalize(cwd);
    let root = absolute_from(&cwd, root);
    let located: Vec<(TopicKey, PathBuf)> = all
        .into_iter()
        .map(|key| {
            let path = topic_file(&root.join(&key.namespace), &key.name);
            (key, path)
        })
        .collect();

    let mut selected = BTreeSet::new();
    for filter in filters {
        let filter = absolute_from(&cwd, filter);
        if !filter.starts_with(&root) {
            return Err(SyncError::OutsideWorkingTree {
                path: filter,
                root: root.clone(),
            }
            .into());
        }

        let matches = select(&located, &filter);
        if matches.is_empty() {
            log::warn!("'{}' does not match any tracked topic", filter.display());
        }
        selected.extend(matches);
    }

    Ok(selected.into_iter().collect())
}

fn select(located: &[(TopicKey, PathBuf)], filter: &Path) -> Vec<TopicKey> {
    let exact: Vec<TopicKey> = located
        .iter()
        .filter(|(_, path)| path == filter)
        .map(|(key, _)| key.clone())
        .collect();
    if !exact.is_empty() {
        return exact;
    }

    let filter_stem = filter.with_extension("");
    let loose: Vec<TopicKey> = located
        .iter()
        .filter(|(_, path)| {
            let stem = path.with_extension("");
            stem == filter || stem == filter_stem
        })
        .map(|(key, _)| key.clone())
        .collect();
    if !loose.is_empty() {
        return loose;
    }

    located
        .iter()
        .filter(|(_, path)| path.starts_with(filter))
        .map(|(key, _)| key.clone())
        .collect()
}

fn absolute_from(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize(path)
    } else {
        normalize(&cwd.join(path))
    }
}

/// Lexically remove `.` and `..` components. Scope paths may name files that
/// do not exist, so the filesystem is not consulted.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::revision::Revision;
    use crate::sync::LocalTopic;
    use std::fs;
    use tempfile::TempDir;

    fn state() -> PersistentState {
        let mut state = PersistentState::new("memory://test");
        let a = state.add_namespace("A").unwrap();
        a.add_topic(LocalTopic::discovered_remotely("OneTopic", Revision::new("V1")))
            .unwrap();
        a.add_topic(LocalTopic::discovered_remotely("Two.Parts", Revision::new("V1")))
            .unwrap();
        let b = state.add_namespace("B").unwrap();
        b.add_topic(LocalTopic::discovered_locally("OneTopic")).unwrap();
        state
    }

    #[test]
    fn test_empty_scope_selects_everything() {
        let root = Path::new("/work");
        let keys = resolve_scope(&state(), root, root, &[]).unwrap();
        assert_eq!(keys.len(), 3);
    }

    #[test]
    fn test_exact_file_match() {
        let root = Path::new("/work");
        let keys =
            resolve_scope(&state(), root, root, &[PathBuf::from("A/OneTopic.wiki")]).unwrap();
        assert_eq!(keys, vec![TopicKey::new("A", "OneTopic")]);
    }

    #[test]
    fn test_extension_insensitive_match() {
        let root = Path::new("/work");
        let keys = resolve_scope(&state(), root, root, &[PathBuf::from("A/OneTopic")]).unwrap();
        assert_eq!(keys, vec![TopicKey::new("A", "OneTopic")]);

        let keys = resolve_scope(&state(), root, root, &[PathBuf::from("A/OneTopic.txt")]).unwrap();
        assert_eq!(keys, vec![TopicKey::new("A", "OneTopic")]);

        let keys = resolve_scope(&state(), root, root, &[PathBuf::from("A/Two.Parts")]).unwrap();
        assert_eq!(keys, vec![TopicKey::new("A", "Two.Parts")]);
    }

    #[test]
    fn test_directory_match() {
        let root = Path::new("/work");
        let keys = resolve_scope(&state(), root, Path::new("/work/B"), &[PathBuf::from(".")])
            .unwrap();
        assert_eq!(keys, vec![TopicKey::new("B", "OneTopic")]);

        let keys = resolve_scope(&state(), root, root, &[PathBuf::from("/work/A/")]).unwrap();
        assert_eq!(
            keys,
            vec![TopicKey::new("A", "OneTopic"), TopicKey::new("A", "Two.Parts")]
        );
    }

    #[test]
    fn test_overlapping_filters_deduplicated() {
        let root = Path::new("/work");
        let filters = vec![PathBuf::from("A"), PathBuf::from("A/OneTopic.wiki")];
        let keys = resolve_scope(&state(), root, root, &filters).unwrap();
        assert_eq!(keys.len(), 2);
    }

    #[test]
    fn test_outside_root_is_fatal() {
        let root = Path::new("/work");
        for outside in ["/elsewhere/A", "../A/OneTopic.wiki"] {
            let err = resolve_scope(&state(), root, root, &[PathBuf::from(outside)]).unwrap_err();
            assert!(matches!(
                err.downcast_ref::<SyncError>(),
                Some(SyncError::OutsideWorkingTree { .. })
            ));
        }
    }

    #[test]
    fn test_relative_root_taken_from_cwd() {
        let root = Path::new("work");
        let cwd = Path::new("/home/user");

        let keys = resolve_scope(&state(), root, cwd, &[PathBuf::from("work/A/OneTopic.wiki")])
            .unwrap();
        assert_eq!(keys, vec![TopicKey::new("A", "OneTopic")]);

        let keys =
            resolve_scope(&state(), root, cwd, &[PathBuf::from("/home/user/work/B")]).unwrap();
        assert_eq!(keys, vec![TopicKey::new("B", "OneTopic")]);

        let err = resolve_scope(&state(), root, cwd, &[PathBuf::from("other/A")]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SyncError>(),
            Some(SyncError::OutsideWorkingTree { .. })
        ));
    }

    #[test]
    fn test_base_dir_found_in_ancestor() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().to_path_buf();
        PersistentState::new("memory://test").save(&root).unwrap();
        let nested = root.join("A").join("deeper");
        fs::create_dir_all(&nested).unwrap();

        // A file in A/deeper starts at A/deeper, two levels below the root
        let file = nested.join("Topic.wiki");
        assert_eq!(calculate_base_dir_from(Path::new("/"), &[file]), normalize(&root));
        assert_eq!(calculate_base_dir_from(&nested, &[]), normalize(&root));
    }

    #[test]
    fn test_base_dir_search_is_bounded() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().to_path_buf();
        PersistentState::new("memory://test").save(&root).unwrap();
        let too_deep = root.join("a").join("b").join("c");
        fs::create_dir_all(&too_deep).unwrap();

        assert_eq!(calculate_base_dir_from(&too_deep, &[]), normalize(&too_deep));
    }
}
