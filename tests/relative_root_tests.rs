//! A working tree opened through a relative path
//!
//! Kept in its own test binary since it changes the process working directory.
use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use wiki_sync::remote::MemoryRemote;
use wiki_sync::sync::{Synchronizer, TopicKey, TopicStatus};

#[test]
fn test_scoped_update_with_relative_root() {
    let parent = TempDir::new().unwrap();
    fs::create_dir(parent.path().join("work")).unwrap();
    std::env::set_current_dir(parent.path()).unwrap();

    let mut remote = MemoryRemote::new("memory://wiki");
    remote.put_revision("A", "One", "V1", "one\n");
    remote.put_revision("A", "Two", "V1", "two\n");

    let mut sync = Synchronizer::open(Path::new("work"), remote).unwrap();
    assert!(sync.root().is_absolute());

    let events = sync.update(&[PathBuf::from("work/A/One.wiki")]).unwrap();
    assert_eq!(events.len(), 1);

    let one = TopicKey::new("A", "One");
    let two = TopicKey::new("A", "Two");
    assert_eq!(sync.status(&one).unwrap(), TopicStatus::UpToDate);
    assert_eq!(sync.status(&two).unwrap(), TopicStatus::NoLocalFile);
    assert_eq!(
        fs::read_to_string(parent.path().join("work").join("A").join("One.wiki")).unwrap(),
        "one\n"
    );
}
