//! Content checksums for topic files.
//!
//! A checksum is the first eight bytes of the BLAKE3 digest of the file's
//! bytes, read as a little-endian `u64`. It depends on content only, never on
//! file metadata, and is stable across platforms and releases, which matters
//! because checksums are persisted in the state file.

use anyhow::{Context, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Checksum of an in-memory buffer.
pub fn of_bytes(bytes: &[u8]) -> u64 {
    let digest = blake3::hash(bytes);
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest.as_bytes()[..8]);
    u64::from_le_bytes(prefix)
}

/// Checksum of the file at `path`, or `None` if the file does not exist.
pub fn of_file(path: &Path) -> Result<Option<u64>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(of_bytes(&bytes))),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
    }
}
