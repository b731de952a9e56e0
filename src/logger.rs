use anyhow::{Context, Result};
use log::LevelFilter;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::ConfigManager;

/// Size past which the operation log is moved aside
const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Initialize the console logger
///
/// The level comes from `RUST_LOG` when it is set, otherwise from
/// `default_level` (chosen by the CLI's `--verbose`/`--quiet` flags):
///
/// ```bash
/// # Show every per-topic decision
/// RUST_LOG=debug wiki-sync update
///
/// # Silence the console
/// RUST_LOG=off wiki-sync commit
/// ```
pub fn init_logger(default_level: LevelFilter) -> Result<()> {
    let level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|s| s.parse::<LevelFilter>().ok())
        .unwrap_or(default_level);

    env_logger::Builder::from_default_env()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{:5}] {}",
                chrono::Local::now().format("%H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter_level(level)
        .target(env_logger::Target::Stderr)
        .try_init()
        .ok(); // already initialized

    Ok(())
}

/// One finished (or failed) operation against a working tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationRecord<'a> {
    pub operation: &'a str,
    pub root: &'a Path,
    pub summary: String,
}

impl OperationRecord<'_> {
    /// `<utc time>\t<operation>\t<root>\t<summary>`
    fn to_line(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}",
            chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ"),
            self.operation,
            self.root.display(),
            self.summary.replace(['\t', '\n'], " ")
        )
    }
}

/// Append-only history of operations, one tab-separated line each.
///
/// The file is moved to `<name>.old` before a write once it has grown past
/// its size limit, so at most one older generation is kept.
#[derive(Debug, Clone)]
pub struct OperationLog {
    path: PathBuf,
    max_size: u64,
}

impl OperationLog {
    pub fn new(path: impl Into<PathBuf>, max_size: u64) -> Self {
        OperationLog {
            path: path.into(),
            max_size,
        }
    }

    /// `wiki-sync.log` in the config directory
    pub fn in_config_dir() -> Result<Self> {
        ConfigManager::ensure_config_dir()?;
        Ok(Self::new(ConfigManager::log_file_path()?, MAX_LOG_SIZE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn rotated_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".old");
        PathBuf::from(name)
    }

    /// Move the log aside if it is over the size limit. Returns whether it was.
    pub fn rotate_if_needed(&self) -> Result<bool> {
        let size = match fs::metadata(&self.path) {
            Ok(metadata) => metadata.len(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to inspect {}", self.path.display()))
            }
        };
        if size <= self.max_size {
            return Ok(false);
        }

        let rotated = self.rotated_path();
        fs::rename(&self.path, &rotated).with_context(|| {
            format!("Failed to rotate log file to {}", rotated.display())
        })?;
        log::info!("Operation log rotated to {}", rotated.display());
        Ok(true)
    }

    pub fn append(&self, record: &OperationRecord<'_>) -> Result<()> {
        self.rotate_if_needed()?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open log file: {}", self.path.display()))?;
        writeln!(file, "{}", record.to_line())
            .with_context(|| format!("Failed to write log file: {}", self.path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    fn record<'a>(operation: &'a str, root: &'a Path, summary: &str) -> OperationRecord<'a> {
        OperationRecord {
            operation,
            root,
            summary: summary.to_string(),
        }
    }

    #[test]
    fn test_init_logger_succeeds() {
        assert!(init_logger(LevelFilter::Warn).is_ok());
        // A second call is harmless
        assert!(init_logger(LevelFilter::Debug).is_ok());
    }

    #[test]
    fn test_append_writes_tab_separated_fields() {
        let temp = TempDir::new().unwrap();
        let log = OperationLog::new(temp.path().join("ops.log"), MAX_LOG_SIZE);
        let root = Path::new("/trees/docs");

        log.append(&record("update", root, "2 topic(s)")).unwrap();
        log.append(&record("commit", root, "failed:\tstale\nrevision")).unwrap();

        let contents = fs::read_to_string(log.path()).unwrap();
        let lines: Vec<Vec<&str>> = contents.lines().map(|l| l.split('\t').collect()).collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0][1..], ["update", "/trees/docs", "2 topic(s)"]);
        assert_eq!(lines[1][1..], ["commit", "/trees/docs", "failed: stale revision"]);
        assert!(lines[0][0].ends_with('Z'));
    }

    #[test]
    fn test_oversized_log_moved_aside_before_append() {
        let temp = TempDir::new().unwrap();
        let log = OperationLog::new(temp.path().join("ops.log"), 16);
        let root = Path::new("/trees/docs");

        assert!(!log.rotate_if_needed().unwrap());
        log.append(&record("init", root, "bound to file:///srv/wiki")).unwrap();
        log.append(&record("update", root, "0 topic(s)")).unwrap();

        let old = fs::read_to_string(temp.path().join("ops.log.old")).unwrap();
        assert!(old.contains("\tinit\t"));
        let current = fs::read_to_string(log.path()).unwrap();
        assert!(current.contains("\tupdate\t"));
        assert!(!current.contains("\tinit\t"));
    }

    #[test]
    #[serial]
    #[cfg(target_os = "linux")]
    fn test_log_lives_in_config_dir() {
        let temp = TempDir::new().unwrap();
        std::env::set_var("XDG_CONFIG_HOME", temp.path());

        let log = OperationLog::in_config_dir().unwrap();
        assert_eq!(log.path(), temp.path().join("wiki-sync").join("wiki-sync.log"));

        std::env::remove_var("XDG_CONFIG_HOME");
    }
}
