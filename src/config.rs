use anyhow::{Context, Result};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::conflict::ResolutionStrategy;

const APP_DIR: &str = "wiki-sync";

/// Cross-platform configuration directory manager
pub struct ConfigManager;

impl ConfigManager {
    /// Get the main configuration directory path following platform conventions:
    /// - Linux: $XDG_CONFIG_HOME/wiki-sync or ~/.config/wiki-sync
    /// - macOS: ~/Library/Application Support/wiki-sync
    /// - Windows: %APPDATA%\wiki-sync
    pub fn config_dir() -> Result<PathBuf> {
        #[cfg(target_os = "linux")]
        {
            // Follow XDG Base Directory Specification
            if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
                Ok(PathBuf::from(xdg_config).join(APP_DIR))
            } else {
                let home = dirs::home_dir().context("Failed to get home directory")?;
                Ok(home.join(".config").join(APP_DIR))
            }
        }

        #[cfg(target_os = "macos")]
        {
            let home = dirs::home_dir().context("Failed to get home directory")?;
            Ok(home.join("Library").join("Application Support").join(APP_DIR))
        }

        #[cfg(target_os = "windows")]
        {
            Ok(dirs::config_dir()
                .context("Failed to get Windows config directory")?
                .join(APP_DIR))
        }

        #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
        {
            let home = dirs::home_dir().context("Failed to get home directory")?;
            Ok(home.join(".wiki-sync"))
        }
    }

    /// Get the user config file path (config.toml)
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Get the log file path
    pub fn log_file_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("wiki-sync.log"))
    }

    /// Ensure the configuration directory exists
    pub fn ensure_config_dir() -> Result<PathBuf> {
        let config_dir = Self::config_dir()?;
        fs::create_dir_all(&config_dir).with_context(|| {
            format!("Failed to create config directory: {}", config_dir.display())
        })?;
        Ok(config_dir)
    }
}

/// User preferences for the command-line client
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Author recorded on commits when `--author` is not given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,

    /// Policy used by `resolve` when no terminal is attached
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_resolution: Option<ResolutionStrategy>,

    /// List up-to-date topics in `status`
    #[serde(default)]
    pub show_up_to_date: bool,
}

impl SyncConfig {
    /// Load configuration from file, defaults if there is none
    pub fn load() -> Result<Self> {
        let config_path = ConfigManager::config_file_path()?;

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))
    }

    pub fn save(&self) -> Result<()> {
        ConfigManager::ensure_config_dir()?;
        let config_path = ConfigManager::config_file_path()?;

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        Ok(())
    }

    /// Commit author: explicit value, then the configured identity, then the
    /// login name from the environment.
    pub fn identity_or(&self, explicit: Option<&str>) -> String {
        explicit
            .map(str::to_string)
            .or_else(|| self.identity.clone())
            .or_else(|| std::env::var("USER").ok())
            .or_else(|| std::env::var("USERNAME").ok())
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| "anonymous".to_string())
    }
}

/// Update configuration settings
pub fn update_config(
    identity: Option<String>,
    default_resolution: Option<ResolutionStrategy>,
    show_up_to_date: Option<bool>,
) -> Result<()> {
    let mut config = SyncConfig::load()?;

    if let Some(identity) = identity {
        config.identity = Some(identity);
    }
    if let Some(strategy) = default_resolution {
        config.default_resolution = Some(strategy);
    }
    if let Some(show) = show_up_to_date {
        config.show_up_to_date = show;
    }

    config.save()?;
    println!("{}", "Configuration updated".green());
    show_config()
}

/// Display current configuration
pub fn show_config() -> Result<()> {
    let config = SyncConfig::load()?;

    println!("{}", "Current configuration:".bold());
    println!("  File: {}", ConfigManager::config_file_path()?.display());
    println!(
        "  Identity: {}",
        config
            .identity
            .as_deref()
            .map(|s| s.cyan().to_string())
            .unwrap_or_else(|| format!("{} ({})", "not set".dimmed(), config.identity_or(None)))
    );
    println!(
        "  Default resolution: {}",
        config
            .default_resolution
            .map(|s| s.as_str().cyan().to_string())
            .unwrap_or_else(|| "ask".dimmed().to_string())
    );
    println!("  Show up-to-date topics: {}", config.show_up_to_date);

    Ok(())
}
