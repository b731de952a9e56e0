//! Configuration command handlers
//!
//! Handles `wiki-sync config`: flag-driven updates, the current settings
//! listing, and an interactive menu when run with no flags on a terminal.

use anyhow::{Context, Result};
use colored::Colorize;
use inquire::{Confirm, MultiSelect, Select, Text};

use crate::config::{self, SyncConfig};
use crate::conflict::ResolutionStrategy;
use crate::interactive_conflict::is_interactive;

/// Handle `wiki-sync config`
pub fn handle_config(
    identity: Option<String>,
    default_resolution: Option<ResolutionStrategy>,
    show_up_to_date: Option<bool>,
    show: bool,
) -> Result<()> {
    let has_updates =
        identity.is_some() || default_resolution.is_some() || show_up_to_date.is_some();

    if has_updates {
        config::update_config(identity, default_resolution, show_up_to_date)
    } else if show || !is_interactive() {
        config::show_config()
    } else {
        handle_config_interactive()
    }
}

/// Handle interactive configuration menu
///
/// Shows all configuration options and allows user to select which ones to modify
pub fn handle_config_interactive() -> Result<()> {
    println!("{}", "Interactive Configuration".cyan().bold());
    println!("{}", "=".repeat(80).cyan());
    println!();

    let current_config = SyncConfig::load().context("Failed to load current configuration")?;

    println!("{}", "Current Settings:".bold());
    display_config_summary(&current_config);
    println!();

    let options = vec![
        "Commit identity",
        "Default conflict resolution",
        "Show up-to-date topics",
    ];

    let selections = MultiSelect::new(
        "Select settings to modify (Space to select, Enter to confirm):",
        options,
    )
    .with_help_message("Use arrow keys to navigate, Space to select/deselect, Enter when done")
    .prompt()
    .context("Failed to get user selections")?;

    if selections.is_empty() {
        println!("{}", "No settings selected. Configuration unchanged.".yellow());
        return Ok(());
    }

    println!();
    let mut modified_config = current_config.clone();

    for selection in selections {
        match selection {
            "Commit identity" => {
                let input = Text::new("Commit identity:")
                    .with_default(modified_config.identity.as_deref().unwrap_or(""))
                    .with_help_message("Leave empty to fall back to the login name")
                    .prompt()?;

                if input.trim().is_empty() {
                    modified_config.identity = None;
                    println!("  {} Unset identity", "✓".green());
                } else {
                    modified_config.identity = Some(input.trim().to_string());
                    println!("  {} Set identity to {}", "✓".green(), input.trim());
                }
            }

            "Default conflict resolution" => {
                let choice = Select::new(
                    "Resolution used when resolve runs without a terminal:",
                    vec!["ask", "local", "remote"],
                )
                .prompt()?;

                modified_config.default_resolution = match choice {
                    "local" => Some(ResolutionStrategy::Local),
                    "remote" => Some(ResolutionStrategy::Remote),
                    _ => None,
                };
                println!("  {} Set default resolution to {}", "✓".green(), choice);
            }

            "Show up-to-date topics" => {
                modified_config.show_up_to_date = Confirm::new("List up-to-date topics in status?")
                    .with_default(modified_config.show_up_to_date)
                    .prompt()?;
                println!("  {} Updated status listing", "✓".green());
            }

            _ => {}
        }
    }

    println!();
    println!("{}", "New Configuration:".cyan().bold());
    display_config_summary(&modified_config);
    println!();

    let confirm = Confirm::new("Save this configuration?")
        .with_default(true)
        .prompt()?;

    if confirm {
        modified_config.save().context("Failed to save configuration")?;
        println!("\n{} Configuration saved successfully!", "✓".green().bold());
    } else {
        println!("\n{}", "Configuration not saved.".yellow());
    }

    Ok(())
}

fn display_config_summary(config: &SyncConfig) {
    println!(
        "  {} {}",
        "Identity:".cyan(),
        config
            .identity
            .clone()
            .unwrap_or_else(|| "Not set".dimmed().to_string())
    );

    println!(
        "  {} {}",
        "Default resolution:".cyan(),
        config
            .default_resolution
            .map(|s| s.as_str().to_string())
            .unwrap_or_else(|| "ask".dimmed().to_string())
    );

    println!(
        "  {} {}",
        "Show up-to-date topics:".cyan(),
        if config.show_up_to_date {
            "Yes".green().to_string()
        } else {
            "No".yellow().to_string()
        }
    );
}
