//! Conflict resolution handler

use anyhow::{anyhow, Result};
use colored::Colorize;
use std::path::PathBuf;

use crate::config::SyncConfig;
use crate::conflict::{ConflictResolver, ResolutionStrategy};
use crate::interactive_conflict::{is_interactive, InteractiveResolver};
use crate::VerbosityLevel;

/// Pick the resolver for a run: an explicit strategy, then the interactive
/// prompt on a terminal, then the configured default.
pub fn choose_resolver(
    explicit: Option<ResolutionStrategy>,
    interactive: bool,
    config: &SyncConfig,
) -> Result<Box<dyn ConflictResolver>> {
    if let Some(strategy) = explicit {
        return Ok(Box::new(strategy));
    }
    if interactive {
        return Ok(Box::new(InteractiveResolver::new()));
    }
    config
        .default_resolution
        .map(|strategy| Box::new(strategy) as Box<dyn ConflictResolver>)
        .ok_or_else(|| {
            anyhow!(
                "No terminal to prompt on. Pass --keep-local or --keep-remote, \
                 or set a default with 'wiki-sync config --default-resolution'"
            )
        })
}

/// Handle `wiki-sync resolve`
pub fn handle_resolve(
    paths: &[PathBuf],
    strategy: Option<ResolutionStrategy>,
    verbosity: VerbosityLevel,
) -> Result<()> {
    let config = SyncConfig::load()?;
    let mut resolver = choose_resolver(strategy, is_interactive(), &config)?;
    let mut sync = super::open_working_tree(paths, verbosity)?;

    let outcome = sync.resolve(resolver.as_mut(), paths)?;

    if verbosity != VerbosityLevel::Quiet {
        if outcome.total() == 0 {
            println!("{}", "No conflicts to resolve".green());
        } else {
            for key in &outcome.resolved {
                println!("  {} {}", "Resolved".green(), key);
            }
            for key in &outcome.declined {
                println!("  {} {}", "Still in conflict".yellow(), key);
            }
            if !outcome.resolved.is_empty() {
                println!(
                    "{} Run {} to publish the resolved topics",
                    "→".cyan(),
                    "wiki-sync commit".bold()
                );
            }
        }
    }

    super::record(
        "resolve",
        sync.root(),
        format!(
            "{} resolved, {} declined",
            outcome.resolved.len(),
            outcome.declined.len()
        ),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolver_requires_a_policy_without_terminal() {
        let config = SyncConfig::default();
        assert!(choose_resolver(None, false, &config).is_err());
        assert!(choose_resolver(Some(ResolutionStrategy::Local), false, &config).is_ok());
    }

    #[test]
    fn test_configured_default_is_used_without_terminal() {
        let config = SyncConfig {
            default_resolution: Some(ResolutionStrategy::Remote),
            ..Default::default()
        };
        assert!(choose_resolver(None, false, &config).is_ok());
    }
}
