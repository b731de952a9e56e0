use anyhow::{Context, Result};
use colored::Colorize;
use inquire::Select;

use crate::conflict::{ConflictResolver, ConflictingTopic};

/// Resolution action chosen by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionAction {
    /// Keep the working tree content and publish it on the next commit
    KeepLocal,
    /// Overwrite the working tree with the remote content
    KeepRemote,
    /// Leave the topic in conflict
    Skip,
    /// Compare both versions (does not resolve the conflict)
    ViewDetails,
}

impl std::fmt::Display for ResolutionAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolutionAction::KeepLocal => write!(f, "Keep Local Version (discard remote)"),
            ResolutionAction::KeepRemote => write!(f, "Keep Remote Version (overwrite local)"),
            ResolutionAction::Skip => write!(f, "Skip (leave in conflict)"),
            ResolutionAction::ViewDetails => write!(f, "View Detailed Comparison"),
        }
    }
}

/// Check if we're running in an interactive terminal
pub fn is_interactive() -> bool {
    atty::is(atty::Stream::Stdin) && atty::is(atty::Stream::Stdout)
}

/// Prompts on the terminal for each conflicting topic.
#[derive(Debug, Default)]
pub struct InteractiveResolver {
    seen: usize,
}

impl InteractiveResolver {
    pub fn new() -> Self {
        Self::default()
    }

    fn choose(
        &self,
        conflict: &ConflictingTopic<'_>,
        local: &str,
        remote: &str,
    ) -> Result<ResolutionAction> {
        loop {
            println!(
                "\n{} Conflict {}: {}",
                ">>>".yellow().bold(),
                self.seen.to_string().cyan(),
                conflict.key.to_string().cyan()
            );

            let options = vec![
                ResolutionAction::KeepLocal,
                ResolutionAction::KeepRemote,
                ResolutionAction::Skip,
                ResolutionAction::ViewDetails,
            ];

            let action = Select::new("How would you like to resolve this conflict?", options)
                .with_help_message("Use arrow keys to navigate, Enter to select")
                .prompt()
                .context("Failed to get resolution action")?;

            match action {
                ResolutionAction::ViewDetails => {
                    display_conflict_details(conflict, local, remote);
                    continue;
                }
                _ => return Ok(action),
            }
        }
    }
}

impl ConflictResolver for InteractiveResolver {
    fn resolve(
        &mut self,
        conflict: &ConflictingTopic<'_>,
        remote_text: &str,
    ) -> Result<Option<String>> {
        self.seen += 1;
        let local_text = conflict.local_text()?;

        let merged = match self.choose(conflict, &local_text, remote_text)? {
            ResolutionAction::KeepLocal => {
                println!("  {} Keeping local version", "✓".green());
                Some(local_text)
            }
            ResolutionAction::KeepRemote => {
                println!("  {} Keeping remote version (overwrites local)", "✓".yellow());
                Some(remote_text.to_string())
            }
            ResolutionAction::Skip | ResolutionAction::ViewDetails => {
                println!("  {} Left in conflict", "-".dimmed());
                None
            }
        };
        Ok(merged)
    }
}

/// Line-level differences between two texts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineComparison {
    pub local_lines: usize,
    pub remote_lines: usize,
    /// Index of the first line that differs, if any
    pub first_difference: Option<usize>,
}

pub fn compare_lines(local: &str, remote: &str) -> LineComparison {
    let local_lines: Vec<&str> = local.lines().collect();
    let remote_lines: Vec<&str> = remote.lines().collect();

    let first_difference = local_lines
        .iter()
        .zip(remote_lines.iter())
        .position(|(l, r)| l != r)
        .or_else(|| {
            (local_lines.len() != remote_lines.len())
                .then(|| local_lines.len().min(remote_lines.len()))
        });

    LineComparison {
        local_lines: local_lines.len(),
        remote_lines: remote_lines.len(),
        first_difference,
    }
}

fn display_conflict_details(conflict: &ConflictingTopic<'_>, local: &str, remote: &str) {
    println!("\n{}", "=".repeat(80).cyan());
    println!("{}", "Conflict Details".bold().cyan());
    println!("{}", "=".repeat(80).cyan());

    println!("\n{} {}", "Topic:".bold(), conflict.key.to_string().cyan());
    println!(
        "{} {}",
        "Based on:".bold(),
        conflict
            .topic
            .based_on_repository_version
            .as_ref()
            .map(|r| r.to_string())
            .unwrap_or_else(|| "-".to_string())
            .dimmed()
    );

    let comparison = compare_lines(local, remote);

    println!(
        "\n{} {}",
        "Local File:".bold().green(),
        conflict.path.display()
    );
    println!("  {} lines", comparison.local_lines.to_string().green());

    println!(
        "\n{} {}",
        "Remote Revision:".bold().yellow(),
        conflict.remote_version
    );
    println!("  {} lines", comparison.remote_lines.to_string().yellow());

    match comparison.first_difference {
        Some(line) => {
            println!("\n{} First difference at line {}", "→".cyan(), line + 1);
            let local_line = local.lines().nth(line).unwrap_or("");
            let remote_line = remote.lines().nth(line).unwrap_or("");
            println!("  {} {}", "local: ".green(), local_line);
            println!("  {} {}", "remote:".yellow(), remote_line);
        }
        None => println!(
            "\n{} Line content is identical, only line endings differ",
            "→".cyan()
        ),
    }

    println!("{}", "=".repeat(80).cyan());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_resolution_action() {
        assert_eq!(
            ResolutionAction::KeepLocal.to_string(),
            "Keep Local Version (discard remote)"
        );
        assert_eq!(
            ResolutionAction::KeepRemote.to_string(),
            "Keep Remote Version (overwrite local)"
        );
        assert_eq!(ResolutionAction::Skip.to_string(), "Skip (leave in conflict)");
    }

    #[test]
    fn test_compare_lines_finds_first_difference() {
        let comparison = compare_lines("a\nb\nc", "a\nx\nc\nd");
        assert_eq!(comparison.local_lines, 3);
        assert_eq!(comparison.remote_lines, 4);
        assert_eq!(comparison.first_difference, Some(1));
    }

    #[test]
    fn test_compare_lines_appended_line() {
        let comparison = compare_lines("a\nb", "a\nb\nc");
        assert_eq!(comparison.first_difference, Some(2));
    }

    #[test]
    fn test_compare_lines_identical() {
        assert_eq!(compare_lines("a\nb\n", "a\nb").first_difference, None);
    }
}
