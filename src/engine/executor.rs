//! Execution engine - terraurl-specific callbacks and result display

use anyhow::Result;
use colored::Colorize;
use declarative::{ConfirmCallback, ExecuteOutcome, ExecuteSummary};

use crate::ui;

/// Confirmation through a terminal prompt, skipped with `--yes`
pub struct PromptConfirm {
    pub assume_yes: bool,
}

impl ConfirmCallback for PromptConfirm {
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        if self.assume_yes {
            return Ok(true);
        }
        confirm_proceed(prompt)
    }
}

/// Confirm with user
fn confirm_proceed(prompt: &str) -> Result<bool> {
    use dialoguer::Confirm;

    println!();
    let confirmed = Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()?;

    Ok(confirmed)
}

/// Print per-resource failures
pub fn print_failures<S>(outcome: &ExecuteOutcome<S>) {
    for (name, error) in outcome.failures() {
        ui::error(&format!("{}.{}: {}", remotefile::RESOURCE_TYPE, name, error));
    }
}

/// Print execution summary
pub fn print_summary(summary: &ExecuteSummary) {
    println!();

    if summary.total_changes() == 0 && summary.failed == 0 && summary.skipped == 0 {
        println!("  {} Everything up to date", "✓".green());
        return;
    }

    let mut parts = Vec::new();
    if summary.created > 0 {
        parts.push(format!("{} created", summary.created).green().to_string());
    }
    if summary.updated > 0 {
        parts.push(format!("{} updated", summary.updated).yellow().to_string());
    }
    if summary.replaced > 0 {
        parts.push(format!("{} replaced", summary.replaced).magenta().to_string());
    }
    if summary.removed > 0 {
        parts.push(format!("{} removed", summary.removed).red().to_string());
    }
    if summary.skipped > 0 {
        parts.push(format!("{} skipped", summary.skipped).dimmed().to_string());
    }
    if summary.failed > 0 {
        parts.push(format!("{} failed", summary.failed).red().bold().to_string());
    }

    let symbol = if summary.is_success() {
        "✓".green()
    } else {
        "✗".red()
    };
    println!("  {} {}", symbol, parts.join(", "));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assume_yes_skips_prompt() {
        let mut confirm = PromptConfirm { assume_yes: true };
        assert!(confirm.confirm("Apply changes?").unwrap());
    }
}
