//! Plan display

use colored::{ColoredString, Colorize};
use declarative::{Action, DiffSummary, PlanFor, ResourceChange};
use remotefile::{FileSpec, ManagedFile, Provider};

use crate::ui;

type FileChange = ResourceChange<FileSpec, ManagedFile>;

/// Display a plan in a user-friendly format
pub fn display_plan(plan: &PlanFor<Provider>) {
    let summary = DiffSummary::from_changes(&plan.changes);
    if !summary.has_changes() {
        println!();
        println!("  {} No changes needed", "✓".green());
        return;
    }

    println!();
    println!(
        "┌─ {} ─────────────────────────────────────────┐",
        "Execution Plan".bold()
    );
    println!("│");
    println!("│ {}", remotefile::RESOURCE_TYPE.bold());

    for change in plan.pending() {
        println!(
            "│   {} {:<24} {}",
            colored_symbol(change.action),
            change.name,
            describe_change(change).dimmed()
        );
        for attr in &change.attributes {
            let reason = if attr.force_new && change.action == Action::Replace {
                " (forces replacement)".red().to_string()
            } else {
                String::new()
            };
            println!(
                "│       {}: {} → {}{}",
                attr.name,
                quoted(&attr.from),
                quoted(&attr.to),
                reason
            );
        }
    }
    println!("│");

    println!("├─────────────────────────────────────────────────────┤");
    println!("│ {}", summary_line(&summary));
    println!("└─────────────────────────────────────────────────────┘");
}

fn colored_symbol(action: Action) -> ColoredString {
    let symbol = format!("{:>3}", action.symbol());
    match action {
        Action::Create => symbol.green(),
        Action::Update => symbol.yellow(),
        Action::Replace => symbol.magenta(),
        Action::Delete => symbol.red(),
        Action::NoOp => symbol.dimmed(),
    }
}

/// One-line description of a planned change
fn describe_change(change: &FileChange) -> String {
    match change.action {
        Action::Create => change
            .desired
            .as_ref()
            .map(|spec| format!("{} → {}", spec.url, ui::display_path(&spec.target_path)))
            .unwrap_or_default(),
        Action::Delete => change
            .current
            .as_ref()
            .map(|file| format!("(will remove {})", ui::display_path(&file.target_path)))
            .unwrap_or_else(|| "(will remove)".to_string()),
        Action::Update => "(re-download in place)".to_string(),
        Action::Replace => "(delete, then download again)".to_string(),
        Action::NoOp => String::new(),
    }
}

fn quoted(value: &str) -> String {
    if value.is_empty() {
        "(empty)".to_string()
    } else {
        format!("\"{}\"", value)
    }
}

/// Summary line in the usual "N to add" form
pub fn summary_line(summary: &DiffSummary) -> String {
    format!(
        "Plan: {} to add, {} to change, {} to replace, {} to destroy",
        summary.additions, summary.updates, summary.replacements, summary.removals
    )
}
