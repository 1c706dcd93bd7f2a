//! Progress indicators for terraurl CLI.

use colored::Colorize;
use declarative::{Action, ApplyResult, ProgressCallback};
use indicatif::{ProgressBar, ProgressStyle};

use crate::ui;

/// Progress bar over the changes of one apply
pub struct BarProgress {
    enabled: bool,
    bar: Option<ProgressBar>,
}

impl BarProgress {
    /// Create a progress reporter; a disabled one prints nothing
    pub fn new(enabled: bool) -> Self {
        Self { enabled, bar: None }
    }
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=>-")
}

impl ProgressCallback for BarProgress {
    fn on_batch_start(&mut self, count: usize) {
        if !self.enabled {
            return;
        }
        let bar = ProgressBar::new(count as u64);
        bar.set_style(bar_style());
        self.bar = Some(bar);
    }

    fn on_resource_start(&mut self, name: &str, action: Action) {
        if let Some(bar) = &self.bar {
            bar.set_message(format!("{} {}", action, ui::truncate_path(name, 30)));
        }
    }

    fn on_resource_complete(&mut self, name: &str, result: &ApplyResult) {
        let Some(bar) = &self.bar else {
            return;
        };
        let symbol = match result {
            ApplyResult::NoChange => "○".dimmed(),
            ApplyResult::Failed { .. } => "✗".red(),
            ApplyResult::Skipped { .. } => "⊘".dimmed(),
            _ => "✓".green(),
        };
        bar.suspend(|| println!("  {} {} ({})", symbol, name, describe(result)));
        bar.inc(1);
    }

    fn on_batch_complete(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

fn describe(result: &ApplyResult) -> &'static str {
    match result {
        ApplyResult::NoChange => "unchanged",
        ApplyResult::Created => "created",
        ApplyResult::Updated => "updated",
        ApplyResult::Replaced => "replaced",
        ApplyResult::Removed => "removed",
        ApplyResult::Failed { .. } => "failed",
        ApplyResult::Skipped { .. } => "skipped",
    }
}
