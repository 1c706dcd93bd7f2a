//! Planned changes and diff statistics

use crate::resource::AttributeChange;
use crate::types::Action;
use serde::{Deserialize, Serialize};

/// One planned change for a named resource instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceChange<C, S> {
    /// Instance name from the configuration
    pub name: String,
    /// What the executor will do
    pub action: Action,
    /// Desired configuration (absent for deletes)
    pub desired: Option<C>,
    /// State recorded before the refresh
    pub prior: Option<S>,
    /// Refreshed state (absent when the instance does not exist)
    pub current: Option<S>,
    /// Attributes behind an update or replace
    pub attributes: Vec<AttributeChange>,
}

impl<C, S> ResourceChange<C, S> {
    /// Attributes that force a replacement
    pub fn forcing_attributes(&self) -> impl Iterator<Item = &AttributeChange> {
        self.attributes.iter().filter(|a| a.force_new)
    }

    /// Check if this change represents an addition
    pub fn is_addition(&self) -> bool {
        self.action == Action::Create
    }

    /// Check if this change represents a removal
    pub fn is_removal(&self) -> bool {
        self.action == Action::Delete
    }
}

/// Diff summary statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffSummary {
    pub additions: usize,
    pub updates: usize,
    pub replacements: usize,
    pub removals: usize,
    pub unchanged: usize,
}

impl DiffSummary {
    /// Create a summary from a list of changes
    pub fn from_changes<C, S>(changes: &[ResourceChange<C, S>]) -> Self {
        let mut summary = Self::default();
        for change in changes {
            match change.action {
                Action::NoOp => summary.unchanged += 1,
                Action::Create => summary.additions += 1,
                Action::Update => summary.updates += 1,
                Action::Replace => summary.replacements += 1,
                Action::Delete => summary.removals += 1,
            }
        }
        summary
    }

    /// Total number of changes
    pub fn total(&self) -> usize {
        self.additions + self.updates + self.replacements + self.removals
    }

    /// Check if there are any changes
    pub fn has_changes(&self) -> bool {
        self.total() > 0
    }
}
