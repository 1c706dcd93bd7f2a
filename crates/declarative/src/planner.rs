//! Execution planner - refreshes recorded state and decides what to do

use crate::context::ApplyContext;
use crate::diff::ResourceChange;
use crate::resource::{AttributeChange, Lifecycle};
use crate::types::{Action, PlanOptions};
use anyhow::{Context, Result, bail};
use std::collections::{BTreeMap, HashMap};

/// Recorded states keyed by instance name
pub type StateMap<S> = BTreeMap<String, S>;

/// An execution plan: the refreshed state plus one change per instance
#[derive(Debug, Clone)]
pub struct ExecutionPlan<C, S> {
    /// Refreshed state of every instance that still exists
    pub refreshed: StateMap<S>,
    /// Planned changes, desired instances first, then orphans
    pub changes: Vec<ResourceChange<C, S>>,
}

/// Plan type for a given lifecycle
pub type PlanFor<L> = ExecutionPlan<<L as Lifecycle>::Config, <L as Lifecycle>::State>;

impl<C, S> ExecutionPlan<C, S> {
    /// Changes that actually touch resources
    pub fn pending(&self) -> impl Iterator<Item = &ResourceChange<C, S>> {
        self.changes.iter().filter(|c| c.action.is_change())
    }

    /// Check if applying the plan would change anything
    pub fn has_changes(&self) -> bool {
        self.pending().next().is_some()
    }

    /// Total number of planned entries, unchanged ones included
    pub fn total_resources(&self) -> usize {
        self.changes.len()
    }

    /// Keep only changes for the named instance
    pub fn filter_by_target(self, target: Option<&str>) -> Self {
        match target {
            None => self,
            Some(name) => Self {
                refreshed: self.refreshed,
                changes: self
                    .changes
                    .into_iter()
                    .filter(|c| c.name == name)
                    .collect(),
            },
        }
    }
}

/// Refresh every recorded instance
///
/// Instances whose refreshed state no longer exists are dropped from the
/// result. Any read failure aborts the refresh.
pub fn refresh<L: Lifecycle>(
    lifecycle: &L,
    ctx: &ApplyContext,
    prior: &StateMap<L::State>,
) -> Result<StateMap<L::State>> {
    let mut refreshed = StateMap::new();

    for (name, state) in prior {
        ctx.checkpoint()?;
        let current = lifecycle
            .read(ctx, state)
            .with_context(|| format!("Failed to refresh {}.{}", lifecycle.resource_type(), name))?;

        if lifecycle.exists(&current) {
            refreshed.insert(name.clone(), current);
        } else {
            log::info!(
                "{}.{} no longer exists, dropping it from state",
                lifecycle.resource_type(),
                name
            );
        }
    }

    Ok(refreshed)
}

/// Refresh recorded state, then plan changes against the desired set
pub fn build_plan<L: Lifecycle>(
    lifecycle: &L,
    ctx: &ApplyContext,
    desired: &BTreeMap<String, L::Config>,
    prior: &StateMap<L::State>,
    options: &PlanOptions,
) -> Result<PlanFor<L>> {
    check_conflicts(lifecycle, desired)?;
    let refreshed = refresh(lifecycle, ctx, prior)?;
    Ok(plan_changes(lifecycle, desired, prior, refreshed, options))
}

/// Plan changes from already refreshed state
pub fn plan_changes<L: Lifecycle>(
    lifecycle: &L,
    desired: &BTreeMap<String, L::Config>,
    prior: &StateMap<L::State>,
    refreshed: StateMap<L::State>,
    options: &PlanOptions,
) -> PlanFor<L> {
    let mut changes = Vec::with_capacity(desired.len());

    for (name, config) in desired {
        let change = match refreshed.get(name) {
            None => ResourceChange {
                name: name.clone(),
                action: Action::Create,
                desired: Some(config.clone()),
                prior: prior.get(name).cloned(),
                current: None,
                attributes: Vec::new(),
            },
            Some(current) => {
                let recorded = prior.get(name).unwrap_or(current);
                let attributes = lifecycle.diff(config, recorded, current);
                ResourceChange {
                    name: name.clone(),
                    action: classify(&attributes, options),
                    desired: Some(config.clone()),
                    prior: Some(recorded.clone()),
                    current: Some(current.clone()),
                    attributes,
                }
            }
        };
        log::debug!("{}.{}: {}", lifecycle.resource_type(), name, change.action);
        changes.push(change);
    }

    for (name, current) in &refreshed {
        if desired.contains_key(name) {
            continue;
        }
        log::debug!("{}.{}: delete", lifecycle.resource_type(), name);
        changes.push(ResourceChange {
            name: name.clone(),
            action: Action::Delete,
            desired: None,
            prior: prior.get(name).cloned(),
            current: Some(current.clone()),
            attributes: Vec::new(),
        });
    }

    ExecutionPlan { refreshed, changes }
}

/// Pick the action for an instance that exists
fn classify(attributes: &[AttributeChange], options: &PlanOptions) -> Action {
    if attributes.is_empty() {
        Action::NoOp
    } else if attributes.iter().any(|a| a.force_new) && !options.replace_in_place {
        Action::Replace
    } else {
        Action::Update
    }
}

/// Refuse desired sets where two instances write to the same place
fn check_conflicts<L: Lifecycle>(
    lifecycle: &L,
    desired: &BTreeMap<String, L::Config>,
) -> Result<()> {
    let mut seen: HashMap<String, &str> = HashMap::new();

    for (name, config) in desired {
        let Some(key) = lifecycle.conflict_key(config) else {
            continue;
        };
        if let Some(other) = seen.get(&key) {
            bail!(
                "{}.{} and {}.{} both manage {}",
                lifecycle.resource_type(),
                other,
                lifecycle.resource_type(),
                name,
                key
            );
        }
        seen.insert(key, name);
    }

    Ok(())
}
