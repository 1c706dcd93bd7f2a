//! Execution engine - applies planned changes, serially or in parallel

use crate::context::{ApplyContext, ConfirmCallback, ProgressCallback};
use crate::diff::ResourceChange;
use crate::planner::{PlanFor, StateMap};
use crate::resource::Lifecycle;
use crate::types::{Action, ApplyResult, ExecuteOptions, ExecuteSummary};
use anyhow::{Result, anyhow};
use rayon::prelude::*;

/// Outcome of executing a plan
#[derive(Debug, Clone)]
pub struct ExecuteOutcome<S> {
    /// Counts per result kind
    pub summary: ExecuteSummary,
    /// State to record after execution
    pub states: StateMap<S>,
    /// Result per applied instance, in plan order
    pub results: Vec<(String, ApplyResult)>,
}

impl<S> ExecuteOutcome<S> {
    /// Instances whose change failed, with the error message
    pub fn failures(&self) -> impl Iterator<Item = (&str, &str)> {
        self.results.iter().filter_map(|(name, result)| match result {
            ApplyResult::Failed { error } => Some((name.as_str(), error.as_str())),
            _ => None,
        })
    }
}

/// How a finished change affects the recorded state
enum StateUpdate<S> {
    Keep,
    Set(S),
    Remove,
}

struct Applied<S> {
    result: ApplyResult,
    update: StateUpdate<S>,
}

impl<S> Applied<S> {
    fn failed(error: &anyhow::Error, update: StateUpdate<S>) -> Self {
        Self {
            result: ApplyResult::Failed {
                error: format!("{error:#}"),
            },
            update,
        }
    }
}

/// Execute a plan with the given options and callbacks
///
/// # Arguments
/// * `lifecycle` - The resource lifecycle the plan was built for
/// * `plan` - The execution plan to run
/// * `ctx` - Context shared by every operation (cancellation, deadline)
/// * `opts` - Execution options (dry_run, jobs)
/// * `progress` - Progress callback
/// * `confirm` - Confirmation callback
///
/// # Returns
/// Summary of execution results and the state to record
pub fn execute<L, P, C>(
    lifecycle: &L,
    plan: PlanFor<L>,
    ctx: &ApplyContext,
    opts: &ExecuteOptions,
    progress: &mut P,
    confirm: &mut C,
) -> Result<ExecuteOutcome<L::State>>
where
    L: Lifecycle,
    P: ProgressCallback,
    C: ConfirmCallback,
{
    let mut summary = ExecuteSummary::default();
    let mut states = plan.refreshed;
    let (pending, unchanged): (Vec<_>, Vec<_>) = plan
        .changes
        .into_iter()
        .partition(|c| c.action.is_change());
    summary.no_change = unchanged.len();

    if pending.is_empty() {
        return Ok(ExecuteOutcome {
            summary,
            states,
            results: Vec::new(),
        });
    }

    let dry_run = opts.dry_run || ctx.dry_run;

    // Confirm before proceeding (unless dry_run)
    if !dry_run && !confirm.confirm("Apply changes?")? {
        return Ok(skip_all(summary, states, &pending, "Declined"));
    }

    if dry_run {
        return Ok(skip_all(summary, states, &pending, "Dry run"));
    }

    // Time spent on the prompt does not count against the deadline
    let ctx = &ctx.restarted();

    progress.on_batch_start(pending.len());
    let applied = if opts.jobs <= 1 || pending.len() == 1 {
        let mut applied = Vec::with_capacity(pending.len());
        for change in &pending {
            progress.on_resource_start(&change.name, change.action);
            let outcome = apply_change(lifecycle, change, ctx);
            progress.on_resource_complete(&change.name, &outcome.result);
            applied.push(outcome);
        }
        applied
    } else {
        let applied = execute_parallel(lifecycle, &pending, ctx, opts.jobs)?;
        // The callback is not thread-safe, so report after the pool is done
        for (change, outcome) in pending.iter().zip(&applied) {
            progress.on_resource_complete(&change.name, &outcome.result);
        }
        applied
    };
    progress.on_batch_complete();

    let mut results = Vec::with_capacity(applied.len());
    for (change, outcome) in pending.into_iter().zip(applied) {
        summary.add_result(&outcome.result);
        match outcome.update {
            StateUpdate::Keep => {}
            StateUpdate::Set(state) => {
                states.insert(change.name.clone(), state);
            }
            StateUpdate::Remove => {
                states.remove(&change.name);
            }
        }
        results.push((change.name, outcome.result));
    }

    Ok(ExecuteOutcome {
        summary,
        states,
        results,
    })
}

/// Apply changes on a rayon pool, preserving plan order
fn execute_parallel<L: Lifecycle>(
    lifecycle: &L,
    pending: &[ResourceChange<L::Config, L::State>],
    ctx: &ApplyContext,
    jobs: usize,
) -> Result<Vec<Applied<L::State>>> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .map_err(|e| anyhow!("Failed to create thread pool: {}", e))?;

    Ok(pool.install(|| {
        pending
            .par_iter()
            .map(|change| apply_change(lifecycle, change, ctx))
            .collect()
    }))
}

fn skip_all<C, S>(
    mut summary: ExecuteSummary,
    states: StateMap<S>,
    pending: &[ResourceChange<C, S>],
    reason: &str,
) -> ExecuteOutcome<S> {
    let results = pending
        .iter()
        .map(|c| {
            let result = ApplyResult::Skipped {
                reason: reason.to_string(),
            };
            summary.add_result(&result);
            (c.name.clone(), result)
        })
        .collect();

    ExecuteOutcome {
        summary,
        states,
        results,
    }
}

/// Apply a single change
fn apply_change<L: Lifecycle>(
    lifecycle: &L,
    change: &ResourceChange<L::Config, L::State>,
    ctx: &ApplyContext,
) -> Applied<L::State> {
    let label = format!("{}.{}", lifecycle.resource_type(), change.name);
    if let Err(interrupted) = ctx.checkpoint() {
        log::warn!("{}: {} not started: {}", label, change.action, interrupted);
        return Applied::failed(&anyhow!(interrupted), StateUpdate::Keep);
    }
    log::debug!("{}: {}", label, change.action);

    let applied = match (change.action, &change.desired, &change.current) {
        (Action::NoOp, _, _) => Applied {
            result: ApplyResult::NoChange,
            update: StateUpdate::Keep,
        },
        (Action::Create, Some(config), _) => match lifecycle.create(ctx, config) {
            Ok(state) => settle(lifecycle, ApplyResult::Created, state),
            Err(e) => Applied::failed(&e, StateUpdate::Remove),
        },
        (Action::Update, Some(config), Some(current)) => {
            let prior = change.prior.as_ref().unwrap_or(current);
            match lifecycle.update(ctx, config, prior, current) {
                Ok(state) => settle(lifecycle, ApplyResult::Updated, state),
                Err(e) => Applied::failed(&e, StateUpdate::Keep),
            }
        }
        (Action::Replace, Some(config), Some(current)) => {
            match lifecycle.delete(ctx, current) {
                Err(e) => Applied::failed(&e, StateUpdate::Keep),
                // The old instance is gone; a failed create leaves it absent
                Ok(_) => match lifecycle.create(ctx, config) {
                    Ok(state) => settle(lifecycle, ApplyResult::Replaced, state),
                    Err(e) => Applied::failed(&e, StateUpdate::Remove),
                },
            }
        }
        (Action::Delete, _, Some(current)) => match lifecycle.delete(ctx, current) {
            Ok(_) => Applied {
                result: ApplyResult::Removed,
                update: StateUpdate::Remove,
            },
            Err(e) => Applied::failed(&e, StateUpdate::Keep),
        },
        (action, _, _) => Applied::failed(
            &anyhow!("{} planned without the state it needs", action),
            StateUpdate::Keep,
        ),
    };

    if let ApplyResult::Failed { error } = &applied.result {
        log::warn!("{}: {} failed: {}", label, change.action, error);
    }
    applied
}

/// Record the state an operation returned, unless it reports the
/// instance as gone
fn settle<L: Lifecycle>(lifecycle: &L, result: ApplyResult, state: L::State) -> Applied<L::State> {
    if lifecycle.exists(&state) {
        Applied {
            result,
            update: StateUpdate::Set(state),
        }
    } else {
        Applied {
            result,
            update: StateUpdate::Remove,
        }
    }
}
