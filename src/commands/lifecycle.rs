//! Lifecycle commands
//!
//! - `plan` - Refresh and show what apply would change
//! - `apply` - Make local files match the configuration
//! - `refresh` - Record reality without changing files
//! - `destroy` - Remove managed files
//! - `show` - Print recorded state

use anyhow::{Result, bail};
use colored::Colorize;
use declarative::{ExecuteOptions, PlanFor, execute, refresh as refresh_states};
use remotefile::{ManagedFile, Provider};

use crate::Context;
use crate::cli::{ApplyArgs, DestroyArgs, PlanArgs, ShowArgs};
use crate::engine::Session;
use crate::engine::differ::display_plan;
use crate::engine::executor::{PromptConfirm, print_failures, print_summary};
use crate::progress::BarProgress;
use crate::state::StateFile;
use crate::ui;

// ============================================================================
// Plan
// ============================================================================

pub fn plan(ctx: &Context, args: PlanArgs) -> Result<()> {
    let session = Session::open(ctx, true)?;
    let plan = session.plan(args.target.as_deref())?;
    check_target(&plan, args.target.as_deref());

    display_plan(&plan);
    Ok(())
}

// ============================================================================
// Apply / Destroy
// ============================================================================

pub fn apply(ctx: &Context, args: ApplyArgs) -> Result<()> {
    let mut session = Session::open(ctx, args.dry_run)?;
    let plan = session.plan(args.target.as_deref())?;
    check_target(&plan, args.target.as_deref());

    let opts = ExecuteOptions {
        dry_run: args.dry_run,
        jobs: args.jobs.max(1),
    };
    run_plan(ctx, &mut session, plan, &opts, args.yes)
}

pub fn destroy(ctx: &Context, args: DestroyArgs) -> Result<()> {
    let mut session = Session::open(ctx, args.dry_run)?;
    let plan = session.plan_destroy(args.target.as_deref())?;
    check_target(&plan, args.target.as_deref());

    let opts = ExecuteOptions {
        dry_run: args.dry_run,
        ..Default::default()
    };
    run_plan(ctx, &mut session, plan, &opts, args.yes)
}

fn run_plan(
    ctx: &Context,
    session: &mut Session,
    plan: PlanFor<Provider>,
    opts: &ExecuteOptions,
    yes: bool,
) -> Result<()> {
    if !ctx.quiet {
        display_plan(&plan);
    }

    let mut progress = BarProgress::new(!ctx.quiet);
    let mut confirm = PromptConfirm { assume_yes: yes };
    let outcome = execute(
        &session.provider,
        plan,
        &session.apply_ctx,
        opts,
        &mut progress,
        &mut confirm,
    )?;

    if opts.dry_run {
        println!();
        println!("  {} Dry run - no changes made", "ℹ".blue());
        return Ok(());
    }

    // Refreshed state is recorded even when nothing changed
    session.state.set_resources(outcome.states.clone());
    session.state.save(&session.state_path)?;

    print_failures(&outcome);
    if !ctx.quiet {
        print_summary(&outcome.summary);
    }

    if !outcome.summary.is_success() {
        bail!("{} change(s) failed", outcome.summary.failed);
    }
    Ok(())
}

fn check_target(plan: &PlanFor<Provider>, target: Option<&str>) {
    if let Some(name) = target
        && plan.changes.is_empty()
    {
        ui::warn(&format!("No resource named '{}'", name));
    }
}

// ============================================================================
// Refresh
// ============================================================================

pub fn refresh(ctx: &Context) -> Result<()> {
    let mut session = Session::open(ctx, false)?;
    let prior = session.state.resources.clone();
    let refreshed = refresh_states(&session.provider, &session.apply_ctx, &prior)?;

    for (name, before) in &prior {
        match refreshed.get(name) {
            None => ui::warn(&format!(
                "{} is gone, it will be recreated on the next apply",
                name
            )),
            Some(after) => {
                let changed = before.changed_attributes(after);
                if changed.is_empty() {
                    log::info!("{} unchanged", name);
                } else if !ctx.quiet {
                    ui::info(&format!("{} drifted: {}", name, changed.join(", ")));
                }
            }
        }
    }

    session.state.set_resources(refreshed);
    session.state.save(&session.state_path)?;
    if !ctx.quiet {
        ui::success(&format!(
            "Refreshed {} resource(s), state serial {}",
            prior.len(),
            session.state.serial
        ));
    }
    Ok(())
}

// ============================================================================
// Show
// ============================================================================

pub fn show(ctx: &Context, args: ShowArgs) -> Result<()> {
    let state = StateFile::load(&ctx.state_path)?;

    let resources: Vec<(&String, &ManagedFile)> = state
        .resources
        .iter()
        .filter(|(name, _)| args.name.as_deref().is_none_or(|n| n == name.as_str()))
        .collect();

    if let Some(name) = &args.name
        && resources.is_empty()
    {
        bail!("No resource named '{}' in {}", name, ctx.state_path.display());
    }

    if args.json {
        let map: std::collections::BTreeMap<_, _> = resources.into_iter().collect();
        println!("{}", serde_json::to_string_pretty(&map)?);
        return Ok(());
    }

    if resources.is_empty() {
        ui::info("No resources recorded");
        ui::dim(&format!("state: {}", ui::display_path(&ctx.state_path)));
        return Ok(());
    }

    for (name, file) in resources {
        ui::header(&format!("{}.{}", remotefile::RESOURCE_TYPE, name));
        ui::kv("id", &file.id);
        ui::kv("url", &file.url);
        ui::kv("target_path", &ui::display_path(&file.target_path));
        ui::kv(
            "size",
            &format!("{} ({} bytes)", ui::format_size(file.size), file.size),
        );
        let last_modified = if file.last_modified.is_empty() {
            "(not reported)"
        } else {
            file.last_modified.as_str()
        };
        ui::kv("last_modified", last_modified);
    }

    println!();
    ui::dim(&format!(
        "serial {}, updated {}",
        state.serial,
        state.last_updated.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    Ok(())
}
