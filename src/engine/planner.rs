//! Execution planner - loads config and state, then plans against them

use anyhow::Result;
use declarative::{ApplyContext, PlanFor, PlanOptions, build_plan};
use remotefile::{FileSpec, Provider};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::Context;
use crate::config::{TerraurlConfig, base_dir};
use crate::state::StateFile;

/// Everything one command needs: desired files, recorded state and the
/// provider to reconcile them with
pub struct Session {
    pub provider: Provider,
    pub desired: BTreeMap<String, FileSpec>,
    pub state: StateFile,
    pub state_path: PathBuf,
    pub options: PlanOptions,
    pub apply_ctx: ApplyContext,
}

impl Session {
    /// Load config and state for `ctx`
    pub fn open(ctx: &Context, dry_run: bool) -> Result<Self> {
        let config = TerraurlConfig::load(&ctx.config_path)?;
        let state = StateFile::load(&ctx.state_path)?;

        let mut apply_ctx = ApplyContext::new(dry_run).with_cancel_token(ctx.cancel.clone());
        if let Some(timeout) = ctx.timeout.or_else(|| config.timeout()) {
            log::debug!("Network deadline in {}s", timeout.as_secs());
            apply_ctx = apply_ctx.with_timeout(timeout);
        }

        Ok(Self {
            provider: Provider::new(config.provider_config()),
            desired: config.desired(&base_dir(&ctx.config_path)),
            state,
            state_path: ctx.state_path.clone(),
            options: config.plan_options(),
            apply_ctx,
        })
    }

    /// Refresh recorded state and plan against the desired files
    pub fn plan(&self, target: Option<&str>) -> Result<PlanFor<Provider>> {
        self.plan_against(&self.desired, target)
    }

    /// Refresh recorded state and plan the removal of everything
    pub fn plan_destroy(&self, target: Option<&str>) -> Result<PlanFor<Provider>> {
        self.plan_against(&BTreeMap::new(), target)
    }

    fn plan_against(
        &self,
        desired: &BTreeMap<String, FileSpec>,
        target: Option<&str>,
    ) -> Result<PlanFor<Provider>> {
        let plan = build_plan(
            &self.provider,
            &self.apply_ctx,
            desired,
            &self.state.resources,
            &self.options,
        )?;
        Ok(plan.filter_by_target(target))
    }
}
