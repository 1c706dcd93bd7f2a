//! `remote_file` as a declarative resource.

use crate::error::Error;
use crate::provider::Provider;
use crate::types::{FileSpec, ManagedFile, RESOURCE_TYPE, attr};
use anyhow::Result;
use declarative::{ApplyContext, AttributeChange, Lifecycle};

impl Lifecycle for Provider {
    type Config = FileSpec;
    type State = ManagedFile;

    fn resource_type(&self) -> &'static str {
        RESOURCE_TYPE
    }

    fn exists(&self, state: &ManagedFile) -> bool {
        state.exists()
    }

    fn create(&self, ctx: &ApplyContext, config: &FileSpec) -> Result<ManagedFile> {
        Provider::create(self, ctx, config).map_err(categorized)
    }

    fn read(&self, ctx: &ApplyContext, state: &ManagedFile) -> Result<ManagedFile> {
        Provider::read(self, ctx, state).map_err(categorized)
    }

    fn update(
        &self,
        ctx: &ApplyContext,
        config: &FileSpec,
        prior: &ManagedFile,
        current: &ManagedFile,
    ) -> Result<ManagedFile> {
        let planned = current.with_spec(config);
        Provider::update(self, ctx, &planned, prior).map_err(categorized)
    }

    fn delete(&self, ctx: &ApplyContext, state: &ManagedFile) -> Result<ManagedFile> {
        Provider::delete(self, ctx, state).map_err(categorized)
    }

    /// Every attribute forces replacement. User-supplied attributes are
    /// compared with the recorded state, computed ones with the refresh.
    fn diff(
        &self,
        config: &FileSpec,
        prior: &ManagedFile,
        current: &ManagedFile,
    ) -> Vec<AttributeChange> {
        let mut changes = Vec::new();
        if config.url != prior.url {
            changes.push(AttributeChange::force_new(attr::URL, &prior.url, &config.url));
        }
        if config.target_path != prior.target_path {
            changes.push(AttributeChange::force_new(
                attr::TARGET_PATH,
                prior.target_path.display(),
                config.target_path.display(),
            ));
        }
        if prior.size != current.size {
            changes.push(AttributeChange::force_new(attr::SIZE, prior.size, current.size));
        }
        if prior.last_modified != current.last_modified {
            changes.push(AttributeChange::force_new(
                attr::LAST_MODIFIED,
                &prior.last_modified,
                &current.last_modified,
            ));
        }
        changes
    }

    fn conflict_key(&self, config: &FileSpec) -> Option<String> {
        Some(config.target_path.display().to_string())
    }
}

/// Prefix the error with its category for the orchestrator
fn categorized(err: Error) -> anyhow::Error {
    let category = err.category();
    anyhow::Error::new(err).context(category)
}
