//! Desired-state file (`terraurl.toml`)
//!
//! ```toml
//! [provider]
//! user_agent = "TerraURL 0.0.1"
//! timeout_secs = 60
//!
//! [resource.tool]
//! url = "https://example.com/tool.tar.gz"
//! target_path = "~/downloads/tool.tar.gz"
//! ```

use anyhow::{Context, Result, bail};
use declarative::PlanOptions;
use remotefile::{DEFAULT_USER_AGENT, FileSpec, ProviderConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// State file name used when none is given
pub const DEFAULT_STATE_FILE: &str = "terraurl.state.json";

// ============================================================================
// Config Structures
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TerraurlConfig {
    #[serde(default)]
    pub provider: ProviderSection,

    /// Managed files keyed by resource name
    #[serde(default)]
    pub resource: BTreeMap<String, ResourceSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderSection {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Overall deadline for network operations
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Deleting an already missing file succeeds
    #[serde(default)]
    pub idempotent_delete: bool,

    /// Re-download in place instead of destroy-then-create on drift
    #[serde(default)]
    pub in_place_updates: bool,
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

impl Default for ProviderSection {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: None,
            idempotent_delete: false,
            in_place_updates: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceSection {
    pub url: String,
    pub target_path: String,
}

// ============================================================================
// Loading
// ============================================================================

impl TerraurlConfig {
    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        let config =
            Self::parse(&content).with_context(|| format!("Invalid config: {}", path.display()))?;
        log::debug!(
            "Loaded {} resource(s) from {}",
            config.resource.len(),
            path.display()
        );
        Ok(config)
    }

    /// Parse and validate config content
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check names and required attributes
    pub fn validate(&self) -> Result<()> {
        if self.provider.user_agent.trim().is_empty() {
            bail!("provider.user_agent must not be empty");
        }
        if self.provider.timeout_secs == Some(0) {
            bail!("provider.timeout_secs must be greater than zero");
        }
        for (name, resource) in &self.resource {
            if !is_valid_name(name) {
                bail!(
                    "invalid resource name '{}': use letters, digits, '-' and '_'",
                    name
                );
            }
            FileSpec::new(resource.url.as_str(), resource.target_path.as_str())
                .validate()
                .with_context(|| format!("resource.{}", name))?;
        }
        Ok(())
    }

    /// Connection settings for the provider
    pub fn provider_config(&self) -> ProviderConfig {
        ProviderConfig::new()
            .user_agent(self.provider.user_agent.clone())
            .idempotent_delete(self.provider.idempotent_delete)
    }

    pub fn plan_options(&self) -> PlanOptions {
        PlanOptions {
            replace_in_place: self.provider.in_place_updates,
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.provider.timeout_secs.map(Duration::from_secs)
    }

    /// Desired files, with `~` expanded and relative paths resolved
    /// against `base_dir`
    pub fn desired(&self, base_dir: &Path) -> BTreeMap<String, FileSpec> {
        self.resource
            .iter()
            .map(|(name, r)| {
                let spec = FileSpec::new(r.url.clone(), resolve_path(&r.target_path, base_dir));
                (name.clone(), spec)
            })
            .collect()
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Default state file location for a config path
pub fn default_state_path(config_path: &Path) -> PathBuf {
    config_path.with_file_name(DEFAULT_STATE_FILE)
}

/// Directory relative target paths are resolved against
pub fn base_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn resolve_path(raw: &str, base_dir: &Path) -> PathBuf {
    let expanded = PathBuf::from(shellexpand::tilde(raw).as_ref());
    if expanded.is_absolute() {
        expanded
    } else {
        base_dir.join(expanded)
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
