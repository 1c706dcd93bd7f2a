use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use declarative::StateMap;
use remotefile::ManagedFile;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Current state file format
pub const STATE_VERSION: u32 = 1;

// ============================================================================
// State Structures
// ============================================================================

/// Recorded state of every managed file
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StateFile {
    /// Format version
    pub version: u32,

    /// Incremented on every save
    #[serde(default)]
    pub serial: u64,

    /// Last time the state was saved
    pub last_updated: DateTime<Utc>,

    /// Observed state keyed by resource name
    #[serde(default)]
    pub resources: StateMap<ManagedFile>,
}

impl Default for StateFile {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            serial: 0,
            last_updated: Utc::now(),
            resources: StateMap::new(),
        }
    }
}

// ============================================================================
// StateFile Implementation
// ============================================================================

impl StateFile {
    /// Load state from disk, or return an empty state if the file doesn't exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("State file {} does not exist, starting empty", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file: {}", path.display()))?;

        let state: StateFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse state file: {}", path.display()))?;

        if state.version > STATE_VERSION {
            bail!(
                "State file {} has version {}, this build understands up to {}",
                path.display(),
                state.version,
                STATE_VERSION
            );
        }

        log::debug!(
            "Loaded state serial {} with {} resource(s) from {}",
            state.serial,
            state.resources.len(),
            path.display()
        );
        Ok(state)
    }

    /// Bump the serial and timestamp, then save to disk
    pub fn save(&mut self, path: &Path) -> Result<()> {
        self.version = STATE_VERSION;
        self.serial += 1;
        self.last_updated = Utc::now();

        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create state directory: {}", dir.display()))?;
        }

        let content =
            serde_json::to_string_pretty(&self).context("Failed to serialize state to JSON")?;

        fs::write(path, content + "\n")
            .with_context(|| format!("Failed to write state file: {}", path.display()))?;

        log::debug!("Saved state serial {} to {}", self.serial, path.display());
        Ok(())
    }

    /// Replace recorded resources, dropping any whose identity was cleared
    pub fn set_resources(&mut self, resources: StateMap<ManagedFile>) {
        self.resources = resources.into_iter().filter(|(_, f)| f.exists()).collect();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use remotefile::FileSpec;
    use tempfile::tempdir;

    fn managed(url: &str, path: &str, size: u64) -> ManagedFile {
        let mut file = ManagedFile::from_spec(&FileSpec::new(url, path));
        file.id = url.to_string();
        file.size = size;
        file.last_modified = "Mon, 01 Jan 2024 00:00:00 GMT".to_string();
        file
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempdir().unwrap();
        let state = StateFile::load(&dir.path().join("none.json")).unwrap();
        assert_eq!(state.serial, 0);
        assert!(state.resources.is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/terraurl.state.json");

        let mut state = StateFile::default();
        state
            .resources
            .insert("tool".into(), managed("https://x/tool", "/opt/tool", 1024));
        state.save(&path).unwrap();
        state.save(&path).unwrap();

        let loaded = StateFile::load(&path).unwrap();
        assert_eq!(loaded.serial, 2);
        assert_eq!(loaded.resources["tool"].size, 1024);
        assert!(loaded.resources["tool"].exists());
    }

    #[test]
    fn test_state_json_layout() {
        let mut state = StateFile::default();
        state
            .resources
            .insert("tool".into(), managed("https://x/tool", "/opt/tool", 7));

        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(value["version"], 1);
        assert_eq!(value["resources"]["tool"]["id"], "https://x/tool");
        assert_eq!(value["resources"]["tool"]["size"], 7);
        assert!(value["last_updated"].is_string());
    }

    #[test]
    fn test_rejects_newer_version() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(
            &path,
            r#"{"version": 99, "serial": 1, "last_updated": "2024-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert!(StateFile::load(&path).is_err());
    }

    #[test]
    fn test_corrupt_file_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{not json").unwrap();
        let err = StateFile::load(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse state file"));
    }

    #[test]
    fn test_set_resources_drops_absent() {
        let mut state = StateFile::default();
        let mut gone = managed("https://x/b", "/tmp/b", 1);
        gone.clear_id();

        let mut resources = StateMap::new();
        resources.insert("a".to_string(), managed("https://x/a", "/tmp/a", 1));
        resources.insert("b".to_string(), gone);
        state.set_resources(resources);

        assert_eq!(state.resources.len(), 1);
        assert!(state.resources.contains_key("a"));
    }
}
