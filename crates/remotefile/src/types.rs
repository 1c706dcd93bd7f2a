//! Core types for remote file management.
//!
//! [`FileSpec`] is what the user asks for, [`ManagedFile`] is what was
//! observed at the last sync, and [`RemoteMetadata`] is one snapshot of the
//! server-side metadata that drift detection relies on.

use crate::backend::ResponseHead;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// User agent sent when the provider configuration does not set one.
pub const DEFAULT_USER_AGENT: &str = "TerraURL 0.0.1";

/// Resource type name of a managed remote file.
pub const RESOURCE_TYPE: &str = "remote_file";

/// Attribute names, as shown in plans.
pub mod attr {
    pub const URL: &str = "url";
    pub const TARGET_PATH: &str = "target_path";
    pub const LAST_MODIFIED: &str = "last_modified";
    pub const SIZE: &str = "size";
}

/// Desired configuration of one remote file.
///
/// # Example
///
/// ```
/// use remotefile::FileSpec;
///
/// let spec = FileSpec::new("https://example.com/a.bin", "/tmp/a.bin");
/// assert!(spec.validate().is_ok());
/// assert!(FileSpec::new("", "/tmp/a.bin").validate().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileSpec {
    /// Where the content lives.
    pub url: String,
    /// Where the content must be written locally.
    pub target_path: PathBuf,
}

impl FileSpec {
    /// Create a new file spec.
    #[must_use]
    pub fn new(url: impl Into<String>, target_path: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            target_path: target_path.into(),
        }
    }

    /// Check required attributes are set.
    ///
    /// URL syntax is left to the HTTP client, which rejects it on first use.
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(Error::InvalidConfig("url must not be empty".to_string()));
        }
        if self.target_path.as_os_str().is_empty() {
            return Err(Error::InvalidConfig(format!(
                "target_path for {} must not be empty",
                self.url
            )));
        }
        Ok(())
    }
}

impl fmt::Display for FileSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.url, self.target_path.display())
    }
}

/// Server-reported metadata from a single response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteMetadata {
    /// `content-length` in bytes.
    pub size: u64,
    /// Raw `last-modified` header, empty when the server sent none.
    pub last_modified: String,
}

impl RemoteMetadata {
    /// Extract metadata from response headers.
    ///
    /// A missing or non-numeric `content-length` is an error, never an
    /// "unknown size".
    pub fn from_head(url: &str, head: &ResponseHead) -> Result<Self> {
        let raw = head.content_length.as_deref();
        let size = raw
            .and_then(|v| v.trim().parse::<u64>().ok())
            .ok_or_else(|| Error::InvalidContentLength {
                url: url.to_string(),
                value: raw.map(str::to_string),
            })?;

        Ok(Self {
            size,
            last_modified: head.last_modified.clone().unwrap_or_default(),
        })
    }
}

/// Observed state of one managed remote file.
///
/// `id` doubles as the external key. It is set to the URL on creation
/// and cleared when the file is found missing or deleted; an empty `id`
/// means the resource does not exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedFile {
    /// Identity, empty when absent.
    #[serde(default)]
    pub id: String,
    /// Where the content lives.
    pub url: String,
    /// Where the content is written locally.
    pub target_path: PathBuf,
    /// `last-modified` at last sync.
    #[serde(default)]
    pub last_modified: String,
    /// `content-length` at last sync.
    #[serde(default)]
    pub size: u64,
}

impl ManagedFile {
    /// Not-yet-created entity for a spec, with no identity and no metadata.
    #[must_use]
    pub fn from_spec(spec: &FileSpec) -> Self {
        Self {
            id: String::new(),
            url: spec.url.clone(),
            target_path: spec.target_path.clone(),
            last_modified: String::new(),
            size: 0,
        }
    }

    /// Whether the entity exists in state.
    #[must_use]
    pub fn exists(&self) -> bool {
        !self.id.is_empty()
    }

    /// Mark the entity as gone so it gets recreated.
    pub fn clear_id(&mut self) {
        self.id.clear();
    }

    /// Local path as a `Path`.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.target_path
    }

    /// User-supplied attributes.
    #[must_use]
    pub fn spec(&self) -> FileSpec {
        FileSpec::new(self.url.clone(), self.target_path.clone())
    }

    /// Recorded metadata snapshot.
    #[must_use]
    pub fn metadata(&self) -> RemoteMetadata {
        RemoteMetadata {
            size: self.size,
            last_modified: self.last_modified.clone(),
        }
    }

    /// Record size and last-modified from one observation.
    pub fn record(&mut self, metadata: RemoteMetadata) {
        self.size = metadata.size;
        self.last_modified = metadata.last_modified;
    }

    /// Copy of this entity with the user-supplied attributes of `spec`.
    #[must_use]
    pub fn with_spec(&self, spec: &FileSpec) -> Self {
        Self {
            url: spec.url.clone(),
            target_path: spec.target_path.clone(),
            ..self.clone()
        }
    }

    /// Names of tracked attributes that differ from `other`.
    #[must_use]
    pub fn changed_attributes(&self, other: &ManagedFile) -> Vec<&'static str> {
        let mut changed = Vec::new();
        if self.url != other.url {
            changed.push(attr::URL);
        }
        if self.target_path != other.target_path {
            changed.push(attr::TARGET_PATH);
        }
        if self.last_modified != other.last_modified {
            changed.push(attr::LAST_MODIFIED);
        }
        if self.size != other.size {
            changed.push(attr::SIZE);
        }
        changed
    }
}

/// Connection-level configuration shared by every managed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Value of the `User-Agent` header on every request.
    pub user_agent: String,
    /// Treat deleting an already missing file as success.
    pub idempotent_delete: bool,
}

impl ProviderConfig {
    /// Create the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the user agent.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set whether deleting a missing file succeeds.
    #[must_use]
    pub fn idempotent_delete(mut self, idempotent: bool) -> Self {
        self.idempotent_delete = idempotent;
        self
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            idempotent_delete: false,
        }
    }
}
