//! The remote file lifecycle.
//!
//! [`Provider`] keeps a local file in sync with the content at a URL. Drift
//! is detected from HEAD metadata (`content-length` and `last-modified`),
//! never by hashing content.

use crate::backend::http::UreqTransport;
use crate::backend::{Method, Request, ResponseHead, Transport};
use crate::download::stream_to_file;
use crate::error::{Error, Result};
use crate::types::{FileSpec, ManagedFile, ProviderConfig, RemoteMetadata};
use declarative::ApplyContext;
use std::fs;
use std::io;

/// Lifecycle controller for `remote_file` resources.
///
/// Holds the provider configuration and the transport every operation
/// goes through. It keeps no per-resource state; concurrent operations on
/// different paths are safe.
pub struct Provider {
    config: ProviderConfig,
    transport: Box<dyn Transport>,
}

impl Provider {
    /// Create a provider talking HTTP through ureq.
    #[must_use]
    pub fn new(config: ProviderConfig) -> Self {
        Self::with_transport(config, UreqTransport::new())
    }

    /// Create a provider with a custom transport.
    pub fn with_transport(config: ProviderConfig, transport: impl Transport + 'static) -> Self {
        Self {
            config,
            transport: Box::new(transport),
        }
    }

    /// Download `spec` and record its metadata.
    ///
    /// Identity is the URL. On failure no entity is returned and the target
    /// path is left as it was.
    pub fn create(&self, ctx: &ApplyContext, spec: &FileSpec) -> Result<ManagedFile> {
        spec.validate()?;

        let mut file = ManagedFile::from_spec(spec);
        file.id = spec.url.clone();

        self.fetch(ctx, &file)?;
        log::info!("Created {}", spec);
        self.read(ctx, &file)
    }

    /// Refresh metadata and check the local file still exists.
    ///
    /// A missing file clears the identity whatever the HEAD outcome; a
    /// HEAD failure is then only logged. With the file present, a HEAD
    /// failure is an error. Never writes the file.
    pub fn read(&self, ctx: &ApplyContext, observed: &ManagedFile) -> Result<ManagedFile> {
        let probe = self.probe(ctx, &observed.url);
        let mut current = observed.clone();

        if !observed.target_path.exists() {
            if observed.exists() {
                log::info!(
                    "{} is missing, {} will be recreated",
                    observed.target_path.display(),
                    observed.url
                );
            }
            current.clear_id();
            match probe {
                Ok(metadata) => current.record(metadata),
                Err(e) => log::warn!("Ignoring failed probe of absent file: {}", e),
            }
            return Ok(current);
        }

        current.record(probe?);
        Ok(current)
    }

    /// Converge `prior` to `planned`.
    ///
    /// No request is made and nothing is written when url, target path,
    /// size and last-modified all match. Otherwise the content is fetched
    /// again to `planned.target_path`, keeping the prior identity.
    pub fn update(
        &self,
        ctx: &ApplyContext,
        planned: &ManagedFile,
        prior: &ManagedFile,
    ) -> Result<ManagedFile> {
        let changed = planned.changed_attributes(prior);
        if changed.is_empty() {
            log::debug!("{} is up to date", planned.url);
            return Ok(prior.clone());
        }
        planned.spec().validate()?;

        log::debug!("Updating {} ({})", planned.url, changed.join(", "));
        let mut next = planned.clone();
        next.id = prior.id.clone();

        self.fetch(ctx, &next)?;
        log::info!("Updated {}", next.spec());
        self.read(ctx, &next)
    }

    /// Remove the local file and clear the identity.
    ///
    /// A missing file is an error unless `idempotent_delete` is set.
    pub fn delete(&self, ctx: &ApplyContext, observed: &ManagedFile) -> Result<ManagedFile> {
        ctx.checkpoint()
            .map_err(|r| Error::interrupted(&observed.url, r))?;

        let path = observed.path();
        match fs::remove_file(path) {
            Ok(()) => log::info!("Removed {}", path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound && self.config.idempotent_delete => {
                log::info!("{} already absent", path.display());
            }
            Err(e) => return Err(Error::io(path, e)),
        }

        let mut gone = observed.clone();
        gone.clear_id();
        Ok(gone)
    }

    fn request<'a>(&'a self, ctx: &ApplyContext, method: Method, url: &'a str) -> Request<'a> {
        Request::new(method, url, &self.config.user_agent).timeout(ctx.remaining())
    }

    /// HEAD `url` and extract its metadata.
    fn probe(&self, ctx: &ApplyContext, url: &str) -> Result<RemoteMetadata> {
        ctx.checkpoint().map_err(|r| Error::interrupted(url, r))?;

        let head = self.transport.head(&self.request(ctx, Method::Head, url))?;
        check_status(url, &head)?;
        RemoteMetadata::from_head(url, &head)
    }

    /// GET `file.url` into `file.target_path`.
    fn fetch(&self, ctx: &ApplyContext, file: &ManagedFile) -> Result<()> {
        ctx.checkpoint()
            .map_err(|r| Error::interrupted(&file.url, r))?;

        log::debug!("Fetching {} to {}", file.url, file.target_path.display());
        let (head, mut body) = self
            .transport
            .get(&self.request(ctx, Method::Get, &file.url))?;
        check_status(&file.url, &head)?;

        let written = stream_to_file(ctx, &file.url, file.path(), &mut body)?;
        if let Some(expected) = head
            .content_length
            .as_deref()
            .and_then(|v| v.trim().parse::<u64>().ok())
            && expected != written
        {
            log::warn!(
                "{} announced {} bytes but sent {}",
                file.url,
                expected,
                written
            );
        }
        Ok(())
    }
}

fn check_status(url: &str, head: &ResponseHead) -> Result<()> {
    if head.is_success() {
        Ok(())
    } else {
        Err(Error::Status {
            url: url.to_string(),
            status: head.status,
        })
    }
}
