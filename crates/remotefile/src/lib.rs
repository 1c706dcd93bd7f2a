//! # Remotefile
//!
//! Keep a local file in sync with the content at a URL.
//!
//! A [`Provider`] drives the create / read / update / delete lifecycle of
//! `remote_file` resources. Drift is detected from the `content-length`
//! and `last-modified` headers of a HEAD request, so a refresh costs one
//! round trip and never touches the file. Content integrity is not
//! verified.
//!
//! ## Quick Start
//!
//! ```no_run
//! use declarative::ApplyContext;
//! use remotefile::{FileSpec, Provider, ProviderConfig};
//!
//! let provider = Provider::new(ProviderConfig::default());
//! let ctx = ApplyContext::default();
//!
//! let spec = FileSpec::new("https://example.com/tool.tar.gz", "/tmp/tool.tar.gz");
//! let file = provider.create(&ctx, &spec)?;
//! println!("{} bytes, last modified {}", file.size, file.last_modified);
//!
//! let file = provider.read(&ctx, &file)?;
//! provider.delete(&ctx, &file)?;
//! # Ok::<(), remotefile::Error>(())
//! ```
//!
//! ## Testing
//!
//! Use [`backend::MockTransport`] to drive a provider without network
//! access:
//!
//! ```
//! use remotefile::backend::{MockRemote, MockTransport};
//! use remotefile::{Provider, ProviderConfig};
//!
//! let mock = MockTransport::new();
//! mock.serve("https://example.com/a.bin", MockRemote::ok(vec![0u8; 32]));
//! let provider = Provider::with_transport(ProviderConfig::default(), mock.clone());
//! ```
//!
//! `Provider` also implements [`declarative::Lifecycle`], so it plugs into
//! the planner and executor of the `declarative` crate. Every attribute
//! forces replacement, and two resources may not share a target path.

pub mod backend;
mod download;
pub mod error;
mod lifecycle;
mod provider;
pub mod types;

pub use error::{Error, ErrorCategory, Result};
pub use provider::Provider;
pub use types::{
    DEFAULT_USER_AGENT, FileSpec, ManagedFile, ProviderConfig, RESOURCE_TYPE, RemoteMetadata,
};
