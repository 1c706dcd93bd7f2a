//! HTTP transports used to probe and fetch remote content.
//!
//! This module provides the [`Transport`] trait and its implementations.
//! The production implementation is [`http::UreqTransport`].
//!
//! # Testing
//!
//! Use [`MockTransport`] for testing without network access:
//!
//! ```
//! use remotefile::backend::{Method, MockRemote, MockTransport, Request, Transport};
//!
//! let mock = MockTransport::new();
//! mock.serve("https://example.com/a.bin", MockRemote::ok(vec![0u8; 16]));
//!
//! let head = mock
//!     .head(&Request::new(Method::Head, "https://example.com/a.bin", "test/1.0"))
//!     .unwrap();
//! assert_eq!(head.content_length.as_deref(), Some("16"));
//! assert_eq!(mock.request_count(Method::Head), 1);
//! ```

pub mod http;

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fmt;
use std::io::{Cursor, Read};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Streaming response body.
pub type BodyReader = Box<dyn Read>;

/// HTTP method of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// Download content.
    Get,
    /// Probe metadata only.
    Head,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Head => write!(f, "HEAD"),
        }
    }
}

/// A single outgoing request.
#[derive(Debug, Clone)]
pub struct Request<'a> {
    pub method: Method,
    pub url: &'a str,
    pub user_agent: &'a str,
    /// Upper bound for the whole exchange, `None` for no limit.
    pub timeout: Option<Duration>,
}

impl<'a> Request<'a> {
    /// Create a request without a timeout.
    #[must_use]
    pub fn new(method: Method, url: &'a str, user_agent: &'a str) -> Self {
        Self {
            method,
            url,
            user_agent,
            timeout: None,
        }
    }

    /// Bound the request by `timeout`.
    #[must_use]
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Status line and the headers drift detection cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHead {
    pub status: u16,
    /// Raw `content-length` header.
    pub content_length: Option<String>,
    /// Raw `last-modified` header.
    pub last_modified: Option<String>,
}

impl ResponseHead {
    /// Whether the status is in the 2xx range.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport trait for talking to the content server.
///
/// Implementations report any status the server sends; judging it is
/// left to the caller. Redirects are followed by the implementation.
pub trait Transport: Send + Sync {
    /// Send a HEAD request.
    fn head(&self, request: &Request<'_>) -> Result<ResponseHead>;

    /// Send a GET request, returning the headers and a streaming body.
    fn get(&self, request: &Request<'_>) -> Result<(ResponseHead, BodyReader)>;
}

/// Canned response served by [`MockTransport`].
#[derive(Debug, Clone)]
pub struct MockRemote {
    status: u16,
    body: Vec<u8>,
    last_modified: Option<String>,
    content_length: Option<Option<String>>,
}

impl MockRemote {
    /// 200 response with `body`.
    #[must_use]
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            body: body.into(),
            last_modified: None,
            content_length: None,
        }
    }

    /// Empty response with `status`.
    #[must_use]
    pub fn status(status: u16) -> Self {
        Self {
            status,
            ..Self::ok(Vec::new())
        }
    }

    /// Set the `last-modified` header.
    #[must_use]
    pub fn last_modified(mut self, value: impl Into<String>) -> Self {
        self.last_modified = Some(value.into());
        self
    }

    /// Override `content-length`; `None` drops the header entirely.
    #[must_use]
    pub fn content_length(mut self, value: Option<&str>) -> Self {
        self.content_length = Some(value.map(str::to_string));
        self
    }

    fn head(&self) -> ResponseHead {
        let content_length = match &self.content_length {
            Some(value) => value.clone(),
            None => Some(self.body.len().to_string()),
        };
        ResponseHead {
            status: self.status,
            content_length,
            last_modified: self.last_modified.clone(),
        }
    }
}

/// A request seen by [`MockTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: Method,
    pub url: String,
    pub user_agent: String,
}

/// Mock transport for testing without network access.
///
/// Serves canned responses per URL and records every request. Requests
/// to a URL that is not served fail like an unreachable host. Clones
/// share the same state.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    remotes: Arc<Mutex<HashMap<String, MockRemote>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockTransport {
    /// Create a mock transport serving nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `remote` at `url`, replacing any previous response.
    pub fn serve(&self, url: impl Into<String>, remote: MockRemote) {
        lock(&self.remotes).insert(url.into(), remote);
    }

    /// Stop serving `url`.
    pub fn unserve(&self, url: &str) {
        lock(&self.remotes).remove(url);
    }

    /// Every request seen so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.requests).clone()
    }

    /// Number of requests seen with `method`.
    #[must_use]
    pub fn request_count(&self, method: Method) -> usize {
        lock(&self.requests)
            .iter()
            .filter(|r| r.method == method)
            .count()
    }

    fn respond(&self, request: &Request<'_>) -> Result<MockRemote> {
        lock(&self.requests).push(RecordedRequest {
            method: request.method,
            url: request.url.to_string(),
            user_agent: request.user_agent.to_string(),
        });
        lock(&self.remotes)
            .get(request.url)
            .cloned()
            .ok_or_else(|| Error::http(request.url, "connection refused"))
    }
}

impl Transport for MockTransport {
    fn head(&self, request: &Request<'_>) -> Result<ResponseHead> {
        Ok(self.respond(request)?.head())
    }

    fn get(&self, request: &Request<'_>) -> Result<(ResponseHead, BodyReader)> {
        let remote = self.respond(request)?;
        let head = remote.head();
        Ok((head, Box::new(Cursor::new(remote.body))))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
