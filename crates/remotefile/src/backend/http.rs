//! ureq-backed transport.
//!
//! Status codes are reported rather than raised, so a 404 reaches the
//! provider as a [`ResponseHead`] it can turn into a precise error.
//! Compression is refused so `content-length` always describes the bytes
//! that end up on disk.

use crate::backend::{BodyReader, Method, Request, ResponseHead, Transport};
use crate::error::{Error, Result};
use ureq::http::Response;
use ureq::{Agent, Body};

/// Production transport.
///
/// # Example
///
/// ```no_run
/// use remotefile::backend::http::UreqTransport;
/// use remotefile::backend::{Method, Request, Transport};
///
/// let transport = UreqTransport::new();
/// let head = transport
///     .head(&Request::new(Method::Head, "https://example.com/", "TerraURL 0.0.1"))
///     .unwrap();
/// println!("HTTP {}", head.status);
/// ```
pub struct UreqTransport {
    agent: Agent,
}

impl UreqTransport {
    /// Create a transport with its own connection pool.
    #[must_use]
    pub fn new() -> Self {
        let agent: Agent = Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .into();
        Self { agent }
    }

    fn call(&self, request: &Request<'_>) -> Result<Response<Body>> {
        log::debug!("{} {}", request.method, request.url);

        let response = match request.method {
            Method::Get => self
                .agent
                .get(request.url)
                .header("User-Agent", request.user_agent)
                .header("Accept-Encoding", "identity")
                .config()
                .timeout_global(request.timeout)
                .build()
                .call(),
            Method::Head => self
                .agent
                .head(request.url)
                .header("User-Agent", request.user_agent)
                .header("Accept-Encoding", "identity")
                .config()
                .timeout_global(request.timeout)
                .build()
                .call(),
        };

        let response = response.map_err(|e| Error::http(request.url, e))?;
        log::debug!(
            "{} {} -> {}",
            request.method,
            request.url,
            response.status().as_u16()
        );
        Ok(response)
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn head(&self, request: &Request<'_>) -> Result<ResponseHead> {
        let response = self.call(request)?;
        Ok(response_head(&response))
    }

    fn get(&self, request: &Request<'_>) -> Result<(ResponseHead, BodyReader)> {
        let response = self.call(request)?;
        let head = response_head(&response);
        let body = response.into_body().into_reader();
        Ok((head, Box::new(body)))
    }
}

fn response_head(response: &Response<Body>) -> ResponseHead {
    let header = |name: &str| {
        response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    ResponseHead {
        status: response.status().as_u16(),
        content_length: header("content-length"),
        last_modified: header("last-modified"),
    }
}
