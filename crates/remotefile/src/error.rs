//! Error types for remote file operations.
//!
//! Errors are grouped into categories so callers can tell a network
//! failure from a bad server response or a local filesystem problem.
//! Nothing here is retried; every error reaches the orchestrator as-is.

use declarative::Interrupted;
use std::fmt;
use std::io;
use std::path::PathBuf;

/// Result type alias for remote file operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of remote file errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// DNS, connect, TLS, timeout, malformed URL or non-success status.
    Transport,
    /// The server answered without usable metadata.
    Protocol,
    /// Local file could not be created, written, renamed or removed.
    Filesystem,
    /// Cancelled or out of time.
    Interrupted,
    /// Invalid resource or provider configuration.
    Config,
}

impl ErrorCategory {
    /// Get a short description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Transport => "Transport error",
            Self::Protocol => "Protocol error",
            Self::Filesystem => "Filesystem error",
            Self::Interrupted => "Interrupted",
            Self::Config => "Configuration error",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while managing a remote file.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Request could not be sent or the connection failed.
    #[error("request to {url} failed: {message}")]
    Http {
        /// Requested URL.
        url: String,
        /// Error message.
        message: String,
    },

    /// Server answered with a non-success status.
    #[error("{url} returned HTTP {status}")]
    Status {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// `content-length` missing or not an integer.
    #[error("invalid content-length from {url}: {}", .value.as_deref().unwrap_or("<missing>"))]
    InvalidContentLength {
        /// Requested URL.
        url: String,
        /// Raw header value, if any.
        value: Option<String>,
    },

    /// IO error during file operations.
    #[error("IO error at {path}: {source}")]
    Io {
        /// Path involved in the error.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },

    /// Operation was cancelled by the caller.
    #[error("operation on {url} cancelled")]
    Cancelled {
        /// URL being processed.
        url: String,
    },

    /// Operation ran past its deadline.
    #[error("deadline exceeded while processing {url}")]
    DeadlineExceeded {
        /// URL being processed.
        url: String,
    },

    /// Resource or provider configuration is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Create an IO error with path context.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a transport error.
    pub fn http(url: impl Into<String>, message: impl ToString) -> Self {
        Self::Http {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Map an interrupted context to an error for `url`.
    pub fn interrupted(url: impl Into<String>, reason: Interrupted) -> Self {
        let url = url.into();
        match reason {
            Interrupted::Cancelled => Self::Cancelled { url },
            Interrupted::DeadlineExceeded => Self::DeadlineExceeded { url },
        }
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Http { .. } | Error::Status { .. } => ErrorCategory::Transport,
            Error::InvalidContentLength { .. } => ErrorCategory::Protocol,
            Error::Io { .. } => ErrorCategory::Filesystem,
            Error::Cancelled { .. } | Error::DeadlineExceeded { .. } => {
                ErrorCategory::Interrupted
            }
            Error::InvalidConfig(_) => ErrorCategory::Config,
        }
    }

    /// Whether this is a filesystem "not found".
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Io { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}
