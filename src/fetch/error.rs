//! Error types for the fetch pipeline.
//!
//! Every stage returns `Result<_, FetchError>`; the variant says which kind of
//! failure occurred and carries the url, host, or path it happened on.

use std::fmt;
use std::net::IpAddr;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use super::validator::AddressClass;

/// Errors that can occur while validating, fetching, or classifying a resource.
#[derive(Debug, Error)]
pub enum FetchError {
    /// URL is not `http`/`https` with a non-empty host.
    #[error("invalid URL {url}: only http and https URLs with a host are allowed")]
    InvalidScheme {
        /// The rejected input.
        url: String,
    },

    /// A resolved address for the host is internal or otherwise non-routable.
    #[error("refusing to access {host}: resolves to {class} address {address}")]
    BlockedHost {
        /// Host component of the URL.
        host: String,
        /// The offending address.
        address: IpAddr,
        /// Why the address is blocked.
        class: AddressClass,
    },

    /// Host name could not be resolved. Treated as blocked.
    #[error("refusing to access {host}: name resolution failed ({reason})")]
    DnsResolutionFailed {
        /// Host component of the URL.
        host: String,
        /// Resolver error text, or a note that no addresses were returned.
        reason: String,
    },

    /// Server answered with a non-success status.
    #[error("HTTP {status} fetching {url}")]
    HttpError {
        /// The requested URL.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// Body grew past the configured ceiling.
    #[error("{url} exceeds the allowed size limit of {limit_bytes} bytes")]
    SizeLimitExceeded {
        /// The requested URL.
        url: String,
        /// The ceiling that was exceeded.
        limit_bytes: u64,
    },

    /// Transfer completed without a single body byte.
    #[error("empty response body from {url}")]
    EmptyBody {
        /// The requested URL.
        url: String,
    },

    /// Fetched file is neither image nor audio.
    ///
    /// The file at `path` is left on disk; the caller owns it.
    #[error("unsupported file {path}: not image or audio (content type {content_type:?})")]
    Unsupported {
        /// Local file that was classified.
        path: PathBuf,
        /// Declared content type, possibly empty.
        content_type: String,
    },

    /// Connection-level failure (refused, reset, TLS, too many redirects).
    #[error("network error fetching {url}: {source}")]
    Network {
        /// The requested URL.
        url: String,
        /// The underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// Connect or read timeout elapsed.
    #[error("timeout fetching {url}")]
    Timeout {
        /// The requested URL.
        url: String,
    },

    /// Scratch file could not be created, written, or kept.
    #[error("IO error on {path}: {source}")]
    Io {
        /// The file or directory involved.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// `max_megabytes` outside the accepted range.
    #[error("size limit of {megabytes} MB is outside the allowed range {min}..={max}")]
    InvalidSizeLimit {
        /// The requested megabytes.
        megabytes: u32,
        /// Lower bound.
        min: u32,
        /// Upper bound.
        max: u32,
    },

    /// Local source does not exist.
    #[error("local file not found: {path}")]
    LocalFileNotFound {
        /// The path that was looked up last.
        path: PathBuf,
    },
}

/// Flat, serializable discriminant of [`FetchError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchErrorKind {
    /// See [`FetchError::InvalidScheme`].
    InvalidScheme,
    /// See [`FetchError::BlockedHost`].
    BlockedHost,
    /// See [`FetchError::DnsResolutionFailed`].
    DnsResolutionFailed,
    /// See [`FetchError::HttpError`].
    HttpError,
    /// See [`FetchError::SizeLimitExceeded`].
    SizeLimitExceeded,
    /// See [`FetchError::EmptyBody`].
    EmptyBody,
    /// See [`FetchError::Unsupported`].
    Unsupported,
    /// See [`FetchError::Network`].
    Network,
    /// See [`FetchError::Timeout`].
    Timeout,
    /// See [`FetchError::Io`].
    Io,
    /// See [`FetchError::InvalidSizeLimit`].
    InvalidSizeLimit,
    /// See [`FetchError::LocalFileNotFound`].
    LocalFileNotFound,
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::InvalidScheme => "invalid_scheme",
            Self::BlockedHost => "blocked_host",
            Self::DnsResolutionFailed => "dns_resolution_failed",
            Self::HttpError => "http_error",
            Self::SizeLimitExceeded => "size_limit_exceeded",
            Self::EmptyBody => "empty_body",
            Self::Unsupported => "unsupported",
            Self::Network => "network",
            Self::Timeout => "timeout",
            Self::Io => "io",
            Self::InvalidSizeLimit => "invalid_size_limit",
            Self::LocalFileNotFound => "local_file_not_found",
        };
        f.write_str(name)
    }
}

impl FetchError {
    /// Creates an invalid scheme error.
    pub fn invalid_scheme(url: impl Into<String>) -> Self {
        Self::InvalidScheme { url: url.into() }
    }

    /// Creates a blocked host error.
    pub fn blocked_host(host: impl Into<String>, address: IpAddr, class: AddressClass) -> Self {
        Self::BlockedHost {
            host: host.into(),
            address,
            class,
        }
    }

    /// Creates a resolution failure error.
    pub fn dns_resolution_failed(host: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DnsResolutionFailed {
            host: host.into(),
            reason: reason.into(),
        }
    }

    /// Creates an HTTP status error.
    pub fn http_error(url: impl Into<String>, status: u16) -> Self {
        Self::HttpError {
            url: url.into(),
            status,
        }
    }

    /// Creates a size limit error.
    pub fn size_limit_exceeded(url: impl Into<String>, limit_bytes: u64) -> Self {
        Self::SizeLimitExceeded {
            url: url.into(),
            limit_bytes,
        }
    }

    /// Creates an empty body error.
    pub fn empty_body(url: impl Into<String>) -> Self {
        Self::EmptyBody { url: url.into() }
    }

    /// Creates an unsupported content error.
    pub fn unsupported(path: impl Into<PathBuf>, content_type: impl Into<String>) -> Self {
        Self::Unsupported {
            path: path.into(),
            content_type: content_type.into(),
        }
    }

    /// Creates a network error, promoting client timeouts to [`FetchError::Timeout`].
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            return Self::Timeout { url: url.into() };
        }
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns the flat discriminant for reporting.
    #[must_use]
    pub fn kind(&self) -> FetchErrorKind {
        match self {
            Self::InvalidScheme { .. } => FetchErrorKind::InvalidScheme,
            Self::BlockedHost { .. } => FetchErrorKind::BlockedHost,
            Self::DnsResolutionFailed { .. } => FetchErrorKind::DnsResolutionFailed,
            Self::HttpError { .. } => FetchErrorKind::HttpError,
            Self::SizeLimitExceeded { .. } => FetchErrorKind::SizeLimitExceeded,
            Self::EmptyBody { .. } => FetchErrorKind::EmptyBody,
            Self::Unsupported { .. } => FetchErrorKind::Unsupported,
            Self::Network { .. } => FetchErrorKind::Network,
            Self::Timeout { .. } => FetchErrorKind::Timeout,
            Self::Io { .. } => FetchErrorKind::Io,
            Self::InvalidSizeLimit { .. } => FetchErrorKind::InvalidSizeLimit,
            Self::LocalFileNotFound { .. } => FetchErrorKind::LocalFileNotFound,
        }
    }

    /// True when the address validator refused the host, including failed lookups.
    #[must_use]
    pub fn is_blocked(&self) -> bool {
        matches!(
            self,
            Self::BlockedHost { .. } | Self::DnsResolutionFailed { .. }
        )
    }
}

// No `From<reqwest::Error>` / `From<std::io::Error>`: every variant needs the
// url or path the source error lacks, so callers go through the constructors.
