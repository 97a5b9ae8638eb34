//! Runtime configuration for the fetch pipeline.

use std::path::PathBuf;
use std::time::Duration;

use crate::fetch::constants::{CONNECT_TIMEOUT, DNS_TIMEOUT, READ_TIMEOUT};

/// Timeouts and directories used by [`crate::Downloader`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    /// Bound on establishing the TCP/TLS connection.
    pub connect_timeout: Duration,
    /// Bound on each individual read; not on the whole transfer.
    pub read_timeout: Duration,
    /// Bound on resolving the host name during validation.
    pub dns_timeout: Duration,
    /// Directory that receives scratch files. Must exist.
    pub scratch_dir: PathBuf,
    /// Fallback directory for relative local paths (local sources only).
    pub input_dir: Option<PathBuf>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            connect_timeout: CONNECT_TIMEOUT,
            read_timeout: READ_TIMEOUT,
            dns_timeout: DNS_TIMEOUT,
            scratch_dir: std::env::temp_dir(),
            input_dir: None,
        }
    }
}

impl FetchConfig {
    /// Sets the connect timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the per-read timeout.
    #[must_use]
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Sets the name resolution timeout.
    #[must_use]
    pub fn with_dns_timeout(mut self, timeout: Duration) -> Self {
        self.dns_timeout = timeout;
        self
    }

    /// Sets the scratch directory.
    #[must_use]
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = dir.into();
        self
    }

    /// Sets the input directory for relative local paths.
    #[must_use]
    pub fn with_input_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.input_dir = Some(dir.into());
        self
    }
}
