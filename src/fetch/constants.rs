//! Constants for the fetch module (timeouts, size ceilings).

use std::time::Duration;

/// Default HTTP connect timeout (5 seconds).
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default per-read idle timeout (15 seconds). Bounds each stall, not the whole transfer.
pub const READ_TIMEOUT: Duration = Duration::from_secs(15);

/// Default bound on a single host name lookup.
pub const DNS_TIMEOUT: Duration = Duration::from_secs(5);

/// Bytes per megabyte when converting the inbound `max_megabytes` parameter.
pub const BYTES_PER_MEGABYTE: u64 = 1024 * 1024;

/// Smallest accepted `max_megabytes`.
pub const MIN_MAX_MEGABYTES: u32 = 1;

/// Largest accepted `max_megabytes`.
pub const MAX_MAX_MEGABYTES: u32 = 200;

/// Default `max_megabytes` when the caller does not choose one.
pub const DEFAULT_MAX_MEGABYTES: u32 = 50;

/// Prefix for scratch files so they are recognisable in a shared temp directory.
pub const TEMP_FILE_PREFIX: &str = "media_fetch_";
