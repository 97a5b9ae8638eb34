//! CLI argument definitions using clap derive macros.

use std::ops::RangeInclusive;
use std::path::PathBuf;

use clap::Parser;

use media_fetch::TypeHint;
use media_fetch::fetch::constants::{
    CONNECT_TIMEOUT, DEFAULT_MAX_MEGABYTES, MAX_MAX_MEGABYTES, MIN_MAX_MEGABYTES, READ_TIMEOUT,
};

/// Accepted `--max-mb` values.
const MEGABYTE_RANGE: RangeInclusive<i64> = MIN_MAX_MEGABYTES as i64..=MAX_MAX_MEGABYTES as i64;

/// Accepted timeout values, in seconds.
const TIMEOUT_SECS_RANGE: RangeInclusive<u64> = 1..=300;

/// Fetch one image or audio file from an untrusted URL.
///
/// Refuses URLs that resolve to private, loopback, link-local, reserved, or
/// multicast addresses, stops at the size ceiling, and prints the result as JSON.
#[derive(Parser, Debug)]
#[command(name = "media-fetch")]
#[command(author, version, about)]
pub struct Args {
    /// URL to fetch (or a local path with --local)
    pub url: String,

    /// Expected media type: auto, image, or audio
    #[arg(short = 't', long, default_value_t = TypeHint::Auto)]
    pub expect_type: TypeHint,

    /// Size ceiling in megabytes (1-200)
    #[arg(
        short = 'm',
        long,
        default_value_t = DEFAULT_MAX_MEGABYTES,
        value_parser = clap::value_parser!(u32).range(MEGABYTE_RANGE)
    )]
    pub max_mb: u32,

    /// Directory for the fetched file (defaults to the system temp dir)
    #[arg(short = 'd', long)]
    pub scratch_dir: Option<PathBuf>,

    /// Connection timeout in seconds (1-300)
    #[arg(
        long,
        default_value_t = CONNECT_TIMEOUT.as_secs(),
        value_parser = clap::value_parser!(u64).range(TIMEOUT_SECS_RANGE)
    )]
    pub connect_timeout: u64,

    /// Per-read timeout in seconds (1-300)
    #[arg(
        long,
        default_value_t = READ_TIMEOUT.as_secs(),
        value_parser = clap::value_parser!(u64).range(TIMEOUT_SECS_RANGE)
    )]
    pub read_timeout: u64,

    /// Treat the input as a local file path or file:// URL
    #[arg(long)]
    pub local: bool,

    /// Fallback directory for relative local paths (requires --local)
    #[arg(long, requires = "local")]
    pub input_dir: Option<PathBuf>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}
