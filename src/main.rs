//! CLI entry point for the media-fetch tool.

use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use media_fetch::{Downloader, FetchConfig, FetchError, FetchRequest, MediaDownload};
use serde_json::json;
use tracing::{debug, error, info};

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    // stdout carries the JSON result only
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let mut config = FetchConfig::default()
        .with_connect_timeout(Duration::from_secs(args.connect_timeout))
        .with_read_timeout(Duration::from_secs(args.read_timeout));
    if let Some(dir) = &args.scratch_dir {
        config = config.with_scratch_dir(dir);
    }
    if let Some(dir) = &args.input_dir {
        config = config.with_input_dir(dir);
    }

    let downloader = Downloader::new(&config);
    let outcome = if args.local {
        downloader.open_local(&args.url, args.expect_type).await
    } else {
        let request = FetchRequest::new(args.url.as_str(), args.expect_type, args.max_mb)?;
        downloader.download_and_classify(&request).await
    };

    match outcome {
        Ok(download) => {
            report_success(&download)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            error!(kind = %e.kind(), error = %e, "fetch failed");
            report_failure(&e)?;
            Ok(ExitCode::FAILURE)
        }
    }
}

fn report_success(download: &MediaDownload) -> Result<()> {
    info!(
        path = %download.path.display(),
        classification = %download.classification,
        bytes = download.byte_count,
        "Fetch complete"
    );
    let line = serde_json::to_string(download).context("serializing result")?;
    println!("{line}");
    Ok(())
}

fn report_failure(e: &FetchError) -> Result<()> {
    let mut report = json!({
        "error": e.kind(),
        "message": e.to_string(),
        "blocked": e.is_blocked(),
    });
    // Unsupported content leaves its file behind for the caller.
    if let FetchError::Unsupported { path, .. } = e {
        report["path"] = json!(path);
    }
    let line = serde_json::to_string(&report).context("serializing error report")?;
    println!("{line}");
    Ok(())
}
