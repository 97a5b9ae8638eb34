//! Media Fetch Library
//!
//! Fetches an image or audio file named by an untrusted URL without letting
//! the URL reach internal services, fill the disk, or smuggle in content the
//! caller cannot decode.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`fetch`] - Address validation and bounded streaming into scratch files
//! - [`classify`] - Image / audio / unsupported decision
//! - [`pipeline`] - [`Downloader`], composing the stages for one request
//! - [`local`] - Opt-in local file sources (no network)
//! - [`config`] - Timeouts and directories

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod classify;
pub mod config;
pub mod fetch;
pub mod local;
pub mod pipeline;
mod user_agent;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use classify::{Classification, TypeHint, classify};
pub use config::FetchConfig;
pub use fetch::{
    AddressClass, AddressValidator, FetchError, FetchErrorKind, FetchResult, HttpClient, SizeLimit,
    TempFileRegistry, TrackedTempFiles, ValidatedUrl,
};
pub use pipeline::{Downloader, FetchRequest, MediaDownload, download_and_classify};
