//! Validated, size-bounded HTTP fetching into scratch storage.
//!
//! This module provides the network-facing half of the pipeline:
//!
//! - [`AddressValidator`] rejects URLs whose host resolves to any private,
//!   loopback, link-local, reserved, or multicast address
//! - [`HttpClient`] streams a validated URL into a uniquely named scratch file,
//!   aborting as soon as the body passes a [`SizeLimit`]
//! - [`TempFileRegistry`] lets the host track produced files
//!
//! Every operation returns `Result<_, FetchError>`.
//!
//! # Example
//!
//! ```no_run
//! use media_fetch::fetch::{AddressValidator, HttpClient, SizeLimit};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let validator = AddressValidator::default();
//! let target = validator.validate("https://example.com/song.mp3").await?;
//! let fetched = HttpClient::new()
//!     .fetch(&target, SizeLimit::from_megabytes(20)?, Path::new("/tmp"))
//!     .await?;
//! println!("{} ({})", fetched.path.display(), fetched.content_type);
//! # Ok(())
//! # }
//! ```

mod client;
pub mod constants;
mod error;
mod limit;
pub mod registry;
mod suffix;
pub mod validator;

pub use client::{FetchResult, HttpClient};
pub use error::{FetchError, FetchErrorKind};
pub use limit::SizeLimit;
pub use registry::{NoopRegistry, RegistryError, TempFileRegistry, TrackedTempFiles};
pub use suffix::{normalize_content_type, temp_file_suffix};
pub use validator::{
    AddressClass, AddressValidator, HostResolver, SystemResolver, ValidatedUrl, classify_address,
};

pub(crate) use registry::notify_registry;
pub(crate) use suffix::extension_of;

// Note: no module-local Result alias. Use `Result<T, FetchError>` explicitly.
