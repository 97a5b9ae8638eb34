//! The inbound operation: validate, fetch, classify.
//!
//! [`Downloader`] composes the three stages. Each stage returns early on
//! failure, so a caller only ever sees a finished [`MediaDownload`] or one
//! [`FetchError`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::classify::{Classification, TypeHint, classify};
use crate::config::FetchConfig;
use crate::fetch::{
    AddressValidator, FetchError, HostResolver, HttpClient, NoopRegistry, SizeLimit, SystemResolver,
    TempFileRegistry, ValidatedUrl, notify_registry,
};
use crate::local::resolve_local_source;

/// One fetch request. Built per invocation and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    url: String,
    size_limit: SizeLimit,
    type_hint: TypeHint,
}

impl FetchRequest {
    /// Builds a request with a megabyte ceiling.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidSizeLimit`] if `max_megabytes` is outside `1..=200`.
    pub fn new(
        url: impl Into<String>,
        type_hint: TypeHint,
        max_megabytes: u32,
    ) -> Result<Self, FetchError> {
        let size_limit = SizeLimit::from_megabytes(max_megabytes)?;
        Ok(Self::with_limit(url, type_hint, size_limit))
    }

    /// Builds a request with an exact byte ceiling.
    #[must_use]
    pub fn with_limit(url: impl Into<String>, type_hint: TypeHint, size_limit: SizeLimit) -> Self {
        Self {
            url: url.into(),
            size_limit,
            type_hint,
        }
    }

    /// The URL as the caller supplied it, before validation.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Byte ceiling for the body.
    #[must_use]
    pub fn size_limit(&self) -> SizeLimit {
        self.size_limit
    }

    /// What the caller expects the resource to be.
    #[must_use]
    pub fn type_hint(&self) -> TypeHint {
        self.type_hint
    }
}

/// A classified file ready for decoding.
///
/// For network fetches the file is a scratch file the caller now owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaDownload {
    /// File holding the media.
    pub path: PathBuf,
    /// Declared (or, for local files, guessed) content type. Empty when unknown.
    pub content_type: String,
    /// Always [`Classification::Image`] or [`Classification::Audio`].
    pub classification: Classification,
    /// Size of `path` in bytes.
    pub byte_count: u64,
}

/// Runs the validate → fetch → classify pipeline.
///
/// Holds no per-request state; one instance may serve concurrent callers.
pub struct Downloader {
    validator: AddressValidator,
    client: HttpClient,
    registry: Arc<dyn TempFileRegistry>,
    scratch_dir: PathBuf,
    input_dir: Option<PathBuf>,
}

impl fmt::Debug for Downloader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Downloader")
            .field("validator", &self.validator)
            .field("client", &self.client)
            .field("scratch_dir", &self.scratch_dir)
            .field("input_dir", &self.input_dir)
            .finish_non_exhaustive()
    }
}

impl Default for Downloader {
    fn default() -> Self {
        Self::new(&FetchConfig::default())
    }
}

impl Downloader {
    /// Builds a downloader from `config` with the system resolver and no registry.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built; see [`HttpClient::new_with_timeouts`].
    #[must_use]
    pub fn new(config: &FetchConfig) -> Self {
        Self {
            validator: AddressValidator::new(Arc::new(SystemResolver))
                .with_dns_timeout(config.dns_timeout),
            client: HttpClient::new_with_timeouts(config.connect_timeout, config.read_timeout),
            registry: Arc::new(NoopRegistry),
            scratch_dir: config.scratch_dir.clone(),
            input_dir: config.input_dir.clone(),
        }
    }

    /// Replaces the temp-file registry notified after each successful fetch.
    #[must_use]
    pub fn with_registry(mut self, registry: Arc<dyn TempFileRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Replaces the host resolver used by validation.
    #[must_use]
    pub fn with_resolver(mut self, resolver: Arc<dyn HostResolver>) -> Self {
        let dns_timeout = self.validator.dns_timeout();
        let validator = AddressValidator::new(resolver);
        self.validator = validator.with_dns_timeout(dns_timeout);
        self
    }

    /// Directory that receives fetched files.
    #[must_use]
    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    /// Validates, fetches, and classifies `request`.
    ///
    /// Nothing touches the network until validation passes.
    ///
    /// # Errors
    ///
    /// Any [`FetchError`] from the three stages. On
    /// [`FetchError::Unsupported`] the fetched file is left in place and its
    /// path is carried in the error; every other failure leaves no file.
    #[instrument(skip_all, fields(url = %request.url(), hint = %request.type_hint()))]
    pub async fn download_and_classify(
        &self,
        request: &FetchRequest,
    ) -> Result<MediaDownload, FetchError> {
        let target = self.validator.validate(request.url()).await?;
        self.fetch_and_classify(&target, request).await
    }

    async fn fetch_and_classify(
        &self,
        target: &ValidatedUrl,
        request: &FetchRequest,
    ) -> Result<MediaDownload, FetchError> {
        let fetched = self
            .client
            .fetch(target, request.size_limit(), &self.scratch_dir)
            .await?;
        notify_registry(self.registry.as_ref(), &fetched.path);

        let classification = classify(&fetched.content_type, &fetched.path, request.type_hint());
        if !classification.is_supported() {
            warn!(
                path = %fetched.path.display(),
                content_type = %fetched.content_type,
                "unsupported content"
            );
            return Err(FetchError::unsupported(fetched.path, fetched.content_type));
        }

        info!(
            path = %fetched.path.display(),
            classification = %classification,
            bytes = fetched.byte_count,
            "media ready"
        );
        Ok(MediaDownload {
            path: fetched.path,
            content_type: fetched.content_type,
            classification,
            byte_count: fetched.byte_count,
        })
    }

    /// Classifies a file already on disk (`file://` URL or plain path).
    ///
    /// No network I/O and no address validation. The returned path is the
    /// caller's own file, not a scratch file.
    ///
    /// # Errors
    ///
    /// - [`FetchError::InvalidScheme`] for non-`file` URLs
    /// - [`FetchError::LocalFileNotFound`] when the file does not exist
    /// - [`FetchError::Io`] when its size cannot be read
    /// - [`FetchError::Unsupported`] when it is neither image nor audio
    #[instrument(skip(self))]
    pub async fn open_local(
        &self,
        raw: &str,
        type_hint: TypeHint,
    ) -> Result<MediaDownload, FetchError> {
        let source = resolve_local_source(raw, self.input_dir.as_deref()).await?;
        let byte_count = tokio::fs::metadata(&source.path)
            .await
            .map_err(|e| FetchError::io(&source.path, e))?
            .len();

        let classification = classify(&source.content_type, &source.path, type_hint);
        if !classification.is_supported() {
            return Err(FetchError::unsupported(source.path, source.content_type));
        }
        debug!(
            path = %source.path.display(),
            classification = %classification,
            "local media ready"
        );
        Ok(MediaDownload {
            path: source.path,
            content_type: source.content_type,
            classification,
            byte_count,
        })
    }
}

/// One-shot convenience over [`Downloader::download_and_classify`].
///
/// # Errors
///
/// [`FetchError::InvalidSizeLimit`] for a ceiling outside `1..=200`, or any
/// pipeline failure.
///
/// # Panics
///
/// Panics if the HTTP client cannot be built; see [`HttpClient::new_with_timeouts`].
pub async fn download_and_classify(
    url: &str,
    type_hint: TypeHint,
    max_megabytes: u32,
    config: &FetchConfig,
) -> Result<MediaDownload, FetchError> {
    let request = FetchRequest::new(url, type_hint, max_megabytes)?;
    Downloader::new(config).download_and_classify(&request).await
}
