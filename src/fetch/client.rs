//! Bounded streaming fetcher.
//!
//! Streams a validated URL's body into a fresh scratch file, aborting the
//! moment the running total passes the ceiling. Nothing is buffered beyond the
//! chunk currently in hand, so a server that never sends `Content-Length`
//! cannot push more than the limit onto disk.
//!
//! Redirects are followed for up to ten hops. A hop whose host is an internal
//! IP literal is refused with [`FetchError::BlockedHost`]; a hop to a host name
//! is not re-validated, which leaves an open hardening item alongside the
//! rebinding window described in the validator module.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::{Attempt, Policy};
use reqwest::{Client, ClientBuilder};
use tempfile::TempPath;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument, warn};

use super::constants::{CONNECT_TIMEOUT, READ_TIMEOUT, TEMP_FILE_PREFIX};
use super::error::FetchError;
use super::limit::SizeLimit;
use super::suffix::{normalize_content_type, temp_file_suffix};
use super::validator::{AddressClass, ValidatedUrl, classify_literal_host};
use crate::user_agent;

/// Redirect hops followed before giving up (reqwest's default ceiling).
const MAX_REDIRECTS: usize = 10;

/// A fetched body sitting in the scratch directory.
///
/// The caller owns `path` and must delete it when done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    /// Scratch file holding the body.
    pub path: PathBuf,
    /// Declared content type, lower-cased without parameters. Empty when absent.
    pub content_type: String,
    /// Bytes written to `path`.
    pub byte_count: u64,
}

/// HTTP client for single-shot, size-bounded fetches.
///
/// Create once and reuse; clones share the connection pool.
///
/// # Example
///
/// ```no_run
/// use media_fetch::fetch::{AddressValidator, HttpClient, SizeLimit};
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let validated = AddressValidator::default()
///     .validate("https://example.com/cat.png")
///     .await?;
/// let limit = SizeLimit::from_megabytes(5)?;
/// let fetched = HttpClient::new()
///     .fetch(&validated, limit, Path::new("/tmp"))
///     .await?;
/// println!("{} bytes in {}", fetched.byte_count, fetched.path.display());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Creates a client with the default 5 s connect and 15 s read timeouts.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    pub fn new() -> Self {
        Self::new_with_timeouts(CONNECT_TIMEOUT, READ_TIMEOUT)
    }

    /// Creates a client with explicit timeouts.
    ///
    /// `connect_timeout` bounds connection establishment; `read_timeout` bounds
    /// each individual read, so a slow but steady transfer may run longer in total.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the supplied
    /// timeout configuration.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new_with_timeouts(connect_timeout: Duration, read_timeout: Duration) -> Self {
        let client = base_client_builder(connect_timeout, read_timeout)
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self { client }
    }

    /// Streams `target` into a new file under `scratch_dir`.
    ///
    /// # Errors
    ///
    /// - [`FetchError::HttpError`] for any non-2xx status (no retry)
    /// - [`FetchError::SizeLimitExceeded`] once the body passes `limit`; the file is removed
    /// - [`FetchError::EmptyBody`] when no bytes arrive; the file is removed
    /// - [`FetchError::BlockedHost`] when a redirect points at an internal IP literal
    /// - [`FetchError::Timeout`] / [`FetchError::Network`] for transport failures
    /// - [`FetchError::Io`] when the scratch file cannot be created or written
    #[must_use = "the fetched file must be consumed and eventually deleted"]
    #[instrument(skip_all, fields(url = %target.as_str(), limit = limit.bytes()))]
    pub async fn fetch(
        &self,
        target: &ValidatedUrl,
        limit: SizeLimit,
        scratch_dir: &Path,
    ) -> Result<FetchResult, FetchError> {
        let url = target.as_str();
        debug!("starting fetch");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| map_send_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            debug!(status = status.as_u16(), "non-success status");
            return Err(FetchError::http_error(url, status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(normalize_content_type)
            .unwrap_or_default();

        if let Some(advertised) = response.content_length()
            && advertised > limit.bytes()
        {
            warn!(advertised, "advertised length exceeds size limit");
            return Err(FetchError::size_limit_exceeded(url, limit.bytes()));
        }

        let suffix = temp_file_suffix(target.url(), &content_type);
        let (file, temp_path) = tempfile::Builder::new()
            .prefix(TEMP_FILE_PREFIX)
            .suffix(&suffix)
            .tempfile_in(scratch_dir)
            .map_err(|e| FetchError::io(scratch_dir, e))?
            .into_parts();
        debug!(path = %temp_path.display(), "created scratch file");

        let file = File::from_std(file);
        let streamed = stream_with_limit(file, response, url, &temp_path, limit).await;

        match streamed {
            Ok(0) => {
                discard(temp_path);
                Err(FetchError::empty_body(url))
            }
            Ok(byte_count) => {
                let path = temp_path.keep().map_err(|e| {
                    let path = e.path.to_path_buf();
                    FetchError::io(path, e.error)
                })?;
                info!(
                    path = %path.display(),
                    bytes = byte_count,
                    content_type = %content_type,
                    "fetch complete"
                );
                Ok(FetchResult {
                    path,
                    content_type,
                    byte_count,
                })
            }
            Err(e) => {
                discard(temp_path);
                Err(e)
            }
        }
    }
}

/// Writes the body chunk by chunk, checking the ceiling before each write.
///
/// Takes the file by value so the handle is closed before the caller deletes it.
async fn stream_with_limit(
    file: File,
    response: reqwest::Response,
    url: &str,
    file_path: &Path,
    limit: SizeLimit,
) -> Result<u64, FetchError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| FetchError::network(url, e))?;
        if chunk.is_empty() {
            continue;
        }

        let total = bytes_written + chunk.len() as u64;
        if total > limit.bytes() {
            warn!(received = total, limit = limit.bytes(), "size limit exceeded, aborting");
            return Err(FetchError::size_limit_exceeded(url, limit.bytes()));
        }

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| FetchError::io(file_path, e))?;
        bytes_written = total;
    }

    writer
        .flush()
        .await
        .map_err(|e| FetchError::io(file_path, e))?;

    Ok(bytes_written)
}

/// Removes a scratch file after a failed fetch.
fn discard(temp_path: TempPath) {
    let path = temp_path.to_path_buf();
    match temp_path.close() {
        Ok(()) => debug!(path = %path.display(), "removed scratch file"),
        Err(e) => warn!(path = %path.display(), error = %e, "failed to remove scratch file"),
    }
}

/// Raised from the redirect policy when a hop targets an internal IP literal.
#[derive(Debug, Error)]
#[error("redirect to {host} blocked: {class} address")]
struct BlockedRedirect {
    host: String,
    address: std::net::IpAddr,
    class: AddressClass,
}

fn map_send_error(url: &str, error: reqwest::Error) -> FetchError {
    let mut source = std::error::Error::source(&error);
    while let Some(cause) = source {
        if let Some(blocked) = cause.downcast_ref::<BlockedRedirect>() {
            return FetchError::blocked_host(blocked.host.clone(), blocked.address, blocked.class);
        }
        source = cause.source();
    }
    FetchError::network(url, error)
}

/// Follows up to [`MAX_REDIRECTS`] hops, refusing hops to internal IP literals.
///
/// Hops to host names are followed without a fresh lookup.
fn redirect_policy() -> Policy {
    Policy::custom(|attempt: Attempt<'_>| {
        if attempt.previous().len() >= MAX_REDIRECTS {
            return attempt.error("too many redirects");
        }
        if let Some((host, address, class)) = classify_literal_host(attempt.url()) {
            warn!(host = %host, class = %class, "refusing redirect to internal address");
            return attempt.error(BlockedRedirect {
                host,
                address,
                class,
            });
        }
        attempt.follow()
    })
}

fn base_client_builder(connect_timeout: Duration, read_timeout: Duration) -> ClientBuilder {
    Client::builder()
        .connect_timeout(connect_timeout)
        .read_timeout(read_timeout)
        .redirect(redirect_policy())
        .user_agent(user_agent::default_fetch_user_agent())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use crate::test_support::chunked_server::{spawn_chunked_server, spawn_stalling_server};
    use crate::test_support::mock_server_or_skip;
    use tempfile::TempDir;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, ResponseTemplate};

    fn limit(bytes: u64) -> SizeLimit {
        SizeLimit::from_bytes(bytes).unwrap()
    }

    fn scratch_entries(dir: &TempDir) -> Vec<PathBuf> {
        std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect()
    }

    #[tokio::test]
    async fn test_fetch_success_writes_body_and_reports_type() {
        let Some(mock_server) = mock_server_or_skip().await else {
            return;
        };
        let scratch = TempDir::new().unwrap();

        let body = b"\x89PNG fake";
        Mock::given(method("GET"))
            .and(path("/cat.png"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Content-Type", "Image/PNG; charset=binary")
                    .set_body_bytes(body.to_vec()),
            )
            .mount(&mock_server)
            .await;

        let target = ValidatedUrl::assume_validated(&format!("{}/cat.png", mock_server.uri()));
        let fetched = HttpClient::new()
            .fetch(&target, limit(1024), scratch.path())
            .await
            .unwrap();

        assert_eq!(fetched.content_type, "image/png");
        assert_eq!(fetched.byte_count, body.len() as u64);
        assert_eq!(std::fs::read(&fetched.path).unwrap(), body);
        assert!(fetched.path.starts_with(scratch.path()));
        let name = fetched.path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with(TEMP_FILE_PREFIX), "unexpected name {name}");
        assert!(name.ends_with(".png"), "unexpected name {name}");
    }

    #[tokio::test]
    async fn test_fetch_suffix_from_content_type_when_path_has_none() {
        let Some(mock_server) = mock_server_or_skip().await else {
            return;
        };
        let scratch = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/media/42"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Content-Type", "audio/mpeg")
                    .set_body_bytes(b"ID3 fake mp3".to_vec()),
            )
            .mount(&mock_server)
            .await;

        let target = ValidatedUrl::assume_validated(&format!("{}/media/42", mock_server.uri()));
        let fetched = HttpClient::new()
            .fetch(&target, limit(1024), scratch.path())
            .await
            .unwrap();

        assert!(fetched.path.to_str().unwrap().ends_with(".mp3"));
        assert_eq!(fetched.content_type, "audio/mpeg");
    }

    #[tokio::test]
    async fn test_fetch_missing_content_type_is_empty() {
        let Some(mock_server) = mock_server_or_skip().await else {
            return;
        };
        let scratch = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/blob"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"raw".to_vec()))
            .mount(&mock_server)
            .await;

        let target = ValidatedUrl::assume_validated(&format!("{}/blob", mock_server.uri()));
        let fetched = HttpClient::new()
            .fetch(&target, limit(1024), scratch.path())
            .await
            .unwrap();

        assert_eq!(fetched.content_type, "");
        assert_eq!(fetched.byte_count, 3);
    }

    #[tokio::test]
    async fn test_fetch_http_error_carries_status_and_leaves_no_file() {
        let Some(mock_server) = mock_server_or_skip().await else {
            return;
        };
        let scratch = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/missing.png"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&mock_server)
            .await;

        let target = ValidatedUrl::assume_validated(&format!("{}/missing.png", mock_server.uri()));
        let result = HttpClient::new()
            .fetch(&target, limit(1024), scratch.path())
            .await;

        match result {
            Err(FetchError::HttpError { status, .. }) => assert_eq!(status, 404),
            other => panic!("Expected HttpError, got: {other:?}"),
        }
        assert!(scratch_entries(&scratch).is_empty());
    }

    #[tokio::test]
    async fn test_fetch_server_error_is_not_retried() {
        let Some(mock_server) = mock_server_or_skip().await else {
            return;
        };
        let scratch = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/flaky.wav"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&mock_server)
            .await;

        let target = ValidatedUrl::assume_validated(&format!("{}/flaky.wav", mock_server.uri()));
        let result = HttpClient::new()
            .fetch(&target, limit(1024), scratch.path())
            .await;

        assert!(matches!(
            result,
            Err(FetchError::HttpError { status: 503, .. })
        ));
        mock_server.verify().await;
    }

    #[tokio::test]
    async fn test_fetch_empty_body_removes_file() {
        let Some(mock_server) = mock_server_or_skip().await else {
            return;
        };
        let scratch = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/empty.png"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;

        let target = ValidatedUrl::assume_validated(&format!("{}/empty.png", mock_server.uri()));
        let result = HttpClient::new()
            .fetch(&target, limit(1024), scratch.path())
            .await;

        assert!(matches!(result, Err(FetchError::EmptyBody { .. })));
        assert!(
            scratch_entries(&scratch).is_empty(),
            "empty fetch must not leave a file behind"
        );
    }

    #[tokio::test]
    async fn test_fetch_advertised_length_over_limit_rejected_before_file() {
        let Some(mock_server) = mock_server_or_skip().await else {
            return;
        };
        let scratch = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/big.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 10 * 1024]))
            .mount(&mock_server)
            .await;

        let target = ValidatedUrl::assume_validated(&format!("{}/big.png", mock_server.uri()));
        let result = HttpClient::new()
            .fetch(&target, limit(1024), scratch.path())
            .await;

        assert!(matches!(
            result,
            Err(FetchError::SizeLimitExceeded {
                limit_bytes: 1024,
                ..
            })
        ));
        assert!(scratch_entries(&scratch).is_empty());
    }

    #[tokio::test]
    async fn test_fetch_unadvertised_stream_over_limit_aborts_and_removes_file() {
        let Some(base) = spawn_chunked_server(64, 4096).await else {
            return;
        };
        let scratch = TempDir::new().unwrap();

        // 64 chunks x 4 KiB = 256 KiB streamed with no Content-Length; cap at 10 KiB.
        let target = ValidatedUrl::assume_validated(&format!("{base}/stream.mp3"));
        let result = HttpClient::new()
            .fetch(&target, limit(10 * 1024), scratch.path())
            .await;

        assert!(
            matches!(result, Err(FetchError::SizeLimitExceeded { .. })),
            "Expected SizeLimitExceeded, got: {result:?}"
        );
        assert!(
            scratch_entries(&scratch).is_empty(),
            "partial file must be deleted after size abort"
        );
    }

    #[tokio::test]
    async fn test_fetch_unadvertised_stream_under_limit_succeeds() {
        let Some(base) = spawn_chunked_server(4, 1000).await else {
            return;
        };
        let scratch = TempDir::new().unwrap();

        let target = ValidatedUrl::assume_validated(&format!("{base}/stream.mp3"));
        let fetched = HttpClient::new()
            .fetch(&target, limit(4000), scratch.path())
            .await
            .unwrap();

        assert_eq!(fetched.byte_count, 4000);
        assert_eq!(std::fs::metadata(&fetched.path).unwrap().len(), 4000);
    }

    #[tokio::test]
    async fn test_fetch_body_exactly_at_limit_is_accepted() {
        let Some(mock_server) = mock_server_or_skip().await else {
            return;
        };
        let scratch = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/exact.gif"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![7u8; 2048]))
            .mount(&mock_server)
            .await;

        let target = ValidatedUrl::assume_validated(&format!("{}/exact.gif", mock_server.uri()));
        let fetched = HttpClient::new()
            .fetch(&target, limit(2048), scratch.path())
            .await
            .unwrap();

        assert_eq!(fetched.byte_count, 2048);
    }

    #[tokio::test]
    async fn test_fetch_sends_identifying_user_agent() {
        let Some(mock_server) = mock_server_or_skip().await else {
            return;
        };
        let scratch = TempDir::new().unwrap();
        let expected_ua = user_agent::default_fetch_user_agent();

        Mock::given(method("GET"))
            .and(path("/ua.png"))
            .and(header("user-agent", expected_ua.as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"png".to_vec()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let target = ValidatedUrl::assume_validated(&format!("{}/ua.png", mock_server.uri()));
        let result = HttpClient::new()
            .fetch(&target, limit(1024), scratch.path())
            .await;

        assert!(result.is_ok(), "UA mock should match: {result:?}");
    }

    #[tokio::test]
    async fn test_fetch_sends_no_cookie_or_auth_headers() {
        let Some(mock_server) = mock_server_or_skip().await else {
            return;
        };
        let scratch = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/plain.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"png".to_vec()))
            .mount(&mock_server)
            .await;

        let target = ValidatedUrl::assume_validated(&format!("{}/plain.png", mock_server.uri()));
        HttpClient::new()
            .fetch(&target, limit(1024), scratch.path())
            .await
            .unwrap();

        let requests = mock_server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        let headers = &requests[0].headers;
        assert!(headers.get("cookie").is_none());
        assert!(headers.get("authorization").is_none());
    }

    #[tokio::test]
    async fn test_fetch_follows_redirect_to_host_name() {
        let Some(mock_server) = mock_server_or_skip().await else {
            return;
        };
        let scratch = TempDir::new().unwrap();
        let port = mock_server.address().port();
        let location = format!("http://localhost:{port}/new.png");

        Mock::given(method("GET"))
            .and(path("/old.png"))
            .respond_with(ResponseTemplate::new(302).insert_header("Location", location.as_str()))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/new.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"moved png".to_vec()))
            .mount(&mock_server)
            .await;

        let target = ValidatedUrl::assume_validated(&format!("{}/old.png", mock_server.uri()));
        let fetched = HttpClient::new()
            .fetch(&target, limit(1024), scratch.path())
            .await
            .unwrap();

        assert_eq!(std::fs::read(&fetched.path).unwrap(), b"moved png");
    }

    #[tokio::test]
    async fn test_fetch_refuses_redirect_to_internal_ip_literal() {
        let Some(mock_server) = mock_server_or_skip().await else {
            return;
        };
        let scratch = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/bounce.png"))
            .respond_with(
                ResponseTemplate::new(302)
                    .insert_header("Location", "http://169.254.169.254/latest/meta-data"),
            )
            .mount(&mock_server)
            .await;

        let target = ValidatedUrl::assume_validated(&format!("{}/bounce.png", mock_server.uri()));
        let result = HttpClient::new()
            .fetch(&target, limit(1024), scratch.path())
            .await;

        match result {
            Err(FetchError::BlockedHost { class, .. }) => {
                assert_eq!(class, AddressClass::LinkLocal);
            }
            other => panic!("Expected BlockedHost, got: {other:?}"),
        }
        assert!(scratch_entries(&scratch).is_empty());
    }

    #[tokio::test]
    async fn test_fetch_slow_headers_time_out_and_leave_no_file() {
        let Some(mock_server) = mock_server_or_skip().await else {
            return;
        };
        let scratch = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/slow.png"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(b"data".to_vec())
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&mock_server)
            .await;

        let client = HttpClient::new_with_timeouts(Duration::from_secs(5), Duration::from_secs(1));
        let target = ValidatedUrl::assume_validated(&format!("{}/slow.png", mock_server.uri()));
        let result = client.fetch(&target, limit(1024), scratch.path()).await;

        assert!(
            matches!(
                result,
                Err(FetchError::Timeout { .. } | FetchError::Network { .. })
            ),
            "Expected timeout or network error, got: {result:?}"
        );
        assert!(scratch_entries(&scratch).is_empty());
    }

    #[tokio::test]
    async fn test_fetch_stall_mid_body_times_out_and_leaves_no_file() {
        let Some(base) = spawn_stalling_server(4, Duration::from_secs(10)).await else {
            return;
        };
        let scratch = TempDir::new().unwrap();

        let client = HttpClient::new_with_timeouts(Duration::from_secs(5), Duration::from_secs(1));
        let target = ValidatedUrl::assume_validated(&format!("{base}/stalled.mp3"));
        let started = std::time::Instant::now();
        let result = client.fetch(&target, limit(1024), scratch.path()).await;

        assert!(
            matches!(result, Err(FetchError::Timeout { .. })),
            "Expected Timeout, got: {result:?}"
        );
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(scratch_entries(&scratch).is_empty());
    }

    #[tokio::test]
    async fn test_fetch_missing_scratch_dir_is_io_error() {
        let Some(mock_server) = mock_server_or_skip().await else {
            return;
        };
        let scratch = TempDir::new().unwrap();
        let missing = scratch.path().join("does-not-exist");

        Mock::given(method("GET"))
            .and(path("/cat.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"png".to_vec()))
            .mount(&mock_server)
            .await;

        let target = ValidatedUrl::assume_validated(&format!("{}/cat.png", mock_server.uri()));
        let result = HttpClient::new().fetch(&target, limit(1024), &missing).await;

        assert!(matches!(result, Err(FetchError::Io { .. })));
    }

    #[tokio::test]
    async fn test_concurrent_fetches_use_distinct_files() {
        let Some(mock_server) = mock_server_or_skip().await else {
            return;
        };
        let scratch = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/same.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"same".to_vec()))
            .mount(&mock_server)
            .await;

        let client = HttpClient::new();
        let target = ValidatedUrl::assume_validated(&format!("{}/same.png", mock_server.uri()));
        let (a, b) = tokio::join!(
            client.fetch(&target, limit(1024), scratch.path()),
            client.fetch(&target, limit(1024), scratch.path()),
        );

        let (a, b) = (a.unwrap(), b.unwrap());
        assert_ne!(a.path, b.path);
        assert_eq!(scratch_entries(&scratch).len(), 2);
    }
}
