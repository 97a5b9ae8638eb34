//! Local file sources.
//!
//! Trusted callers may point the pipeline at a file that is already on disk,
//! either as a `file://` URL or a plain path. Relative paths that do not exist
//! as given are retried under the configured input directory. No network I/O
//! happens here and address validation does not apply; the URL validator still
//! rejects these inputs.

use std::path::{Path, PathBuf};

use tracing::debug;
use url::Url;

use crate::classify::content_type_for_extension;
use crate::fetch::{FetchError, extension_of};

/// A file on disk plus the content type guessed from its extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalSource {
    /// Existing regular file.
    pub path: PathBuf,
    /// Guessed content type; empty when the extension is unknown.
    pub content_type: String,
}

/// Resolves `raw` to an existing local file.
///
/// # Errors
///
/// - [`FetchError::InvalidScheme`] for URLs with any scheme other than `file`
/// - [`FetchError::LocalFileNotFound`] when no candidate path is a regular file
pub async fn resolve_local_source(
    raw: &str,
    input_dir: Option<&Path>,
) -> Result<LocalSource, FetchError> {
    let candidates = candidate_paths(raw, input_dir)?;

    let mut last = PathBuf::from(raw);
    for candidate in candidates {
        if is_regular_file(&candidate).await {
            debug!(path = %candidate.display(), "resolved local source");
            let content_type = guess_content_type(&candidate);
            return Ok(LocalSource {
                path: candidate,
                content_type,
            });
        }
        last = candidate;
    }
    Err(FetchError::LocalFileNotFound { path: last })
}

fn candidate_paths(raw: &str, input_dir: Option<&Path>) -> Result<Vec<PathBuf>, FetchError> {
    if let Ok(url) = Url::parse(raw) {
        if url.scheme() == "file" {
            let path = url
                .to_file_path()
                .map_err(|()| FetchError::invalid_scheme(raw))?;
            return Ok(vec![path]);
        }
        // Single-letter "schemes" are Windows drive letters, not URLs.
        if url.scheme().len() > 1 {
            return Err(FetchError::invalid_scheme(raw));
        }
    }

    let as_given = PathBuf::from(raw);
    let mut candidates = vec![as_given.clone()];
    if let Some(dir) = input_dir
        && as_given.is_relative()
    {
        candidates.push(dir.join(&as_given));
    }
    Ok(candidates)
}

async fn is_regular_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .is_ok_and(|metadata| metadata.is_file())
}

fn guess_content_type(path: &Path) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .and_then(extension_of)
        .and_then(|ext| content_type_for_extension(&ext))
        .unwrap_or_default()
        .to_string()
}
