//! Content classification for fetched files.
//!
//! Decides image / audio / unsupported from evidence, strongest first:
//!
//! 1. an explicit caller hint
//! 2. the server-declared content type
//! 3. the file extension
//!
//! Nothing here opens the file; decoding is the caller's job and only happens
//! after a supported classification.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::fetch::{extension_of, normalize_content_type};

/// Content types accepted as images.
pub const IMAGE_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp", "image/gif"];

/// Content types accepted as audio.
pub const AUDIO_MIME_TYPES: &[&str] = &[
    "audio/mpeg",
    "audio/wav",
    "audio/x-wav",
    "audio/flac",
    "audio/x-flac",
    "audio/ogg",
    "audio/mp4",
];

/// File extensions accepted as images (lower-case, dot included).
pub const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".webp", ".gif"];

/// File extensions accepted as audio (lower-case, dot included).
pub const AUDIO_EXTENSIONS: &[&str] = &[".mp3", ".wav", ".flac", ".ogg", ".m4a", ".aac"];

/// What the caller expects the resource to be.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeHint {
    /// Decide from content type and extension.
    #[default]
    Auto,
    /// Treat as image regardless of other evidence.
    Image,
    /// Treat as audio regardless of other evidence.
    Audio,
}

impl fmt::Display for TypeHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Auto => "auto",
            Self::Image => "image",
            Self::Audio => "audio",
        })
    }
}

/// Error for an unrecognised type hint string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown type hint {0:?}; expected auto, image, or audio")]
pub struct ParseTypeHintError(String);

impl FromStr for TypeHint {
    type Err = ParseTypeHintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "image" => Ok(Self::Image),
            "audio" => Ok(Self::Audio),
            _ => Err(ParseTypeHintError(s.to_string())),
        }
    }
}

/// Outcome of classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    /// Decode as a still image.
    Image,
    /// Decode as an audio waveform.
    Audio,
    /// Neither; the pipeline fails closed.
    Unsupported,
}

impl Classification {
    /// True for [`Classification::Image`] and [`Classification::Audio`].
    #[must_use]
    pub fn is_supported(self) -> bool {
        !matches!(self, Self::Unsupported)
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Image => "image",
            Self::Audio => "audio",
            Self::Unsupported => "unsupported",
        })
    }
}

/// Classifies a fetched file. First matching rule wins.
///
/// `content_type` may carry parameters or be empty; it is normalized first.
#[must_use]
pub fn classify(content_type: &str, path: &Path, hint: TypeHint) -> Classification {
    match hint {
        TypeHint::Image => return Classification::Image,
        TypeHint::Audio => return Classification::Audio,
        TypeHint::Auto => {}
    }

    let mime = normalize_content_type(content_type);
    if IMAGE_MIME_TYPES.contains(&mime.as_str()) {
        return Classification::Image;
    }
    if AUDIO_MIME_TYPES.contains(&mime.as_str()) {
        return Classification::Audio;
    }

    let extension = path
        .file_name()
        .and_then(|name| name.to_str())
        .and_then(extension_of);
    let classification = match extension.as_deref() {
        Some(ext) if IMAGE_EXTENSIONS.contains(&ext) => Classification::Image,
        Some(ext) if AUDIO_EXTENSIONS.contains(&ext) => Classification::Audio,
        _ => Classification::Unsupported,
    };
    debug!(
        content_type = %mime,
        extension = ?extension,
        classification = %classification,
        "classified by extension fallback"
    );
    classification
}

/// Best-guess content type for a file extension (dot included, any case).
///
/// Used for local files, which have no server-declared type.
#[must_use]
pub fn content_type_for_extension(extension: &str) -> Option<&'static str> {
    let mime = match extension.to_ascii_lowercase().as_str() {
        ".jpg" | ".jpeg" => "image/jpeg",
        ".png" => "image/png",
        ".webp" => "image/webp",
        ".gif" => "image/gif",
        ".mp3" => "audio/mpeg",
        ".wav" => "audio/x-wav",
        ".flac" => "audio/flac",
        ".ogg" => "audio/ogg",
        ".m4a" => "audio/mp4",
        ".aac" => "audio/aac",
        _ => return None,
    };
    Some(mime)
}
