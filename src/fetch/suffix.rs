//! Scratch-file suffix derivation.
//!
//! The suffix only helps downstream tools that sniff by extension; it never
//! feeds validation. Preference: URL path extension, then the declared
//! content type, then nothing.

use url::Url;

/// Longest extension (including the dot) taken from a URL path.
const MAX_SUFFIX_LEN: usize = 12;

/// Picks the suffix for a scratch file holding the body of `url`.
#[must_use]
pub fn temp_file_suffix(url: &Url, content_type: &str) -> String {
    extension_from_url(url)
        .or_else(|| extension_from_content_type(content_type).map(str::to_string))
        .unwrap_or_default()
}

/// Lower-cased extension of the last path segment, dot included.
pub(crate) fn extension_from_url(url: &Url) -> Option<String> {
    let last_segment = url.path_segments()?.next_back()?;
    let decoded = urlencoding::decode(last_segment).ok()?;
    extension_of(&decoded)
}

/// Lower-cased extension of a file name, dot included.
///
/// Leading dots do not start an extension (`.hidden` has none), and only
/// ASCII alphanumerics are accepted so the suffix is always a safe file name part.
pub(crate) fn extension_of(name: &str) -> Option<String> {
    let stem_len = name.trim_start_matches('.').len();
    let name = &name[name.len() - stem_len..];
    let dot_index = name.rfind('.')?;
    let ext = &name[dot_index..];
    if ext.len() <= 1 || ext.len() > MAX_SUFFIX_LEN {
        return None;
    }
    if !ext[1..].chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Guess a file extension from a content type. `None` for unknown types.
pub(crate) fn extension_from_content_type(content_type: &str) -> Option<&'static str> {
    let mime = normalize_content_type(content_type);

    let ext = match mime.as_str() {
        "image/jpeg" | "image/jpg" | "image/pjpeg" => ".jpg",
        "image/png" => ".png",
        "image/gif" => ".gif",
        "image/webp" => ".webp",
        "image/bmp" => ".bmp",
        "image/tiff" => ".tiff",
        "image/svg+xml" => ".svg",
        "audio/mpeg" | "audio/mp3" => ".mp3",
        "audio/wav" | "audio/x-wav" | "audio/wave" => ".wav",
        "audio/flac" | "audio/x-flac" => ".flac",
        "audio/ogg" => ".ogg",
        "audio/mp4" | "audio/x-m4a" => ".m4a",
        "audio/aac" => ".aac",
        "text/html" => ".html",
        "text/plain" => ".txt",
        "application/json" => ".json",
        "application/xml" | "text/xml" => ".xml",
        "application/pdf" => ".pdf",
        "video/mp4" => ".mp4",
        _ => return None,
    };
    Some(ext)
}

/// Media type without parameters, trimmed and lower-cased.
///
/// `"Image/PNG; charset=binary"` becomes `"image/png"`; a missing header becomes `""`.
#[must_use]
pub fn normalize_content_type(raw: &str) -> String {
    raw.split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}
