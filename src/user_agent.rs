//! User-Agent string sent with every fetch.

/// Product token shared by all requests.
const PRODUCT: &str = "media-fetch";

/// Default User-Agent for fetch requests (identifies the tool and version).
#[must_use]
pub(crate) fn default_fetch_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("{PRODUCT}/{version} (image-audio-fetcher)")
}
