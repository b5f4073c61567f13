use lazy_static::lazy_static;
use regex::Regex;

/// Rewrites a Google Drive share link to its direct-view form so clients can
/// render it as an image. Anything else is returned unchanged.
pub fn direct_view_url(url: &str) -> String {
    lazy_static! {
        static ref FILE_LINK_RE: Regex =
            Regex::new(r"^https?://drive\.google\.com/file/d/([A-Za-z0-9_-]+)").unwrap();
        static ref ID_PARAM_RE: Regex =
            Regex::new(r"^https?://drive\.google\.com/(?:open|uc)\?(?:[^#]*&)?id=([A-Za-z0-9_-]+)")
                .unwrap();
    }

    FILE_LINK_RE
        .captures(url)
        .or_else(|| ID_PARAM_RE.captures(url))
        .and_then(|c| c.get(1))
        .map(|id| format!("https://drive.google.com/uc?export=view&id={}", id.as_str()))
        .unwrap_or_else(|| url.to_string())
}
