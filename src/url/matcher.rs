use crate::url::normalize::is_tracking_param;
use std::fmt;
use url::Url;

/// File extensions of static assets that are never crawled as pages
const STATIC_ASSET_EXTENSIONS: &[&str] = &[
    "css", "js", "mjs", "map", "png", "jpg", "jpeg", "gif", "webp", "svg", "ico", "bmp", "avif",
    "tif", "tiff", "woff", "woff2", "ttf", "otf", "eot", "mp3", "mp4", "m4a", "wav", "ogg", "webm",
    "mov", "avi", "zip", "gz", "tgz", "rar", "7z", "tar", "exe", "dmg", "msi", "pdf", "doc",
    "docx", "xls", "xlsx", "ppt", "pptx", "apk", "iso",
];

/// Path prefixes of administrative or account areas
const ADMIN_PATH_PREFIXES: &[&str] = &[
    "/wp-admin",
    "/wp-login.php",
    "/wp-json",
    "/admin",
    "/administrator",
    "/login",
    "/logout",
    "/signin",
    "/sign-in",
    "/signup",
    "/sign-up",
    "/register",
    "/account",
    "/cart",
    "/checkout",
    "/cgi-bin",
    "/user/login",
];

/// Query keys that carry a session identifier
const SESSION_PARAMS: &[&str] = &[
    "sid",
    "sessionid",
    "session_id",
    "phpsessid",
    "jsessionid",
    "aspsessionid",
    "token",
    "auth",
];

/// Why a URL was excluded from the crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExclusionReason {
    /// Path points at a static asset (stylesheet, image, binary download, ...)
    StaticAsset,
    /// Query string carries tracking parameters
    TrackingParameters,
    /// URL carries a session identifier
    SessionBearing,
    /// Administrative or account path
    AdministrativePath,
    /// Matches a configured excluded path pattern
    Configured,
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::StaticAsset => "static asset",
            Self::TrackingParameters => "tracking parameters",
            Self::SessionBearing => "session identifier",
            Self::AdministrativePath => "administrative path",
            Self::Configured => "configured exclusion",
        };
        f.write_str(label)
    }
}

/// Checks if a domain matches a wildcard pattern
///
/// This function supports two types of patterns:
/// 1. Exact match: "example.com" matches only "example.com"
/// 2. Wildcard match: "*.example.com" matches:
///    - "example.com" (the bare domain)
///    - "blog.example.com" (single subdomain)
///    - "api.v2.example.com" (nested subdomains)
///
/// # Examples
///
/// ```
/// use sumi_scroll::url::matches_wildcard;
///
/// assert!(matches_wildcard("example.com", "example.com"));
/// assert!(matches_wildcard("*.github.io", "acme.github.io"));
/// assert!(!matches_wildcard("*.github.io", "github.com"));
/// ```
pub fn matches_wildcard(pattern: &str, candidate: &str) -> bool {
    if let Some(base) = pattern.strip_prefix("*.") {
        candidate == base || candidate.ends_with(&format!(".{}", base))
    } else {
        candidate == pattern
    }
}

/// Returns the reason a URL must not be crawled, if any
///
/// # Arguments
///
/// * `url` - The normalized URL to check
/// * `extra_paths` - Configured path substrings that also exclude a URL
///
/// # Returns
///
/// * `Some(ExclusionReason)` - The first matching exclusion
/// * `None` - The URL may be crawled
pub fn exclusion_reason(url: &Url, extra_paths: &[String]) -> Option<ExclusionReason> {
    let path = url.path().to_ascii_lowercase();

    if let Some(ext) = path_extension(&path) {
        if STATIC_ASSET_EXTENSIONS.contains(&ext) {
            return Some(ExclusionReason::StaticAsset);
        }
    }

    if ADMIN_PATH_PREFIXES.iter().any(|prefix| {
        path == *prefix || path.starts_with(&format!("{}/", prefix))
    }) {
        return Some(ExclusionReason::AdministrativePath);
    }

    if path.contains(";jsessionid=") || path.contains(";sessionid=") {
        return Some(ExclusionReason::SessionBearing);
    }

    for (key, _) in url.query_pairs() {
        let key = key.to_ascii_lowercase();
        if SESSION_PARAMS.contains(&key.as_str()) {
            return Some(ExclusionReason::SessionBearing);
        }
        if is_tracking_param(&key) {
            return Some(ExclusionReason::TrackingParameters);
        }
    }

    if extra_paths
        .iter()
        .any(|pattern| path.contains(&pattern.to_ascii_lowercase()))
    {
        return Some(ExclusionReason::Configured);
    }

    None
}

/// Returns the lowercase extension of the last path segment
pub fn path_extension(path: &str) -> Option<&str> {
    let last = path.rsplit('/').next()?;
    let (stem, ext) = last.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext)
}
