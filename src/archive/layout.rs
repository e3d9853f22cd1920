//! Archive path construction
//!
//! Every name written into the archive goes through [`sanitize_name`]: no
//! path separators, no traversal, no reserved characters, bounded length.

use std::collections::HashSet;
use url::Url;

/// Name used when nothing usable can be derived
pub const FALLBACK_NAME: &str = "index";

/// Device names Windows refuses as file stems
const RESERVED_STEMS: &[&str] = &[
    "con", "prn", "aux", "nul", "com1", "com2", "com3", "com4", "lpt1", "lpt2", "lpt3",
];

/// Reduces an arbitrary string to a safe single path component
///
/// Keeps ASCII alphanumerics, `.`, `_` and `-`; everything else becomes
/// `-`. Runs of `-` collapse, leading and trailing `.`/`-` are trimmed and
/// the result is cut to `max_len` characters. Returns [`FALLBACK_NAME`]
/// when nothing is left.
pub fn sanitize_name(name: &str, max_len: usize) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        let c = if c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-' {
            c
        } else {
            '-'
        };
        if c == '-' && out.ends_with('-') {
            continue;
        }
        out.push(c);
    }

    while out.contains("..") {
        out = out.replace("..", ".");
    }

    let mut out: String = out
        .trim_matches(|c| c == '.' || c == '-')
        .chars()
        .take(max_len)
        .collect();
    out = out.trim_end_matches(|c| c == '.' || c == '-').to_string();

    if out.is_empty() {
        return FALLBACK_NAME.to_string();
    }

    let stem = out.split('.').next().unwrap_or("").to_ascii_lowercase();
    if RESERVED_STEMS.contains(&stem.as_str()) {
        out.insert(0, '_');
    }

    out
}

/// Derives a page slug from the URL path
///
/// Path segments are percent-decoded and joined with `-`, so
/// `/docs/getting-started/` becomes `docs-getting-started`. The root path
/// yields [`FALLBACK_NAME`]. A trailing `.html`-style extension is dropped.
pub fn page_slug(url: &Url, max_len: usize) -> String {
    let segments: Vec<String> = url
        .path_segments()
        .map(|segments| {
            segments
                .filter(|s| !s.is_empty())
                .map(|s| {
                    ::url::form_urlencoded::parse(format!("x={}", s).as_bytes())
                        .next()
                        .map(|(_, v)| v.into_owned())
                        .unwrap_or_else(|| s.to_string())
                })
                .collect()
        })
        .unwrap_or_default();

    let mut joined = segments.join("-");
    for ext in [".html", ".htm", ".php", ".aspx", ".md", ".txt", ".json", ".xml"] {
        if let Some(stripped) = joined.strip_suffix(ext) {
            joined = stripped.to_string();
            break;
        }
    }

    sanitize_name(&joined, max_len)
}

/// Directory name for a host
pub fn host_dir(url: &Url) -> String {
    sanitize_name(url.host_str().unwrap_or(""), 253)
}

/// File name for a downloaded asset
///
/// Uses the last path segment; when it has no extension one is derived from
/// the content type.
pub fn asset_file_name(url: &Url, content_type: Option<&str>, max_len: usize) -> String {
    let last = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|s| !s.is_empty())
        .unwrap_or("image");

    let name = sanitize_name(last, max_len);
    if name.contains('.') {
        return name;
    }

    match content_type.and_then(extension_for_mime) {
        Some(ext) => format!("{}.{}", name, ext),
        None => name,
    }
}

fn extension_for_mime(content_type: &str) -> Option<&'static str> {
    let mime = content_type.split(';').next()?.trim().to_ascii_lowercase();
    Some(match mime.as_str() {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/svg+xml" => "svg",
        "image/avif" => "avif",
        "image/x-icon" | "image/vnd.microsoft.icon" => "ico",
        "image/bmp" => "bmp",
        _ => return None,
    })
}

/// Relative path from one archive file to another
///
/// ```
/// use sumi_scroll::archive::relative_path;
///
/// assert_eq!(
///     relative_path("web/a.com/pages/intro.md", "web/a.com/assets/logo.png"),
///     "../assets/logo.png"
/// );
/// ```
pub fn relative_path(from_file: &str, to_file: &str) -> String {
    let from: Vec<&str> = from_file.split('/').collect();
    let to: Vec<&str> = to_file.split('/').collect();
    let from_dirs = &from[..from.len().saturating_sub(1)];

    let common = from_dirs
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<&str> = vec![".."; from_dirs.len() - common];
    parts.extend_from_slice(&to[common..]);
    parts.join("/")
}

/// Hands out unique archive paths
///
/// When a name is already taken, `-2`, `-3`, ... is appended to the stem
/// until it is free. Nothing is ever overwritten.
#[derive(Debug, Default)]
pub struct PathAllocator {
    used: HashSet<String>,
}

impl PathAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves a path for `dir/stem[.ext]`
    pub fn allocate(&mut self, dir: &str, stem: &str, ext: Option<&str>) -> String {
        let build = |stem: &str| {
            let file = match ext {
                Some(ext) => format!("{}.{}", stem, ext),
                None => stem.to_string(),
            };
            if dir.is_empty() {
                file
            } else {
                format!("{}/{}", dir.trim_end_matches('/'), file)
            }
        };

        let mut candidate = build(stem);
        let mut counter = 2;
        while self.used.contains(&candidate) {
            candidate = build(&format!("{}-{}", stem, counter));
            counter += 1;
        }

        self.used.insert(candidate.clone());
        candidate
    }

    /// Reserves a path for a file name that may carry an extension
    pub fn allocate_file(&mut self, dir: &str, file_name: &str) -> String {
        match file_name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => self.allocate(dir, stem, Some(ext)),
            _ => self.allocate(dir, file_name, None),
        }
    }

    /// Returns true if the path is taken
    pub fn contains(&self, path: &str) -> bool {
        self.used.contains(path)
    }

    pub fn len(&self) -> usize {
        self.used.len()
    }

    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("Hello World!", 100), "Hello-World");
        assert_eq!(sanitize_name("../../etc/passwd", 100), "etc-passwd");
        assert_eq!(sanitize_name("a<b>c:d|e?f*", 100), "a-b-c-d-e-f");
        assert_eq!(sanitize_name("...", 100), FALLBACK_NAME);
        assert_eq!(sanitize_name("", 100), FALLBACK_NAME);
        assert_eq!(sanitize_name("con", 100), "_con");
    }

    #[test]
    fn test_sanitize_truncates() {
        let long = "a".repeat(300);
        assert_eq!(sanitize_name(&long, 100).len(), 100);
        assert_eq!(sanitize_name("abc-def", 4), "abc");
    }

    #[test]
    fn test_page_slug() {
        assert_eq!(page_slug(&url("https://a.com/"), 100), "index");
        assert_eq!(
            page_slug(&url("https://a.com/docs/getting-started/"), 100),
            "docs-getting-started"
        );
        assert_eq!(page_slug(&url("https://a.com/about.html"), 100), "about");
        assert_eq!(
            page_slug(&url("https://a.com/caf%C3%A9/menu"), 100),
            "caf-menu"
        );
    }

    #[test]
    fn test_page_slug_is_deterministic() {
        let u = url("https://a.com/blog/2024/01/post");
        assert_eq!(page_slug(&u, 100), page_slug(&u, 100));
    }

    #[test]
    fn test_asset_file_name() {
        assert_eq!(
            asset_file_name(&url("https://a.com/img/logo.png"), None, 100),
            "logo.png"
        );
        assert_eq!(
            asset_file_name(&url("https://cdn.a.com/i/abc123"), Some("image/jpeg"), 100),
            "abc123.jpg"
        );
        assert_eq!(asset_file_name(&url("https://a.com/"), None, 100), "image");
    }

    #[test]
    fn test_relative_path() {
        assert_eq!(
            relative_path("web/a.com/index.md", "web/a.com/assets/x.png"),
            "assets/x.png"
        );
        assert_eq!(
            relative_path("web/b.a.com/pages/p.md", "web/a.com/assets/x.png"),
            "../../a.com/assets/x.png"
        );
        assert_eq!(
            relative_path("data/status.md", "data/status_attachments/status.json"),
            "status_attachments/status.json"
        );
    }

    #[test]
    fn test_allocator_disambiguates() {
        let mut paths = PathAllocator::new();
        assert_eq!(paths.allocate("web/a/pages", "intro", Some("md")), "web/a/pages/intro.md");
        assert_eq!(paths.allocate("web/a/pages", "intro", Some("md")), "web/a/pages/intro-2.md");
        assert_eq!(paths.allocate("web/a/pages", "intro", Some("md")), "web/a/pages/intro-3.md");
        assert_eq!(paths.allocate("web/b/pages", "intro", Some("md")), "web/b/pages/intro.md");
        assert_eq!(paths.len(), 4);
    }

    #[test]
    fn test_allocate_file_splits_extension() {
        let mut paths = PathAllocator::new();
        assert_eq!(paths.allocate_file("assets", "logo.png"), "assets/logo.png");
        assert_eq!(paths.allocate_file("assets", "logo.png"), "assets/logo-2.png");
        assert_eq!(paths.allocate_file("assets", "README"), "assets/README");
    }
}
