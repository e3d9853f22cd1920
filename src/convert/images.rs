//! Embedded image normalization

use super::ImageReference;
use crate::url::path_extension;
use std::collections::HashSet;
use url::Url;

/// File extensions recognized as images
const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "webp", "svg", "bmp", "ico", "avif", "tif", "tiff",
];

/// Path fragments used by common image hosting and CMS upload schemes
const IMAGE_PATH_PATTERNS: &[&str] = &[
    "/images/",
    "/image/",
    "/img/",
    "/media/",
    "/uploads/",
    "/wp-content/uploads/",
    "/_next/image",
    "/photos/",
];

/// Hosts that serve images without telling extensions
const IMAGE_HOST_PATTERNS: &[&str] = &[
    "images.",
    "img.",
    "i.imgur.com",
    "googleusercontent.com",
    "res.cloudinary.com",
    "imgix.net",
    "gravatar.com",
];

/// An `<img>` as found in the page, before normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageCandidate {
    pub src: String,
    pub alt: String,
}

/// Resolves an image `src` to its canonical absolute URL
///
/// Data URIs and non-HTTP(S) sources yield `None`. The fragment is dropped;
/// the query is kept because image services key variants on it.
pub fn canonical_image_url(src: &str, base: &Url) -> Option<Url> {
    let src = src.trim();
    if src.is_empty() || src.to_ascii_lowercase().starts_with("data:") {
        return None;
    }

    let mut url = base.join(src).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    url.set_fragment(None);
    Some(url)
}

/// Returns true if the URL looks like an image
pub fn is_image_url(url: &Url) -> bool {
    let path = url.path().to_ascii_lowercase();

    if let Some(ext) = path_extension(&path) {
        if IMAGE_EXTENSIONS.contains(&ext) {
            return true;
        }
    }

    if IMAGE_PATH_PATTERNS.iter().any(|p| path.contains(p)) {
        return true;
    }

    url.host_str()
        .map(|host| {
            let host = host.to_ascii_lowercase();
            IMAGE_HOST_PATTERNS
                .iter()
                .any(|p| host.starts_with(p) || host.ends_with(p))
        })
        .unwrap_or(false)
}

/// Normalizes a page's image candidates into references
///
/// Skips data URIs, resolves relative sources against `base`, keeps only
/// URLs that look like images and drops repeats within the page (first
/// occurrence wins).
pub fn normalize_images(
    candidates: &[ImageCandidate],
    base: &Url,
    page_url: &str,
) -> Vec<ImageReference> {
    let mut seen = HashSet::new();
    let mut images = Vec::new();

    for candidate in candidates {
        let Some(url) = canonical_image_url(&candidate.src, base) else {
            continue;
        };
        if !is_image_url(&url) {
            tracing::trace!("Skipping non-image source {}", url);
            continue;
        }
        if seen.insert(url.to_string()) {
            images.push(ImageReference::new(
                url.as_str(),
                candidate.alt.trim(),
                page_url,
            ));
        }
    }

    images
}
