use super::{ContentCategory, PageMetadata};

/// An image referenced by a converted page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    /// Canonical absolute URL of the image
    pub source_url: String,
    /// Alt text (may be empty)
    pub alt: String,
    /// URL of the page that referenced it
    pub page_url: String,
    /// Downloaded bytes, when this reference owns the download
    pub bytes: Option<Vec<u8>>,
    /// SHA-256 of `bytes`, hex encoded
    pub content_hash: Option<String>,
    /// Content-Type reported by the image host
    pub content_type: Option<String>,
}

impl ImageReference {
    /// Creates a reference without downloaded bytes
    pub fn new(source_url: impl Into<String>, alt: impl Into<String>, page_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            alt: alt.into(),
            page_url: page_url.into(),
            bytes: None,
            content_hash: None,
            content_type: None,
        }
    }

    /// Size of the downloaded bytes (0 when not downloaded)
    pub fn byte_len(&self) -> usize {
        self.bytes.as_ref().map_or(0, Vec::len)
    }
}

/// An additional output file produced alongside a page's document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtraFile {
    /// File name (sanitized again by the archiver)
    pub name: String,
    /// File contents
    pub bytes: Vec<u8>,
}

/// One page's conversion outcome
///
/// Created by the page converter and consumed exactly once by the archiver.
#[derive(Debug, Clone)]
pub struct ConversionResult {
    /// Final URL of the page
    pub url: String,
    /// Discovery depth (0 for the root)
    pub depth: u32,
    /// Content family; `None` when the page failed before classification
    pub category: Option<ContentCategory>,
    pub success: bool,
    pub title: Option<String>,
    /// Markdown body (empty on failure)
    pub body: String,
    pub images: Vec<ImageReference>,
    /// Multi-file payload for pages that expand into several outputs
    pub files: Vec<ExtraFile>,
    pub metadata: Option<PageMetadata>,
    /// Error text on failure
    pub error: Option<String>,
    /// Non-fatal problems worth surfacing in the manifest
    pub warnings: Vec<String>,
}

impl ConversionResult {
    /// A successful conversion
    pub fn success(
        url: impl Into<String>,
        depth: u32,
        category: ContentCategory,
        title: Option<String>,
        body: String,
    ) -> Self {
        Self {
            url: url.into(),
            depth,
            category: Some(category),
            success: true,
            title,
            body,
            images: Vec::new(),
            files: Vec::new(),
            metadata: None,
            error: None,
            warnings: Vec::new(),
        }
    }

    /// A failed fetch or conversion
    pub fn failure(
        url: impl Into<String>,
        depth: u32,
        category: Option<ContentCategory>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            depth,
            category,
            success: false,
            title: None,
            body: String::new(),
            images: Vec::new(),
            files: Vec::new(),
            metadata: None,
            error: Some(error.into()),
            warnings: Vec::new(),
        }
    }

    /// Returns true for the crawl root
    pub fn is_root(&self) -> bool {
        self.depth == 0
    }

    /// Approximate serialized size: body plus embedded media and extra files
    pub fn approx_size(&self) -> u64 {
        let images: usize = self.images.iter().map(ImageReference::byte_len).sum();
        let files: usize = self.files.iter().map(|f| f.bytes.len()).sum();
        (self.body.len() + images + files) as u64
    }

    /// Best display title: page title, metadata title, or the URL
    pub fn display_title(&self) -> String {
        self.title
            .clone()
            .or_else(|| self.metadata.as_ref().and_then(|m| m.title.clone()))
            .unwrap_or_else(|| self.url.clone())
    }
}
