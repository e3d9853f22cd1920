//! Converter registry keyed by [`ContentCategory`]

use super::{
    ContentCategory, ConvertError, ExtraFile, HtmlConverter, ImageReference, PageMetadata,
};
use crate::crawler::ContentKind;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use url::Url;

/// Per-call conversion options
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Classification of the response being converted
    pub kind: ContentKind,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            kind: ContentKind::Html,
        }
    }
}

/// Output of a [`DocumentConverter`]
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub title: Option<String>,
    /// Markdown content
    pub content: String,
    pub images: Vec<ImageReference>,
    /// Additional files that belong with the document
    pub files: Vec<ExtraFile>,
    pub metadata: Option<PageMetadata>,
    pub warnings: Vec<String>,
}

/// Transforms a raw response body into a [`Document`]
///
/// Implementations must be deterministic for identical input and must not
/// perform network I/O.
pub trait DocumentConverter: Send + Sync {
    fn convert(
        &self,
        raw: &[u8],
        base_url: &Url,
        options: &ConvertOptions,
    ) -> Result<Document, ConvertError>;
}

/// Plain text and Markdown pass through unchanged
#[derive(Debug, Clone, Default)]
pub struct TextConverter;

impl DocumentConverter for TextConverter {
    fn convert(
        &self,
        raw: &[u8],
        _base_url: &Url,
        options: &ConvertOptions,
    ) -> Result<Document, ConvertError> {
        let text = std::str::from_utf8(raw).map_err(|e| ConvertError::Decode(e.to_string()))?;

        let title = match options.kind {
            ContentKind::Markdown => text
                .lines()
                .find_map(|line| line.strip_prefix("# "))
                .map(|t| t.trim().to_string()),
            _ => None,
        };

        Ok(Document {
            title,
            content: text.to_string(),
            ..Document::default()
        })
    }
}

/// Structured payloads become a fenced code block plus the raw file
#[derive(Debug, Clone, Default)]
pub struct DataConverter;

impl DocumentConverter for DataConverter {
    fn convert(
        &self,
        raw: &[u8],
        base_url: &Url,
        options: &ConvertOptions,
    ) -> Result<Document, ConvertError> {
        let text = std::str::from_utf8(raw).map_err(|e| ConvertError::Decode(e.to_string()))?;

        let (lang, ext) = match options.kind {
            ContentKind::Xml => ("xml", "xml"),
            _ => ("json", "json"),
        };

        let name = base_url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|s| !s.is_empty())
            .map(|s| s.trim_end_matches(&format!(".{}", ext)).to_string())
            .unwrap_or_else(|| "payload".to_string());

        let content = format!("# {}\n\nSource: <{}>\n\n```{}\n{}\n```\n", name, base_url, lang, text.trim_end());

        Ok(Document {
            title: Some(name.clone()),
            content,
            files: vec![ExtraFile {
                name: format!("{}.{}", name, ext),
                bytes: raw.to_vec(),
            }],
            ..Document::default()
        })
    }
}

/// One converter per content category, resolved once at startup
#[derive(Clone)]
pub struct ConverterRegistry {
    converters: HashMap<ContentCategory, Arc<dyn DocumentConverter>>,
}

impl ConverterRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self {
            converters: HashMap::new(),
        }
    }

    /// The standard table: HTML, text and data converters
    pub fn with_defaults() -> Self {
        Self::new()
            .register(ContentCategory::Web, HtmlConverter::new())
            .register(ContentCategory::Text, TextConverter)
            .register(ContentCategory::Data, DataConverter)
    }

    /// Registers (or replaces) the converter for a category
    pub fn register(
        mut self,
        category: ContentCategory,
        converter: impl DocumentConverter + 'static,
    ) -> Self {
        self.converters.insert(category, Arc::new(converter));
        self
    }

    /// Looks up the converter for a category
    pub fn get(&self, category: ContentCategory) -> Option<Arc<dyn DocumentConverter>> {
        self.converters.get(&category).cloned()
    }

    /// Returns true if the category has a converter
    pub fn supports(&self, category: ContentCategory) -> bool {
        self.converters.contains_key(&category)
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut categories: Vec<_> = self.converters.keys().collect();
        categories.sort();
        f.debug_struct("ConverterRegistry")
            .field("categories", &categories)
            .finish()
    }
}
