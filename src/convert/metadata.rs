//! Out-of-band page metadata (title, description, Open Graph)

use super::ConvertError;
use scraper::{Html, Selector};

/// Descriptive metadata pulled from a page's `<head>`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub og_title: Option<String>,
    pub og_description: Option<String>,
    pub og_image: Option<String>,
    pub language: Option<String>,
}

impl PageMetadata {
    /// Returns true if nothing was found
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Description, preferring the plain meta tag over Open Graph
    pub fn summary(&self) -> Option<&str> {
        self.description
            .as_deref()
            .or(self.og_description.as_deref())
    }
}

/// Extracts metadata from a raw HTML body
///
/// Unlike content conversion this is strict about encoding: a body that is
/// not valid UTF-8 is reported as [`ConvertError::Decode`] so the caller can
/// fall back to a result without metadata.
pub fn extract_metadata(raw: &[u8]) -> Result<PageMetadata, ConvertError> {
    let html = std::str::from_utf8(raw).map_err(|e| ConvertError::Decode(e.to_string()))?;
    let document = Html::parse_document(html);

    Ok(PageMetadata {
        title: select_text(&document, "title"),
        description: meta_content(&document, "meta[name='description']"),
        og_title: meta_content(&document, "meta[property='og:title']"),
        og_description: meta_content(&document, "meta[property='og:description']"),
        og_image: meta_content(&document, "meta[property='og:image']"),
        language: select_attr(&document, "html[lang]", "lang"),
    })
}

fn select_text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn select_attr(document: &Html, selector: &str, attr: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr(attr))
        .map(|v| v.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn meta_content(document: &Html, selector: &str) -> Option<String> {
    select_attr(document, selector, "content")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_metadata() {
        let html = br#"<html lang="en"><head>
            <title>Docs</title>
            <meta name="description" content="All the docs">
            <meta property="og:title" content="Docs | Acme">
            <meta property="og:image" content="https://acme.com/og.png">
        </head><body></body></html>"#;

        let meta = extract_metadata(html).unwrap();
        assert_eq!(meta.title.as_deref(), Some("Docs"));
        assert_eq!(meta.summary(), Some("All the docs"));
        assert_eq!(meta.og_title.as_deref(), Some("Docs | Acme"));
        assert_eq!(meta.og_image.as_deref(), Some("https://acme.com/og.png"));
        assert_eq!(meta.language.as_deref(), Some("en"));
    }

    #[test]
    fn test_missing_metadata_is_empty() {
        let meta = extract_metadata(b"<html><body>plain</body></html>").unwrap();
        assert!(meta.is_empty());
    }

    #[test]
    fn test_invalid_utf8_is_decode_error() {
        let result = extract_metadata(&[0x3c, 0x68, 0xff, 0xfe]);
        assert!(matches!(result, Err(ConvertError::Decode(_))));
    }
}
