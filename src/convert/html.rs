//! HTML to Markdown conversion

use super::images::{canonical_image_url, normalize_images, ImageCandidate};
use super::{ConvertError, ConvertOptions, Document, DocumentConverter};
use htmd::HtmlToMarkdown;
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::OnceLock;
use url::Url;

/// Elements dropped before conversion
const SKIP_TAGS: &[&str] = &[
    "script", "style", "noscript", "iframe", "svg", "template", "form", "nav", "footer",
];

/// Candidate content roots, most specific first
const CONTENT_ROOTS: &[&str] = &["main", "article", "[role='main']", "body"];

/// Client-side framework mount points
const SHELL_MARKERS: &[&str] = &[
    "#root",
    "#app",
    "#__next",
    "#__nuxt",
    "[ng-app]",
    "[ng-version]",
    "[data-reactroot]",
];

/// Pages with less visible text than this may be client-rendered shells
const SHELL_TEXT_THRESHOLD: usize = 200;

/// Converts HTML pages into Markdown with `htmd`
///
/// The main content element (`<main>`, `<article>`, `role=main`, falling
/// back to `<body>`) is converted; navigation, scripts and styling are
/// dropped. Image links in the output are made absolute so the archiver
/// can rewrite them to archived assets.
#[derive(Debug, Clone, Default)]
pub struct HtmlConverter;

impl HtmlConverter {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentConverter for HtmlConverter {
    fn convert(
        &self,
        raw: &[u8],
        base_url: &Url,
        _options: &ConvertOptions,
    ) -> Result<Document, ConvertError> {
        let html = String::from_utf8_lossy(raw);
        let document = Html::parse_document(&html);

        let title = extract_title(&document);
        let content_html = content_root(&document);
        let candidates = image_candidates(&content_html);

        let converter = HtmlToMarkdown::builder()
            .skip_tags(SKIP_TAGS.to_vec())
            .build();
        let markdown = converter
            .convert(&content_html)
            .map_err(|e| ConvertError::Extraction(e.to_string()))?;

        let content = tidy_markdown(&absolutize_image_links(&markdown, base_url));

        let mut warnings = Vec::new();
        if is_dynamic_shell(&document, &content) {
            warnings.push(format!(
                "{} looks like a client-rendered shell; archived content may be incomplete",
                base_url
            ));
        }

        Ok(Document {
            title,
            content,
            images: normalize_images(&candidates, base_url, base_url.as_str()),
            files: Vec::new(),
            metadata: None,
            warnings,
        })
    }
}

/// Detects pages whose content is rendered by JavaScript
///
/// A page qualifies when it exposes a framework mount point (or asks the
/// reader to enable JavaScript) and the extracted text is nearly empty.
pub fn is_dynamic_shell(document: &Html, extracted: &str) -> bool {
    let visible: usize = extracted
        .chars()
        .filter(|c| c.is_alphanumeric())
        .count();
    if visible >= SHELL_TEXT_THRESHOLD {
        return false;
    }

    let has_mount_point = SHELL_MARKERS.iter().any(|marker| {
        Selector::parse(marker)
            .map(|selector| document.select(&selector).next().is_some())
            .unwrap_or(false)
    });

    has_mount_point || extracted.to_ascii_lowercase().contains("enable javascript")
}

fn extract_title(document: &Html) -> Option<String> {
    ["title", "h1"].iter().find_map(|tag| {
        let selector = Selector::parse(tag).ok()?;
        document
            .select(&selector)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|s| !s.is_empty())
    })
}

/// HTML of the first content root that has any text
fn content_root(document: &Html) -> String {
    for root in CONTENT_ROOTS {
        let Ok(selector) = Selector::parse(root) else {
            continue;
        };
        if let Some(element) = document.select(&selector).next() {
            if element.text().any(|t| !t.trim().is_empty()) || *root == "body" {
                return element.html();
            }
        }
    }
    document.html()
}

fn image_candidates(content_html: &str) -> Vec<ImageCandidate> {
    let fragment = Html::parse_fragment(content_html);
    let Ok(selector) = Selector::parse("img") else {
        return Vec::new();
    };

    fragment
        .select(&selector)
        .filter_map(|img| {
            let el = img.value();
            let src = el
                .attr("src")
                .filter(|s| !s.trim().is_empty() && !s.trim_start().starts_with("data:"))
                .or_else(|| el.attr("data-src"))?;
            Some(ImageCandidate {
                src: src.to_string(),
                alt: el.attr("alt").unwrap_or("").to_string(),
            })
        })
        .collect()
}

fn image_link_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r#"!\[([^\]]*)\]\(([^)\s]+)((?:\s+"[^"]*")?)\)"#).ok())
        .as_ref()
}

/// Rewrites `![alt](src)` so that `src` is the canonical absolute URL
fn absolutize_image_links(markdown: &str, base_url: &Url) -> String {
    let Some(pattern) = image_link_pattern() else {
        return markdown.to_string();
    };

    pattern
        .replace_all(markdown, |caps: &regex::Captures<'_>| {
            match canonical_image_url(&caps[2], base_url) {
                Some(url) => format!("![{}]({}{})", &caps[1], url, &caps[3]),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Collapses runs of blank lines and trims the document
fn tidy_markdown(markdown: &str) -> String {
    let mut out = String::with_capacity(markdown.len());
    let mut blank_run = 0;

    for line in markdown.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }

    let trimmed = out.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{}\n", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convert(html: &str) -> Document {
        let base = Url::parse("https://acme.com/docs/intro").unwrap();
        HtmlConverter::new()
            .convert(html.as_bytes(), &base, &ConvertOptions::default())
            .unwrap()
    }

    #[test]
    fn test_converts_main_content() {
        let doc = convert(
            r#"<html><head><title>Intro</title></head><body>
                <nav><a href="/">Home</a></nav>
                <main><h1>Getting started</h1><p>Install the <strong>tool</strong>.</p></main>
                <footer>Copyright</footer>
            </body></html>"#,
        );

        assert_eq!(doc.title.as_deref(), Some("Intro"));
        assert!(doc.content.contains("Getting started"));
        assert!(doc.content.contains("**tool**"));
        assert!(!doc.content.contains("Copyright"));
        assert!(!doc.content.contains("Home"));
        assert!(doc.warnings.is_empty());
    }

    #[test]
    fn test_scripts_are_dropped() {
        let doc = convert(
            r#"<html><body><p>Visible text</p><script>var hidden = 1;</script></body></html>"#,
        );
        assert!(doc.content.contains("Visible text"));
        assert!(!doc.content.contains("hidden"));
    }

    #[test]
    fn test_images_are_absolutized_and_collected() {
        let doc = convert(
            r#"<html><body><main>
                <p>Diagram:</p>
                <img src="../img/arch.png" alt="Architecture">
                <img src="data:image/png;base64,AAAA">
            </main></body></html>"#,
        );

        assert_eq!(doc.images.len(), 1);
        assert_eq!(doc.images[0].source_url, "https://acme.com/img/arch.png");
        assert_eq!(doc.images[0].alt, "Architecture");
        assert!(doc.content.contains("https://acme.com/img/arch.png"));
    }

    #[test]
    fn test_title_falls_back_to_h1() {
        let doc = convert("<html><body><h1>Heading</h1><p>text</p></body></html>");
        assert_eq!(doc.title.as_deref(), Some("Heading"));
    }

    #[test]
    fn test_dynamic_shell_flagged() {
        let doc = convert(
            r#"<html><head><title>App</title></head><body>
                <div id="root"></div>
                <script src="/static/bundle.js"></script>
            </body></html>"#,
        );
        assert_eq!(doc.warnings.len(), 1);
        assert!(doc.warnings[0].contains("client-rendered"));
    }

    #[test]
    fn test_tidy_markdown() {
        assert_eq!(tidy_markdown("\n\na\n\n\n\nb  \n\n"), "a\n\nb\n");
        assert_eq!(tidy_markdown("  \n "), "");
    }
}
