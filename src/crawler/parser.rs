//! HTML parser for extracting links and metadata
//!
//! This module handles parsing HTML content to extract:
//! - Links to follow (anchors, canonical/alternate/pagination links,
//!   Open Graph URLs, meta refresh targets and script redirects)
//! - Page title

use crate::url::normalize_link;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::BTreeSet;
use std::sync::OnceLock;
use url::Url;

/// Extracted information from an HTML page
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    /// The page title (from <title> tag)
    pub title: Option<String>,

    /// Normalized absolute links, fragment and query stripped
    pub links: BTreeSet<String>,
}

/// Parses HTML content and extracts links and metadata
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags anywhere in the document
/// - `<link rel="canonical|alternate|next|prev" href="...">`
/// - `<meta property="og:url" content="...">`
/// - `<meta http-equiv="refresh" content="0; url=...">`
/// - `location.href = "..."` / `location.replace("...")` in inline scripts
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs
/// - Anything that does not resolve to HTTP(S)
///
/// Relative links resolve against `<base href>` when the page declares one.
///
/// # Example
///
/// ```no_run
/// use sumi_scroll::crawler::parse_html;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let parsed = parse_html(html, &base_url);
/// assert_eq!(parsed.title, Some("Test".to_string()));
/// assert!(parsed.links.contains("https://example.com/page"));
/// ```
pub fn parse_html(html: &str, base_url: &Url) -> ParsedPage {
    let document = Html::parse_document(html);
    let base = document_base(&document, base_url);

    ParsedPage {
        title: extract_title(&document),
        links: collect_links(&document, &base),
    }
}

/// Extracts the candidate link set from an HTML page
///
/// Duplicates collapse; the result is ordered so callers enqueue
/// deterministically.
pub fn extract_links(html: &str, base_url: &Url) -> BTreeSet<String> {
    parse_html(html, base_url).links
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Honors `<base href>` if present and resolvable
fn document_base(document: &Html, base_url: &Url) -> Url {
    Selector::parse("base[href]")
        .ok()
        .and_then(|selector| {
            document
                .select(&selector)
                .next()
                .and_then(|el| el.value().attr("href"))
                .and_then(|href| base_url.join(href.trim()).ok())
        })
        .unwrap_or_else(|| base_url.clone())
}

fn collect_links(document: &Html, base_url: &Url) -> BTreeSet<String> {
    let mut links = BTreeSet::new();

    let mut push = |href: &str| {
        if let Some(url) = resolve_link(href, base_url) {
            links.insert(url);
        }
    };

    if let Ok(selector) = Selector::parse("a[href]") {
        for element in document.select(&selector) {
            if element.value().attr("download").is_some() {
                continue;
            }
            if let Some(href) = element.value().attr("href") {
                push(href);
            }
        }
    }

    if let Ok(selector) = Selector::parse("link[rel][href]") {
        for element in document.select(&selector) {
            let followable = element
                .value()
                .attr("rel")
                .map(|rel| {
                    rel.split_ascii_whitespace().any(|r| {
                        matches!(
                            r.to_ascii_lowercase().as_str(),
                            "canonical" | "alternate" | "next" | "prev"
                        )
                    })
                })
                .unwrap_or(false);

            if followable {
                if let Some(href) = element.value().attr("href") {
                    push(href);
                }
            }
        }
    }

    if let Ok(selector) = Selector::parse("meta[property='og:url'][content]") {
        for element in document.select(&selector) {
            if let Some(content) = element.value().attr("content") {
                push(content);
            }
        }
    }

    if let Ok(selector) = Selector::parse("meta[http-equiv][content]") {
        for element in document.select(&selector) {
            let is_refresh = element
                .value()
                .attr("http-equiv")
                .map(|v| v.eq_ignore_ascii_case("refresh"))
                .unwrap_or(false);
            if !is_refresh {
                continue;
            }
            if let Some(target) = element.value().attr("content").and_then(refresh_target) {
                push(target);
            }
        }
    }

    if let Ok(selector) = Selector::parse("script:not([src])") {
        for element in document.select(&selector) {
            let source = element.text().collect::<String>();
            for target in script_redirects(&source) {
                push(&target);
            }
        }
    }

    links
}

/// Pulls the URL out of a meta refresh `content` value (`"5; url=/next"`)
fn refresh_target(content: &str) -> Option<&str> {
    let (_, rest) = content.split_once(';')?;
    let rest = rest.trim();
    let eq = rest.find('=')?;
    if !rest[..eq].trim().eq_ignore_ascii_case("url") {
        return None;
    }
    let target = rest[eq + 1..].trim().trim_matches(|c| c == '\'' || c == '"');
    (!target.is_empty()).then_some(target)
}

fn script_redirect_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(
                r#"location(?:\.href)?\s*=\s*["']([^"']+)["']|location\.(?:replace|assign)\(\s*["']([^"']+)["']\s*\)"#,
            )
            .ok()
        })
        .as_ref()
}

/// Best-effort extraction of redirect targets from inline JavaScript
fn script_redirects(source: &str) -> Vec<String> {
    let Some(pattern) = script_redirect_pattern() else {
        return Vec::new();
    };
    pattern
        .captures_iter(source)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Resolves a link href to a normalized absolute URL
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only links
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    let absolute = base_url.join(href).ok()?;
    if absolute.scheme() != "http" && absolute.scheme() != "https" {
        return None;
    }

    normalize_link(absolute.as_str()).ok().map(|url| url.to_string())
}
