//! `index.md` generation: root page content plus a table of contents

use super::layout::relative_path;
use std::collections::BTreeMap;
use url::Url;

/// Section heading for top-level pages
const TOP_LEVEL_SECTION: &str = "Pages";

/// Section heading for pages outside the root host's `pages/` directory
const ELSEWHERE_SECTION: &str = "Elsewhere";

/// A page listed in the table of contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub url: String,
    pub title: String,
    /// Archive path of the page's document
    pub path: String,
}

/// Renders `index.md`
///
/// # Arguments
///
/// * `index_path` - Archive path of the index itself (links are relative to it)
/// * `root_url` - The crawl root
/// * `root_title` - Title of the root page, if it converted
/// * `root_body` - Markdown of the root page, if it converted
/// * `entries` - Every other archived page
///
/// Pages under the index's own `pages/` directory are grouped by the first
/// segment of their URL path; everything else is listed under a final
/// section. Links are wiki-style: `[[pages/slug|Title]]`.
pub fn render_index(
    index_path: &str,
    root_url: &str,
    root_title: Option<&str>,
    root_body: Option<&str>,
    entries: &[TocEntry],
) -> String {
    let mut md = String::new();

    match root_body {
        Some(body) => {
            if !body.trim_start().starts_with("# ") {
                md.push_str(&format!("# {}\n\n", root_title.unwrap_or(root_url)));
            }
            md.push_str(body.trim_end());
            md.push_str("\n\n");
        }
        None => {
            md.push_str(&format!("# {}\n\n", root_title.unwrap_or(root_url)));
            md.push_str(&format!(
                "The root page <{}> could not be converted; see `summary.md`.\n\n",
                root_url
            ));
        }
    }

    if entries.is_empty() {
        return md;
    }

    let local_prefix = match index_path.rsplit_once('/') {
        Some((dir, _)) => format!("{}/pages/", dir),
        None => "pages/".to_string(),
    };

    let mut sections: BTreeMap<String, Vec<&TocEntry>> = BTreeMap::new();
    let mut elsewhere: Vec<&TocEntry> = Vec::new();

    for entry in entries {
        if entry.path.starts_with(&local_prefix) {
            sections.entry(section_for(&entry.url)).or_default().push(entry);
        } else {
            elsewhere.push(entry);
        }
    }

    md.push_str("---\n\n## Contents\n\n");

    for (section, mut pages) in sections {
        pages.sort_by(|a, b| a.url.cmp(&b.url));
        md.push_str(&format!("### {}\n\n", section));
        for page in pages {
            md.push_str(&wiki_link(index_path, page));
        }
        md.push('\n');
    }

    if !elsewhere.is_empty() {
        elsewhere.sort_by(|a, b| a.path.cmp(&b.path));
        md.push_str(&format!("### {}\n\n", ELSEWHERE_SECTION));
        for page in elsewhere {
            md.push_str(&wiki_link(index_path, page));
        }
        md.push('\n');
    }

    md
}

/// First URL path segment for pages nested below it, otherwise the top-level section
fn section_for(url: &str) -> String {
    let segments: Vec<String> = Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .map(|s| s.filter(|s| !s.is_empty()).map(str::to_string).collect())
        })
        .unwrap_or_default();

    if segments.len() >= 2 {
        segments[0].clone()
    } else {
        TOP_LEVEL_SECTION.to_string()
    }
}

fn wiki_link(index_path: &str, entry: &TocEntry) -> String {
    let target = relative_path(index_path, &entry.path);
    let target = target.strip_suffix(".md").unwrap_or(&target);
    let title = entry.title.replace(['|', '[', ']'], "-");
    format!("- [[{}|{}]]\n", target, title.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(url: &str, title: &str, path: &str) -> TocEntry {
        TocEntry {
            url: url.to_string(),
            title: title.to_string(),
            path: path.to_string(),
        }
    }

    const INDEX: &str = "web/acme.com/index.md";

    #[test]
    fn test_root_only() {
        let md = render_index(INDEX, "https://acme.com/", Some("Acme"), Some("Welcome."), &[]);
        assert_eq!(md, "# Acme\n\nWelcome.\n\n");
    }

    #[test]
    fn test_groups_by_first_segment() {
        let entries = vec![
            entry("https://acme.com/docs/install", "Install", "web/acme.com/pages/docs-install.md"),
            entry("https://acme.com/about", "About", "web/acme.com/pages/about.md"),
            entry("https://acme.com/docs/usage", "Usage", "web/acme.com/pages/docs-usage.md"),
        ];
        let md = render_index(INDEX, "https://acme.com/", None, Some("# Home\n\nhi"), &entries);

        assert!(md.starts_with("# Home\n\nhi"));
        assert!(md.contains("### Pages\n\n- [[pages/about|About]]\n"));
        assert!(md.contains(
            "### docs\n\n- [[pages/docs-install|Install]]\n- [[pages/docs-usage|Usage]]\n"
        ));
    }

    #[test]
    fn test_other_hosts_listed_elsewhere() {
        let entries = vec![entry(
            "https://blog.acme.com/post",
            "Post",
            "web/blog.acme.com/pages/post.md",
        )];
        let md = render_index(INDEX, "https://acme.com/", None, None, &entries);

        assert!(md.contains("could not be converted"));
        assert!(md.contains("### Elsewhere\n\n- [[../blog.acme.com/pages/post|Post]]\n"));
    }

    #[test]
    fn test_titles_cannot_break_links() {
        let entries = vec![entry("https://acme.com/a", "A | B", "web/acme.com/pages/a.md")];
        let md = render_index(INDEX, "https://acme.com/", None, Some("x"), &entries);
        assert!(md.contains("[[pages/a|A - B]]"));
    }
}
