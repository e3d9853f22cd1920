//! Archive manifest and its `summary.md` rendering

use crate::convert::ContentCategory;
use crate::state::{PageState, RejectReason};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::time::Duration;

/// A page written into the archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub category: ContentCategory,
    pub title: String,
    pub url: String,
    /// Path inside the archive
    pub path: String,
}

/// A page that produced no document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedPage {
    pub url: String,
    pub error: String,
}

/// Summary of an archive run, written as `summary.md`
#[derive(Debug, Clone)]
pub struct ArchiveManifest {
    pub generated_at: DateTime<Utc>,
    pub root_url: String,
    pub config_fingerprint: String,
    pub duration: Duration,

    /// Pages that reached the archiver (successes + failures)
    pub total_pages: usize,
    pub successes: usize,
    pub failures: usize,
    /// Unique images stored
    pub total_images: usize,
    /// Image references dropped as duplicates
    pub duplicate_images: usize,

    /// Per-category index of written pages
    pub entries: BTreeMap<ContentCategory, Vec<ManifestEntry>>,
    /// Successful pages per discovery depth
    pub depths: BTreeMap<u32, usize>,
    /// Final URL states as recorded by the frontier
    pub page_states: BTreeMap<PageState, usize>,
    /// Rejected URLs by reason
    pub rejected: BTreeMap<RejectReason, usize>,
    pub failed: Vec<FailedPage>,
    pub warnings: Vec<String>,

    /// Number of batch flushes
    pub flushes: usize,
    /// Times the archiver paused under memory pressure
    pub pressure_pauses: usize,
}

impl ArchiveManifest {
    /// An empty manifest for a run rooted at `root_url`
    pub fn new(root_url: impl Into<String>, config_fingerprint: impl Into<String>) -> Self {
        Self {
            generated_at: Utc::now(),
            root_url: root_url.into(),
            config_fingerprint: config_fingerprint.into(),
            duration: Duration::ZERO,
            total_pages: 0,
            successes: 0,
            failures: 0,
            total_images: 0,
            duplicate_images: 0,
            entries: BTreeMap::new(),
            depths: BTreeMap::new(),
            page_states: BTreeMap::new(),
            rejected: BTreeMap::new(),
            failed: Vec::new(),
            warnings: Vec::new(),
            flushes: 0,
            pressure_pauses: 0,
        }
    }

    /// Records a successfully archived page
    pub fn record_success(&mut self, depth: u32) {
        self.total_pages += 1;
        self.successes += 1;
        *self.depths.entry(depth).or_insert(0) += 1;
    }

    /// Records a failed page
    pub fn record_failure(&mut self, url: impl Into<String>, error: impl Into<String>) {
        self.total_pages += 1;
        self.failures += 1;
        self.failed.push(FailedPage {
            url: url.into(),
            error: error.into(),
        });
    }

    /// Adds a page to the per-category index
    pub fn add_entry(&mut self, entry: ManifestEntry) {
        self.entries.entry(entry.category).or_default().push(entry);
    }

    /// Number of pages indexed under a category
    pub fn category_count(&self, category: ContentCategory) -> usize {
        self.entries.get(&category).map_or(0, Vec::len)
    }

    /// Success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.total_pages == 0 {
            0.0
        } else {
            self.successes as f64 / self.total_pages as f64 * 100.0
        }
    }

    /// Renders the manifest as Markdown
    pub fn render_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str("# Sumi-Scroll Archive Summary\n\n");

        md.push_str("## Run Information\n\n");
        md.push_str(&format!("- **Root URL**: {}\n", self.root_url));
        md.push_str(&format!(
            "- **Generated**: {}\n",
            self.generated_at.to_rfc3339()
        ));
        md.push_str(&format!(
            "- **Duration**: {:.2} seconds\n",
            self.duration.as_secs_f64()
        ));
        md.push_str(&format!("- **Config Hash**: {}\n\n", self.config_fingerprint));

        md.push_str("## Overall Statistics\n\n");
        md.push_str(&format!("- **Total Pages**: {}\n", self.total_pages));
        md.push_str(&format!("- **Successful**: {}\n", self.successes));
        md.push_str(&format!("- **Failed**: {}\n", self.failures));
        md.push_str(&format!("- **Images**: {}\n", self.total_images));
        if self.duplicate_images > 0 {
            md.push_str(&format!(
                "- **Duplicate Images Dropped**: {}\n",
                self.duplicate_images
            ));
        }
        md.push_str(&format!("- **Success Rate**: {:.2}%\n", self.success_rate()));
        md.push_str(&format!("- **Batches Flushed**: {}\n", self.flushes));
        if self.pressure_pauses > 0 {
            md.push_str(&format!(
                "- **Memory Pressure Pauses**: {}\n",
                self.pressure_pauses
            ));
        }
        md.push('\n');

        md.push_str("## Categories\n\n");
        md.push_str("| Category | Pages |\n");
        md.push_str("|----------|-------|\n");
        for category in ContentCategory::all() {
            md.push_str(&format!(
                "| {} | {} |\n",
                category,
                self.category_count(category)
            ));
        }
        md.push('\n');

        if !self.depths.is_empty() {
            md.push_str("## Depth Breakdown\n\n");
            md.push_str("| Depth | Pages |\n");
            md.push_str("|-------|-------|\n");
            for (depth, count) in &self.depths {
                md.push_str(&format!("| {} | {} |\n", depth, count));
            }
            md.push('\n');
        }

        if !self.page_states.is_empty() {
            md.push_str("## URL States\n\n");
            md.push_str("| State | Count |\n");
            md.push_str("|-------|-------|\n");
            for (state, count) in &self.page_states {
                md.push_str(&format!("| {} | {} |\n", state, count));
            }
            md.push('\n');
        }

        if !self.rejected.is_empty() {
            md.push_str("## Rejected URLs\n\n");
            md.push_str("| Reason | Count |\n");
            md.push_str("|--------|-------|\n");
            for (reason, count) in &self.rejected {
                md.push_str(&format!("| {} | {} |\n", reason, count));
            }
            md.push('\n');
        }

        if !self.failed.is_empty() {
            md.push_str("## Failures\n\n");
            for failure in &self.failed {
                md.push_str(&format!("- {}: {}\n", failure.url, failure.error));
            }
            md.push('\n');
        }

        if !self.warnings.is_empty() {
            md.push_str("## Warnings\n\n");
            for warning in &self.warnings {
                md.push_str(&format!("- {}\n", warning));
            }
            md.push('\n');
        }

        for (category, entries) in &self.entries {
            md.push_str(&format!("## Index: {}\n\n", category));
            for entry in entries {
                md.push_str(&format!(
                    "- [{}]({}) ({})\n",
                    entry.title.replace(['[', ']'], ""),
                    entry.path,
                    entry.url
                ));
            }
            md.push('\n');
        }

        md
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::url::ExclusionReason;

    fn sample() -> ArchiveManifest {
        let mut manifest = ArchiveManifest::new("https://acme.com/", "abc123");
        manifest.record_success(0);
        manifest.record_success(1);
        manifest.record_failure("https://acme.com/down", "HTTP 503 after 3 attempt(s)");
        manifest.add_entry(ManifestEntry {
            category: ContentCategory::Web,
            title: "Intro".to_string(),
            url: "https://acme.com/intro".to_string(),
            path: "web/acme.com/pages/intro.md".to_string(),
        });
        manifest
    }

    #[test]
    fn test_counts() {
        let manifest = sample();
        assert_eq!(manifest.total_pages, 3);
        assert_eq!(manifest.successes, 2);
        assert_eq!(manifest.failures, 1);
        assert_eq!(manifest.category_count(ContentCategory::Web), 1);
        assert_eq!(manifest.category_count(ContentCategory::Data), 0);
    }

    #[test]
    fn test_render_markdown() {
        let mut manifest = sample();
        manifest.rejected.insert(RejectReason::OutOfScope, 2);
        manifest
            .rejected
            .insert(RejectReason::Excluded(ExclusionReason::StaticAsset), 1);

        let md = manifest.render_markdown();
        assert!(md.starts_with("# Sumi-Scroll Archive Summary"));
        assert!(md.contains("- **Root URL**: https://acme.com/"));
        assert!(md.contains("- **Total Pages**: 3"));
        assert!(md.contains("| web | 1 |"));
        assert!(md.contains("| out of scope | 2 |"));
        assert!(md.contains("## Failures"));
        assert!(md.contains("https://acme.com/down: HTTP 503"));
        assert!(md.contains("[Intro](web/acme.com/pages/intro.md)"));
    }

    #[test]
    fn test_success_rate_empty() {
        let manifest = ArchiveManifest::new("https://acme.com/", "");
        assert_eq!(manifest.success_rate(), 0.0);
    }
}
