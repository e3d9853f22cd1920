//! The batch archiver
//!
//! Conversion results are grouped into byte-bounded batches and streamed
//! into a staging zip on disk. Finalizing writes the real archive: the
//! manifest first, then the root index, then every staged entry copied
//! without recompression.

use super::batch::{Batch, FlushRecord};
use super::index::{render_index, TocEntry};
use super::layout::{
    asset_file_name, host_dir, page_slug, relative_path, sanitize_name, PathAllocator,
};
use super::manifest::{ArchiveManifest, ManifestEntry};
use super::pressure::{PressureLevel, ResourceProbe};
use crate::config::ArchiveConfig;
use crate::convert::{ContentCategory, ConversionResult, ImageReference};
use crate::crawler::FrontierStats;
use crate::url::strip_www;
use crate::ScrollError;
use sha2::{Digest, Sha256};
use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::{Seek, SeekFrom, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use url::Url;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Name of the manifest entry
pub const SUMMARY_FILE: &str = "summary.md";

/// Archiver settings derived from [`ArchiveConfig`]
#[derive(Debug, Clone)]
pub struct ArchiveSettings {
    pub output_path: PathBuf,
    pub batch_ceiling_bytes: u64,
    pub max_name_length: usize,
    pub pressure_pause: Duration,
}

impl ArchiveSettings {
    pub fn from_config(config: &ArchiveConfig) -> Self {
        Self {
            output_path: PathBuf::from(&config.output_path),
            batch_ceiling_bytes: config.batch_ceiling_bytes,
            max_name_length: config.max_name_length,
            pressure_pause: Duration::from_millis(config.pressure_pause_ms),
        }
    }
}

/// The finished archive and everything known about how it was built
#[derive(Debug, Clone)]
pub struct ArchiveArtifact {
    /// Location of the zip file
    pub path: PathBuf,
    pub manifest: ArchiveManifest,
    /// One record per flushed batch, in order
    pub flushes: Vec<FlushRecord>,
    /// Size of the zip file on disk
    pub bytes_written: u64,
}

#[derive(Debug)]
struct RootPage {
    title: Option<String>,
    body: String,
}

/// Consumes conversion results and builds the archive
///
/// The archiver is the only owner of its batch, so it needs no locking; it
/// is driven sequentially from a single channel receiver.
pub struct BatchArchiver {
    settings: ArchiveSettings,
    root: Url,
    index_path: String,
    started: Instant,
    probe: Box<dyn ResourceProbe>,
    staging: ZipWriter<File>,
    staged_dirs: BTreeSet<String>,
    paths: PathAllocator,
    batch: Batch,
    manifest: ArchiveManifest,
    flushes: Vec<FlushRecord>,
    assets_by_url: HashMap<String, String>,
    assets_by_hash: HashMap<String, String>,
    toc: Vec<TocEntry>,
    root_page: Option<RootPage>,
}

impl BatchArchiver {
    /// Opens a staging archive for a crawl rooted at `root`
    ///
    /// # Arguments
    ///
    /// * `settings` - Output location, batch ceiling and naming limits
    /// * `root` - The crawl root; its host names the index directory
    /// * `config_fingerprint` - Recorded in the manifest
    /// * `probe` - Memory-pressure source sampled after each flush
    pub fn new(
        settings: ArchiveSettings,
        root: &Url,
        config_fingerprint: &str,
        probe: Box<dyn ResourceProbe>,
    ) -> Result<Self, ScrollError> {
        let staging = ZipWriter::new(tempfile::tempfile()?);
        let index_path = format!("web/{}/index.md", host_dir(root));

        let mut paths = PathAllocator::new();
        paths.allocate("", "summary", Some("md"));
        paths.allocate(&format!("web/{}", host_dir(root)), "index", Some("md"));

        Ok(Self {
            batch: Batch::new(settings.batch_ceiling_bytes),
            settings,
            root: root.clone(),
            index_path,
            started: Instant::now(),
            probe,
            staging,
            staged_dirs: BTreeSet::new(),
            paths,
            manifest: ArchiveManifest::new(root.as_str(), config_fingerprint),
            flushes: Vec::new(),
            assets_by_url: HashMap::new(),
            assets_by_hash: HashMap::new(),
            toc: Vec::new(),
            root_page: None,
        })
    }

    /// Archive path of the root index
    pub fn index_path(&self) -> &str {
        &self.index_path
    }

    /// Convenience: consume a whole result stream and finalize
    pub async fn archive(
        mut self,
        rx: mpsc::Receiver<ConversionResult>,
    ) -> Result<ArchiveArtifact, ScrollError> {
        self.consume(rx).await?;
        self.finish(&FrontierStats::default()).await
    }

    /// Pushes every result from the channel until it closes
    pub async fn consume(
        &mut self,
        mut rx: mpsc::Receiver<ConversionResult>,
    ) -> Result<(), ScrollError> {
        while let Some(result) = rx.recv().await {
            self.push(result).await?;
        }
        Ok(())
    }

    /// Adds one result, flushing first if it would overflow the batch
    pub async fn push(&mut self, result: ConversionResult) -> Result<(), ScrollError> {
        if !result.success {
            let error = result.error.unwrap_or_else(|| "unknown error".to_string());
            tracing::debug!("Recording failure for {}: {}", result.url, error);
            self.manifest.record_failure(result.url, error);
            return Ok(());
        }

        self.manifest.record_success(result.depth);

        let size = result.approx_size();
        if self.batch.would_exceed(size) {
            self.flush().await?;
        }
        if size > self.batch.ceiling() {
            tracing::warn!(
                "{} is {} bytes, larger than the {} byte batch ceiling",
                result.url,
                size,
                self.batch.ceiling()
            );
        }

        self.batch.push(result);
        Ok(())
    }

    /// Writes the current batch into the staging archive
    pub async fn flush(&mut self) -> Result<(), ScrollError> {
        if self.batch.is_empty() {
            return Ok(());
        }

        let (items, record) = self.batch.drain();
        for item in items {
            self.write_result(item)?;
        }

        tracing::debug!(
            "Flushed batch {}: {} items, {} bytes",
            self.flushes.len() + 1,
            record.items,
            record.bytes
        );
        self.flushes.push(record);
        self.manifest.flushes += 1;

        self.check_pressure().await;
        Ok(())
    }

    /// Finalizes the archive at the configured output path
    ///
    /// `frontier` supplies the URL-state and rejection tables for the manifest.
    pub async fn finish(mut self, frontier: &FrontierStats) -> Result<ArchiveArtifact, ScrollError> {
        self.flush().await?;

        self.manifest.duration = self.started.elapsed();
        self.manifest.page_states = frontier.states.clone();
        self.manifest.rejected = frontier.rejected.clone();

        let mut staged_file = self.staging.finish()?;
        staged_file.seek(SeekFrom::Start(0))?;
        let mut staged = ZipArchive::new(staged_file)?;

        if let Some(parent) = self.settings.output_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut zip = ZipWriter::new(File::create(&self.settings.output_path)?);
        let options = deflated();

        zip.start_file(SUMMARY_FILE, options)?;
        zip.write_all(self.manifest.render_markdown().as_bytes())?;

        let (root_title, root_body) = match &self.root_page {
            Some(page) => (page.title.as_deref(), Some(page.body.as_str())),
            None => (None, None),
        };
        let index = render_index(
            &self.index_path,
            self.root.as_str(),
            root_title,
            root_body,
            &self.toc,
        );
        zip.start_file(self.index_path.as_str(), options)?;
        zip.write_all(index.as_bytes())?;
        register_dirs(&mut self.staged_dirs, &self.index_path);

        // Only directories that received files are written.
        for dir in &self.staged_dirs {
            zip.add_directory(dir.as_str(), FileOptions::default())?;
        }

        for i in 0..staged.len() {
            let entry = staged.by_index(i)?;
            zip.raw_copy_file(entry)?;
        }

        let file = zip.finish()?;
        let bytes_written = file.metadata()?.len();

        tracing::info!(
            "Archive written to {} ({} pages, {} failures, {} images, {} bytes)",
            self.settings.output_path.display(),
            self.manifest.successes,
            self.manifest.failures,
            self.manifest.total_images,
            bytes_written
        );

        Ok(ArchiveArtifact {
            path: self.settings.output_path,
            manifest: self.manifest,
            flushes: self.flushes,
            bytes_written,
        })
    }

    /// Host directory for a page: the root's own when only `www.` differs
    fn site_dir(&self, url: &Url) -> String {
        match (url.host_str(), self.root.host_str()) {
            (Some(host), Some(root)) if strip_www(host) == strip_www(root) => host_dir(&self.root),
            _ => host_dir(url),
        }
    }

    fn write_result(&mut self, item: ConversionResult) -> Result<(), ScrollError> {
        let url = Url::parse(&item.url).unwrap_or_else(|_| self.root.clone());
        let category = item.category.unwrap_or(ContentCategory::Web);
        let max_len = self.settings.max_name_length;
        let title = item.display_title();

        let is_index =
            item.is_root() && category == ContentCategory::Web && self.root_page.is_none();

        let doc_path = if is_index {
            self.index_path.clone()
        } else {
            let dir = match category {
                ContentCategory::Web => format!("web/{}/pages", self.site_dir(&url)),
                other => other.as_str().to_string(),
            };
            self.paths.allocate(&dir, &page_slug(&url, max_len), Some("md"))
        };

        let media_dir = match category {
            ContentCategory::Web => format!("web/{}/assets", self.site_dir(&url)),
            other => {
                let stem = doc_path
                    .rsplit('/')
                    .next()
                    .and_then(|f| f.strip_suffix(".md"))
                    .unwrap_or("document");
                format!("{}/{}_attachments", other.as_str(), stem)
            }
        };

        let mut body = item.body;
        for image in item.images {
            let source = image.source_url.clone();
            if let Some(asset) = self.store_image(image, &media_dir)? {
                body = rewrite_link(&body, &source, &relative_path(&doc_path, &asset));
            }
        }

        for file in item.files {
            let name = sanitize_name(&file.name, max_len);
            let path = self.paths.allocate_file(&media_dir, &name);
            self.stage(&path, &file.bytes)?;
        }

        if is_index {
            self.root_page = Some(RootPage {
                title: item.title,
                body,
            });
        } else {
            let document = render_document(&title, &item.url, &body);
            self.stage(&doc_path, document.as_bytes())?;
            self.toc.push(TocEntry {
                url: item.url.clone(),
                title: title.clone(),
                path: doc_path.clone(),
            });
        }

        self.manifest.warnings.extend(item.warnings);
        self.manifest.add_entry(ManifestEntry {
            category,
            title,
            url: item.url,
            path: doc_path,
        });

        Ok(())
    }

    /// Stores an image once per canonical URL and once per content hash
    ///
    /// Returns the archive path the reference should point to, or `None`
    /// when the image has no bytes and was never stored.
    fn store_image(
        &mut self,
        image: ImageReference,
        media_dir: &str,
    ) -> Result<Option<String>, ScrollError> {
        if let Some(path) = self.assets_by_url.get(&image.source_url) {
            self.manifest.duplicate_images += 1;
            return Ok(Some(path.clone()));
        }

        let Some(bytes) = image.bytes else {
            return Ok(None);
        };

        let hash = image
            .content_hash
            .unwrap_or_else(|| hex::encode(Sha256::digest(&bytes)));

        if let Some(path) = self.assets_by_hash.get(&hash).cloned() {
            tracing::trace!("{} duplicates stored asset {}", image.source_url, path);
            self.manifest.duplicate_images += 1;
            self.assets_by_url.insert(image.source_url, path.clone());
            return Ok(Some(path));
        }

        let name = Url::parse(&image.source_url)
            .map(|u| {
                asset_file_name(
                    &u,
                    image.content_type.as_deref(),
                    self.settings.max_name_length,
                )
            })
            .unwrap_or_else(|_| "image".to_string());

        let path = self.paths.allocate_file(media_dir, &name);
        self.stage(&path, &bytes)?;

        self.manifest.total_images += 1;
        self.assets_by_hash.insert(hash, path.clone());
        self.assets_by_url.insert(image.source_url, path.clone());
        Ok(Some(path))
    }

    fn stage(&mut self, path: &str, bytes: &[u8]) -> Result<(), ScrollError> {
        self.staging.start_file(path, deflated())?;
        self.staging.write_all(bytes)?;
        register_dirs(&mut self.staged_dirs, path);
        Ok(())
    }

    async fn check_pressure(&mut self) {
        let level = self.probe.pressure();
        if level == PressureLevel::Normal {
            return;
        }

        tracing::warn!("Memory pressure {} after flush", level);
        let level = if self.probe.relieve() {
            self.probe.pressure()
        } else {
            level
        };

        if level >= PressureLevel::Elevated {
            let pause = if level == PressureLevel::Critical {
                self.settings.pressure_pause * 2
            } else {
                self.settings.pressure_pause
            };
            tracing::warn!("Memory still {}, pausing for {:?}", level, pause);
            self.manifest.pressure_pauses += 1;
            tokio::time::sleep(pause).await;
        }
    }
}

fn deflated() -> FileOptions {
    FileOptions::default().compression_method(CompressionMethod::Deflated)
}

/// Records every ancestor directory of `path`
fn register_dirs(dirs: &mut BTreeSet<String>, path: &str) {
    let mut prefix = String::new();
    let mut parts = path.split('/').peekable();
    while let Some(part) = parts.next() {
        if parts.peek().is_none() {
            break;
        }
        if !prefix.is_empty() {
            prefix.push('/');
        }
        prefix.push_str(part);
        dirs.insert(prefix.clone());
    }
}

/// Points Markdown links at `from` to `to`
fn rewrite_link(body: &str, from: &str, to: &str) -> String {
    body.replace(&format!("]({})", from), &format!("]({})", to))
        .replace(&format!("]({} \"", from), &format!("]({} \"", to))
}

fn render_document(title: &str, url: &str, body: &str) -> String {
    let mut doc = String::new();
    if !body.trim_start().starts_with("# ") {
        doc.push_str(&format!("# {}\n\n", title));
    }
    doc.push_str(body.trim_end());
    doc.push_str(&format!("\n\n---\n\nSource: <{}>\n", url));
    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::NoPressure;
    use crate::convert::ExtraFile;
    use std::io::Read;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn settings(dir: &TempDir, ceiling: u64) -> ArchiveSettings {
        ArchiveSettings {
            output_path: dir.path().join("out.zip"),
            batch_ceiling_bytes: ceiling,
            max_name_length: 100,
            pressure_pause: Duration::from_millis(1),
        }
    }

    fn root() -> Url {
        Url::parse("https://acme.com/").unwrap()
    }

    fn archiver(dir: &TempDir, ceiling: u64) -> BatchArchiver {
        BatchArchiver::new(settings(dir, ceiling), &root(), "fp", Box::new(NoPressure)).unwrap()
    }

    fn page(path: &str, depth: u32, body: &str) -> ConversionResult {
        ConversionResult::success(
            format!("https://acme.com{}", path),
            depth,
            ContentCategory::Web,
            Some(format!("Title {}", path)),
            body.to_string(),
        )
    }

    fn image(url: &str, page: &str, bytes: Option<&[u8]>) -> ImageReference {
        let mut image = ImageReference::new(url, "", page);
        image.bytes = bytes.map(|b| b.to_vec());
        image
    }

    fn entries(path: &std::path::Path) -> Vec<String> {
        let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
        (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect()
    }

    fn read_entry(path: &std::path::Path, name: &str) -> String {
        let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
        let mut file = archive.by_name(name).unwrap();
        let mut out = String::new();
        file.read_to_string(&mut out).unwrap();
        out
    }

    #[tokio::test]
    async fn test_summary_is_first_and_root_becomes_index() {
        let dir = TempDir::new().unwrap();
        let mut archiver = archiver(&dir, 1024);
        archiver.push(page("/", 0, "Welcome home.")).await.unwrap();
        let artifact = archiver.finish(&FrontierStats::default()).await.unwrap();

        let names = entries(&artifact.path);
        assert_eq!(names[0], "summary.md");
        assert_eq!(names[1], "web/acme.com/index.md");

        let files: Vec<_> = names.iter().filter(|n| !n.ends_with('/')).collect();
        assert_eq!(files.len(), 2);
        assert!(read_entry(&artifact.path, "web/acme.com/index.md").contains("Welcome home."));
        assert_eq!(artifact.manifest.successes, 1);
        assert_eq!(artifact.manifest.failures, 0);
    }

    #[tokio::test]
    async fn test_pages_written_under_host() {
        let dir = TempDir::new().unwrap();
        let mut archiver = archiver(&dir, 1024);
        archiver.push(page("/", 0, "root")).await.unwrap();
        archiver.push(page("/docs/intro", 1, "intro")).await.unwrap();
        let artifact = archiver.finish(&FrontierStats::default()).await.unwrap();

        let names = entries(&artifact.path);
        assert!(names.contains(&"web/acme.com/pages/docs-intro.md".to_string()));
        assert!(!names.iter().any(|n| n.starts_with("text") || n.starts_with("data")));

        let index = read_entry(&artifact.path, "web/acme.com/index.md");
        assert!(index.contains("[[pages/docs-intro|Title /docs/intro]]"));
    }

    #[tokio::test]
    async fn test_colliding_slugs_are_disambiguated() {
        let dir = TempDir::new().unwrap();
        let mut archiver = archiver(&dir, 1024);
        archiver.push(page("/a/b", 1, "one")).await.unwrap();
        archiver.push(page("/a-b", 1, "two")).await.unwrap();
        let artifact = archiver.finish(&FrontierStats::default()).await.unwrap();

        let names = entries(&artifact.path);
        assert!(names.contains(&"web/acme.com/pages/a-b.md".to_string()));
        assert!(names.contains(&"web/acme.com/pages/a-b-2.md".to_string()));
    }

    #[tokio::test]
    async fn test_failures_recorded_not_written() {
        let dir = TempDir::new().unwrap();
        let mut archiver = archiver(&dir, 1024);
        archiver.push(page("/", 0, "root")).await.unwrap();
        archiver
            .push(ConversionResult::failure(
                "https://acme.com/down",
                1,
                None,
                "HTTP 503 for https://acme.com/down after 3 attempt(s)",
            ))
            .await
            .unwrap();
        let artifact = archiver.finish(&FrontierStats::default()).await.unwrap();

        assert_eq!(artifact.manifest.total_pages, 2);
        assert_eq!(artifact.manifest.failures, 1);
        let summary = read_entry(&artifact.path, "summary.md");
        assert!(summary.contains("https://acme.com/down: HTTP 503"));
    }

    #[tokio::test]
    async fn test_images_deduplicated_and_links_rewritten() {
        let dir = TempDir::new().unwrap();
        let mut archiver = archiver(&dir, 1024 * 1024);

        let mut a = page("/a", 1, "![](https://acme.com/img/logo.png)");
        a.images.push(image("https://acme.com/img/logo.png", "https://acme.com/a", Some(b"PNGDATA")));
        let mut b = page("/b", 1, "![](https://acme.com/img/logo.png)");
        b.images.push(image("https://acme.com/img/logo.png", "https://acme.com/b", None));
        let mut c = page("/c", 1, "![](https://cdn.acme.com/copy.png)");
        c.images.push(image("https://cdn.acme.com/copy.png", "https://acme.com/c", Some(b"PNGDATA")));

        for p in [a, b, c] {
            archiver.push(p).await.unwrap();
        }
        let artifact = archiver.finish(&FrontierStats::default()).await.unwrap();

        let names = entries(&artifact.path);
        let assets: Vec<_> = names.iter().filter(|n| n.contains("/assets/") && !n.ends_with('/')).collect();
        assert_eq!(assets.len(), 1);
        assert_eq!(artifact.manifest.total_images, 1);
        assert_eq!(artifact.manifest.duplicate_images, 2);

        let b = read_entry(&artifact.path, "web/acme.com/pages/b.md");
        assert!(b.contains("![](../assets/logo.png)"));
        let c = read_entry(&artifact.path, "web/acme.com/pages/c.md");
        assert!(c.contains("![](../assets/logo.png)"));
    }

    #[tokio::test]
    async fn test_flushes_respect_ceiling() {
        let dir = TempDir::new().unwrap();
        let mut archiver = archiver(&dir, 100);
        for i in 0..10 {
            archiver.push(page(&format!("/p{}", i), 1, &"x".repeat(30))).await.unwrap();
        }
        archiver.push(page("/huge", 1, &"y".repeat(500))).await.unwrap();
        let artifact = archiver.finish(&FrontierStats::default()).await.unwrap();

        assert!(artifact.flushes.len() > 1);
        for record in &artifact.flushes {
            assert!(record.bytes <= 100 + record.largest_item);
        }
        let items: usize = artifact.flushes.iter().map(|r| r.items).sum();
        assert_eq!(items, 11);
    }

    #[tokio::test]
    async fn test_data_pages_get_attachments() {
        let dir = TempDir::new().unwrap();
        let mut archiver = archiver(&dir, 1024);
        let mut result = ConversionResult::success(
            "https://acme.com/api/status.json",
            1,
            ContentCategory::Data,
            Some("status".to_string()),
            "```json\n{}\n```".to_string(),
        );
        result.files.push(ExtraFile {
            name: "status.json".to_string(),
            bytes: b"{}".to_vec(),
        });
        archiver.push(result).await.unwrap();
        let artifact = archiver.finish(&FrontierStats::default()).await.unwrap();

        let names = entries(&artifact.path);
        assert!(names.contains(&"data/api-status.md".to_string()));
        assert!(names.contains(&"data/api-status_attachments/status.json".to_string()));
        assert!(names.contains(&"data/".to_string()));
    }

    struct CountingProbe {
        samples: Arc<AtomicUsize>,
        level: PressureLevel,
    }

    impl ResourceProbe for CountingProbe {
        fn pressure(&self) -> PressureLevel {
            self.samples.fetch_add(1, Ordering::SeqCst);
            self.level
        }
    }

    #[tokio::test]
    async fn test_pressure_pauses_after_flush() {
        let dir = TempDir::new().unwrap();
        let samples = Arc::new(AtomicUsize::new(0));
        let probe = CountingProbe {
            samples: samples.clone(),
            level: PressureLevel::Critical,
        };
        let mut archiver =
            BatchArchiver::new(settings(&dir, 10), &root(), "fp", Box::new(probe)).unwrap();

        archiver.push(page("/a", 1, &"x".repeat(8))).await.unwrap();
        archiver.push(page("/b", 1, &"x".repeat(8))).await.unwrap();
        let artifact = archiver.finish(&FrontierStats::default()).await.unwrap();

        assert_eq!(artifact.flushes.len(), 2);
        assert_eq!(samples.load(Ordering::SeqCst), 2);
        assert_eq!(artifact.manifest.pressure_pauses, 2);
    }

    /// Elevated until relieved, Normal afterwards
    struct RelievingProbe {
        samples: Arc<AtomicUsize>,
        relieved: Arc<AtomicUsize>,
    }

    impl ResourceProbe for RelievingProbe {
        fn pressure(&self) -> PressureLevel {
            self.samples.fetch_add(1, Ordering::SeqCst);
            if self.relieved.load(Ordering::SeqCst) == 0 {
                PressureLevel::Elevated
            } else {
                PressureLevel::Normal
            }
        }

        fn relieve(&self) -> bool {
            self.relieved.fetch_add(1, Ordering::SeqCst);
            true
        }
    }

    #[tokio::test]
    async fn test_relieved_pressure_does_not_pause() {
        let dir = TempDir::new().unwrap();
        let samples = Arc::new(AtomicUsize::new(0));
        let relieved = Arc::new(AtomicUsize::new(0));
        let probe = RelievingProbe {
            samples: samples.clone(),
            relieved: relieved.clone(),
        };
        let mut archiver =
            BatchArchiver::new(settings(&dir, 1000), &root(), "fp", Box::new(probe)).unwrap();

        archiver.push(page("/a", 1, "body")).await.unwrap();
        let artifact = archiver.finish(&FrontierStats::default()).await.unwrap();

        assert_eq!(artifact.flushes.len(), 1);
        assert_eq!(relieved.load(Ordering::SeqCst), 1);
        assert_eq!(samples.load(Ordering::SeqCst), 2);
        assert_eq!(artifact.manifest.pressure_pauses, 0);
    }

    #[tokio::test]
    async fn test_apex_pages_share_www_root_tree() {
        let dir = TempDir::new().unwrap();
        let root = Url::parse("https://www.acme.com/").unwrap();
        let mut archiver =
            BatchArchiver::new(settings(&dir, 1000), &root, "fp", Box::new(NoPressure)).unwrap();

        let mut home = ConversionResult::success(
            "https://www.acme.com/",
            0,
            ContentCategory::Web,
            Some("Home".to_string()),
            "![](https://acme.com/logo.png)".to_string(),
        );
        home.images = vec![image("https://acme.com/logo.png", "https://www.acme.com/", Some(b"png"))];
        archiver.push(home).await.unwrap();
        archiver
            .push(ConversionResult::success(
                "https://acme.com/about",
                1,
                ContentCategory::Web,
                Some("About".to_string()),
                "About us".to_string(),
            ))
            .await
            .unwrap();
        let artifact = archiver.finish(&FrontierStats::default()).await.unwrap();

        let names = entries(&artifact.path);
        assert!(names.contains(&"web/www.acme.com/pages/about.md".to_string()));
        assert!(names.contains(&"web/www.acme.com/assets/logo.png".to_string()));
        assert!(!names.iter().any(|n| n.starts_with("web/acme.com/")));

        let index = read_entry(&artifact.path, "web/www.acme.com/index.md");
        assert!(index.contains("[[pages/about|About]]"));
        assert!(!index.contains("### Elsewhere"));
    }

    #[test]
    fn test_register_dirs() {
        let mut dirs = BTreeSet::new();
        register_dirs(&mut dirs, "web/acme.com/pages/a.md");
        register_dirs(&mut dirs, "summary.md");
        let dirs: Vec<_> = dirs.into_iter().collect();
        assert_eq!(dirs, vec!["web", "web/acme.com", "web/acme.com/pages"]);
    }

    #[test]
    fn test_render_document_adds_title_and_source() {
        let doc = render_document("Intro", "https://acme.com/intro", "Body text\n");
        assert_eq!(
            doc,
            "# Intro\n\nBody text\n\n---\n\nSource: <https://acme.com/intro>\n"
        );

        let doc = render_document("Intro", "https://acme.com/intro", "# Own heading");
        assert!(doc.starts_with("# Own heading"));
    }
}
