//! Bounded conversion worker pool
//!
//! [`PageConverter`] sits between the frontier and the archiver. Each fetched
//! page is converted on the blocking thread pool (HTML parsing is CPU-bound),
//! its images are downloaded through the shared [`Fetcher`], and the outcome
//! is forwarded as a [`ConversionResult`]. Failures are captured in the result
//! and never stop sibling conversions.

use super::{
    extract_metadata, ContentCategory, ConversionResult, ConvertOptions, ConverterRegistry,
    ImageReference,
};
use crate::config::ConverterConfig;
use crate::crawler::{CrawlOutcome, FetchedDocument, Fetcher};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use url::Url;

/// The page conversion stage
#[derive(Clone)]
pub struct PageConverter {
    registry: ConverterRegistry,
    fetcher: Fetcher,
    config: ConverterConfig,
    permits: Arc<Semaphore>,
    failed_images: Arc<Mutex<HashSet<String>>>,
}

impl PageConverter {
    /// Creates a converter stage
    ///
    /// # Arguments
    ///
    /// * `registry` - Converters by content category
    /// * `fetcher` - Shared fetcher used for image downloads
    /// * `config` - Converter settings (concurrency, metadata, images)
    pub fn new(registry: ConverterRegistry, fetcher: Fetcher, config: &ConverterConfig) -> Self {
        let concurrency = (config.concurrency as usize).max(1);
        Self {
            registry,
            fetcher,
            config: config.clone(),
            permits: Arc::new(Semaphore::new(concurrency)),
            failed_images: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Converts one fetched document
    ///
    /// Never fails: extraction errors become a failed [`ConversionResult`],
    /// metadata errors degrade to a result without metadata, and image
    /// download errors become warnings.
    pub async fn convert(&self, doc: FetchedDocument) -> ConversionResult {
        let FetchedDocument {
            url,
            depth,
            category,
            page,
        } = doc;

        let Some(converter) = self.registry.get(category) else {
            return ConversionResult::failure(
                url.as_str(),
                depth,
                Some(category),
                format!("No converter registered for category '{}'", category),
            );
        };

        let fetch_metadata = self.config.fetch_metadata && category == ContentCategory::Web;
        let options = ConvertOptions { kind: page.kind };
        let base = url.clone();
        let body = page.body;

        let converted = tokio::task::spawn_blocking(move || {
            let metadata = if fetch_metadata {
                match extract_metadata(&body) {
                    Ok(metadata) => Some(metadata),
                    Err(e) => {
                        tracing::debug!("Metadata extraction failed for {}: {}", base, e);
                        None
                    }
                }
            } else {
                None
            };

            converter
                .convert(&body, &base, &options)
                .map(|document| (document, metadata))
        })
        .await;

        let (document, metadata) = match converted {
            Ok(Ok(pair)) => pair,
            Ok(Err(e)) => {
                tracing::warn!("Conversion failed for {}: {}", url, e);
                return ConversionResult::failure(url.as_str(), depth, Some(category), e.to_string());
            }
            Err(e) => {
                tracing::error!("Conversion task for {} aborted: {}", url, e);
                return ConversionResult::failure(
                    url.as_str(),
                    depth,
                    Some(category),
                    format!("Conversion task aborted: {}", e),
                );
            }
        };

        let mut result = ConversionResult::success(
            url.as_str(),
            depth,
            category,
            document.title,
            document.content,
        );
        result.files = document.files;
        result.metadata = document.metadata.or(metadata).filter(|m| !m.is_empty());
        result.warnings = document.warnings;

        let mut images = document.images;
        if self.config.download_images {
            self.download_images(&mut images, &mut result.warnings).await;
        }
        result.images = images;

        tracing::debug!(
            "Converted {} ({} bytes, {} images)",
            url,
            result.body.len(),
            result.images.len()
        );
        result
    }

    async fn download_images(&self, images: &mut [ImageReference], warnings: &mut Vec<String>) {
        for image in images.iter_mut() {
            if self.is_known_failure(&image.source_url) {
                continue;
            }

            let Ok(source) = Url::parse(&image.source_url) else {
                continue;
            };

            match self
                .fetcher
                .fetch_limited(&source, Some(self.config.max_image_bytes))
                .await
            {
                Ok(fetched) => {
                    image.content_hash = Some(hex::encode(Sha256::digest(&fetched.body)));
                    image.content_type = Some(fetched.content_type).filter(|c| !c.is_empty());
                    image.bytes = Some(fetched.body);
                }
                Err(e) => {
                    tracing::debug!("Image download failed for {}: {}", image.source_url, e);
                    self.record_failure(&image.source_url);
                    warnings.push(format!(
                        "{}: image {} not archived ({})",
                        image.page_url, image.source_url, e
                    ));
                }
            }
        }
    }

    fn is_known_failure(&self, url: &str) -> bool {
        self.failed_images
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(url)
    }

    fn record_failure(&self, url: &str) {
        self.failed_images
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(url.to_string());
    }

    /// Runs the stage until the frontier closes its channel
    ///
    /// Fetch failures pass straight through as failed results. Conversions
    /// run concurrently up to the configured limit; results are sent in
    /// completion order.
    pub async fn run(self, mut rx: mpsc::Receiver<CrawlOutcome>, tx: mpsc::Sender<ConversionResult>) {
        let mut tasks: JoinSet<()> = JoinSet::new();
        let mut converted = 0usize;

        while let Some(outcome) = rx.recv().await {
            match outcome {
                CrawlOutcome::Failed { url, depth, error } => {
                    let result = ConversionResult::failure(url, depth, None, error.to_string());
                    if tx.send(result).await.is_err() {
                        tracing::warn!("Archiver closed; dropping remaining conversions");
                        break;
                    }
                }
                CrawlOutcome::Fetched(doc) => {
                    let permit = match self.permits.clone().acquire_owned().await {
                        Ok(permit) => permit,
                        Err(_) => break,
                    };
                    let converter = self.clone();
                    let tx = tx.clone();
                    tasks.spawn(async move {
                        let result = converter.convert(doc).await;
                        drop(permit);
                        if tx.send(result).await.is_err() {
                            tracing::debug!("Archiver closed before result was delivered");
                        }
                    });
                    converted += 1;
                }
            }

            // Reap finished tasks so the set does not grow with the crawl.
            while let Some(joined) = tasks.try_join_next() {
                if let Err(e) = joined {
                    tracing::error!("Conversion worker failed: {}", e);
                }
            }
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::error!("Conversion worker failed: {}", e);
            }
        }

        tracing::info!("Converter finished: {} pages converted", converted);
    }
}
