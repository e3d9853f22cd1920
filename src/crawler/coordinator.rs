//! Crawl coordinator - wires the pipeline together
//!
//! This module builds every stage from the configuration and runs them
//! concurrently:
//! - the [`Frontier`] discovers and fetches pages
//! - the [`PageConverter`] turns fetched pages into documents
//! - the [`BatchArchiver`] writes documents into the archive
//!
//! Stages are connected by bounded channels, so a slow archiver applies
//! backpressure to conversion, and slow conversion applies it to discovery.

use crate::archive::{ArchiveArtifact, ArchiveSettings, BatchArchiver, ProcessMemoryProbe};
use crate::config::{config_fingerprint, validate, Config};
use crate::convert::{ConverterRegistry, PageConverter};
use crate::crawler::fetcher::Fetcher;
use crate::crawler::frontier::Frontier;
use crate::robots::RobotsCache;
use crate::url::{normalize_url, ScopePolicy};
use crate::ScrollError;
use tokio::sync::mpsc;
use url::Url;

/// Capacity of the frontier → converter channel
const CRAWL_CHANNEL_CAPACITY: usize = 64;

/// Capacity of the converter → archiver channel
const RESULT_CHANNEL_CAPACITY: usize = 32;

/// Main pipeline coordinator
pub struct Coordinator {
    config: Config,
    fingerprint: String,
}

impl Coordinator {
    /// Creates a coordinator after validating the configuration
    ///
    /// # Arguments
    ///
    /// * `config` - The effective configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(ScrollError)` - The configuration is invalid
    pub fn new(config: Config) -> Result<Self, ScrollError> {
        validate(&config)?;
        let fingerprint = config_fingerprint(&config)?;
        Ok(Self {
            config,
            fingerprint,
        })
    }

    /// The configuration fingerprint recorded in the manifest
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Validates and normalizes a root URL
    ///
    /// Only absolute HTTP(S) URLs with a host are accepted.
    pub fn parse_root(root_url: &str) -> Result<Url, ScrollError> {
        let invalid = |reason: String| ScrollError::InvalidRoot {
            url: root_url.to_string(),
            reason,
        };

        let root = normalize_url(root_url.trim()).map_err(|e| invalid(e.to_string()))?;
        if root.scheme() != "http" && root.scheme() != "https" {
            return Err(invalid(format!("unsupported scheme '{}'", root.scheme())));
        }
        if root.host_str().is_none() {
            return Err(invalid("missing host".to_string()));
        }
        Ok(root)
    }

    /// Runs the whole pipeline for one root URL
    ///
    /// Resolves once the archive has been fully written. Per-page failures
    /// are reported in the manifest; only configuration errors and archive
    /// I/O failures are returned as errors.
    pub async fn run(&self, root_url: &str) -> Result<ArchiveArtifact, ScrollError> {
        let root = Self::parse_root(root_url)?;
        let scope = ScopePolicy::from_root(&root, &self.config.crawler)?;

        tracing::info!("Starting crawl of {}", root);
        tracing::info!(
            "Budget: {} pages, depth {}, {} fetch workers, {} converters",
            self.config.crawler.max_pages,
            self.config.crawler.max_depth,
            self.config.crawler.concurrency,
            self.config.converter.concurrency
        );

        let fetcher = Fetcher::new(&self.config.fetcher, &self.config.user_agent)?;

        let robots = if self.config.crawler.respect_robots_txt {
            Some(RobotsCache::new(
                fetcher.clone(),
                self.config.user_agent.crawler_name.clone(),
            ))
        } else {
            tracing::info!("robots.txt checks disabled");
            None
        };

        let frontier = Frontier::new(
            fetcher.clone(),
            scope,
            self.config.crawler.max_pages as usize,
            self.config.crawler.max_depth,
            self.config.crawler.concurrency as usize,
            robots,
        );

        let converter = PageConverter::new(
            ConverterRegistry::with_defaults(),
            fetcher,
            &self.config.converter,
        );

        let mut archiver = BatchArchiver::new(
            ArchiveSettings::from_config(&self.config.archive),
            &root,
            &self.fingerprint,
            Box::new(ProcessMemoryProbe::new(
                self.config.archive.memory_high_water_mb,
            )),
        )?;

        let (crawl_tx, crawl_rx) = mpsc::channel(CRAWL_CHANNEL_CAPACITY);
        let (result_tx, result_rx) = mpsc::channel(RESULT_CHANNEL_CAPACITY);

        let (stats, (), consumed) = tokio::join!(
            frontier.run(root, crawl_tx),
            converter.run(crawl_rx, result_tx),
            archiver.consume(result_rx),
        );
        consumed?;

        let artifact = archiver.finish(&stats).await?;

        tracing::info!(
            "Crawl complete: {} pages archived, {} failed, {} rejected",
            artifact.manifest.successes,
            artifact.manifest.failures,
            stats.rejected_total()
        );

        Ok(artifact)
    }
}

/// Crawls `root_url` and builds its archive
///
/// This is the main entry point for library callers.
///
/// # Arguments
///
/// * `root_url` - The site to archive
/// * `config` - The effective configuration
///
/// # Returns
///
/// * `Ok(ArchiveArtifact)` - The written archive and its manifest
/// * `Err(ScrollError)` - Invalid configuration or root URL, or archive I/O failure
pub async fn run_crawl(root_url: &str, config: Config) -> Result<ArchiveArtifact, ScrollError> {
    Coordinator::new(config)?.run(root_url).await
}
