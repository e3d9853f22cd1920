//! Sumi-Scroll main entry point
//!
//! This is the command-line interface for the Sumi-Scroll site archiver.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use sumi_scroll::config::{config_fingerprint, load_config, validate, Config};
use sumi_scroll::crawler::Coordinator;
use sumi_scroll::url::ScopePolicy;
use tracing_subscriber::EnvFilter;

/// Sumi-Scroll: roll a website into a single Markdown archive
///
/// Sumi-Scroll crawls a site from its root URL, converts every in-scope page
/// to Markdown and packages the result as a zip archive with a summary and
/// a table of contents.
#[derive(Parser, Debug)]
#[command(name = "sumi-scroll")]
#[command(version)]
#[command(about = "Crawl a website into a Markdown archive", long_about = None)]
struct Cli {
    /// Root URL of the site to archive
    #[arg(value_name = "ROOT_URL")]
    root_url: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Where to write the archive (overrides archive.output-path)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Page budget (overrides crawler.max-pages; 1 archives just the root)
    #[arg(long)]
    max_pages: Option<u32>,

    /// Maximum link depth (overrides crawler.max-depth)
    #[arg(long)]
    max_depth: Option<u32>,

    /// Concurrent fetch workers (overrides crawler.concurrency)
    #[arg(long)]
    concurrency: Option<u32>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show the crawl scope without crawling
    #[arg(long)]
    dry_run: bool,
}

impl Cli {
    /// Applies command-line overrides on top of the file configuration
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(output) = &self.output {
            config.archive.output_path = output.display().to_string();
        }
        if let Some(max_pages) = self.max_pages {
            config.crawler.max_pages = max_pages;
        }
        if let Some(max_depth) = self.max_depth {
            config.crawler.max_depth = max_depth;
        }
        if let Some(concurrency) = self.concurrency {
            config.crawler.concurrency = concurrency;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?
        }
        None => Config::default(),
    };
    cli.apply_overrides(&mut config);

    if cli.dry_run {
        handle_dry_run(&cli.root_url, &config)
    } else {
        handle_crawl(&cli.root_url, config).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_scroll=info,warn"),
            1 => EnvFilter::new("sumi_scroll=debug,info"),
            2 => EnvFilter::new("sumi_scroll=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows the crawl scope
fn handle_dry_run(root_url: &str, config: &Config) -> anyhow::Result<()> {
    validate(config).context("Invalid configuration")?;
    let root = Coordinator::parse_root(root_url)?;
    let scope = ScopePolicy::from_root(&root, &config.crawler)?;
    let fingerprint = config_fingerprint(config)?;

    println!("=== Sumi-Scroll Dry Run ===\n");

    println!("Root: {}", root);
    println!("  Host: {}", scope.host());
    println!("  Root domain: {}", scope.root_domain());

    println!("\nCrawler Configuration:");
    println!("  Max pages: {}", config.crawler.max_pages);
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Fetch workers: {}", config.crawler.concurrency);
    println!("  Respect robots.txt: {}", config.crawler.respect_robots_txt);

    println!("\nAsset Hosts ({}):", config.crawler.asset_hosts.len());
    for pattern in &config.crawler.asset_hosts {
        println!("  - {}", pattern);
    }

    println!("\nExtra Excluded Paths ({}):", config.crawler.excluded_paths.len());
    for path in &config.crawler.excluded_paths {
        println!("  - {}", path);
    }

    println!("\nConverter:");
    println!("  Workers: {}", config.converter.concurrency);
    println!("  Metadata: {}", config.converter.fetch_metadata);
    println!("  Download images: {}", config.converter.download_images);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Archive: {}", config.archive.output_path);
    println!("  Batch ceiling: {} bytes", config.archive.batch_ceiling_bytes);
    println!("  Memory high-water: {} MB", config.archive.memory_high_water_mb);

    println!("\n✓ Configuration is valid (fingerprint {})", fingerprint);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(root_url: &str, config: Config) -> anyhow::Result<()> {
    let coordinator = Coordinator::new(config).context("Invalid configuration")?;
    tracing::info!("Configuration fingerprint: {}", coordinator.fingerprint());

    match coordinator.run(root_url).await {
        Ok(artifact) => {
            let manifest = &artifact.manifest;
            println!("✓ Archive written to {}", artifact.path.display());
            println!(
                "  {} pages ({} succeeded, {} failed), {} images, {} bytes",
                manifest.total_pages,
                manifest.successes,
                manifest.failures,
                manifest.total_images,
                artifact.bytes_written
            );
            if !manifest.warnings.is_empty() {
                println!("  {} warnings, see summary.md", manifest.warnings.len());
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
