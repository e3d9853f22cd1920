//! Sumi-Scroll: a site-to-archive scroll
//!
//! This crate crawls a website from a root URL, converts every in-scope page
//! into Markdown, and packages the results into a single zip archive with a
//! generated summary and table of contents.
//!
//! The pipeline has three stages, each bounded independently:
//!
//! 1. the crawl frontier discovers and fetches pages with its own worker pool,
//! 2. the page converter turns fetched pages into documents under a separate
//!    concurrency limit,
//! 3. the batch archiver consumes conversion results, flushing byte-bounded
//!    batches into the archive while watching memory pressure.

pub mod archive;
pub mod config;
pub mod convert;
pub mod crawler;
pub mod robots;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Sumi-Scroll operations
///
/// Only fatal problems surface here. Per-page failures are recorded in the
/// archive manifest instead.
#[derive(Debug, Error)]
pub enum ScrollError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid root URL '{url}': {reason}")]
    InvalidRoot { url: String, reason: String },

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid domain pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Result type alias for Sumi-Scroll operations
pub type Result<T> = std::result::Result<T, ScrollError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use archive::{ArchiveArtifact, ArchiveManifest};
pub use config::Config;
pub use convert::{ContentCategory, ConversionResult, ImageReference};
pub use crawler::run_crawl;
pub use state::{PageState, RejectReason};
pub use url::{normalize_url, ScopePolicy};
