use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Main configuration structure for Sumi-Scroll
///
/// Every section is optional in the TOML file; missing values fall back to
/// the defaults below.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub fetcher: FetcherConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub converter: ConverterConfig,
    pub archive: ArchiveConfig,
}

/// Frontier behavior configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Maximum number of pages admitted to the crawl (page budget)
    pub max_pages: u32,

    /// Maximum link depth from the root URL
    pub max_depth: u32,

    /// Number of concurrent fetch/extract workers
    pub concurrency: u32,

    /// Whether robots.txt rules are honoured
    pub respect_robots_txt: bool,

    /// Extra path substrings that exclude a URL from the crawl
    pub excluded_paths: Vec<String>,

    /// Asset-hosting domains (wildcard patterns) that count as in scope
    /// when their subdomain embeds the root site's name
    pub asset_hosts: Vec<String>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages: 100,
            max_depth: 3,
            concurrency: 10,
            respect_robots_txt: true,
            excluded_paths: Vec::new(),
            asset_hosts: vec![
                "*.github.io".to_string(),
                "*.netlify.app".to_string(),
                "*.vercel.app".to_string(),
                "*.pages.dev".to_string(),
                "*.readthedocs.io".to_string(),
                "*.gitbook.io".to_string(),
                "*.cloudfront.net".to_string(),
            ],
        }
    }
}

/// HTTP fetcher configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FetcherConfig {
    /// Total request timeout (seconds)
    pub request_timeout_secs: u64,

    /// Connection establishment timeout (seconds)
    pub connect_timeout_secs: u64,

    /// Retries after the first attempt for transient failures
    pub max_retries: u32,

    /// Base retry delay; the n-th retry waits n times this value (milliseconds)
    pub retry_base_delay_ms: u64,

    /// Maximum redirect hops followed per request
    pub max_redirects: u32,

    /// Extra headers sent with every request
    pub headers: BTreeMap<String, String>,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
            max_retries: 3,
            retry_base_delay_ms: 1000,
            max_redirects: 10,
            headers: BTreeMap::new(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct UserAgentConfig {
    /// Name of the crawler
    pub crawler_name: String,

    /// Version of the crawler
    pub crawler_version: String,

    /// URL with information about the crawler
    pub contact_url: String,

    /// Email address for crawler-related contact
    pub contact_email: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "SumiScroll".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://example.com/sumi-scroll".to_string(),
            contact_email: "crawler@example.com".to_string(),
        }
    }
}

impl UserAgentConfig {
    /// Formats the user agent header value
    ///
    /// Format: `CrawlerName/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Page converter configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ConverterConfig {
    /// Number of concurrent conversions
    pub concurrency: u32,

    /// Whether title/description metadata is extracted
    pub fetch_metadata: bool,

    /// Whether referenced images are downloaded into the archive
    pub download_images: bool,

    /// Images larger than this are referenced but not archived (bytes)
    pub max_image_bytes: u64,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            concurrency: 5,
            fetch_metadata: true,
            download_images: true,
            max_image_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Archive output configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ArchiveConfig {
    /// Path of the zip archive to produce
    pub output_path: String,

    /// Byte ceiling of a batch before it is flushed into the archive
    pub batch_ceiling_bytes: u64,

    /// Resident memory above which the archiver relieves pressure (MiB)
    pub memory_high_water_mb: u64,

    /// Pause applied when memory stays high after relief (milliseconds)
    pub pressure_pause_ms: u64,

    /// Maximum length of a derived file name (characters, without extension)
    pub max_name_length: usize,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            output_path: "./site-archive.zip".to_string(),
            batch_ceiling_bytes: 32 * 1024 * 1024,
            memory_high_water_mb: 1024,
            pressure_pause_ms: 250,
            max_name_length: 100,
        }
    }
}
