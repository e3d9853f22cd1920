//! Crawler module for web page fetching and discovery
//!
//! This module contains the discovery half of the pipeline, including:
//! - HTTP fetching with retries and manual redirect handling
//! - HTML parsing and link extraction
//! - The breadth-first crawl frontier
//! - Overall pipeline coordination

mod coordinator;
mod fetcher;
mod frontier;
mod parser;

pub use coordinator::{run_crawl, Coordinator};
pub use fetcher::{
    build_http_client, looks_like_html, ContentKind, FetchError, FetchedPage, Fetcher,
    RetryPolicy,
};
pub use frontier::{CrawlOutcome, CrawlTarget, FetchedDocument, Frontier, FrontierStats};
pub use parser::{extract_links, parse_html, ParsedPage};
