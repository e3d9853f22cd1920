//! Robots.txt handling module
//!
//! robots.txt is fetched once per origin through the crawl's [`Fetcher`],
//! cached for the run and consulted before a URL is scheduled.
//!
//! [`Fetcher`]: crate::crawler::Fetcher

mod cache;
mod parser;

pub use cache::RobotsCache;
pub use parser::ParsedRobots;
