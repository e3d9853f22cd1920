//! Per-host robots.txt cache
//!
//! Each host's robots.txt is fetched at most once per run. Concurrent
//! workers asking about the same host wait on the same fetch.

use crate::crawler::Fetcher;
use crate::robots::ParsedRobots;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;
use url::Url;

/// Robots.txt rules cached by origin for the lifetime of a crawl
#[derive(Debug, Clone)]
pub struct RobotsCache {
    fetcher: Fetcher,
    agent: String,
    entries: Arc<Mutex<HashMap<String, Arc<OnceCell<ParsedRobots>>>>>,
}

impl RobotsCache {
    /// Creates an empty cache
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Used to download robots.txt files
    /// * `agent` - Product token matched against `User-agent` lines
    pub fn new(fetcher: Fetcher, agent: impl Into<String>) -> Self {
        Self {
            fetcher,
            agent: agent.into(),
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Checks whether `url` may be crawled
    ///
    /// Fetches and caches the origin's robots.txt on first use. A missing,
    /// unreachable or non-text robots.txt allows everything.
    pub async fn is_allowed(&self, url: &Url) -> bool {
        let Some(origin) = origin_key(url) else {
            return true;
        };

        let cell = {
            let mut entries = self
                .entries
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            entries.entry(origin.clone()).or_default().clone()
        };

        let robots = cell
            .get_or_init(|| self.download(origin))
            .await;

        robots.is_allowed(url.as_str(), &self.agent)
    }

    /// Number of origins whose robots.txt has been resolved
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .values()
            .filter(|cell| cell.initialized())
            .count()
    }

    /// Returns true if no robots.txt has been resolved yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    async fn download(&self, origin: String) -> ParsedRobots {
        let robots_url = match Url::parse(&format!("{}/robots.txt", origin)) {
            Ok(url) => url,
            Err(_) => return ParsedRobots::allow_all(),
        };

        match self.fetcher.fetch(&robots_url).await {
            Ok(page) if !page.body.is_empty() => {
                tracing::debug!("Loaded robots.txt for {}", origin);
                ParsedRobots::from_content(&page.text())
            }
            Ok(_) => ParsedRobots::allow_all(),
            Err(e) => {
                tracing::debug!("No usable robots.txt for {}: {}", origin, e);
                ParsedRobots::allow_all()
            }
        }
    }
}

/// `scheme://host[:port]` for a URL
fn origin_key(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
        None => format!("{}://{}", url.scheme(), host),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FetcherConfig, UserAgentConfig};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> Fetcher {
        let mut config = FetcherConfig::default();
        config.max_retries = 0;
        Fetcher::new(&config, &UserAgentConfig::default()).unwrap()
    }

    #[test]
    fn test_origin_key() {
        let url = Url::parse("https://example.com/a/b").unwrap();
        assert_eq!(origin_key(&url).as_deref(), Some("https://example.com"));

        let url = Url::parse("http://127.0.0.1:8080/x").unwrap();
        assert_eq!(origin_key(&url).as_deref(), Some("http://127.0.0.1:8080"));
    }

    #[tokio::test]
    async fn test_disallowed_path_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private"))
            .expect(1)
            .mount(&server)
            .await;

        let cache = RobotsCache::new(fetcher(), "TestBot");
        let open = Url::parse(&format!("{}/docs", server.uri())).unwrap();
        let closed = Url::parse(&format!("{}/private/page", server.uri())).unwrap();

        assert!(cache.is_allowed(&open).await);
        assert!(!cache.is_allowed(&closed).await);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_robots_allows_all() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let cache = RobotsCache::new(fetcher(), "TestBot");
        let url = Url::parse(&format!("{}/anything", server.uri())).unwrap();
        assert!(cache.is_allowed(&url).await);
    }
}
