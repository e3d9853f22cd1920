//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings and headers
//! - Retry logic for transient failures, driven by a [`RetryPolicy`]
//! - Manual redirect handling with loop detection
//! - Content-type classification (with HTML sniffing for ambiguous types)

use crate::config::{FetcherConfig, UserAgentConfig};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, LOCATION};
use reqwest::{redirect::Policy, Client, StatusCode};
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// How many leading bytes are inspected when sniffing for HTML
const SNIFF_LEN: usize = 1024;

/// Typed failure of a fetch, returned after retries are exhausted
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("HTTP {status} for {url} after {attempts} attempt(s)")]
    Status {
        url: String,
        status: u16,
        attempts: u32,
    },

    #[error("Network error for {url} after {attempts} attempt(s): {message}")]
    Network {
        url: String,
        message: String,
        attempts: u32,
    },

    #[error("Too many redirects from {url}")]
    RedirectLimit { url: String },

    #[error("Redirect loop detected at {url}")]
    RedirectLoop { url: String },

    #[error("Invalid redirect from {url}: {message}")]
    InvalidRedirect { url: String, message: String },

    #[error("Response from {url} exceeds {limit} bytes")]
    TooLarge { url: String, limit: u64 },
}

impl FetchError {
    /// The HTTP status code behind this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Number of attempts made before giving up
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Status { attempts, .. } | Self::Network { attempts, .. } => *attempts,
            _ => 1,
        }
    }

    fn with_attempts(mut self, n: u32) -> Self {
        match &mut self {
            Self::Status { attempts, .. } | Self::Network { attempts, .. } => *attempts = n,
            _ => {}
        }
        self
    }
}

/// Retry policy applied uniformly to every request
///
/// Transient failures (408, 429, 5xx, timeouts, connection errors) are
/// retried up to `max_retries` times; the n-th retry waits `n * base_delay`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay unit; multiplied by the retry number
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Builds the policy from fetcher configuration
    pub fn from_config(config: &FetcherConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
        }
    }

    /// Total number of attempts allowed per request
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Delay before the given retry (1-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay * retry
    }

    /// Returns true if a response status should be retried
    pub fn is_retryable_status(status: StatusCode) -> bool {
        status == StatusCode::REQUEST_TIMEOUT
            || status == StatusCode::TOO_MANY_REQUESTS
            || status.is_server_error()
    }

    /// Returns true if a transport error should be retried
    pub fn is_retryable_error(error: &reqwest::Error) -> bool {
        error.is_timeout() || error.is_connect() || error.is_request() || error.is_body()
    }
}

/// Coarse classification of a response body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    Html,
    PlainText,
    Markdown,
    Json,
    Xml,
    Image,
    Other,
}

impl ContentKind {
    /// Classifies a response from its Content-Type header and body
    ///
    /// An empty or ambiguous content type (`application/octet-stream`,
    /// `binary/octet-stream`) is probed for a doctype or `<html` marker
    /// before being treated as [`ContentKind::Other`].
    pub fn classify(content_type: &str, body: &[u8]) -> Self {
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();

        match mime.as_str() {
            "text/html" | "application/xhtml+xml" => Self::Html,
            "text/markdown" | "text/x-markdown" => Self::Markdown,
            "text/plain" => {
                if looks_like_html(body) {
                    Self::Html
                } else {
                    Self::PlainText
                }
            }
            "application/json" | "application/ld+json" => Self::Json,
            "application/xml" | "text/xml" => Self::Xml,
            "" | "application/octet-stream" | "binary/octet-stream" => {
                if looks_like_html(body) {
                    Self::Html
                } else {
                    Self::Other
                }
            }
            m if m.starts_with("image/") => Self::Image,
            m if m.ends_with("+json") => Self::Json,
            m if m.ends_with("+xml") => Self::Xml,
            _ => Self::Other,
        }
    }
}

/// Checks the start of a body for HTML markers
pub fn looks_like_html(body: &[u8]) -> bool {
    let head = &body[..body.len().min(SNIFF_LEN)];
    let head = String::from_utf8_lossy(head).to_ascii_lowercase();
    let head = head.trim_start_matches('\u{feff}').trim_start();
    head.starts_with("<!doctype html") || head.contains("<html")
}

/// A successfully fetched response
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// The URL that was requested
    pub url: Url,
    /// Final URL after redirects
    pub final_url: Url,
    /// HTTP status code of the final response
    pub status: u16,
    /// Response headers of the final response
    pub headers: HeaderMap,
    /// Raw Content-Type header value (empty when absent)
    pub content_type: String,
    /// Classified content kind
    pub kind: ContentKind,
    /// Response body
    pub body: Vec<u8>,
}

impl FetchedPage {
    /// Body decoded as UTF-8 (lossy)
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Returns true if at least one redirect was followed
    pub fn redirected(&self) -> bool {
        self.url != self.final_url
    }
}

/// Builds an HTTP client with proper configuration
///
/// Redirects are disabled on the client; [`Fetcher`] follows them by hand so
/// that loops and hop counts are under its control.
///
/// # Arguments
///
/// * `fetcher` - Timeouts and extra headers
/// * `user_agent` - The user agent configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(
    fetcher: &FetcherConfig,
    user_agent: &UserAgentConfig,
) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    for (name, value) in &fetcher.headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => tracing::warn!("Ignoring invalid request header '{}'", name),
        }
    }

    Client::builder()
        .user_agent(user_agent.header_value())
        .default_headers(headers)
        .timeout(Duration::from_secs(fetcher.request_timeout_secs))
        .connect_timeout(Duration::from_secs(fetcher.connect_timeout_secs))
        .redirect(Policy::none())
        .gzip(true)
        .brotli(true)
        .build()
}

/// Failure of a single attempt, tagged with whether it may be retried
struct AttemptError {
    error: FetchError,
    retryable: bool,
}

impl AttemptError {
    fn fatal(error: FetchError) -> Self {
        Self {
            error,
            retryable: false,
        }
    }
}

/// Bounded, retried HTTP fetcher
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    policy: RetryPolicy,
    max_redirects: u32,
}

impl Fetcher {
    /// Creates a fetcher from configuration
    pub fn new(fetcher: &FetcherConfig, user_agent: &UserAgentConfig) -> Result<Self, reqwest::Error> {
        let client = build_http_client(fetcher, user_agent)?;
        Ok(Self::with_client(
            client,
            RetryPolicy::from_config(fetcher),
            fetcher.max_redirects,
        ))
    }

    /// Creates a fetcher around an existing client
    pub fn with_client(client: Client, policy: RetryPolicy, max_redirects: u32) -> Self {
        Self {
            client,
            policy,
            max_redirects,
        }
    }

    /// The retry policy in use
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetches a URL with retry and redirect handling
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | HTTP 408 / 429 / 5xx | Retry, `n * base_delay` between attempts |
    /// | Timeout / connect / reset | Retry, `n * base_delay` between attempts |
    /// | Other HTTP 4xx | Immediate failure |
    /// | Redirect loop / too many hops | Immediate failure |
    ///
    /// # Returns
    ///
    /// * `Ok(FetchedPage)` - Final response after redirects
    /// * `Err(FetchError)` - Typed failure after the last attempt
    pub async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        self.fetch_limited(url, None).await
    }

    /// Like [`Fetcher::fetch`], but rejects bodies larger than `limit` bytes
    pub async fn fetch_limited(
        &self,
        url: &Url,
        limit: Option<u64>,
    ) -> Result<FetchedPage, FetchError> {
        let max_attempts = self.policy.max_attempts();
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.fetch_once(url, limit).await {
                Ok(page) => return Ok(page),
                Err(failure) if failure.retryable && attempt < max_attempts => {
                    let delay = self.policy.delay_for(attempt);
                    tracing::debug!(
                        "Attempt {}/{} for {} failed ({}), retrying in {:?}",
                        attempt,
                        max_attempts,
                        url,
                        failure.error,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(failure) => return Err(failure.error.with_attempts(attempt)),
            }
        }
    }

    /// One attempt: follows redirects and reads the final body
    async fn fetch_once(&self, url: &Url, limit: Option<u64>) -> Result<FetchedPage, AttemptError> {
        let mut current = url.clone();
        let mut seen: HashSet<String> = HashSet::new();
        seen.insert(current.to_string());

        let mut hops = 0;
        let response = loop {
            let response = self
                .client
                .get(current.clone())
                .send()
                .await
                .map_err(|e| network_failure(&current, e))?;

            let status = response.status();
            if !status.is_redirection() {
                break response;
            }

            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| {
                    AttemptError::fatal(FetchError::InvalidRedirect {
                        url: current.to_string(),
                        message: format!("HTTP {} without Location header", status.as_u16()),
                    })
                })?;

            let next = current.join(location).map_err(|e| {
                AttemptError::fatal(FetchError::InvalidRedirect {
                    url: current.to_string(),
                    message: e.to_string(),
                })
            })?;

            if !seen.insert(next.to_string()) {
                return Err(AttemptError::fatal(FetchError::RedirectLoop {
                    url: next.to_string(),
                }));
            }

            hops += 1;
            if hops > self.max_redirects {
                return Err(AttemptError::fatal(FetchError::RedirectLimit {
                    url: url.to_string(),
                }));
            }

            tracing::trace!("Redirect {} -> {}", current, next);
            current = next;
        };

        let status = response.status();
        if !status.is_success() {
            return Err(AttemptError {
                error: FetchError::Status {
                    url: current.to_string(),
                    status: status.as_u16(),
                    attempts: 1,
                },
                retryable: RetryPolicy::is_retryable_status(status),
            });
        }

        if let (Some(limit), Some(length)) = (limit, response.content_length()) {
            if length > limit {
                return Err(AttemptError::fatal(FetchError::TooLarge {
                    url: current.to_string(),
                    limit,
                }));
            }
        }

        let headers = response.headers().clone();
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        let body = response
            .bytes()
            .await
            .map_err(|e| network_failure(&current, e))?
            .to_vec();

        if let Some(limit) = limit {
            if body.len() as u64 > limit {
                return Err(AttemptError::fatal(FetchError::TooLarge {
                    url: current.to_string(),
                    limit,
                }));
            }
        }

        Ok(FetchedPage {
            url: url.clone(),
            final_url: current,
            status: status.as_u16(),
            kind: ContentKind::classify(&content_type, &body),
            headers,
            content_type,
            body,
        })
    }
}

fn network_failure(url: &Url, error: reqwest::Error) -> AttemptError {
    let retryable = RetryPolicy::is_retryable_error(&error);
    let message = if error.is_timeout() {
        "Request timeout".to_string()
    } else if error.is_connect() {
        format!("Connection failed: {}", error)
    } else {
        error.to_string()
    };

    AttemptError {
        error: FetchError::Network {
            url: url.to_string(),
            message,
            attempts: 1,
        },
        retryable,
    }
}
