//! URL handling module for Sumi-Scroll
//!
//! This module provides URL normalization, domain extraction, wildcard matching,
//! exclusion rules and the [`ScopePolicy`] that decides which discovered URLs
//! belong to the crawl.

mod domain;
mod matcher;
mod normalize;

use crate::config::CrawlerConfig;
use crate::UrlError;
use url::Url;

pub use domain::{extract_domain, root_domain, root_of_host, site_name, strip_www};
pub use matcher::{exclusion_reason, matches_wildcard, path_extension, ExclusionReason};
pub use normalize::{is_tracking_param, normalize_link, normalize_parsed, normalize_url};

/// Outcome of checking a URL against a [`ScopePolicy`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeDecision {
    /// Same host as the root (ignoring a `www.` prefix)
    SameHost,
    /// Another host under the root's registrable domain
    SameRootDomain,
    /// Allow-listed asset host whose subdomain embeds the root's site name
    AssetHost,
    /// A different site
    OutOfScope,
    /// In scope by domain, but matched an exclusion rule
    Excluded(ExclusionReason),
}

impl ScopeDecision {
    /// Returns true if the URL may be enqueued
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::SameHost | Self::SameRootDomain | Self::AssetHost)
    }
}

/// Scope rules derived from the root URL
///
/// A URL is in scope when its host is the root host, shares the root's
/// registrable domain, or is an allow-listed asset host (for example
/// `acme.github.io` for a crawl rooted at `acme.com`). On the root host an
/// explicit non-default port must match the root's, so local test servers
/// stay isolated while `http` and `https` on default ports count as one site.
#[derive(Debug, Clone)]
pub struct ScopePolicy {
    host: String,
    root_domain: String,
    /// Explicit non-default port of the root, if any
    port: Option<u16>,
    asset_hosts: Vec<String>,
    excluded_paths: Vec<String>,
}

impl ScopePolicy {
    /// Builds a scope policy for a crawl rooted at `root`
    ///
    /// # Arguments
    ///
    /// * `root` - The normalized root URL
    /// * `config` - Crawler configuration (asset-host allow-list, exclusions)
    ///
    /// # Returns
    ///
    /// * `Ok(ScopePolicy)` - The policy
    /// * `Err(UrlError)` - The root URL has no host
    pub fn from_root(root: &Url, config: &CrawlerConfig) -> Result<Self, UrlError> {
        let host = extract_domain(root).ok_or(UrlError::MissingDomain)?;
        let root_domain = root_domain(root).ok_or(UrlError::MissingDomain)?;

        Ok(Self {
            host: strip_www(&host).to_string(),
            root_domain,
            port: root.port(),
            asset_hosts: config.asset_hosts.clone(),
            excluded_paths: config.excluded_paths.clone(),
        })
    }

    /// The root host, without `www.`
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The root's registrable domain
    pub fn root_domain(&self) -> &str {
        &self.root_domain
    }

    /// Classifies a URL
    ///
    /// Domain matching is checked first; exclusion rules only apply to URLs
    /// that are otherwise in scope.
    pub fn classify(&self, url: &Url) -> ScopeDecision {
        let domain_decision = self.classify_host(url);
        if !domain_decision.is_accepted() {
            return domain_decision;
        }

        match exclusion_reason(url, &self.excluded_paths) {
            Some(reason) => ScopeDecision::Excluded(reason),
            None => domain_decision,
        }
    }

    /// Returns true if the URL passes domain matching and exclusion rules
    pub fn accepts(&self, url: &Url) -> bool {
        self.classify(url).is_accepted()
    }

    fn classify_host(&self, url: &Url) -> ScopeDecision {
        let Some(host) = extract_domain(url) else {
            return ScopeDecision::OutOfScope;
        };
        let host = strip_www(&host);

        if url.port() != self.port && host == self.host {
            return ScopeDecision::OutOfScope;
        }

        if host == self.host {
            return ScopeDecision::SameHost;
        }

        if host.ends_with(&format!(".{}", self.root_domain)) || host == self.root_domain {
            return ScopeDecision::SameRootDomain;
        }

        if self.is_asset_host(host) {
            return ScopeDecision::AssetHost;
        }

        ScopeDecision::OutOfScope
    }

    fn is_asset_host(&self, host: &str) -> bool {
        let name = site_name(&self.root_domain);
        if name.is_empty() || name.parse::<u8>().is_ok() {
            return false;
        }

        self.asset_hosts.iter().any(|pattern| {
            let Some(base) = pattern.strip_prefix("*.") else {
                return false;
            };
            if !matches_wildcard(pattern, host) || host == base {
                return false;
            }
            let subdomain = &host[..host.len() - base.len() - 1];
            subdomain
                .split(|c| c == '.' || c == '-')
                .any(|label| label == name)
                || subdomain.contains(&self.root_domain.replace('.', "-"))
        })
    }
}
