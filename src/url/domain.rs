use url::{Host, Url};

/// Second-level labels that act as public suffixes under a country TLD
/// (e.g. `co.uk`, `com.au`); the registrable domain needs one more label.
const SECOND_LEVEL_SUFFIXES: &[&str] = &["co", "com", "net", "org", "gov", "ac", "edu", "ne", "or"];

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
/// A leading `www.` is kept; use [`strip_www`] when comparing sites.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sumi_scroll::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Removes a leading `www.` label
pub fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

/// Derives the registrable ("root") domain of a URL's host
///
/// `docs.example.com` → `example.com`, `shop.example.co.uk` → `example.co.uk`.
/// IP addresses and single-label hosts are returned unchanged.
pub fn root_domain(url: &Url) -> Option<String> {
    match url.host()? {
        Host::Ipv4(addr) => Some(addr.to_string()),
        Host::Ipv6(addr) => Some(addr.to_string()),
        Host::Domain(domain) => Some(root_of_host(&domain.to_lowercase())),
    }
}

/// Registrable domain of a host name (see [`root_domain`])
pub fn root_of_host(host: &str) -> String {
    let labels: Vec<&str> = host.split('.').filter(|l| !l.is_empty()).collect();
    if labels.len() <= 2 {
        return labels.join(".");
    }

    let n = labels.len();
    let keep = if labels[n - 1].len() == 2 && SECOND_LEVEL_SUFFIXES.contains(&labels[n - 2]) {
        3
    } else {
        2
    };

    labels[n - keep..].join(".")
}

/// The site name of a registrable domain: `example.co.uk` → `example`
pub fn site_name(root: &str) -> &str {
    root.split('.').next().unwrap_or(root)
}
