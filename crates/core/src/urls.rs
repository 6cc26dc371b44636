//! URL validation, normalization, hashing, and crawl-policy helpers.
//!
//! Every function here is total: invalid input yields `false`, `None`,
//! or the original string, never an error.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

static URL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^https?://(?:(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,6}\.?|localhost|\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3})(?::\d+)?(?:/?|[/?]\S+)$",
    )
    .expect("url pattern")
});

/// Conservative syntactic check: http(s) scheme, plausible host
/// (dotted domain, localhost, or IPv4), optional port and path.
pub fn is_valid(url: &str) -> bool {
    if url.is_empty() || !URL_PATTERN.is_match(url) {
        return false;
    }
    match Url::parse(url) {
        Ok(parsed) => {
            matches!(parsed.scheme(), "http" | "https")
                && parsed.host_str().is_some_and(|h| !h.is_empty())
        }
        Err(_) => false,
    }
}

fn keep_query_param(param: &str) -> bool {
    match param.split_once('=') {
        Some((key, _)) => {
            let key = key.to_ascii_lowercase();
            !(key.starts_with("utm_") || key == "ref" || key == "source")
        }
        None => false,
    }
}

/// Canonical form used for dedup: lowercase scheme and host, no
/// fragment, tracking query parameters dropped (order preserved),
/// trailing slashes stripped. Unparseable input comes back unchanged.
pub fn normalize(url: &str) -> String {
    let Ok(mut parsed) = Url::parse(url) else {
        return url.to_string();
    };
    parsed.set_fragment(None);

    let filtered = parsed
        .query()
        .map(|q| q.split('&').filter(|p| keep_query_param(p)).collect::<Vec<_>>().join("&"));
    match filtered {
        Some(q) if !q.is_empty() => parsed.set_query(Some(&q)),
        _ => parsed.set_query(None),
    }

    let mut out = parsed.to_string();
    while out.ends_with('/') {
        out.pop();
    }
    out
}

/// Frontier identity of a URL: MD5 hex of its normalized form.
pub fn url_hash(url: &str) -> String {
    format!("{:x}", md5::compute(normalize(url).as_bytes()))
}

pub fn host_of(url: &str) -> Option<String> {
    Url::parse(url).ok().and_then(|u| u.host_str().map(|h| h.to_lowercase()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainInfo {
    pub domain: String,
    pub subdomain: String,
    pub suffix: String,
    pub registered_domain: String,
}

/// Public-suffix-aware split of a URL's host. Hosts without a known
/// suffix fall back to the whole host as the registered domain.
pub fn domain_info(url: &str) -> DomainInfo {
    let host = host_of(url).unwrap_or_default();
    match psl::domain(host.as_bytes()) {
        Some(parsed) => {
            let registered = String::from_utf8_lossy(parsed.as_bytes()).into_owned();
            let suffix = String::from_utf8_lossy(parsed.suffix().as_bytes()).into_owned();
            let domain = registered
                .strip_suffix(suffix.as_str())
                .map(|d| d.trim_end_matches('.').to_string())
                .unwrap_or_default();
            let subdomain = host
                .strip_suffix(registered.as_str())
                .map(|s| s.trim_end_matches('.').to_string())
                .unwrap_or_default();
            DomainInfo { domain, subdomain, suffix, registered_domain: registered }
        }
        None => DomainInfo {
            domain: host.clone(),
            subdomain: String::new(),
            suffix: String::new(),
            registered_domain: host,
        },
    }
}

/// Crawl-policy gate: invalid URLs are rejected; a seed-domain set
/// restricts hosts; block patterns veto; allow patterns, when given,
/// require at least one match.
pub fn should_crawl(
    url: &str,
    seed_domains: Option<&HashSet<String>>,
    allowed_patterns: Option<&[Regex]>,
    blocked_patterns: Option<&[Regex]>,
) -> bool {
    if !is_valid(url) {
        return false;
    }

    if let Some(domains) = seed_domains {
        match host_of(url) {
            Some(host) if domains.contains(&host) => {}
            _ => return false,
        }
    }

    if let Some(blocked) = blocked_patterns {
        if blocked.iter().any(|re| re.is_match(url)) {
            return false;
        }
    }

    if let Some(allowed) = allowed_patterns {
        return allowed.iter().any(|re| re.is_match(url));
    }

    true
}

pub fn has_excluded_extension(url: &Url, extensions: &[String]) -> bool {
    let path = url.path().to_lowercase();
    extensions.iter().any(|ext| path.ends_with(ext.as_str()))
}

/// Minimum inter-request delay for a domain. A few well-known hosts
/// get explicit politeness overrides; everything else uses the default.
pub fn rate_limit_delay(domain: &str, default_delay: f64) -> f64 {
    match domain {
        "wikipedia.org" => 0.5,
        "github.com" => 1.0,
        "stackoverflow.com" => 2.0,
        "reddit.com" => 3.0,
        "twitter.com" | "facebook.com" => 5.0,
        _ => default_delay,
    }
}

pub fn robots_url(base_url: &str) -> Option<String> {
    let parsed = Url::parse(base_url).ok()?;
    let host = parsed.host_str()?;
    let authority = match parsed.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    };
    Some(format!("{}://{}/robots.txt", parsed.scheme(), authority))
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RobotsRules {
    pub allowed: Vec<String>,
    pub disallowed: Vec<String>,
    pub crawl_delay: Option<f64>,
    pub sitemaps: Vec<String>,
}

/// Parse robots.txt, honoring groups for the exact user agent and `*`.
/// Sitemap lines are collected wherever they appear.
pub fn parse_robots(robots_content: &str, user_agent: &str) -> RobotsRules {
    let mut rules = RobotsRules::default();
    let mut current_agent: Option<String> = None;

    for line in robots_content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let lower = line.to_lowercase();
        if let Some(value) = line.split_once(':').map(|(_, v)| v.trim()) {
            if lower.starts_with("user-agent:") {
                current_agent = Some(value.to_string());
                continue;
            }
            if lower.starts_with("sitemap:") {
                if !value.is_empty() {
                    rules.sitemaps.push(value.to_string());
                }
                continue;
            }

            let applies = current_agent
                .as_deref()
                .is_some_and(|ua| ua == user_agent || ua == "*");
            if !applies {
                continue;
            }

            if lower.starts_with("disallow:") {
                if !value.is_empty() {
                    rules.disallowed.push(value.to_string());
                }
            } else if lower.starts_with("allow:") {
                if !value.is_empty() {
                    rules.allowed.push(value.to_string());
                }
            } else if lower.starts_with("crawl-delay:") {
                if let Ok(delay) = value.parse::<f64>() {
                    rules.crawl_delay = Some(delay);
                }
            }
        }
    }

    rules
}
