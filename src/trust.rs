//! Domain allow-list filtering for discovered URLs.

use tracing::debug;

/// Keeps only URLs that mention a trusted financial-data domain.
#[derive(Debug, Clone)]
pub struct TrustFilter {
    domains: Vec<String>,
}

impl TrustFilter {
    /// Create a filter from allow-list entries. Blank entries are dropped.
    pub fn new<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let domains = domains
            .into_iter()
            .map(|d| d.as_ref().trim().to_string())
            .filter(|d| !d.is_empty())
            .collect();

        Self { domains }
    }

    /// Whether `url` contains at least one allow-list entry, matched exactly.
    fn is_trusted(&self, url: &str) -> bool {
        self.domains.iter().any(|d| url.contains(d.as_str()))
    }

    /// Return the trusted subset of `urls`, preserving order.
    pub fn filter(&self, urls: &[String]) -> Vec<String> {
        let trusted: Vec<String> = urls
            .iter()
            .filter(|url| self.is_trusted(url))
            .cloned()
            .collect();

        debug!("{} of {} discovered URLs are trusted", trusted.len(), urls.len());
        trusted
    }
}
