//! Google Programmable Search (Custom Search JSON API) client.

use super::WebSearch;
use crate::config::SearchSettings;
use crate::error::{FinragError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// The API returns at most this many items per request.
const PAGE_SIZE: usize = 10;

/// `start + num` may not exceed 100.
const MAX_START: usize = 91;

/// Search client backed by the Custom Search JSON API.
pub struct GoogleSearch {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    engine_id: String,
    pause: Duration,
}

#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    link: String,
}

impl GoogleSearch {
    /// Create a client with explicit credentials.
    pub fn new(endpoint: &str, api_key: &str, engine_id: &str, pause: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| FinragError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
            engine_id: engine_id.to_string(),
            pause,
        })
    }

    /// Create a client from settings, resolving credentials from the environment.
    pub fn from_settings(settings: &SearchSettings) -> Result<Self> {
        let api_key = settings.resolved_api_key().ok_or_else(|| {
            FinragError::Config(
                "Search API key not set. Set search.api_key or export GOOGLE_API_KEY".to_string(),
            )
        })?;
        let engine_id = settings.resolved_engine_id().ok_or_else(|| {
            FinragError::Config(
                "Search engine id not set. Set search.engine_id or export GOOGLE_CSE_ID"
                    .to_string(),
            )
        })?;

        Self::new(&settings.endpoint, &api_key, &engine_id, settings.pause())
    }

    async fn fetch_page(&self, query: &str, start: usize, num: usize) -> Result<SearchPage> {
        debug!("Requesting search results {}..{}", start, start + num - 1);

        let num = num.to_string();
        let start = start.to_string();
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.engine_id.as_str()),
                ("q", query),
                ("num", num.as_str()),
                ("start", start.as_str()),
            ])
            .send()
            .await
            .map_err(|e| FinragError::Discovery(format!("Search request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FinragError::Discovery(format!(
                "Search API returned {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        response
            .json::<SearchPage>()
            .await
            .map_err(|e| FinragError::Discovery(format!("Malformed search response: {}", e)))
    }
}

fn is_web_url(link: &str) -> bool {
    url::Url::parse(link)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

#[async_trait]
impl WebSearch for GoogleSearch {
    #[instrument(skip(self))]
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>> {
        let mut urls = Vec::with_capacity(limit);
        let mut seen = HashSet::new();
        let mut start = 1;

        while urls.len() < limit && start <= MAX_START {
            if start > 1 && !self.pause.is_zero() {
                tokio::time::sleep(self.pause).await;
            }

            let num = (limit - urls.len()).min(PAGE_SIZE);
            let page = self.fetch_page(query, start, num).await?;
            let returned = page.items.len();

            for item in page.items {
                if is_web_url(&item.link) && seen.insert(item.link.clone()) {
                    urls.push(item.link);
                }
            }

            if returned < num {
                break;
            }
            start += returned;
        }

        urls.truncate(limit);
        info!("Discovered {} URLs", urls.len());
        Ok(urls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn page(links: &[String]) -> serde_json::Value {
        serde_json::json!({
            "items": links.iter().map(|l| serde_json::json!({ "link": l })).collect::<Vec<_>>()
        })
    }

    fn client(server: &MockServer) -> GoogleSearch {
        GoogleSearch::new(
            &format!("{}/customsearch/v1", server.uri()),
            "key",
            "cx",
            Duration::ZERO,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_pages_until_limit() {
        let server = MockServer::start().await;

        let first: Vec<String> = (0..10).map(|i| format!("https://groww.in/{}", i)).collect();
        let second: Vec<String> = (10..15).map(|i| format!("https://groww.in/{}", i)).collect();

        Mock::given(method("GET"))
            .and(path("/customsearch/v1"))
            .and(query_param("start", "1"))
            .and(query_param("num", "10"))
            .and(query_param("q", "tcs share price"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(&first)))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/customsearch/v1"))
            .and(query_param("start", "11"))
            .and(query_param("num", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(&second)))
            .expect(1)
            .mount(&server)
            .await;

        let urls = client(&server).search("tcs share price", 15).await.unwrap();
        assert_eq!(urls.len(), 15);
        assert_eq!(urls[0], "https://groww.in/0");
        assert_eq!(urls[14], "https://groww.in/14");
    }

    #[tokio::test]
    async fn test_no_items_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let urls = client(&server).search("nothing", 15).await.unwrap();
        assert!(urls.is_empty());
    }

    #[tokio::test]
    async fn test_drops_duplicates_and_non_web_links() {
        let server = MockServer::start().await;
        let links = vec![
            "https://screener.in/a".to_string(),
            "ftp://files.example.com/x".to_string(),
            "https://screener.in/a".to_string(),
        ];
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(&links)))
            .mount(&server)
            .await;

        let urls = client(&server).search("q", 10).await.unwrap();
        assert_eq!(urls, vec!["https://screener.in/a".to_string()]);
    }

    #[tokio::test]
    async fn test_provider_error_is_discovery_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_string("quota exceeded"))
            .mount(&server)
            .await;

        let err = client(&server).search("q", 5).await.unwrap_err();
        assert!(matches!(err, FinragError::Discovery(_)));
        assert!(err.to_string().contains("403"));
    }
}
