//! HTTP page fetcher with HTML-to-text extraction.

use super::PageFetcher;
use crate::config::LoaderSettings;
use crate::error::{FinragError, Result};
use async_trait::async_trait;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use std::time::Duration;
use tracing::{debug, instrument};

/// Elements whose content is never part of the readable text.
const SKIPPED_TAGS: &[&str] = &[
    "script", "style", "noscript", "template", "svg", "iframe", "nav", "footer", "aside",
    "form", "button", "select",
];

/// Site chrome when placed directly under `<body>`; content headings elsewhere.
const PAGE_CHROME_TAGS: &[&str] = &["header"];

/// Elements that start a new paragraph in the extracted text.
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "section", "article", "main", "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol",
    "li", "table", "tr", "blockquote", "pre", "dl", "dt", "dd", "figure", "figcaption",
];

/// Fetches pages over HTTP and extracts readable text.
pub struct HttpPageFetcher {
    client: reqwest::Client,
    inline_space: Regex,
}

impl HttpPageFetcher {
    /// Create a fetcher with the given User-Agent and request timeout.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(timeout)
            .build()
            .map_err(|e| FinragError::Config(format!("Failed to create HTTP client: {}", e)))?;

        // Any whitespace other than a newline.
        let inline_space =
            Regex::new(r"[^\S\n]+").map_err(|e| FinragError::Config(e.to_string()))?;

        Ok(Self {
            client,
            inline_space,
        })
    }

    pub fn from_settings(settings: &LoaderSettings, timeout: Duration) -> Result<Self> {
        Self::new(&settings.user_agent, timeout)
    }

    /// Reduce an HTML document to paragraphs of plain text.
    pub fn extract_text(&self, html: &str) -> String {
        let document = Html::parse_document(html);

        let mut raw = String::new();
        match Selector::parse("body")
            .ok()
            .and_then(|sel| document.select(&sel).next())
        {
            Some(body) => collect_text(body, true, &mut raw),
            None => collect_text(document.root_element(), true, &mut raw),
        }

        self.normalize(&raw)
    }

    /// Collapse runs of spaces and keep at most one blank line between paragraphs.
    fn normalize(&self, raw: &str) -> String {
        let collapsed = self.inline_space.replace_all(raw, " ");

        let mut out = String::with_capacity(collapsed.len());
        let mut pending_break = false;
        for line in collapsed.lines() {
            let line = line.trim();
            if line.is_empty() {
                pending_break = !out.is_empty();
                continue;
            }
            if !out.is_empty() {
                out.push_str(if pending_break { "\n\n" } else { "\n" });
            }
            out.push_str(line);
            pending_break = false;
        }
        out
    }
}

fn collect_text(element: ElementRef<'_>, top_level: bool, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                let name = el.name();
                if SKIPPED_TAGS.contains(&name)
                    || (top_level && PAGE_CHROME_TAGS.contains(&name))
                {
                    continue;
                }
                if name == "br" {
                    out.push('\n');
                    continue;
                }

                let block = BLOCK_TAGS.contains(&name);
                if block {
                    out.push_str("\n\n");
                } else if matches!(name, "td" | "th") {
                    out.push(' ');
                }
                if let Some(child_el) = ElementRef::wrap(child) {
                    collect_text(child_el, false, out);
                }
                if block {
                    out.push_str("\n\n");
                }
            }
            _ => {}
        }
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    #[instrument(skip(self))]
    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FinragError::fetch(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FinragError::fetch(url, format!("HTTP {}", status.as_u16())));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("text/html")
            .to_lowercase();

        let body = response.text().await.map_err(|e| FinragError::fetch(url, e))?;
        debug!("Fetched {} bytes ({})", body.len(), content_type);

        if content_type.contains("html") || content_type.contains("xml") {
            Ok(self.extract_text(&body))
        } else if content_type.starts_with("text/") {
            Ok(self.normalize(&body))
        } else {
            Err(FinragError::fetch(
                url,
                format!("unsupported content type {}", content_type),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> HttpPageFetcher {
        HttpPageFetcher::new("finrag-test", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_extract_text_drops_chrome() {
        let html = r#"<html><head><title>T</title><style>p{}</style></head>
            <body>
              <nav>Home | Markets</nav>
              <h1>TCS Q3 results</h1>
              <p>Net profit rose   <b>12%</b> year on year.</p>
              <script>track()</script>
              <p>Revenue: Rs 60,000 cr<br>Margin: 25%</p>
              <footer>Copyright</footer>
            </body></html>"#;

        let text = fetcher().extract_text(html);
        assert_eq!(
            text,
            "TCS Q3 results\n\nNet profit rose 12% year on year.\n\n\
             Revenue: Rs 60,000 cr\nMargin: 25%"
        );
    }

    #[test]
    fn test_article_header_is_kept() {
        let html = "<html><body>\
            <header>Markets | Sign in</header>\
            <article><header><h1>Infosys raises guidance</h1><p>By Staff</p></header>\
            <p>Infosys now expects 4% growth.</p></article>\
            </body></html>";

        let text = fetcher().extract_text(html);
        assert_eq!(
            text,
            "Infosys raises guidance\n\nBy Staff\n\nInfosys now expects 4% growth."
        );
    }

    #[test]
    fn test_extract_text_table_cells() {
        let html = "<table><tr><th>Ratio</th><th>Value</th></tr>\
            <tr><td>P/E</td><td>31.2</td></tr></table>";
        let text = fetcher().extract_text(html);
        assert_eq!(text, "Ratio Value\n\nP/E 31.2");
    }

    #[tokio::test]
    async fn test_fetch_html_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/company/TCS"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(
                    "<html><body><p>Market cap 14 lakh cr</p></body></html>",
                    "text/html; charset=utf-8",
                ),
            )
            .mount(&server)
            .await;

        let text = fetcher()
            .fetch(&format!("{}/company/TCS", server.uri()))
            .await
            .unwrap();
        assert_eq!(text, "Market cap 14 lakh cr");
    }

    #[tokio::test]
    async fn test_fetch_plain_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("NIFTY 50 closed at 22,000\n"))
            .mount(&server)
            .await;

        let text = fetcher().fetch(&server.uri()).await.unwrap();
        assert_eq!(text, "NIFTY 50 closed at 22,000");
    }

    #[tokio::test]
    async fn test_fetch_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = fetcher().fetch(&server.uri()).await.unwrap_err();
        assert!(matches!(err, FinragError::DocumentFetch { .. }));
        assert!(err.to_string().contains("HTTP 404"));
    }

    #[tokio::test]
    async fn test_fetch_rejects_binary() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(vec![0x25u8, 0x50, 0x44, 0x46], "application/pdf"),
            )
            .mount(&server)
            .await;

        let err = fetcher().fetch(&server.uri()).await.unwrap_err();
        assert!(err.to_string().contains("unsupported content type"));
    }
}
