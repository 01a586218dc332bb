//! HTTP client for page fetches, PDF downloads, and JSON APIs.

mod response;
mod user_agent;

pub use response::{parse_content_disposition_filename, HttpResponse};
pub use user_agent::{resolve_user_agent, BROWSER_USER_AGENT};

use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::Client;

/// Default bound for fetching a publication page.
pub const DEFAULT_PAGE_TIMEOUT: Duration = Duration::from_secs(20);

/// Default bound for downloading a PDF body.
pub const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared HTTP client with browser-like headers and per-kind timeouts.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    page_timeout: Duration,
    download_timeout: Duration,
}

impl HttpClient {
    /// Create a client with the default browser user agent and timeouts.
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_user_agent(None, DEFAULT_PAGE_TIMEOUT, DEFAULT_DOWNLOAD_TIMEOUT)
    }

    /// Create a client with custom user agent configuration.
    /// - None: browser user agent
    /// - Some("impersonate"): random real browser user agent
    /// - Some(custom): custom user agent string
    pub fn with_user_agent(
        user_agent_config: Option<&str>,
        page_timeout: Duration,
        download_timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static(user_agent::ACCEPT));
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_static(user_agent::ACCEPT_LANGUAGE),
        );
        headers.insert(
            header::UPGRADE_INSECURE_REQUESTS,
            HeaderValue::from_static("1"),
        );

        let client = Client::builder()
            .user_agent(resolve_user_agent(user_agent_config))
            .default_headers(headers)
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self {
            client,
            page_timeout,
            download_timeout,
        })
    }

    pub fn page_timeout(&self) -> Duration {
        self.page_timeout
    }

    pub fn download_timeout(&self) -> Duration {
        self.download_timeout
    }

    /// GET a publication page (or feed) with the page timeout.
    pub async fn get_page(&self, url: &str) -> Result<HttpResponse, reqwest::Error> {
        self.get_with_timeout(url, self.page_timeout).await
    }

    /// GET a document body with the download timeout.
    pub async fn get_document(&self, url: &str) -> Result<HttpResponse, reqwest::Error> {
        self.get_with_timeout(url, self.download_timeout).await
    }

    async fn get_with_timeout(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<HttpResponse, reqwest::Error> {
        let start = std::time::Instant::now();
        let response = self.client.get(url).timeout(timeout).send().await?;
        tracing::debug!(
            "GET {} -> {} in {}ms",
            url,
            response.status(),
            start.elapsed().as_millis()
        );
        Ok(HttpResponse::new(response))
    }

    /// GET a JSON document with query parameters, failing on non-success status.
    pub async fn get_json(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<serde_json::Value, reqwest::Error> {
        self.client
            .get(url)
            .query(query)
            .header(header::ACCEPT, "application/json")
            .timeout(self.download_timeout)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }
}
