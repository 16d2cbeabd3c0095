//! Concurrent page fetching.

use std::time::{Duration, Instant};

use futures::future;
use scraper::Html;

use crate::config::ScraperConfig;
use crate::error::ScraperError;
use crate::page::Page;
use crate::url::PageUrl;

/// Batch HTTP fetcher for netkeiba pages.
///
/// All URLs in a batch are dispatched concurrently over one shared client;
/// the call joins on every request and returns one result per input URL, in
/// input order regardless of completion order. A transport failure marks
/// only its own slot.
pub struct Fetcher {
    client: reqwest::Client,
}

impl Fetcher {
    pub fn new() -> Fetcher {
        Fetcher::with_config(&ScraperConfig::default())
    }

    pub fn with_config(config: &ScraperConfig) -> Fetcher {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(&config.user_agent)
            .build()
            .expect("failed to create HTTP client");

        Fetcher { client }
    }

    /// Fetch and parse a single page.
    pub async fn fetch_one(&self, url: PageUrl) -> Result<Page, ScraperError> {
        let mut pages = self.fetch_all(vec![url]).await;
        pages.remove(0)
    }

    /// Fetch and parse every page in the list concurrently.
    ///
    /// The output position i corresponds to `urls[i]`.
    pub async fn fetch_all(&self, urls: Vec<PageUrl>) -> Vec<Result<Page, ScraperError>> {
        let started = Instant::now();
        let count = urls.len();

        let pages = future::join_all(urls.into_iter().map(|url| self.fetch_page(url))).await;

        tracing::info!(
            "{} requests. Time: {:.3} [sec]",
            count,
            started.elapsed().as_secs_f64()
        );
        pages
    }

    async fn fetch_page(&self, url: PageUrl) -> Result<Page, ScraperError> {
        let response = self
            .client
            .get(url.url())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ScraperError::Request {
                url: url.url().to_string(),
                source: e,
            })?;

        let body = response.text().await.map_err(|e| ScraperError::Request {
            url: url.url().to_string(),
            source: e,
        })?;

        // html5ever recovers from malformed markup instead of failing, so a
        // fetched body always yields a tree. Surface what it had to repair.
        let html = Html::parse_document(&body);
        if !html.errors.is_empty() {
            tracing::debug!(
                "{} recoverable parse errors in {}",
                html.errors.len(),
                url.url()
            );
        }

        Ok(Page::new(url, html))
    }
}

impl Default for Fetcher {
    fn default() -> Self {
        Fetcher::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::PageCategory;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn page_url(base: &str, route: &str) -> PageUrl {
        PageUrl::raw(format!("{base}{route}"), PageCategory::RaceCard)
    }

    fn body_text(page: &Page) -> String {
        page.html().root_element().text().collect()
    }

    async fn mount_page(server: &MockServer, route: &str, marker: &str, delay_ms: u64) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_millis(delay_ms))
                    .set_body_string(format!("<html><body>{marker}</body></html>")),
            )
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_fetch_all_preserves_input_order() {
        let server = MockServer::start().await;
        // The first URL completes last; output order must still follow
        // input order.
        mount_page(&server, "/slow", "page-slow", 300).await;
        mount_page(&server, "/fast", "page-fast", 0).await;
        mount_page(&server, "/mid", "page-mid", 100).await;

        let urls = vec![
            page_url(&server.uri(), "/slow"),
            page_url(&server.uri(), "/fast"),
            page_url(&server.uri(), "/mid"),
        ];
        let pages = Fetcher::new().fetch_all(urls).await;

        assert_eq!(pages.len(), 3);
        assert!(body_text(pages[0].as_ref().unwrap()).contains("page-slow"));
        assert!(body_text(pages[1].as_ref().unwrap()).contains("page-fast"));
        assert!(body_text(pages[2].as_ref().unwrap()).contains("page-mid"));
    }

    #[tokio::test]
    async fn test_failed_request_marks_only_its_slot() {
        let server = MockServer::start().await;
        mount_page(&server, "/a", "page-a", 0).await;
        mount_page(&server, "/b", "page-b", 0).await;

        let urls = vec![
            page_url(&server.uri(), "/a"),
            // Discard port; the connection is refused
            page_url("http://127.0.0.1:9", "/dead"),
            page_url(&server.uri(), "/b"),
        ];
        let pages = Fetcher::new().fetch_all(urls).await;

        assert_eq!(pages.len(), 3);
        assert!(pages[0].is_ok());
        assert!(matches!(
            pages[1].as_ref(),
            Err(ScraperError::Request { url, .. }) if url.contains("/dead")
        ));
        assert!(pages[2].is_ok());
    }

    #[tokio::test]
    async fn test_http_error_status_fails_the_slot() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let result = Fetcher::new()
            .fetch_one(page_url(&server.uri(), "/missing"))
            .await;
        assert!(matches!(result, Err(ScraperError::Request { .. })));
    }

    #[tokio::test]
    async fn test_fetch_one_returns_the_page() {
        let server = MockServer::start().await;
        mount_page(&server, "/one", "single-page", 0).await;

        let page = Fetcher::new()
            .fetch_one(page_url(&server.uri(), "/one"))
            .await
            .unwrap();
        assert_eq!(page.category(), PageCategory::RaceCard);
        assert!(body_text(&page).contains("single-page"));
    }

    #[tokio::test]
    async fn test_malformed_markup_still_yields_a_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<html><body><td>orphan cell<div></body>"),
            )
            .mount(&server)
            .await;

        let page = Fetcher::new()
            .fetch_one(page_url(&server.uri(), "/broken"))
            .await
            .unwrap();
        assert!(body_text(&page).contains("orphan cell"));
    }
}
