//! HTTP-backed engine client
//!
//! Drives an `Engine` request/response definition through the shared
//! `HttpClient` and maps every failure onto a `SearchError` kind.

use super::traits::{Engine, EngineClient, EngineId, RequestParams};
use crate::cache::{query_cache_key, HitCache};
use crate::error::SearchError;
use crate::network::{deadline_after, HttpClient};
use crate::results::Hit;
use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Engine client for backends reached over HTTP
pub struct HttpEngineClient {
    id: EngineId,
    engine: Arc<dyn Engine>,
    client: HttpClient,
    api_key: Option<String>,
    requires_credential: bool,
    cache: Option<Arc<HitCache>>,
    fetch_content: bool,
}

impl HttpEngineClient {
    pub fn new(id: impl Into<EngineId>, engine: Arc<dyn Engine>, client: HttpClient) -> Self {
        Self {
            id: id.into(),
            engine,
            client,
            api_key: None,
            requires_credential: false,
            cache: None,
            fetch_content: false,
        }
    }

    /// Set the credential, ignoring empty keys
    pub fn with_api_key(mut self, key: Option<String>) -> Self {
        self.api_key = key.filter(|k| !k.trim().is_empty());
        self
    }

    pub fn requires_credential(mut self, required: bool) -> Self {
        self.requires_credential = required;
        self
    }

    pub fn with_cache(mut self, cache: Arc<HitCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Replace snippets with the extracted text of each result page
    pub fn fetch_content(mut self, enabled: bool) -> Self {
        self.fetch_content = enabled;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    async fn call(&self, query: &str, count: usize, deadline: Instant) -> Result<Vec<Hit>, SearchError> {
        let mut params = RequestParams::new(query).with_count(count);
        if let Some(ref key) = self.api_key {
            params = params.with_api_key(key.clone());
        }

        let request = self
            .engine
            .request(&params)
            .map_err(|e| SearchError::unavailable(format!("could not build request: {}", e)))?;

        let remaining = deadline.saturating_duration_since(Instant::now());
        let response = self
            .client
            .execute_with_timeout(request, remaining)
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SearchError::timeout(format!("request timed out: {}", e))
                } else {
                    SearchError::unavailable(format!("request failed: {}", e))
                }
            })?;

        if response.is_auth_error() {
            return Err(SearchError::auth_failed(format!(
                "credential rejected (HTTP {})",
                response.status
            )));
        }
        if response.is_rate_limited() {
            return Err(SearchError::unavailable("rate limited (HTTP 429)"));
        }
        if !response.is_success() {
            return Err(SearchError::unavailable(format!("HTTP error: {}", response.status)));
        }

        let mut hits = self
            .engine
            .response(response)
            .map_err(|e| SearchError::unavailable(format!("unparsable response: {}", e)))?;
        hits.truncate(count.max(1));

        if self.fetch_content {
            hits = self.enrich(hits, deadline).await;
        }
        Ok(hits)
    }

    /// Fetch page text for every hit, keeping the engine snippet on failure
    async fn enrich(&self, hits: Vec<Hit>, deadline: Instant) -> Vec<Hit> {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return hits;
        }

        let pages = join_all(
            hits.iter()
                .map(|hit| self.client.fetch_page_text(&hit.url, remaining)),
        )
        .await;

        hits.into_iter()
            .zip(pages)
            .map(|(hit, page)| match page {
                Some(text) => hit.with_snippet(text),
                None => hit,
            })
            .collect()
    }
}

#[async_trait]
impl EngineClient for HttpEngineClient {
    async fn search(
        &self,
        query: &str,
        count: usize,
        timeout: Duration,
    ) -> Result<Vec<Hit>, SearchError> {
        if self.requires_credential && self.api_key.is_none() {
            warn!("Engine {} called without a configured API key", self.id);
            return Err(SearchError::auth_failed(format!(
                "The {} search engine requires an API key which is not configured",
                self.id
            ))
            .with_engine(&self.id));
        }

        let cache_key = query_cache_key(&self.id, query, count);
        if let Some(ref cache) = self.cache {
            if let Some(hits) = cache.get(&cache_key).await {
                debug!("Cache hit for {} on {}", query, self.id);
                return Ok(hits);
            }
        }

        let deadline = deadline_after(timeout);
        let hits = match tokio::time::timeout_at(deadline, self.call(query, count, deadline)).await {
            Ok(result) => result.map_err(|e| e.with_engine(&self.id))?,
            Err(_) => {
                return Err(SearchError::timeout(format!(
                    "no response within {:.1}s",
                    timeout.as_secs_f64()
                ))
                .with_engine(&self.id))
            }
        };

        if let Some(ref cache) = self.cache {
            cache.set(cache_key, hits.clone()).await;
        }
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::engines::bing::Bing;
    use crate::engines::wikipedia::Wikipedia;
    use crate::error::ErrorKind;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn wikipedia(server: &MockServer) -> Arc<dyn Engine> {
        let mut engine = Wikipedia::new();
        let mut config = EngineConfig::new("wikipedia", "wikipedia");
        config.base_url = Some(format!("{}/w/api.php", server.uri()));
        engine.init(&config).unwrap();
        Arc::new(engine)
    }

    fn bing(server: &MockServer) -> Arc<dyn Engine> {
        let mut engine = Bing::new();
        let mut config = EngineConfig::new("bing", "bing");
        config.base_url = Some(format!("{}/v7.0/search", server.uri()));
        engine.init(&config).unwrap();
        Arc::new(engine)
    }

    fn wiki_body() -> serde_json::Value {
        serde_json::json!({
            "query": {"pages": {
                "1": {"index": 1, "title": "Rust", "extract": "A language.", "fullurl": "https://en.wikipedia.org/wiki/Rust"},
                "2": {"index": 2, "title": "Cargo", "extract": "A tool.", "fullurl": "https://en.wikipedia.org/wiki/Cargo"}
            }}
        })
    }

    #[tokio::test]
    async fn test_search_success_and_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/w/api.php"))
            .respond_with(ResponseTemplate::new(200).set_body_json(wiki_body()))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpEngineClient::new("wikipedia", wikipedia(&server), HttpClient::new().unwrap())
            .with_cache(Arc::new(HitCache::default()));

        let hits = client.search("rust", 5, Duration::from_secs(5)).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].title, "Rust");

        let cached = client.search("rust", 5, Duration::from_secs(5)).await.unwrap();
        assert_eq!(cached, hits);
    }

    #[tokio::test]
    async fn test_search_truncates_to_count() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(wiki_body()))
            .mount(&server)
            .await;

        let client = HttpEngineClient::new("wikipedia", wikipedia(&server), HttpClient::new().unwrap());
        let hits = client.search("rust", 1, Duration::from_secs(5)).await.unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn test_search_with_unbounded_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(wiki_body()))
            .mount(&server)
            .await;

        let client = HttpEngineClient::new("wikipedia", wikipedia(&server), HttpClient::new().unwrap());
        let hits = client.search("rust", 5, Duration::MAX).await.unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn test_rejected_credential_is_auth_failed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let client = HttpEngineClient::new("bing", bing(&server), HttpClient::new().unwrap())
            .requires_credential(true)
            .with_api_key(Some("bad".to_string()));

        let err = client.search("rust", 5, Duration::from_secs(5)).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::AuthFailed);
        assert_eq!(err.engine.as_deref(), Some("bing"));
    }

    #[tokio::test]
    async fn test_server_error_is_unavailable_and_not_cached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(2)
            .mount(&server)
            .await;

        let client = HttpEngineClient::new("wikipedia", wikipedia(&server), HttpClient::new().unwrap())
            .with_cache(Arc::new(HitCache::default()));

        for _ in 0..2 {
            let err = client.search("rust", 5, Duration::from_secs(5)).await.unwrap_err();
            assert_eq!(err.kind, ErrorKind::Unavailable);
        }
    }

    #[tokio::test]
    async fn test_slow_backend_is_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(wiki_body())
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let client = HttpEngineClient::new("wikipedia", wikipedia(&server), HttpClient::new().unwrap());
        let err = client
            .search("rust", 5, Duration::from_millis(200))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Timeout);
    }

    #[tokio::test]
    async fn test_paid_engine_without_key_makes_no_call() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = HttpEngineClient::new("bing", bing(&server), HttpClient::new().unwrap())
            .requires_credential(true)
            .with_api_key(Some(String::new()));

        let err = client.search("rust", 5, Duration::from_secs(5)).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::AuthFailed);
        assert!(err.message.contains("requires an API key"));
    }

    #[tokio::test]
    async fn test_fetch_content_replaces_snippet() {
        let server = MockServer::start().await;
        let page_url = format!("{}/page", server.uri());
        Mock::given(method("GET"))
            .and(path("/w/api.php"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "query": {"pages": {
                    "1": {"index": 1, "title": "Page", "extract": "Short.", "fullurl": page_url}
                }}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                "<html><body><p>Full page text.</p></body></html>",
                "text/html",
            ))
            .mount(&server)
            .await;

        let client = HttpEngineClient::new("wikipedia", wikipedia(&server), HttpClient::new().unwrap())
            .fetch_content(true);
        let hits = client.search("page", 5, Duration::from_secs(5)).await.unwrap();
        assert_eq!(hits[0].snippet, "Full page text.");
    }
}
