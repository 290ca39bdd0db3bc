//! HTTP client shared by engine backends, page extraction and the oracle

use super::extract::{extract_text, MAX_PAGE_CHARS};
use super::user_agent::{accept_html, accept_json, generate_user_agent};
use crate::config::OutgoingSettings;
use crate::engines::{EngineRequest, EngineResponse, HttpMethod, RequestBody};
use anyhow::Result;
use reqwest::{Client, Response};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Upper bound for any timeout or deadline handed to the runtime
pub const MAX_WAIT: Duration = Duration::from_secs(24 * 60 * 60);

/// Deadline `timeout` from now, capped at [`MAX_WAIT`]
pub fn deadline_after(timeout: Duration) -> tokio::time::Instant {
    tokio::time::Instant::now() + timeout.min(MAX_WAIT)
}

/// HTTP client wrapper with deepsearch-specific configuration
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    default_timeout: Duration,
    user_agent: String,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self> {
        Self::with_settings(&OutgoingSettings::default())
    }

    /// Create a new HTTP client with custom settings
    pub fn with_settings(settings: &OutgoingSettings) -> Result<Self> {
        let mut builder = Client::builder()
            .timeout(Duration::from_secs_f64(settings.request_timeout))
            .pool_max_idle_per_host(settings.pool_maxsize)
            .cookie_store(true)
            .gzip(true)
            .brotli(true);

        if !settings.verify_ssl {
            builder = builder.danger_accept_invalid_certs(true);
        }

        if let Some(ref proxy_url) = settings.proxies.all {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
        } else {
            if let Some(ref http) = settings.proxies.http {
                builder = builder.proxy(reqwest::Proxy::http(http)?);
            }
            if let Some(ref https) = settings.proxies.https {
                builder = builder.proxy(reqwest::Proxy::https(https)?);
            }
        }

        Ok(Self {
            client: builder.build()?,
            default_timeout: Duration::from_secs_f64(settings.request_timeout),
            user_agent: generate_user_agent(),
        })
    }

    /// Execute an engine request with the default timeout
    pub async fn execute(&self, request: EngineRequest) -> reqwest::Result<EngineResponse> {
        self.execute_with_timeout(request, self.default_timeout).await
    }

    /// Execute an engine request with a custom timeout
    ///
    /// Transport errors are returned as-is so callers can tell timeouts
    /// from connection failures.
    pub async fn execute_with_timeout(
        &self,
        request: EngineRequest,
        timeout: Duration,
    ) -> reqwest::Result<EngineResponse> {
        let mut req_builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
        };

        req_builder = req_builder
            .timeout(timeout)
            .header("User-Agent", &self.user_agent)
            .header("Accept-Language", "en-US,en;q=0.9")
            .header("DNT", "1");

        if !request.headers.keys().any(|k| k.eq_ignore_ascii_case("accept")) {
            req_builder = req_builder.header("Accept", accept_html());
        }

        for (key, value) in &request.headers {
            req_builder = req_builder.header(key, value);
        }

        if !request.params.is_empty() {
            req_builder = req_builder.query(&request.params);
        }

        if let Some(body) = request.data {
            req_builder = match body {
                RequestBody::Form(data) => req_builder.form(&data),
                RequestBody::Json(json) => req_builder.json(&json),
            };
        }

        let response = req_builder.send().await?;
        Self::parse_response(response).await
    }

    /// POST a JSON body, optionally with a bearer token
    pub async fn post_json(
        &self,
        url: &str,
        body: serde_json::Value,
        bearer: Option<&str>,
        timeout: Duration,
    ) -> reqwest::Result<EngineResponse> {
        let mut request = EngineRequest::post(url)
            .header("Accept", accept_json())
            .json(body);
        if let Some(token) = bearer {
            request = request.header("Authorization", format!("Bearer {}", token));
        }
        self.execute_with_timeout(request, timeout).await
    }

    /// Fetch a page and extract its readable text
    ///
    /// Returns `None` for non-HTTP URLs, failed requests, non-HTML responses
    /// and pages without text.
    pub async fn fetch_page_text(&self, url: &str, timeout: Duration) -> Option<String> {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return None;
        }

        let response = match self.execute_with_timeout(EngineRequest::get(url), timeout).await {
            Ok(response) => response,
            Err(e) => {
                debug!("Content extraction failed for {}: {}", url, e);
                return None;
            }
        };

        let is_html = response
            .headers
            .get("content-type")
            .map(|ct| ct.to_lowercase().contains("text/html"))
            .unwrap_or(false);
        if !response.is_success() || !is_html {
            return None;
        }

        let text = extract_text(&response.text, MAX_PAGE_CHARS);
        (!text.is_empty()).then_some(text)
    }

    /// Parse response into EngineResponse
    async fn parse_response(response: Response) -> reqwest::Result<EngineResponse> {
        let status = response.status().as_u16();
        let url = response.url().to_string();

        let mut headers = HashMap::new();
        for (key, value) in response.headers() {
            if let Ok(v) = value.to_str() {
                headers.insert(key.to_string(), v.to_string());
            }
        }

        let text = response.text().await?;

        Ok(EngineResponse {
            status,
            headers,
            text,
            url,
        })
    }

    /// Get a new user agent
    pub fn rotate_user_agent(&mut self) {
        self.user_agent = generate_user_agent();
    }

    /// Get current user agent
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}
