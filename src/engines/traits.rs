//! Engine traits and types

use crate::config::EngineConfig;
use crate::error::SearchError;
use crate::results::Hit;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Identifier of a registered engine (e.g. "ddg", "google")
pub type EngineId = String;

/// Identifies an engine and whether it needs a credential
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EngineSpec {
    pub id: EngineId,
    pub requires_credential: bool,
}

impl EngineSpec {
    pub fn free(id: impl Into<EngineId>) -> Self {
        Self {
            id: id.into(),
            requires_credential: false,
        }
    }

    pub fn paid(id: impl Into<EngineId>) -> Self {
        Self {
            id: id.into(),
            requires_credential: true,
        }
    }
}

/// Capability every search backend exposes to the round executor
///
/// Implementations must return within `timeout` or fail with
/// `ErrorKind::Timeout`, must report failed calls as errors rather than
/// empty successes, and must not panic.
#[async_trait]
pub trait EngineClient: Send + Sync {
    /// Search for `query`, asking the backend for up to `count` hits
    async fn search(
        &self,
        query: &str,
        count: usize,
        timeout: Duration,
    ) -> Result<Vec<Hit>, SearchError>;
}

/// Parameters for building a search request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestParams {
    /// Search query string
    pub query: String,
    /// Number of results wanted
    pub count: usize,
    /// Credential for engines that need one
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl RequestParams {
    /// Create new request parameters
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            count: 5,
            api_key: None,
        }
    }

    /// Set the number of results wanted
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count.max(1);
        self
    }

    /// Set the credential
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// The credential, or an error naming the engine that needs it
    pub fn require_api_key(&self, engine: &str) -> anyhow::Result<&str> {
        self.api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| anyhow::anyhow!("{} requires an API key", engine))
    }
}

/// HTTP request to be made by the engine
#[derive(Debug, Clone)]
pub struct EngineRequest {
    /// URL to request
    pub url: String,
    /// HTTP method
    pub method: HttpMethod,
    /// Request headers
    pub headers: HashMap<String, String>,
    /// Query parameters
    pub params: HashMap<String, String>,
    /// POST body data
    pub data: Option<RequestBody>,
}

impl EngineRequest {
    /// Create a GET request
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: HttpMethod::Get,
            headers: HashMap::new(),
            params: HashMap::new(),
            data: None,
        }
    }

    /// Create a POST request
    pub fn post(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Post,
            ..Self::get(url)
        }
    }

    /// Add a header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Add a query parameter
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Add form data (sets content-type to form-urlencoded)
    pub fn form(mut self, data: HashMap<String, String>) -> Self {
        self.data = Some(RequestBody::Form(data));
        self
    }

    /// Add JSON body
    pub fn json(mut self, data: serde_json::Value) -> Self {
        self.data = Some(RequestBody::Json(data));
        self
    }
}

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// Request body types
#[derive(Debug, Clone)]
pub enum RequestBody {
    Form(HashMap<String, String>),
    Json(serde_json::Value),
}

/// HTTP response from engine request
#[derive(Debug)]
pub struct EngineResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: HashMap<String, String>,
    /// Response body as text
    pub text: String,
    /// Response URL (after redirects)
    pub url: String,
}

impl EngineResponse {
    /// Parse response as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> anyhow::Result<T> {
        Ok(serde_json::from_str(&self.text)?)
    }

    /// Check if response is successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Check if the backend rejected the credential
    pub fn is_auth_error(&self) -> bool {
        self.status == 401 || self.status == 403
    }

    /// Check if response indicates rate limiting
    pub fn is_rate_limited(&self) -> bool {
        self.status == 429
    }
}

/// Request/response definition of an HTTP search backend
///
/// Backends only describe how to build a request and parse a response;
/// `HttpEngineClient` performs the call and maps failures onto
/// `SearchError` kinds.
pub trait Engine: Send + Sync {
    /// Backend name
    fn name(&self) -> &str;

    /// Short description of the engine
    fn about(&self) -> EngineAbout {
        EngineAbout::default()
    }

    /// Build the HTTP request for a search
    fn request(&self, params: &RequestParams) -> anyhow::Result<EngineRequest>;

    /// Parse a successful HTTP response into hits
    fn response(&self, response: EngineResponse) -> anyhow::Result<Vec<Hit>>;

    /// Optional initialization from the engine's configuration
    fn init(&mut self, _config: &EngineConfig) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Engine metadata
#[derive(Debug, Clone, Default, Serialize)]
pub struct EngineAbout {
    /// Website URL
    pub website: Option<String>,
    /// Whether it uses the official API
    pub use_official_api: bool,
    /// Whether an API key is required
    pub require_api_key: bool,
    /// Result format (HTML, JSON, XML)
    pub results: String,
}

impl EngineAbout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn website(mut self, url: impl Into<String>) -> Self {
        self.website = Some(url.into());
        self
    }

    pub fn official_api(mut self, uses: bool) -> Self {
        self.use_official_api = uses;
        self
    }

    pub fn api_key_required(mut self, required: bool) -> Self {
        self.require_api_key = required;
        self
    }

    pub fn results_format(mut self, format: impl Into<String>) -> Self {
        self.results = format.into();
        self
    }
}

/// Read a string field from a JSON object
pub(crate) fn json_str<'a>(value: &'a serde_json::Value, key: &str) -> &'a str {
    value.get(key).and_then(|v| v.as_str()).unwrap_or_default()
}
